//! Common utilities shared across the extractors
//!
//! AST traversal, text extraction and hashing helpers that know nothing about
//! entity kinds.

use sha2::{Digest, Sha256};
use tree_sitter::Node;

use crate::schema::LineSpan;

// ============================================================================
// Text Extraction
// ============================================================================

/// Get text content of a node
pub fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// Text of a named field of `node`, if present
pub fn field_text(node: &Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .map(|child| get_node_text(&child, source))
}

/// 1-based line span of a node
pub fn line_span(node: &Node) -> LineSpan {
    LineSpan::new(node.start_position().row + 1, node.end_position().row + 1)
}

/// Hex SHA-256 of a piece of source text
pub fn hash_text(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

// ============================================================================
// AST Traversal
// ============================================================================

/// Visit all nodes in a tree with a visitor function (iterative to avoid stack overflow)
pub fn visit_all<F>(node: &Node, mut visitor: F)
where
    F: FnMut(&Node),
{
    let mut cursor = node.walk();
    let mut did_visit_children = false;

    loop {
        if !did_visit_children {
            visitor(&cursor.node());

            if cursor.goto_first_child() {
                did_visit_children = false;
                continue;
            }
        }

        if cursor.goto_next_sibling() {
            did_visit_children = false;
            continue;
        }

        // The cursor cannot leave the node it was created from
        if !cursor.goto_parent() {
            break;
        }
        did_visit_children = true;
    }
}

/// Check if a node or any descendant is of one of `kinds`
pub fn contains_node_kind(node: &Node, kinds: &[&str]) -> bool {
    let mut found = false;
    visit_all(node, |n| {
        if !found && kinds.contains(&n.kind()) {
            found = true;
        }
    });
    found
}

/// Node kinds that construct UI markup
pub const MARKUP_KINDS: &[&str] = &["jsx_element", "jsx_self_closing_element", "jsx_fragment"];

/// Check if a function, class or expression constructs JSX anywhere inside
pub fn returns_markup(node: &Node) -> bool {
    contains_node_kind(node, MARKUP_KINDS)
}

/// Strip wrappers that do not change what an expression is
/// (`(x)`, `x as T`, `x satisfies T`, `x!`, `<T>x`)
pub fn unwrap_expression<'a>(node: Node<'a>) -> Node<'a> {
    let mut current = node;
    while matches!(
        current.kind(),
        "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression"
            | "type_assertion"
    ) {
        match current.named_child(0) {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}
