//! TestWorkspace builder: a temporary front-end workspace plus an engine
//! over it

use std::fs;
use std::path::{Path, PathBuf};

use entity_resolver::{init_tracing, EngineConfig, Entity, EntityEngine};
use tempfile::TempDir;

/// Builder for creating workspace structures in a temp directory
pub struct TestWorkspace {
    dir: TempDir,
    files: Vec<String>,
}

impl TestWorkspace {
    /// Create a new empty workspace
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            files: Vec::new(),
        }
    }

    /// Get the path to the workspace root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn abs(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }

    /// Add a source file with the given content
    pub fn add_file(&mut self, relative_path: &str, content: &str) -> &mut Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        if !self.files.iter().any(|f| f == relative_path) {
            self.files.push(relative_path.to_string());
        }
        self
    }

    /// Source files added so far, in insertion order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Engine with the `test` profile; `RUST_LOG` turns on its logs
    pub fn engine(&self) -> EntityEngine {
        let config = EngineConfig::for_profile("test");
        init_tracing(&config.logging);
        EntityEngine::new(config)
    }

    /// Extract every added file and index the result
    pub fn indexed_engine(&self) -> (EntityEngine, Vec<Entity>) {
        let engine = self.engine();
        let entities = engine.extract_all(&self.files, self.path());
        engine.init_entity_map(&entities);
        (engine, entities)
    }

    // ========================================================================
    // Pre-built workspaces
    // ========================================================================

    /// A small React + services workspace
    pub fn react_app() -> Self {
        let mut ws = Self::new();
        ws.add_file(
            "src/widgets/Button.tsx",
            r#"import React from 'react';

export default function Button({ label }: { label: string }) {
  return <button>{label}</button>;
}
"#,
        )
        .add_file(
            "src/widgets/Card.tsx",
            r#"import React, { memo } from 'react';

function CardInner() {
  return <div className="card" />;
}

export const CARD_PADDING = 8;
export default memo(CardInner);
"#,
        )
        .add_file(
            "src/utils/format.ts",
            r#"export function formatDate(date: Date): string {
  return date.toISOString();
}

export const formatters = { date: formatDate };
"#,
        )
        .add_file(
            "src/utils/math.ts",
            r#"export const PI_APPROX = 3.14;

export function area(r: number) {
  return PI_APPROX * r * r;
}
"#,
        )
        .add_file(
            "src/services/index.ts",
            r#"export default class ApiService {
  get(url: string) {
    return fetch(url);
  }
}
"#,
        );
        ws
    }

    /// A Vue workspace with both script styles
    pub fn vue_app() -> Self {
        let mut ws = Self::new();
        ws.add_file(
            "src/components/Counter.vue",
            r#"<template>
  <button @click="count++">{{ count }}</button>
</template>

<script setup lang="ts">
import { ref } from 'vue';
const count = ref(0);
</script>
"#,
        )
        .add_file(
            "src/components/Hello.vue",
            r#"<template>
  <p>Hello</p>
</template>

<script>
export default {
  name: 'Hello',
};
</script>
"#,
        );
        ws
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
