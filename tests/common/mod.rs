//! Common test utilities and fixtures for entity-resolver integration tests
//!
//! This module provides:
//! - `TestWorkspace` builder for creating front-end workspaces on disk
//! - Assertions over extracted entity lists

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod assertions;
pub mod workspace;

pub use assertions::*;
pub use workspace::TestWorkspace;
