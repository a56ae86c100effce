//! Tenecs Engine
//!
//! Front end for the Tenecs language: everything between the parser and
//! the code generators.
//!
//! This crate provides:
//! - The untyped AST handed over by the parser, and a builder for it
//! - The type model: unions, generics, assignability and inference
//! - Name binding and bidirectional type checking
//! - Short-circuit desugaring and `when` exhaustiveness checking
//! - Runtime discriminators for generic structs on erased backends
//! - Discovery of tests and runnable entry points
//!
//! # Usage
//!
//! ```ignore
//! use tenecs_engine::syntax::build::*;
//! use tenecs_engine::{check_file, CheckerConfig, SourceFile};
//!
//! let top_level = file("main", vec![], vec![top("answer", int(42))]);
//! let output = check_file(SourceFile::new("main.10x", top_level), &CheckerConfig::default())?;
//! assert!(output.tests.is_empty());
//! ```

pub mod checker;
pub mod config;
pub mod driver;
pub mod find;
pub mod program;
pub mod syntax;
pub mod types;

// Re-export main types
pub use checker::{render_caret, CheckError, Diagnostic, ErrorKind};
pub use config::{CheckerConfig, ConfigError};
pub use driver::{check_file, check_files, CheckOutput};
pub use find::{find_runnables, find_tests, FoundTests, Runnables};
pub use program::Program;
pub use syntax::{FileTopLevel, SourceFile, Span};
pub use types::{Discriminator, Ref, VariableType};
