//! Tenecs type checker
//!
//! This module provides:
//! - Symbol tables with lexical scopes
//! - Name binding (files → symbol table), with top-level inference
//! - Short-circuit and arrow desugaring
//! - Bidirectional type checking of expressions
//! - Exhaustiveness checking for `when`
//! - Diagnostics rendering

pub mod annotation;
pub mod binder;
pub mod builtins;
#[allow(clippy::module_inception)]
pub mod checker;
pub mod desugar;
pub mod diagnostic;
pub mod error;
pub mod exhaustiveness;
mod invocation;
pub mod symbols;

pub use binder::{bind, Binder, Bound, BoundDeclaration};
pub use builtins::STANDARD_LIBRARY;
pub use checker::TypeChecker;
pub use desugar::{desugar_file, Desugarer};
pub use diagnostic::{render_caret, Diagnostic, ErrorCode};
pub use error::{CheckError, ErrorKind};
pub use exhaustiveness::{CaseCoverage, ExhaustivenessResult};
pub use symbols::{Scope, SymbolTable, TypeSymbol};
