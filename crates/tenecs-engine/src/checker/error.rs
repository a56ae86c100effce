//! Error types for binding and type checking
//!
//! Every failure the checker can report is a [`CheckError`]: an
//! [`ErrorKind`], a human-readable message and the source position it
//! refers to. Errors are plain data so callers decide how to render them.

use crate::syntax::Span;
use crate::types::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Assignability failure, including failed generic inference
    TypeMismatch,
    /// Name not found in any active frame or the global table
    UnresolvedReference,
    /// Type name absent from scope
    NotFoundType,
    /// Two bindings with the same name in one scope
    DuplicateVariable,
    /// Repeated type, field or package-level declaration
    DuplicateDeclaration,
    /// `when` without an arm for some union element
    NonExhaustiveMatch,
    /// `when` arm that matches nothing left
    DuplicateOrUnreachableCase,
    /// `when` arm over a generic struct lacking a witness field
    UnnarrowableGeneric,
    /// Short-circuit declaration whose residual cannot leave the block
    ShortCircuitOutsideReturnCompatibleFunction,
    /// Declaration check did not finish within the bounded wait
    Timeout,
}

impl ErrorKind {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "E2001",
            ErrorKind::UnresolvedReference => "E2002",
            ErrorKind::NotFoundType => "E2003",
            ErrorKind::DuplicateVariable => "E2004",
            ErrorKind::DuplicateDeclaration => "E2005",
            ErrorKind::NonExhaustiveMatch => "E2006",
            ErrorKind::DuplicateOrUnreachableCase => "E2007",
            ErrorKind::UnnarrowableGeneric => "E2008",
            ErrorKind::ShortCircuitOutsideReturnCompatibleFunction => "E2009",
            ErrorKind::Timeout => "E2010",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::UnresolvedReference => "UnresolvedReference",
            ErrorKind::NotFoundType => "NotFoundType",
            ErrorKind::DuplicateVariable => "DuplicateVariable",
            ErrorKind::DuplicateDeclaration => "DuplicateDeclaration",
            ErrorKind::NonExhaustiveMatch => "NonExhaustiveMatch",
            ErrorKind::DuplicateOrUnreachableCase => "DuplicateOrUnreachableCase",
            ErrorKind::UnnarrowableGeneric => "UnnarrowableGeneric",
            ErrorKind::ShortCircuitOutsideReturnCompatibleFunction => {
                "ShortCircuitOutsideReturnCompatibleFunction"
            }
            ErrorKind::Timeout => "Timeout",
        };
        write!(f, "{}", name)
    }
}

/// A located checker error
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct CheckError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// File the error was found in
    pub file: String,
    /// Location of the offending node
    pub span: Span,
}

impl CheckError {
    pub fn new(kind: ErrorKind, file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        CheckError {
            kind,
            message: message.into(),
            file: file.into(),
            span,
        }
    }

    pub fn type_mismatch(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, file, span, message)
    }

    pub fn unresolved(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedReference, file, span, message)
    }

    pub fn not_found_type(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFoundType, file, span, message)
    }

    /// `duplicate variable 'name'`
    pub fn duplicate_variable(file: impl Into<String>, span: Span, name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateVariable,
            file,
            span,
            format!("duplicate variable '{}'", name),
        )
    }

    pub fn duplicate_declaration(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateDeclaration, file, span, message)
    }

    pub fn short_circuit(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ShortCircuitOutsideReturnCompatibleFunction, file, span, message)
    }

    pub fn timeout(file: impl Into<String>, span: Span, declaration: &str, timeout_ms: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            file,
            span,
            format!("checking '{}' did not finish within {}ms", declaration, timeout_ms),
        )
    }

    /// Attach a position to a type algebra failure
    pub fn from_type_error(error: TypeError, file: impl Into<String>, span: Span) -> Self {
        let kind = match &error {
            TypeError::UnnarrowableGeneric { .. } => ErrorKind::UnnarrowableGeneric,
            TypeError::WrongGenericCount { .. }
            | TypeError::InferenceConflict { .. }
            | TypeError::NotMatchable { .. } => ErrorKind::TypeMismatch,
        };
        Self::new(kind, file, span, error.to_string())
    }

    /// Same error reported under another kind
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}
