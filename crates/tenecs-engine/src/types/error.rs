//! Type system errors

use thiserror::Error;

/// Failures of the pure type algebra
///
/// These carry no source position; the checker attaches one when it turns
/// them into a `CheckError`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A generic type applied to the wrong number of arguments
    #[error("wrong number of generics, expected {expected} but got {actual}")]
    WrongGenericCount {
        /// Declared generic count
        expected: usize,
        /// Provided generic count
        actual: usize,
    },

    /// Two uses of the same generic inferred incompatible types
    #[error("Could not infer generics, please annotate them")]
    InferenceConflict {
        /// Generic parameter name
        generic: String,
        /// Type inferred first
        previous: String,
        /// Conflicting type
        current: String,
    },

    /// A type that has no runtime discriminator
    #[error("{reason}")]
    NotMatchable {
        /// Printable name of the offending type
        ty: String,
        /// What makes it unmatchable
        reason: &'static str,
    },

    /// A generic parameter with no witness field
    #[error("matching on a struct with generics requires the struct to have one field of that type ({name} has no field of type <{parameter}>)")]
    UnnarrowableGeneric {
        /// Printable name of the struct
        name: String,
        /// Generic parameter lacking a witness
        parameter: String,
    },
}
