//! Tenecs type model
//!
//! Type values, the assignability relation, generic resolution and
//! inference, and runtime discriminator synthesis for erased backends.

pub mod assignability;
pub mod discriminant;
pub mod error;
pub mod generics;
pub mod ty;

pub use assignability::{contained_in, is_assignable};
pub use discriminant::{witness_fields, Discriminator, DiscriminatorSynthesizer, MatchFields};
pub use error::TypeError;
pub use generics::{infer_generic, instantiate, mentions_any, merge_inference, resolve_generics, Substitution};
pub use ty::{canonical_order, Function, FunctionArgument, KnownType, OrType, TypeArgument, VariableType, BUILTIN_PACKAGE};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique handle to a struct, alias or function
///
/// Serialized as its printable `pkg.Name` form so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Ref {
    pub package: String,
    pub name: String,
}

impl Ref {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl From<&KnownType> for Ref {
    fn from(known: &KnownType) -> Self {
        Ref::new(known.package.clone(), known.name.clone())
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

impl From<Ref> for String {
    fn from(r: Ref) -> Self {
        r.to_string()
    }
}

impl From<String> for Ref {
    /// Package names are dotted, type and function names never are
    fn from(text: String) -> Self {
        match text.rsplit_once('.') {
            Some((package, name)) => Ref::new(package, name),
            None => Ref::new(BUILTIN_PACKAGE, text),
        }
    }
}
