//! Core type definitions for the Tenecs type system

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Package holding the built-in types
pub const BUILTIN_PACKAGE: &str = "";

/// An unbound generic placeholder: `<T>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeArgument {
    pub name: String,
}

/// A nominal type: struct, interface or built-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownType {
    pub package: String,
    pub name: String,
    /// Generic parameter names as declared, e.g. `["T"]` for `List`
    pub declared_generics: Vec<String>,
    /// Positional generic arguments
    pub generics: Vec<VariableType>,
    /// False for interfaces, which cannot be stored in struct fields
    pub valid_struct_field: bool,
}

impl KnownType {
    pub fn is(&self, package: &str, name: &str) -> bool {
        self.package == package && self.name == name
    }

    /// Same nominal type with the declared generics as type arguments
    pub fn with_declared_generics(&self) -> KnownType {
        KnownType {
            generics: self
                .declared_generics
                .iter()
                .map(|g| VariableType::type_argument(g))
                .collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionArgument {
    pub name: String,
    pub variable_type: VariableType,
}

/// `<G>(a: A, b: B) ~> R`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub generics: Vec<String>,
    pub arguments: Vec<FunctionArgument>,
    pub return_type: Box<VariableType>,
}

impl Function {
    pub fn new(generics: Vec<String>, arguments: Vec<FunctionArgument>, return_type: VariableType) -> Self {
        Self {
            generics,
            arguments,
            return_type: Box::new(return_type),
        }
    }

    /// Positional argument types, ignoring names
    pub fn argument_types(&self) -> impl Iterator<Item = &VariableType> {
        self.arguments.iter().map(|a| &a.variable_type)
    }
}

/// A flattened, deduplicated union in canonical order
///
/// Only [`VariableType::or`] builds these, so the invariants hold for every
/// value in circulation: no nested unions, no duplicates, sorted by printable
/// name. A union never holds exactly one element; the empty union exists only
/// as the "nothing left" binding of an exhausted `other` arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrType {
    elements: Vec<VariableType>,
}

impl OrType {
    pub fn elements(&self) -> &[VariableType] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// The central type value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VariableType {
    TypeArgument(TypeArgument),
    Known(KnownType),
    Function(Function),
    Or(OrType),
}

impl VariableType {
    // ------------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------------

    fn builtin(name: &str) -> Self {
        VariableType::Known(KnownType {
            package: BUILTIN_PACKAGE.to_string(),
            name: name.to_string(),
            declared_generics: Vec::new(),
            generics: Vec::new(),
            valid_struct_field: true,
        })
    }

    pub fn string() -> Self {
        Self::builtin("String")
    }

    pub fn int() -> Self {
        Self::builtin("Int")
    }

    pub fn float() -> Self {
        Self::builtin("Float")
    }

    pub fn boolean() -> Self {
        Self::builtin("Boolean")
    }

    pub fn void() -> Self {
        Self::builtin("Void")
    }

    pub fn list(of: VariableType) -> Self {
        VariableType::Known(KnownType {
            package: BUILTIN_PACKAGE.to_string(),
            name: "List".to_string(),
            declared_generics: vec!["T".to_string()],
            generics: vec![of],
            valid_struct_field: true,
        })
    }

    pub fn type_argument(name: &str) -> Self {
        VariableType::TypeArgument(TypeArgument {
            name: name.to_string(),
        })
    }

    pub fn function(generics: Vec<String>, arguments: Vec<FunctionArgument>, return_type: VariableType) -> Self {
        VariableType::Function(Function::new(generics, arguments, return_type))
    }

    /// Union of the given types
    ///
    /// Nested unions are flattened and duplicates (by semantic equality)
    /// dropped. Of alpha-equivalent spellings the one with the smallest
    /// printable name survives. Elements are sorted by printable name, and a
    /// single survivor is returned as itself.
    pub fn or(types: impl IntoIterator<Item = VariableType>) -> Self {
        let mut elements: Vec<VariableType> = Vec::new();
        for ty in types {
            for element in ty.into_flattened() {
                match elements.iter_mut().find(|e| **e == element) {
                    Some(existing) => {
                        if canonical_order(&element, existing) == Ordering::Less {
                            *existing = element;
                        }
                    }
                    None => elements.push(element),
                }
            }
        }
        if elements.len() == 1 {
            if let Some(only) = elements.pop() {
                return only;
            }
        }
        elements.sort_by(canonical_order);
        VariableType::Or(OrType { elements })
    }

    /// The empty union
    pub fn nothing() -> Self {
        VariableType::Or(OrType { elements: Vec::new() })
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Union elements, or the type itself
    pub fn flattened(&self) -> Vec<VariableType> {
        match self {
            VariableType::Or(or) => or.elements.clone(),
            other => vec![other.clone()],
        }
    }

    fn into_flattened(self) -> Vec<VariableType> {
        match self {
            VariableType::Or(or) => or.elements.into_iter().flat_map(|e| e.into_flattened()).collect(),
            other => vec![other],
        }
    }

    pub fn as_known(&self) -> Option<&KnownType> {
        match self {
            VariableType::Known(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            VariableType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_or(&self) -> Option<&OrType> {
        match self {
            VariableType::Or(or) => Some(or),
            _ => None,
        }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        matches!(self, VariableType::Known(k) if k.is(BUILTIN_PACKAGE, name))
    }

    pub fn is_void(&self) -> bool {
        self.is_builtin("Void")
    }

    /// Element type of `List<T>`
    pub fn list_element(&self) -> Option<&VariableType> {
        match self {
            VariableType::Known(k) if k.is(BUILTIN_PACKAGE, "List") => k.generics.first(),
            _ => None,
        }
    }

    /// Whether a value of this type may be stored in a struct field
    pub fn can_be_struct_field(&self) -> bool {
        match self {
            VariableType::TypeArgument(_) => true,
            VariableType::Known(k) => k.valid_struct_field,
            VariableType::Function(_) => false,
            VariableType::Or(or) => or.elements.iter().all(|e| e.can_be_struct_field()),
        }
    }

    /// Canonical textual rendering, also used for ordering
    pub fn printable_name(&self) -> String {
        self.to_string()
    }

    /// Structural equality after normalization
    ///
    /// Unions compare as sets and function generics compare up to renaming.
    pub fn semantically_equal(&self, other: &VariableType) -> bool {
        match (self, other) {
            (VariableType::Or(_), _) | (_, VariableType::Or(_)) => {
                let left = self.flattened();
                let right = other.flattened();
                left.iter().all(|l| right.iter().any(|r| l.semantically_equal(r)))
                    && right.iter().all(|r| left.iter().any(|l| l.semantically_equal(r)))
            }
            (VariableType::TypeArgument(a), VariableType::TypeArgument(b)) => a.name == b.name,
            (VariableType::Known(a), VariableType::Known(b)) => {
                a.package == b.package
                    && a.name == b.name
                    && a.generics.len() == b.generics.len()
                    && a.generics
                        .iter()
                        .zip(&b.generics)
                        .all(|(x, y)| x.semantically_equal(y))
            }
            (VariableType::Function(a), VariableType::Function(b)) => {
                let a = normalize_function(a, 0, &[]);
                let b = normalize_function(b, 0, &[]);
                a.generics.len() == b.generics.len()
                    && a.arguments.len() == b.arguments.len()
                    && a.argument_types()
                        .zip(b.argument_types())
                        .all(|(x, y)| x.semantically_equal(y))
                    && a.return_type.semantically_equal(&b.return_type)
            }
            _ => false,
        }
    }
}

impl PartialEq for VariableType {
    fn eq(&self, other: &Self) -> bool {
        self.semantically_equal(other)
    }
}

impl From<KnownType> for VariableType {
    fn from(known: KnownType) -> Self {
        VariableType::Known(known)
    }
}

impl From<Function> for VariableType {
    fn from(function: Function) -> Self {
        VariableType::Function(function)
    }
}

/// Deterministic total order over types, by printable name
pub fn canonical_order(a: &VariableType, b: &VariableType) -> Ordering {
    a.printable_name().cmp(&b.printable_name())
}

// ============================================================================
// Generic normalization
// ============================================================================

/// Renames function generics positionally so that alpha-equivalent
/// signatures become structurally identical. Nested functions get names
/// scoped by depth.
fn normalize_function(function: &Function, depth: usize, outer: &[(String, String)]) -> Function {
    let mut renames: Vec<(String, String)> = outer.to_vec();
    let mut generics = Vec::with_capacity(function.generics.len());
    for (i, generic) in function.generics.iter().enumerate() {
        let normalized = format!("${}_{}", depth, i);
        renames.push((generic.clone(), normalized.clone()));
        generics.push(normalized);
    }
    let arguments = function
        .arguments
        .iter()
        .map(|a| FunctionArgument {
            name: a.name.clone(),
            variable_type: normalize(&a.variable_type, depth + 1, &renames),
        })
        .collect();
    let return_type = normalize(&function.return_type, depth + 1, &renames);
    Function::new(generics, arguments, return_type)
}

fn normalize(ty: &VariableType, depth: usize, renames: &[(String, String)]) -> VariableType {
    match ty {
        VariableType::TypeArgument(arg) => {
            // innermost binding wins
            match renames.iter().rev().find(|(from, _)| from == &arg.name) {
                Some((_, to)) => VariableType::type_argument(to),
                None => ty.clone(),
            }
        }
        VariableType::Known(k) => VariableType::Known(KnownType {
            generics: k.generics.iter().map(|g| normalize(g, depth, renames)).collect(),
            ..k.clone()
        }),
        VariableType::Function(f) => VariableType::Function(normalize_function(f, depth, renames)),
        VariableType::Or(or) => VariableType::or(or.elements.iter().map(|e| normalize(e, depth, renames))),
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

impl fmt::Display for KnownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.package.is_empty() {
            write!(f, "{}.", self.package)?;
        }
        write!(f, "{}", self.name)?;
        if !self.generics.is_empty() {
            write!(f, "<")?;
            for (i, generic) in self.generics.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", generic)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.generics.is_empty() {
            write!(f, "<{}>", self.generics.join(", "))?;
        }
        write!(f, "(")?;
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", argument.variable_type)?;
        }
        write!(f, ") ~> {}", self.return_type)
    }
}

impl fmt::Display for OrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableType::TypeArgument(t) => write!(f, "{}", t),
            VariableType::Known(k) => write!(f, "{}", k),
            VariableType::Function(func) => write!(f, "{}", func),
            VariableType::Or(or) => write!(f, "{}", or),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(ty: VariableType) -> FunctionArgument {
        FunctionArgument {
            name: "_".to_string(),
            variable_type: ty,
        }
    }

    #[test]
    fn test_or_flattens_and_dedups() {
        let inner = VariableType::or(vec![VariableType::string(), VariableType::int()]);
        let outer = VariableType::or(vec![inner, VariableType::int(), VariableType::boolean()]);
        let or = outer.as_or().unwrap();
        assert_eq!(or.len(), 3);
        assert!(or.elements().iter().all(|e| e.as_or().is_none()));
    }

    #[test]
    fn test_or_singleton_collapses() {
        let single = VariableType::or(vec![VariableType::int(), VariableType::int()]);
        assert!(single.is_builtin("Int"));
    }

    #[test]
    fn test_or_canonical_order_is_source_independent() {
        let a = VariableType::or(vec![VariableType::string(), VariableType::boolean(), VariableType::int()]);
        let b = VariableType::or(vec![VariableType::int(), VariableType::string(), VariableType::boolean()]);
        assert_eq!(a.to_string(), "Boolean | Int | String");
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_or_keeps_one_spelling_of_equivalent_functions() {
        let identity = |g: &str| {
            VariableType::function(
                vec![g.to_string()],
                vec![arg(VariableType::type_argument(g))],
                VariableType::type_argument(g),
            )
        };
        let t_first = VariableType::or(vec![identity("T"), identity("U"), VariableType::int()]);
        let u_first = VariableType::or(vec![identity("U"), identity("T"), VariableType::int()]);
        assert_eq!(t_first.to_string(), "<T>(<T>) ~> <T> | Int");
        assert_eq!(t_first.to_string(), u_first.to_string());
    }

    #[test]
    fn test_union_equality_ignores_order() {
        let a = VariableType::or(vec![VariableType::string(), VariableType::int()]);
        let b = VariableType::or(vec![VariableType::int(), VariableType::string()]);
        assert_eq!(a, b);
        assert_ne!(a, VariableType::int());
    }

    #[test]
    fn test_function_alpha_equivalence() {
        let id_t = VariableType::function(
            vec!["T".to_string()],
            vec![arg(VariableType::type_argument("T"))],
            VariableType::type_argument("T"),
        );
        let id_u = VariableType::function(
            vec!["U".to_string()],
            vec![arg(VariableType::type_argument("U"))],
            VariableType::type_argument("U"),
        );
        assert_eq!(id_t, id_u);
    }

    #[test]
    fn test_function_arguments_take_part_in_equality() {
        let f = VariableType::function(vec![], vec![arg(VariableType::int())], VariableType::int());
        let g = VariableType::function(vec![], vec![arg(VariableType::string())], VariableType::int());
        assert_ne!(f, g);
    }

    #[test]
    fn test_display() {
        let list = VariableType::list(VariableType::type_argument("T"));
        assert_eq!(list.to_string(), "List<<T>>");
        let f = VariableType::function(
            vec![],
            vec![arg(VariableType::string()), arg(VariableType::int())],
            VariableType::boolean(),
        );
        assert_eq!(f.to_string(), "(String, Int) ~> Boolean");
        let known = VariableType::Known(KnownType {
            package: "main".to_string(),
            name: "Box".to_string(),
            declared_generics: vec!["T".to_string()],
            generics: vec![VariableType::string()],
            valid_struct_field: true,
        });
        assert_eq!(known.to_string(), "main.Box<String>");
    }

    #[test]
    fn test_can_be_struct_field() {
        assert!(VariableType::int().can_be_struct_field());
        let f = VariableType::function(vec![], vec![], VariableType::int());
        assert!(!f.can_be_struct_field());
        assert!(!VariableType::or(vec![VariableType::int(), f]).can_be_struct_field());
    }
}
