//! Assignability relation
//!
//! `is_assignable(value, target)` answers whether a value of type `value`
//! may be used where `target` is expected:
//! - a union value is assignable when every element is
//! - a value is assignable to a union when it is assignable to some element
//! - nominal types must match by package and name, with invariant generics
//! - functions and type arguments must be semantically equal

use super::ty::VariableType;

/// Check if `value` is assignable to `target`
pub fn is_assignable(value: &VariableType, target: &VariableType) -> bool {
    match (value, target) {
        (VariableType::Or(or), _) => or.elements().iter().all(|element| is_assignable(element, target)),
        (_, VariableType::Or(or)) => or.elements().iter().any(|element| is_assignable(value, element)),
        (VariableType::Known(a), VariableType::Known(b)) => {
            a.package == b.package
                && a.name == b.name
                && a.generics.len() == b.generics.len()
                && a.generics
                    .iter()
                    .zip(&b.generics)
                    .all(|(x, y)| x.semantically_equal(y))
        }
        (VariableType::Function(_), VariableType::Function(_)) => value.semantically_equal(target),
        (VariableType::TypeArgument(a), VariableType::TypeArgument(b)) => a.name == b.name,
        _ => false,
    }
}

/// Every flattened element of `sub` equals some element of `sup`
pub fn contained_in(sub: &VariableType, sup: &VariableType) -> bool {
    let candidates = sup.flattened();
    sub.flattened()
        .iter()
        .all(|element| candidates.iter().any(|candidate| candidate == element))
}
