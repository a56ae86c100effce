//! Generic substitution and inference
//!
//! Substitutions are scoped to one instantiation: callers build a fresh
//! [`Substitution`] per invocation and drop it afterwards.

use super::assignability::contained_in;
use super::error::TypeError;
use super::ty::{Function, FunctionArgument, KnownType, VariableType};
use rustc_hash::FxHashMap;

/// Generic name to concrete type
pub type Substitution = FxHashMap<String, VariableType>;

/// Replace type arguments according to `substitution`
///
/// Generics bound by a nested function shadow outer substitutions. Type
/// arguments with no substitution are left untouched.
pub fn resolve_generics(ty: &VariableType, substitution: &Substitution) -> VariableType {
    if substitution.is_empty() {
        return ty.clone();
    }
    match ty {
        VariableType::TypeArgument(arg) => substitution.get(&arg.name).cloned().unwrap_or_else(|| ty.clone()),
        VariableType::Known(known) => VariableType::Known(KnownType {
            generics: known
                .generics
                .iter()
                .map(|g| resolve_generics(g, substitution))
                .collect(),
            ..known.clone()
        }),
        VariableType::Function(function) => {
            if function.generics.iter().any(|g| substitution.contains_key(g)) {
                let mut inner = substitution.clone();
                for generic in &function.generics {
                    inner.remove(generic);
                }
                VariableType::Function(resolve_function(function, &inner))
            } else {
                VariableType::Function(resolve_function(function, substitution))
            }
        }
        VariableType::Or(or) => VariableType::or(or.elements().iter().map(|e| resolve_generics(e, substitution))),
    }
}

fn resolve_function(function: &Function, substitution: &Substitution) -> Function {
    Function {
        generics: function.generics.clone(),
        arguments: function
            .arguments
            .iter()
            .map(|a| FunctionArgument {
                name: a.name.clone(),
                variable_type: resolve_generics(&a.variable_type, substitution),
            })
            .collect(),
        return_type: Box::new(resolve_generics(&function.return_type, substitution)),
    }
}

/// Whether `ty` refers to any of `generics` as a free type argument
pub fn mentions_any(ty: &VariableType, generics: &[String]) -> bool {
    match ty {
        VariableType::TypeArgument(arg) => generics.contains(&arg.name),
        VariableType::Known(known) => known.generics.iter().any(|g| mentions_any(g, generics)),
        VariableType::Function(function) => {
            let free: Vec<String> = generics
                .iter()
                .filter(|g| !function.generics.contains(g))
                .cloned()
                .collect();
            function.argument_types().any(|a| mentions_any(a, &free)) || mentions_any(&function.return_type, &free)
        }
        VariableType::Or(or) => or.elements().iter().any(|e| mentions_any(e, generics)),
    }
}

/// Apply concrete generics to a generic function
pub fn instantiate(function: &Function, generics: &[VariableType]) -> Result<Function, TypeError> {
    if function.generics.len() != generics.len() {
        return Err(TypeError::WrongGenericCount {
            expected: function.generics.len(),
            actual: generics.len(),
        });
    }
    let substitution: Substitution = function
        .generics
        .iter()
        .cloned()
        .zip(generics.iter().cloned())
        .collect();
    let resolved = resolve_function(function, &substitution);
    Ok(Function {
        generics: Vec::new(),
        ..resolved
    })
}

/// Combine a new inference for `generic` with an earlier one
///
/// The result widens when the earlier inference is contained in the new one.
/// Anything else, including a narrower later inference, is a conflict.
pub fn merge_inference(
    generic: &str,
    found: Option<VariableType>,
    inferred: VariableType,
) -> Result<VariableType, TypeError> {
    match found {
        None => Ok(inferred),
        Some(previous) if contained_in(&previous, &inferred) => Ok(inferred),
        Some(previous) => Err(TypeError::InferenceConflict {
            generic: generic.to_string(),
            previous: previous.to_string(),
            current: inferred.to_string(),
        }),
    }
}

fn merge_optional(generic: &str, found: Option<VariableType>, inferred: Option<VariableType>) -> Result<Option<VariableType>, TypeError> {
    match inferred {
        None => Ok(found),
        Some(inferred) => merge_inference(generic, found, inferred).map(Some),
    }
}

/// Infer what `generic` must be for `argument` to fit `parameter`
///
/// Returns `Ok(None)` when the parameter says nothing about the generic.
pub fn infer_generic(
    generic: &str,
    parameter: &VariableType,
    argument: &VariableType,
) -> Result<Option<VariableType>, TypeError> {
    match parameter {
        VariableType::TypeArgument(arg) => {
            if arg.name == generic {
                Ok(Some(argument.clone()))
            } else {
                Ok(None)
            }
        }
        VariableType::Known(param) => {
            let arg = match argument {
                VariableType::Known(arg)
                    if arg.package == param.package
                        && arg.name == param.name
                        && arg.generics.len() == param.generics.len() =>
                {
                    arg
                }
                _ => return Ok(None),
            };
            let mut found = None;
            for (p, a) in param.generics.iter().zip(&arg.generics) {
                found = merge_optional(generic, found, infer_generic(generic, p, a)?)?;
            }
            Ok(found)
        }
        VariableType::Function(param) => {
            if param.generics.iter().any(|g| g == generic) {
                return Ok(None);
            }
            let arg = match argument {
                VariableType::Function(arg) if arg.arguments.len() == param.arguments.len() => arg,
                _ => return Ok(None),
            };
            let mut found = None;
            for (p, a) in param.argument_types().zip(arg.argument_types()) {
                found = merge_optional(generic, found, infer_generic(generic, p, a)?)?;
            }
            merge_optional(
                generic,
                found,
                infer_generic(generic, &param.return_type, &arg.return_type)?,
            )
        }
        VariableType::Or(param) => {
            // elements matching literally say nothing about the generic
            let remaining: Vec<VariableType> = argument
                .flattened()
                .into_iter()
                .filter(|a| !param.elements().iter().any(|p| p == a))
                .collect();
            if remaining.is_empty() {
                return Ok(None);
            }
            let remaining = VariableType::or(remaining);
            let mut found = None;
            for element in param.elements() {
                found = merge_optional(generic, found, infer_generic(generic, element, &remaining)?)?;
            }
            Ok(found)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> VariableType {
        VariableType::type_argument("T")
    }

    fn arg(ty: VariableType) -> FunctionArgument {
        FunctionArgument {
            name: "_".to_string(),
            variable_type: ty,
        }
    }

    #[test]
    fn test_resolve_generics_substitutes_nested() {
        let mut substitution = Substitution::default();
        substitution.insert("T".to_string(), VariableType::int());
        let resolved = resolve_generics(&VariableType::list(t()), &substitution);
        assert_eq!(resolved, VariableType::list(VariableType::int()));
    }

    #[test]
    fn test_resolve_generics_respects_shadowing() {
        let mut substitution = Substitution::default();
        substitution.insert("T".to_string(), VariableType::int());
        let inner = VariableType::function(vec!["T".to_string()], vec![arg(t())], t());
        let resolved = resolve_generics(&inner, &substitution);
        assert_eq!(resolved.to_string(), "<T>(<T>) ~> <T>");
    }

    #[test]
    fn test_infer_through_list() {
        let inferred = infer_generic("T", &VariableType::list(t()), &VariableType::list(VariableType::string())).unwrap();
        assert_eq!(inferred, Some(VariableType::string()));
    }

    #[test]
    fn test_infer_through_function_return() {
        let parameter = VariableType::function(vec![], vec![arg(VariableType::int())], t());
        let argument = VariableType::function(vec![], vec![arg(VariableType::int())], VariableType::boolean());
        assert_eq!(infer_generic("T", &parameter, &argument).unwrap(), Some(VariableType::boolean()));
    }

    #[test]
    fn test_infer_through_union_ignores_literal_matches() {
        let parameter = VariableType::or(vec![t(), VariableType::void()]);
        let argument = VariableType::or(vec![VariableType::string(), VariableType::void()]);
        assert_eq!(infer_generic("T", &parameter, &argument).unwrap(), Some(VariableType::string()));
    }

    #[test]
    fn test_merge_only_widens() {
        let int_or_string = VariableType::or(vec![VariableType::int(), VariableType::string()]);
        let widened = merge_inference("T", Some(VariableType::int()), int_or_string.clone()).unwrap();
        assert_eq!(widened, int_or_string);
        let same = merge_inference("T", Some(VariableType::int()), VariableType::int()).unwrap();
        assert_eq!(same, VariableType::int());
        let narrowed = merge_inference("T", Some(int_or_string), VariableType::string()).unwrap_err();
        assert!(matches!(narrowed, TypeError::InferenceConflict { .. }));
    }

    #[test]
    fn test_merge_conflict() {
        let err = merge_inference("T", Some(VariableType::int()), VariableType::string()).unwrap_err();
        assert!(matches!(err, TypeError::InferenceConflict { .. }));
        assert_eq!(err.to_string(), "Could not infer generics, please annotate them");
    }

    #[test]
    fn test_conflict_inside_one_parameter() {
        let pair = |a: VariableType, b: VariableType| {
            VariableType::Known(KnownType {
                package: "main".to_string(),
                name: "Pair".to_string(),
                declared_generics: vec!["A".to_string(), "B".to_string()],
                generics: vec![a, b],
                valid_struct_field: true,
            })
        };
        let result = infer_generic("T", &pair(t(), t()), &pair(VariableType::int(), VariableType::string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_mentions_any() {
        let open = vec!["T".to_string()];
        assert!(mentions_any(&VariableType::list(t()), &open));
        assert!(!mentions_any(&VariableType::int(), &open));
        let shadowed = VariableType::function(vec!["T".to_string()], vec![arg(t())], t());
        assert!(!mentions_any(&shadowed, &open));
    }

    #[test]
    fn test_instantiate_checks_generic_count() {
        let id = Function::new(vec!["T".to_string()], vec![arg(t())], t());
        let err = instantiate(&id, &[]).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of generics, expected 1 but got 0");
        let concrete = instantiate(&id, &[VariableType::int()]).unwrap();
        assert!(concrete.generics.is_empty());
        assert_eq!(*concrete.return_type, VariableType::int());
    }
}
