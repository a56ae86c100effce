//! Runtime discriminators for type-erased backends
//!
//! Target runtimes only keep a nominal tag on each record, never the
//! generic arguments it was built with. To narrow `when x is Box<String>`
//! a backend checks the tag and then checks the value stored in a *witness
//! field*: for each generic parameter, the first field (in declaration order)
//! whose declared type is exactly that parameter.
//!
//! A parameter without a witness field cannot be distinguished at runtime,
//! so matching on an instantiation of it is rejected.

use super::error::TypeError;
use super::ty::{KnownType, VariableType, BUILTIN_PACKAGE};
use super::Ref;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Witness field per generic parameter, positionally; `None` when absent
pub type MatchFields = BTreeMap<Ref, Vec<Option<String>>>;

/// Pick the witness field for each declared generic
pub fn witness_fields(generics: &[String], fields: &[(String, VariableType)]) -> Vec<Option<String>> {
    generics
        .iter()
        .map(|generic| {
            fields
                .iter()
                .find(|(_, ty)| matches!(ty, VariableType::TypeArgument(arg) if &arg.name == generic))
                .map(|(name, _)| name.clone())
        })
        .collect()
}

/// The runtime test compiled from a `when` arm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discriminator {
    /// Value is null
    Void,
    /// Record tag matches, and each witness field satisfies its discriminator
    Tag {
        package: String,
        name: String,
        witnesses: Vec<(String, Discriminator)>,
    },
    /// Value is a list that is empty or whose elements all satisfy the inner test
    List(Box<Discriminator>),
    /// Any of the alternatives holds
    AnyOf(Vec<Discriminator>),
}

/// Builds discriminators from the synthesized witness table
pub struct DiscriminatorSynthesizer<'a> {
    match_fields: &'a MatchFields,
}

impl<'a> DiscriminatorSynthesizer<'a> {
    pub fn new(match_fields: &'a MatchFields) -> Self {
        Self { match_fields }
    }

    /// Discriminator for a `when` arm of type `ty`
    ///
    /// Unions are allowed at the top of an arm and inside list elements.
    pub fn discriminator(&self, ty: &VariableType) -> Result<Discriminator, TypeError> {
        match ty {
            VariableType::Or(or) => or
                .elements()
                .iter()
                .map(|element| self.discriminator(element))
                .collect::<Result<Vec<_>, _>>()
                .map(Discriminator::AnyOf),
            other => self.single(other),
        }
    }

    fn single(&self, ty: &VariableType) -> Result<Discriminator, TypeError> {
        match ty {
            VariableType::TypeArgument(_) => Err(TypeError::NotMatchable {
                ty: ty.to_string(),
                reason: "can't match on generic",
            }),
            VariableType::Function(_) => Err(TypeError::NotMatchable {
                ty: ty.to_string(),
                reason: "can't match on function",
            }),
            VariableType::Or(_) => Err(TypeError::NotMatchable {
                ty: ty.to_string(),
                reason: "can't match on or in generic position",
            }),
            VariableType::Known(known) => self.known(known),
        }
    }

    fn known(&self, known: &KnownType) -> Result<Discriminator, TypeError> {
        if known.package == BUILTIN_PACKAGE {
            match known.name.as_str() {
                "Void" => return Ok(Discriminator::Void),
                "List" => {
                    let element = known.generics.first().ok_or(TypeError::WrongGenericCount {
                        expected: 1,
                        actual: 0,
                    })?;
                    return Ok(Discriminator::List(Box::new(self.discriminator(element)?)));
                }
                _ => {}
            }
        }

        let mut witnesses = Vec::with_capacity(known.generics.len());
        if !known.generics.is_empty() {
            let fields = self.match_fields.get(&Ref::from(known));
            for (i, generic) in known.generics.iter().enumerate() {
                let parameter = known.declared_generics.get(i).cloned().unwrap_or_default();
                let field = fields
                    .and_then(|f| f.get(i))
                    .and_then(|f| f.clone())
                    .ok_or_else(|| TypeError::UnnarrowableGeneric {
                        name: format!("{}", Ref::from(known)),
                        parameter: parameter.clone(),
                    })?;
                witnesses.push((field, self.single(generic)?));
            }
        }

        Ok(Discriminator::Tag {
            package: known.package.clone(),
            name: known.name.clone(),
            witnesses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(name: &str) -> VariableType {
        VariableType::type_argument(name)
    }

    fn known(name: &str, declared: &[&str], generics: Vec<VariableType>) -> VariableType {
        VariableType::Known(KnownType {
            package: "main".to_string(),
            name: name.to_string(),
            declared_generics: declared.iter().map(|g| g.to_string()).collect(),
            generics,
            valid_struct_field: true,
        })
    }

    fn fields(pairs: &[(&str, VariableType)]) -> Vec<(String, VariableType)> {
        pairs.iter().map(|(n, t)| (n.to_string(), t.clone())).collect()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_witness_single_field() {
        let witnesses = witness_fields(&strings(&["T"]), &fields(&[("value", generic("T"))]));
        assert_eq!(witnesses, vec![Some("value".to_string())]);
    }

    #[test]
    fn test_witness_picks_first_exact_field() {
        let witnesses = witness_fields(
            &strings(&["A", "B"]),
            &fields(&[
                ("label", VariableType::string()),
                ("first", generic("A")),
                ("second", generic("B")),
                ("again", generic("A")),
            ]),
        );
        assert_eq!(witnesses, vec![Some("first".to_string()), Some("second".to_string())]);
    }

    #[test]
    fn test_witness_ignores_nested_occurrences() {
        let witnesses = witness_fields(
            &strings(&["T"]),
            &fields(&[
                ("value", VariableType::list(generic("T"))),
                ("maybe", VariableType::or(vec![generic("T"), VariableType::void()])),
            ]),
        );
        assert_eq!(witnesses, vec![None]);
    }

    #[test]
    fn test_discriminator_for_generic_struct() {
        let mut match_fields = MatchFields::default();
        match_fields.insert(Ref::new("main", "Box"), vec![Some("value".to_string())]);
        let synthesizer = DiscriminatorSynthesizer::new(&match_fields);

        let discriminator = synthesizer
            .discriminator(&known("Box", &["T"], vec![VariableType::string()]))
            .unwrap();
        assert_eq!(
            discriminator,
            Discriminator::Tag {
                package: "main".to_string(),
                name: "Box".to_string(),
                witnesses: vec![(
                    "value".to_string(),
                    Discriminator::Tag {
                        package: String::new(),
                        name: "String".to_string(),
                        witnesses: vec![],
                    }
                )],
            }
        );
    }

    #[test]
    fn test_missing_witness_is_unnarrowable() {
        let mut match_fields = MatchFields::default();
        match_fields.insert(Ref::new("main", "Wrapper"), vec![None]);
        let synthesizer = DiscriminatorSynthesizer::new(&match_fields);

        let err = synthesizer
            .discriminator(&known("Wrapper", &["T"], vec![VariableType::int()]))
            .unwrap_err();
        assert_eq!(
            err,
            TypeError::UnnarrowableGeneric {
                name: "main.Wrapper".to_string(),
                parameter: "T".to_string(),
            }
        );
    }

    #[test]
    fn test_union_in_generic_position_rejected() {
        let mut match_fields = MatchFields::default();
        match_fields.insert(Ref::new("main", "Box"), vec![Some("value".to_string())]);
        let synthesizer = DiscriminatorSynthesizer::new(&match_fields);

        let arm = known(
            "Box",
            &["T"],
            vec![VariableType::or(vec![VariableType::int(), VariableType::string()])],
        );
        let err = synthesizer.discriminator(&arm).unwrap_err();
        assert_eq!(err.to_string(), "can't match on or in generic position");
    }

    #[test]
    fn test_list_elements_may_be_unions() {
        let match_fields = MatchFields::default();
        let synthesizer = DiscriminatorSynthesizer::new(&match_fields);
        let list = VariableType::list(VariableType::or(vec![VariableType::int(), VariableType::void()]));
        let discriminator = synthesizer.discriminator(&list).unwrap();
        match discriminator {
            Discriminator::List(inner) => assert!(matches!(*inner, Discriminator::AnyOf(ref alts) if alts.len() == 2)),
            other => panic!("expected list discriminator, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_and_function_rejected() {
        let match_fields = MatchFields::default();
        let synthesizer = DiscriminatorSynthesizer::new(&match_fields);
        assert_eq!(
            synthesizer.discriminator(&generic("T")).unwrap_err().to_string(),
            "can't match on generic"
        );
        let f = VariableType::function(vec![], vec![], VariableType::int());
        assert_eq!(
            synthesizer.discriminator(&f).unwrap_err().to_string(),
            "can't match on function"
        );
    }
}
