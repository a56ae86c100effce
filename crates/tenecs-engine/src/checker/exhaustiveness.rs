//! Exhaustiveness checking for `when` expressions
//!
//! A [`CaseCoverage`] starts with the flattened elements of the matched
//! type. Every `is` arm consumes the elements of its own type, and an
//! `other` arm takes whatever is left. Consuming an element twice, or one
//! that was never there, is an error. Anything left at the end is missing.

use crate::types::VariableType;

/// Result of exhaustiveness checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustivenessResult {
    /// Every element is covered
    Exhaustive,
    /// Printable names of the uncovered elements, in canonical order
    NonExhaustive(Vec<String>),
}

/// Why an arm could not consume its elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageError {
    /// Element already taken by an earlier arm
    Duplicate(String),
    /// Element that is not part of the matched type at all
    NoMatching { arm: String, over: String },
}

impl CoverageError {
    pub fn message(&self) -> String {
        match self {
            CoverageError::Duplicate(case) => format!("duplicate case {}", case),
            CoverageError::NoMatching { arm, over } => format!("no matching for {} in {}", arm, over),
        }
    }
}

/// Coverage state of one `when`
#[derive(Debug, Clone)]
pub struct CaseCoverage {
    over: VariableType,
    remaining: Vec<VariableType>,
    consumed: Vec<VariableType>,
}

impl CaseCoverage {
    pub fn new(over: &VariableType) -> Self {
        Self {
            over: over.clone(),
            remaining: over.flattened(),
            consumed: Vec::new(),
        }
    }

    /// Consume the elements of an `is` arm
    ///
    /// Either every element is consumed or none is.
    pub fn consume(&mut self, arm: &VariableType) -> Result<(), CoverageError> {
        let elements = arm.flattened();
        for element in &elements {
            if self.consumed.iter().any(|c| c == element) {
                return Err(CoverageError::Duplicate(element.printable_name()));
            }
            if !self.remaining.iter().any(|r| r == element) {
                return Err(CoverageError::NoMatching {
                    arm: element.printable_name(),
                    over: self.over.printable_name(),
                });
            }
        }
        for element in elements {
            self.remaining.retain(|r| r != &element);
            self.consumed.push(element);
        }
        Ok(())
    }

    /// Consume everything left, for an `other` arm
    ///
    /// Returns the empty union when nothing is left.
    pub fn take_remaining(&mut self) -> VariableType {
        let remaining = std::mem::take(&mut self.remaining);
        self.consumed.extend(remaining.iter().cloned());
        VariableType::or(remaining)
    }

    pub fn finish(self) -> ExhaustivenessResult {
        if self.remaining.is_empty() {
            return ExhaustivenessResult::Exhaustive;
        }
        let mut missing: Vec<String> = self.remaining.iter().map(|r| r.printable_name()).collect();
        missing.sort();
        ExhaustivenessResult::NonExhaustive(missing)
    }
}

/// `missing cases for A, B`
pub fn missing_cases_message(missing: &[String]) -> String {
    format!("missing cases for {}", missing.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KnownType;

    fn string_or_int() -> VariableType {
        VariableType::or(vec![VariableType::string(), VariableType::int()])
    }

    #[test]
    fn test_missing_case() {
        let mut coverage = CaseCoverage::new(&string_or_int());
        coverage.consume(&VariableType::string()).unwrap();
        assert_eq!(coverage.finish(), ExhaustivenessResult::NonExhaustive(vec!["Int".to_string()]));
    }

    #[test]
    fn test_all_cases() {
        let mut coverage = CaseCoverage::new(&string_or_int());
        coverage.consume(&VariableType::int()).unwrap();
        coverage.consume(&VariableType::string()).unwrap();
        assert_eq!(coverage.finish(), ExhaustivenessResult::Exhaustive);
    }

    #[test]
    fn test_other_takes_the_rest() {
        let mut coverage = CaseCoverage::new(&VariableType::or(vec![
            VariableType::string(),
            VariableType::int(),
            VariableType::void(),
        ]));
        coverage.consume(&VariableType::string()).unwrap();
        let rest = coverage.take_remaining();
        assert_eq!(rest, VariableType::or(vec![VariableType::int(), VariableType::void()]));
        assert_eq!(coverage.finish(), ExhaustivenessResult::Exhaustive);
    }

    #[test]
    fn test_other_with_nothing_left() {
        let mut coverage = CaseCoverage::new(&VariableType::int());
        coverage.consume(&VariableType::int()).unwrap();
        let rest = coverage.take_remaining();
        assert!(rest.as_or().map_or(false, |or| or.is_empty()));
    }

    #[test]
    fn test_duplicate_case() {
        let mut coverage = CaseCoverage::new(&string_or_int());
        coverage.consume(&VariableType::string()).unwrap();
        let err = coverage.consume(&VariableType::string()).unwrap_err();
        assert_eq!(err.message(), "duplicate case String");
    }

    #[test]
    fn test_no_matching() {
        let mut coverage = CaseCoverage::new(&string_or_int());
        let err = coverage.consume(&VariableType::boolean()).unwrap_err();
        assert_eq!(err.message(), "no matching for Boolean in Int | String");
    }

    #[test]
    fn test_union_arm_is_atomic() {
        let mut coverage = CaseCoverage::new(&string_or_int());
        let err = coverage
            .consume(&VariableType::or(vec![VariableType::string(), VariableType::boolean()]))
            .unwrap_err();
        assert!(matches!(err, CoverageError::NoMatching { .. }));
        coverage.consume(&VariableType::string()).unwrap();
    }

    #[test]
    fn test_generic_instances_are_distinct() {
        let boxed = |of: VariableType| {
            VariableType::Known(KnownType {
                package: "main".to_string(),
                name: "Box".to_string(),
                declared_generics: vec!["T".to_string()],
                generics: vec![of],
                valid_struct_field: true,
            })
        };
        let over = VariableType::or(vec![boxed(VariableType::int()), boxed(VariableType::string())]);
        let mut coverage = CaseCoverage::new(&over);
        coverage.consume(&boxed(VariableType::string())).unwrap();
        assert_eq!(
            coverage.finish(),
            ExhaustivenessResult::NonExhaustive(vec!["main.Box<Int>".to_string()])
        );
    }

    #[test]
    fn test_missing_message_order_is_canonical() {
        let over = VariableType::or(vec![VariableType::void(), VariableType::string(), VariableType::boolean()]);
        let coverage = CaseCoverage::new(&over);
        match coverage.finish() {
            ExhaustivenessResult::NonExhaustive(missing) => {
                assert_eq!(missing_cases_message(&missing), "missing cases for Boolean, String, Void");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
