//! Discovery of tests and entry points in a checked program
//!
//! Selection is purely by declared type, so backends can run or package a
//! program without re-walking it.

use crate::program::Program;
use crate::types::{Ref, VariableType};
use serde::Serialize;

const TEST_PACKAGE: &str = "tenecs.test";

/// Declarations that are tests, sorted by `(package, name)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FoundTests {
    pub unit_tests: Vec<Ref>,
    pub unit_test_suites: Vec<Ref>,
    pub go_integration_tests: Vec<Ref>,
}

impl FoundTests {
    pub fn is_empty(&self) -> bool {
        self.unit_tests.is_empty() && self.unit_test_suites.is_empty() && self.go_integration_tests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.unit_tests.len() + self.unit_test_suites.len() + self.go_integration_tests.len()
    }
}

/// Declarations a backend can run directly
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Runnables {
    pub go_main: Vec<Ref>,
    pub web_web_app: Vec<Ref>,
}

pub fn find_tests(program: &Program) -> FoundTests {
    FoundTests {
        unit_tests: declarations_of(program, TEST_PACKAGE, "UnitTest"),
        unit_test_suites: declarations_of(program, TEST_PACKAGE, "UnitTestSuite"),
        go_integration_tests: declarations_of(program, TEST_PACKAGE, "GoIntegrationTest"),
    }
}

pub fn find_runnables(program: &Program) -> Runnables {
    Runnables {
        go_main: declarations_of(program, "tenecs.go", "Main"),
        web_web_app: declarations_of(program, "tenecs.web", "WebApp"),
    }
}

fn declarations_of(program: &Program, package: &str, name: &str) -> Vec<Ref> {
    let mut found: Vec<Ref> = program
        .declarations
        .iter()
        .filter(|d| matches!(d.variable_type(), VariableType::Known(known) if known.is(package, name)))
        .map(|d| Ref::new(program.package.clone(), d.name.clone()))
        .collect();
    found.sort();
    found
}
