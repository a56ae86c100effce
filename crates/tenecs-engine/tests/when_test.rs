//! Integration tests for `when` checking
//!
//! Covers:
//! - Exhaustive and non-exhaustive matches over unions
//! - Duplicate and unreachable arms
//! - `other` arms, including one with nothing left to match
//! - Canonical case order regardless of source order

use tenecs_engine::program::Expression;
use tenecs_engine::syntax::build::*;
use tenecs_engine::syntax::{TopLevelDeclaration, WhenIs};
use tenecs_engine::{check_file, CheckError, CheckOutput, CheckerConfig, ErrorKind, SourceFile, VariableType};

fn check(declarations: Vec<TopLevelDeclaration>) -> Result<CheckOutput, Vec<CheckError>> {
    check_file(
        SourceFile::new("main.10x", file("main", vec![], declarations)),
        &CheckerConfig::sequential(),
    )
}

fn string_or_int() -> tenecs_engine::syntax::TypeAnnotation {
    or_ty(vec![ty("String"), ty("Int")])
}

/// `usage := (value: String | Int): String => { when value { ... } }`
fn usage(arms: Vec<WhenIs>, fallback: Option<tenecs_engine::syntax::WhenOther>) -> TopLevelDeclaration {
    top(
        "usage",
        lambda(
            vec![("value", Some(string_or_int()))],
            Some(ty("String")),
            vec![when(var("value"), arms, fallback)],
        ),
    )
}

fn string_arm() -> WhenIs {
    is(Some("s"), ty("String"), vec![var("s")])
}

fn int_arm() -> WhenIs {
    is(Some("i"), ty("Int"), vec![string("int")])
}

#[test]
fn test_exhaustive_when() {
    let output = check(vec![usage(vec![string_arm(), int_arm()], None)]).unwrap();
    let declaration = output.program.declaration("usage").unwrap();
    assert_eq!(
        declaration.variable_type().to_string(),
        "(Int | String) ~> String"
    );
}

#[test]
fn test_missing_case_is_reported() {
    let errors = check(vec![usage(vec![string_arm()], None)]).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::NonExhaustiveMatch);
    assert_eq!(errors[0].message, "missing cases for Int");
}

#[test]
fn test_duplicate_case() {
    let errors = check(vec![usage(vec![string_arm(), string_arm(), int_arm()], None)]).unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::DuplicateOrUnreachableCase);
    assert_eq!(errors[0].message, "duplicate case String");
}

#[test]
fn test_case_outside_union() {
    let errors = check(vec![usage(
        vec![string_arm(), int_arm(), is(None, ty("Boolean"), vec![string("b")])],
        None,
    )])
    .unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::DuplicateOrUnreachableCase);
    assert_eq!(errors[0].message, "no matching for Boolean in Int | String");
}

#[test]
fn test_other_binds_the_rest() {
    let output = check(vec![usage(
        vec![string_arm()],
        Some(other(Some("rest"), vec![declare_annotated("n", ty("Int"), var("rest")), string("int")])),
    )])
    .unwrap();
    match &output.program.declaration("usage").unwrap().expression {
        Expression::Function(function) => match &function.block[0] {
            Expression::When { cases, other_case, other_case_name, .. } => {
                assert_eq!(cases.len(), 1);
                assert!(other_case.is_some());
                assert_eq!(other_case_name.as_deref(), Some("rest"));
            }
            other => panic!("expected when, got {:?}", other),
        },
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn test_other_with_nothing_left_is_accepted() {
    let output = check(vec![usage(vec![string_arm(), int_arm()], Some(other(None, vec![string("never")])))]);
    assert!(output.is_ok(), "{:?}", output.err());
}

#[test]
fn test_arm_body_must_fit_expected_type() {
    let errors = check(vec![usage(vec![string_arm(), is(Some("i"), ty("Int"), vec![var("i")])], None)]).unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::TypeMismatch);
    assert_eq!(errors[0].message, "expected type String but found Int");
}

#[test]
fn test_when_without_expectation_is_union_of_arms() {
    let output = check(vec![top_annotated(
        "describe",
        fn_ty(&[], vec![string_or_int()], or_ty(vec![ty("String"), ty("Boolean")])),
        lambda(
            vec![("value", None)],
            None,
            vec![
                declare(
                    "result",
                    when(
                        var("value"),
                        vec![
                            is(None, ty("String"), vec![string("s")]),
                            is(None, ty("Int"), vec![boolean(true)]),
                        ],
                        None,
                    ),
                ),
                var("result"),
            ],
        ),
    )])
    .unwrap();
    assert!(output.program.declaration("describe").is_some());
}

#[test]
fn test_case_order_is_canonical() {
    let forward = check(vec![usage(vec![string_arm(), int_arm()], None)]).unwrap();
    let backward = check(vec![usage(vec![int_arm(), string_arm()], None)]).unwrap();

    let cases = |output: &CheckOutput| -> Vec<VariableType> {
        match &output.program.declaration("usage").unwrap().expression {
            Expression::Function(function) => match &function.block[0] {
                Expression::When { cases, .. } => cases.iter().map(|c| c.variable_type.clone()).collect(),
                _ => vec![],
            },
            _ => vec![],
        }
    };
    assert_eq!(cases(&forward), vec![VariableType::int(), VariableType::string()]);
    assert_eq!(
        serde_json::to_string(&forward.program).unwrap(),
        serde_json::to_string(&backward.program).unwrap()
    );
}

#[test]
fn test_missing_cases_order_is_canonical() {
    let declaration = |arms| {
        top(
            "f",
            lambda(
                vec![("v", Some(or_ty(vec![ty("Void"), ty("String"), ty("Boolean"), ty("Int")])))],
                Some(ty("String")),
                vec![when(var("v"), arms, None)],
            ),
        )
    };
    let errors = check(vec![declaration(vec![int_arm()])]).unwrap_err();
    assert_eq!(errors[0].message, "missing cases for Boolean, String, Void");
}

#[test]
fn test_string_or_int_scenario() {
    let program = |arms: Vec<WhenIs>| {
        check_file(
            SourceFile::new(
                "main.10x",
                file(
                    "main",
                    vec![import("tenecs.string.join")],
                    vec![
                        top("stringOrInt", lambda(vec![], Some(string_or_int()), vec![int(3)])),
                        top(
                            "usage",
                            lambda(
                                vec![],
                                Some(string_or_int()),
                                vec![when(call("stringOrInt", vec![]), arms, None)],
                            ),
                        ),
                    ],
                ),
            ),
            &CheckerConfig::sequential(),
        )
    };
    let string_case = || is(Some("str"), ty("String"), vec![call("join", vec![var("str"), string("!")])]);

    let output = program(vec![is(Some("str"), ty("Int"), vec![var("str")]), string_case()]).unwrap();
    assert_eq!(
        output.program.declaration("usage").unwrap().variable_type().to_string(),
        "() ~> Int | String"
    );

    let errors = program(vec![string_case()]).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::NonExhaustiveMatch);
    assert_eq!(errors[0].message, "missing cases for Int");
}
