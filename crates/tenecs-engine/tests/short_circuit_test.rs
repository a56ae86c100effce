//! Integration tests for short-circuit declarations
//!
//! `name: T ?= expr` and friends rewrite the rest of the block into a
//! `when`; these tests check the rewritten program against the explicit
//! form and the errors reported when the residual cannot leave the block.

use tenecs_engine::syntax::build::*;
use tenecs_engine::syntax::{ExpressionBox, TopLevelDeclaration};
use tenecs_engine::{check_file, CheckError, CheckOutput, CheckerConfig, ErrorKind, SourceFile};

fn check(declarations: Vec<TopLevelDeclaration>) -> Result<CheckOutput, Vec<CheckError>> {
    let mut all = vec![
        structure("Failure", &[], vec![("message", ty("String"))]),
        // divide := (a: Int, b: Int): Int | Failure => { a }
        top(
            "divide",
            lambda(
                vec![("a", Some(ty("Int"))), ("b", Some(ty("Int")))],
                Some(or_ty(vec![ty("Int"), ty("Failure")])),
                vec![var("a")],
            ),
        ),
    ];
    all.extend(declarations);
    check_file(
        SourceFile::new("main.10x", file("main", vec![], all)),
        &CheckerConfig::sequential(),
    )
}

fn function(name: &str, return_type: tenecs_engine::syntax::TypeAnnotation, block: Vec<ExpressionBox>) -> TopLevelDeclaration {
    top(name, lambda(vec![("a", Some(ty("Int")))], Some(return_type), block))
}

fn int_or_failure() -> tenecs_engine::syntax::TypeAnnotation {
    or_ty(vec![ty("Int"), ty("Failure")])
}

fn body_json(output: &CheckOutput, name: &str) -> String {
    serde_json::to_string(&output.program.declaration(name).unwrap().expression).unwrap()
}

#[test]
fn test_success_annotated_matches_explicit_when() {
    let output = check(vec![
        function(
            "sugar",
            int_or_failure(),
            vec![
                short_circuit("x", Some(ty("Int")), None, call("divide", vec![var("a"), var("a")])),
                var("x"),
            ],
        ),
        function(
            "explicit",
            int_or_failure(),
            vec![when(
                call("divide", vec![var("a"), var("a")]),
                vec![is(Some("x"), ty("Int"), vec![var("x")])],
                Some(other(Some("x"), vec![var("x")])),
            )],
        ),
    ])
    .unwrap();
    assert_eq!(body_json(&output, "sugar"), body_json(&output, "explicit"));
}

#[test]
fn test_residual_annotated_matches_explicit_when() {
    let output = check(vec![
        function(
            "sugar",
            int_or_failure(),
            vec![
                short_circuit("x", None, Some(ty("Failure")), call("divide", vec![var("a"), var("a")])),
                var("x"),
            ],
        ),
        function(
            "explicit",
            int_or_failure(),
            vec![when(
                call("divide", vec![var("a"), var("a")]),
                vec![is(Some("x"), ty("Failure"), vec![var("x")])],
                Some(other(Some("x"), vec![var("x")])),
            )],
        ),
    ])
    .unwrap();
    assert_eq!(body_json(&output, "sugar"), body_json(&output, "explicit"));
}

#[test]
fn test_both_annotated() {
    let output = check(vec![function(
        "both",
        int_or_failure(),
        vec![
            short_circuit("x", Some(ty("Int")), Some(ty("Failure")), call("divide", vec![var("a"), var("a")])),
            declare("doubled", var("x")),
            var("doubled"),
        ],
    )]);
    assert!(output.is_ok(), "{:?}", output.err());
}

#[test]
fn test_residual_must_fit_return_type() {
    let errors = check(vec![function(
        "leaky",
        ty("Int"),
        vec![
            short_circuit("x", Some(ty("Int")), None, call("divide", vec![var("a"), var("a")])),
            var("x"),
        ],
    )])
    .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::ShortCircuitOutsideReturnCompatibleFunction);
    assert_eq!(errors[0].message, "expected type Int but found main.Failure");
}

#[test]
fn test_one_side_must_be_annotated() {
    let errors = check(vec![function(
        "bare",
        int_or_failure(),
        vec![
            short_circuit("x", None, None, call("divide", vec![var("a"), var("a")])),
            var("x"),
        ],
    )])
    .unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::ShortCircuitOutsideReturnCompatibleFunction);
    assert_eq!(errors[0].message, "when shortcircuiting one of the types needs to be annotated");
}

#[test]
fn test_not_allowed_at_top_level() {
    let declaration = match short_circuit("x", Some(ty("Int")), None, call("divide", vec![int(1), int(1)])).expression {
        tenecs_engine::syntax::Expression::Declaration(declaration) => declaration,
        other => panic!("unexpected {:?}", other),
    };
    let errors = check(vec![TopLevelDeclaration::Declaration(declaration)]).unwrap_err();
    assert_eq!(errors[0].kind, ErrorKind::ShortCircuitOutsideReturnCompatibleFunction);
    assert_eq!(errors[0].message, "shortcircuit only allowed inside of functions");
}

#[test]
fn test_underscore_binding() {
    let output = check(vec![function(
        "ignored",
        int_or_failure(),
        vec![
            short_circuit("_", Some(ty("Int")), None, call("divide", vec![var("a"), var("a")])),
            var("a"),
        ],
    )]);
    assert!(output.is_ok(), "{:?}", output.err());
}

#[test]
fn test_chained_short_circuits() {
    let output = check(vec![function(
        "chained",
        int_or_failure(),
        vec![
            short_circuit("x", Some(ty("Int")), None, call("divide", vec![var("a"), var("a")])),
            short_circuit("y", Some(ty("Int")), None, call("divide", vec![var("x"), var("a")])),
            var("y"),
        ],
    )]);
    assert!(output.is_ok(), "{:?}", output.err());
}
