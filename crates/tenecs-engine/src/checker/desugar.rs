//! Syntactic rewrites applied before type checking
//!
//! Two forms are removed here:
//!
//! - Short-circuit declarations. `x: T ? R = value` ends the enclosing block
//!   early when `value` is an `R`. It becomes a `when` over `value` whose
//!   success arm holds the rest of the block and whose residual arm yields
//!   the residual value.
//! - Arrow invocations. `a->f(b)` becomes `f(a, b)`.
//!
//! Blocks are rewritten from the last statement to the first, so a second
//! short-circuit ends up nested inside the continuation of the first.

use super::error::CheckError;
use crate::syntax::{
    AccessOrInvocation, ArgumentsList, Block, CaseOrigin, Declaration, ElseIf, Expression, ExpressionBox,
    FileTopLevel, If, Lambda, List, Name, NamedArgument, ReferenceOrInvocation, Span, TopLevelDeclaration,
    TypeAnnotation, When, WhenIs, WhenOther,
};
use tracing::trace;

/// Name given to a short-circuit binding spelled `_`
pub const UNUSED_BINDING: &str = "_unused_";

/// Desugar every declaration of a file
pub fn desugar_file(file: &str, top_level: FileTopLevel) -> Result<FileTopLevel, CheckError> {
    let desugarer = Desugarer::new(file);
    let mut declarations = Vec::with_capacity(top_level.declarations.len());
    for declaration in top_level.declarations {
        declarations.push(desugarer.top_level(declaration)?);
    }
    Ok(FileTopLevel {
        declarations,
        ..top_level
    })
}

pub struct Desugarer<'a> {
    file: &'a str,
}

impl<'a> Desugarer<'a> {
    pub fn new(file: &'a str) -> Self {
        Self { file }
    }

    pub fn top_level(&self, declaration: TopLevelDeclaration) -> Result<TopLevelDeclaration, CheckError> {
        match declaration {
            TopLevelDeclaration::Declaration(declaration) => {
                self.top_level_declaration(declaration).map(TopLevelDeclaration::Declaration)
            }
            other => Ok(other),
        }
    }

    /// Desugar a package-level binding, where short-circuits are not allowed
    pub fn top_level_declaration(&self, declaration: Declaration) -> Result<Declaration, CheckError> {
        if let Some(short_circuit) = &declaration.short_circuit {
            return Err(CheckError::short_circuit(
                self.file,
                short_circuit.span.merge(&declaration.name.span),
                "shortcircuit only allowed inside of functions",
            ));
        }
        self.declaration(declaration)
    }

    fn declaration(&self, declaration: Declaration) -> Result<Declaration, CheckError> {
        let value = self.expression_box(*declaration.value)?;
        Ok(Declaration {
            value: Box::new(value),
            ..declaration
        })
    }

    /// Rewrite a block, nesting continuations under short-circuits
    pub fn block(&self, block: Block) -> Result<Block, CheckError> {
        // statements after the current one, in reverse order
        let mut rest: Vec<ExpressionBox> = Vec::with_capacity(block.len());
        for statement in block.into_iter().rev() {
            let statement = self.expression_box(statement)?;
            match statement.expression {
                Expression::Declaration(declaration) if declaration.short_circuit.is_some() => {
                    let continuation: Block = rest.drain(..).rev().collect();
                    rest.push(self.short_circuit(declaration, continuation)?);
                }
                expression => rest.push(ExpressionBox { expression, ..statement }),
            }
        }
        rest.reverse();
        Ok(rest)
    }

    fn short_circuit(&self, declaration: Declaration, continuation: Block) -> Result<ExpressionBox, CheckError> {
        let span = declaration.span;
        let name = if declaration.name.text == "_" {
            Name::new(UNUSED_BINDING, declaration.name.span)
        } else {
            declaration.name
        };
        let residual = declaration.short_circuit.and_then(|s| s.annotation);
        let residual_block = vec![reference(&name)];

        let (is, other) = match (declaration.annotation, residual) {
            (None, None) => {
                return Err(CheckError::short_circuit(
                    self.file,
                    span,
                    "when shortcircuiting one of the types needs to be annotated",
                ))
            }
            (Some(success), Some(residual)) => (
                vec![
                    arm(&name, residual, residual_block, span, CaseOrigin::ShortCircuitResidual),
                    arm(&name, success, continuation, span, CaseOrigin::Source),
                ],
                None,
            ),
            (None, Some(residual)) => (
                vec![arm(&name, residual, residual_block, span, CaseOrigin::ShortCircuitResidual)],
                Some(otherwise(&name, continuation, span, CaseOrigin::Source)),
            ),
            (Some(success), None) => (
                vec![arm(&name, success, continuation, span, CaseOrigin::Source)],
                Some(otherwise(&name, residual_block, span, CaseOrigin::ShortCircuitResidual)),
            ),
        };

        trace!(file = self.file, name = %name.text, "desugared short-circuit");
        Ok(ExpressionBox {
            expression: Expression::When(When {
                over: declaration.value,
                is,
                other,
                span,
            }),
            chain: Vec::new(),
            span,
        })
    }

    /// Rewrite nested blocks and arrow links of one expression
    pub fn expression_box(&self, expression_box: ExpressionBox) -> Result<ExpressionBox, CheckError> {
        let ExpressionBox { expression, chain, span } = expression_box;
        let mut current = ExpressionBox {
            expression: self.expression(expression)?,
            chain: Vec::with_capacity(chain.len()),
            span,
        };
        for link in chain {
            let link = self.link(link)?;
            match link.access {
                Some(access) if access.arrow => {
                    let arguments = link.arguments.ok_or_else(|| {
                        CheckError::type_mismatch(
                            self.file,
                            link.span,
                            "Arrow syntax requires parenthesis on the right-hand side",
                        )
                    })?;
                    let receiver = NamedArgument {
                        name: None,
                        span: current.span,
                        argument: current,
                    };
                    let mut all = Vec::with_capacity(arguments.arguments.len() + 1);
                    all.push(receiver);
                    all.extend(arguments.arguments);
                    let call_span = span.merge(&link.span);
                    current = ExpressionBox::new(Expression::ReferenceOrInvocation(ReferenceOrInvocation {
                        var: access.name,
                        arguments: Some(ArgumentsList {
                            generics: arguments.generics,
                            arguments: all,
                            span: arguments.span,
                        }),
                        span: call_span,
                    }));
                }
                access => current.chain.push(AccessOrInvocation { access, ..link }),
            }
        }
        Ok(current)
    }

    fn link(&self, link: AccessOrInvocation) -> Result<AccessOrInvocation, CheckError> {
        Ok(AccessOrInvocation {
            arguments: link.arguments.map(|a| self.arguments(a)).transpose()?,
            ..link
        })
    }

    fn arguments(&self, list: ArgumentsList) -> Result<ArgumentsList, CheckError> {
        let mut arguments = Vec::with_capacity(list.arguments.len());
        for argument in list.arguments {
            arguments.push(NamedArgument {
                argument: self.expression_box(argument.argument)?,
                ..argument
            });
        }
        Ok(ArgumentsList { arguments, ..list })
    }

    fn expression(&self, expression: Expression) -> Result<Expression, CheckError> {
        Ok(match expression {
            Expression::Literal(_) => expression,
            Expression::ReferenceOrInvocation(reference) => Expression::ReferenceOrInvocation(ReferenceOrInvocation {
                arguments: reference.arguments.map(|a| self.arguments(a)).transpose()?,
                ..reference
            }),
            Expression::Lambda(lambda) => Expression::Lambda(Lambda {
                block: self.block(lambda.block)?,
                ..lambda
            }),
            Expression::Declaration(declaration) => Expression::Declaration(self.declaration(declaration)?),
            Expression::If(conditional) => {
                let mut else_ifs = Vec::with_capacity(conditional.else_ifs.len());
                for else_if in conditional.else_ifs {
                    else_ifs.push(ElseIf {
                        condition: self.expression_box(else_if.condition)?,
                        then_block: self.block(else_if.then_block)?,
                        span: else_if.span,
                    });
                }
                Expression::If(If {
                    condition: Box::new(self.expression_box(*conditional.condition)?),
                    then_block: self.block(conditional.then_block)?,
                    else_ifs,
                    else_block: self.block(conditional.else_block)?,
                    span: conditional.span,
                })
            }
            Expression::List(list) => {
                let mut expressions = Vec::with_capacity(list.expressions.len());
                for expression in list.expressions {
                    expressions.push(self.expression_box(expression)?);
                }
                Expression::List(List { expressions, ..list })
            }
            Expression::When(when) => {
                let mut is = Vec::with_capacity(when.is.len());
                for case in when.is {
                    is.push(WhenIs {
                        then_block: self.block(case.then_block)?,
                        ..case
                    });
                }
                let other = match when.other {
                    Some(other) => Some(WhenOther {
                        then_block: self.block(other.then_block)?,
                        ..other
                    }),
                    None => None,
                };
                Expression::When(When {
                    over: Box::new(self.expression_box(*when.over)?),
                    is,
                    other,
                    span: when.span,
                })
            }
        })
    }
}

fn reference(name: &Name) -> ExpressionBox {
    ExpressionBox::new(Expression::ReferenceOrInvocation(ReferenceOrInvocation {
        var: name.clone(),
        arguments: None,
        span: name.span,
    }))
}

fn arm(
    name: &Name,
    annotation: TypeAnnotation,
    then_block: Block,
    span: Span,
    origin: CaseOrigin,
) -> WhenIs {
    WhenIs {
        name: Some(name.clone()),
        annotation,
        then_block,
        span,
        origin,
    }
}

fn otherwise(name: &Name, then_block: Block, span: Span, origin: CaseOrigin) -> WhenOther {
    WhenOther {
        name: Some(name.clone()),
        then_block,
        span,
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::error::ErrorKind;
    use crate::syntax::build::*;

    fn desugar_block(block: Block) -> Result<Block, CheckError> {
        Desugarer::new("main.10x").block(block)
    }

    fn as_when(expression: &ExpressionBox) -> &When {
        match &expression.expression {
            Expression::When(when) => when,
            other => panic!("expected when, got {:?}", other),
        }
    }

    #[test]
    fn test_both_annotated() {
        let block = desugar_block(vec![
            short_circuit("x", Some(ty("String")), Some(ty("Error")), call("risky", vec![])),
            var("x"),
        ])
        .unwrap();
        assert_eq!(block.len(), 1);
        let when = as_when(&block[0]);
        assert_eq!(when.is.len(), 2);
        assert!(when.other.is_none());
        assert_eq!(when.is[0].origin, CaseOrigin::ShortCircuitResidual);
        assert_eq!(when.is[0].then_block, vec![var("x")]);
        assert_eq!(when.is[1].origin, CaseOrigin::Source);
        assert_eq!(when.is[1].then_block, vec![var("x")]);
    }

    #[test]
    fn test_residual_only_continues_in_other() {
        let block = desugar_block(vec![
            int(1),
            short_circuit("x", None, Some(ty("Error")), call("risky", vec![])),
            call("use", vec![var("x")]),
            int(2),
        ])
        .unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(block[0], int(1));
        let when = as_when(&block[1]);
        assert_eq!(when.is.len(), 1);
        let other = when.other.as_ref().unwrap();
        assert_eq!(other.origin, CaseOrigin::Source);
        assert_eq!(other.then_block, vec![call("use", vec![var("x")]), int(2)]);
    }

    #[test]
    fn test_success_only_returns_in_other() {
        let block = desugar_block(vec![
            short_circuit("x", Some(ty("String")), None, call("risky", vec![])),
            var("x"),
        ])
        .unwrap();
        let when = as_when(&block[0]);
        assert_eq!(when.is[0].then_block, vec![var("x")]);
        assert_eq!(when.other.as_ref().unwrap().origin, CaseOrigin::ShortCircuitResidual);
    }

    #[test]
    fn test_twice_nests() {
        let block = desugar_block(vec![
            short_circuit("a", None, Some(ty("Error")), call("first", vec![])),
            short_circuit("b", None, Some(ty("Error")), call("second", vec![])),
            var("b"),
        ])
        .unwrap();
        let outer = as_when(&block[0]);
        let continuation = &outer.other.as_ref().unwrap().then_block;
        assert_eq!(continuation.len(), 1);
        let inner = as_when(&continuation[0]);
        assert_eq!(inner.other.as_ref().unwrap().then_block, vec![var("b")]);
    }

    #[test]
    fn test_neither_annotated() {
        let err = desugar_block(vec![short_circuit("x", None, None, call("risky", vec![]))]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ShortCircuitOutsideReturnCompatibleFunction);
        assert_eq!(err.message, "when shortcircuiting one of the types needs to be annotated");
    }

    #[test]
    fn test_underscore_renamed() {
        let block = desugar_block(vec![
            short_circuit("_", None, Some(ty("Error")), call("risky", vec![])),
            int(1),
        ])
        .unwrap();
        let when = as_when(&block[0]);
        assert_eq!(when.is[0].name.as_ref().map(|n| n.text.as_str()), Some(UNUSED_BINDING));
    }

    #[test]
    fn test_top_level_rejected() {
        let file = file(
            "main",
            vec![],
            vec![TopLevelDeclaration::Declaration(Declaration {
                name: name("x"),
                annotation: None,
                short_circuit: Some(crate::syntax::ShortCircuit {
                    annotation: Some(ty("Error")),
                    span: Span::default(),
                }),
                value: Box::new(call("risky", vec![])),
                span: Span::default(),
            })],
        );
        let err = desugar_file("main.10x", file).unwrap_err();
        assert_eq!(err.message, "shortcircuit only allowed inside of functions");
    }

    #[test]
    fn test_arrow_becomes_call() {
        let desugarer = Desugarer::new("main.10x");
        let rewritten = desugarer
            .expression_box(arrow(var("a"), "f", vec![var("b")]))
            .unwrap();
        assert_eq!(rewritten, call("f", vec![var("a"), var("b")]));
    }

    #[test]
    fn test_arrow_requires_parenthesis() {
        let mut expression = var("a");
        expression.chain.push(AccessOrInvocation {
            access: Some(crate::syntax::DotOrArrowName {
                name: name("f"),
                arrow: true,
            }),
            arguments: None,
            span: Span::default(),
        });
        let err = Desugarer::new("main.10x").expression_box(expression).unwrap_err();
        assert_eq!(err.message, "Arrow syntax requires parenthesis on the right-hand side");
    }

    #[test]
    fn test_desugars_inside_lambda() {
        let body = vec![
            short_circuit("x", None, Some(ty("Error")), call("risky", vec![])),
            var("x"),
        ];
        let desugarer = Desugarer::new("main.10x");
        let rewritten = desugarer.expression_box(lambda(vec![], None, body)).unwrap();
        match rewritten.expression {
            Expression::Lambda(lambda) => {
                assert_eq!(lambda.block.len(), 1);
                as_when(&lambda.block[0]);
            }
            other => panic!("expected lambda, got {:?}", other),
        }
    }
}
