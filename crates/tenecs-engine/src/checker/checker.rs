//! Type checker - bidirectional checking of expressions
//!
//! Every expression is checked against an optional expected type. With an
//! expectation the checker pushes it down into blocks, lambdas and list
//! elements and verifies assignability at the end. Without one it infers
//! the type bottom up.
//!
//! The result is the typed tree from [`crate::program`].

use super::annotation::{resolve_annotation, AnnotationResolver};
use super::error::{CheckError, ErrorKind};
use super::exhaustiveness::{missing_cases_message, CaseCoverage, CoverageError, ExhaustivenessResult};
use super::symbols::{LookupError, Scope};
use crate::program::{self, Expression, FunctionExpression, WhenCase};
use crate::syntax::{self as ast, Block, CaseOrigin, ExpressionBox, Literal, Name, Span};
use crate::types::{
    contained_in, is_assignable, resolve_generics, DiscriminatorSynthesizer, Function, FunctionArgument,
    Substitution, VariableType,
};

/// Expected shape of a lambda, with generics already renamed to the
/// lambda's own
pub(crate) struct LambdaShape {
    pub arguments: Vec<VariableType>,
    /// `None` infers the return type from the body
    pub return_type: Option<VariableType>,
}

/// Type checker for the declarations of one file
pub struct TypeChecker<'a> {
    pub(crate) scope: Scope<'a>,

    /// Set when a reference hit a package-level name still being inferred
    touched_pending: bool,
}

impl<'a> TypeChecker<'a> {
    pub fn new(scope: Scope<'a>) -> Self {
        TypeChecker {
            scope,
            touched_pending: false,
        }
    }

    pub(crate) fn file(&self) -> &'a str {
        self.scope.file()
    }

    /// Whether the last check failed only because of a pending name
    pub fn touched_pending(&self) -> bool {
        self.touched_pending
    }

    /// Type of a top-level declaration, from its annotation or its value
    pub fn infer_top_level(&mut self, declaration: &ast::Declaration) -> Result<VariableType, CheckError> {
        self.touched_pending = false;
        if let Some(annotation) = &declaration.annotation {
            return resolve_annotation(&self.scope, annotation);
        }
        match &declaration.value.expression {
            ast::Expression::Lambda(lambda) if declaration.value.chain.is_empty() => {
                match self.lambda_signature(lambda)? {
                    Some(function) => Ok(VariableType::Function(function)),
                    None => Ok(self.check_box(&declaration.value, None)?.variable_type()),
                }
            }
            _ => Ok(self.check_box(&declaration.value, None)?.variable_type()),
        }
    }

    /// Type of a fully annotated lambda, without looking at its body
    ///
    /// Lets top-level functions refer to themselves and to each other.
    fn lambda_signature(&mut self, lambda: &ast::Lambda) -> Result<Option<Function>, CheckError> {
        let return_annotation = match &lambda.return_type {
            Some(annotation) if lambda.parameters.iter().all(|p| p.annotation.is_some()) => annotation,
            _ => return Ok(None),
        };
        let generics: Vec<String> = lambda.generics.iter().map(|g| g.text.clone()).collect();
        let mut resolver = AnnotationResolver::new(&self.scope).with_generics(generics.clone());
        let mut arguments = Vec::with_capacity(lambda.parameters.len());
        for parameter in &lambda.parameters {
            if let Some(annotation) = &parameter.annotation {
                arguments.push(FunctionArgument {
                    name: parameter.name.text.clone(),
                    variable_type: resolver.resolve(annotation)?,
                });
            }
        }
        let return_type = resolver.resolve(return_annotation)?;
        Ok(Some(Function::new(generics, arguments, return_type)))
    }

    /// Check a top-level declaration against its bound type
    pub fn check_top_level(
        &mut self,
        declaration: &ast::Declaration,
        variable_type: &VariableType,
    ) -> Result<program::Declaration, CheckError> {
        let expression = self.check_box(&declaration.value, Some(variable_type))?;
        Ok(program::Declaration {
            name: declaration.name.text.clone(),
            expression,
        })
    }

    /// Run `f` inside a fresh frame
    pub(crate) fn scoped<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CheckError>,
    ) -> Result<T, CheckError> {
        self.scope.push_frame();
        let result = f(self);
        self.scope.pop_frame();
        result
    }

    pub(crate) fn check_assignable(
        &self,
        actual: &VariableType,
        expected: &VariableType,
        span: Span,
    ) -> Result<(), CheckError> {
        if is_assignable(actual, expected) {
            Ok(())
        } else {
            Err(CheckError::type_mismatch(
                self.file(),
                span,
                format!("expected type {} but found {}", expected, actual),
            ))
        }
    }

    fn define(&mut self, name: &Name, variable_type: VariableType) -> Result<(), CheckError> {
        let file = self.file();
        self.scope
            .define_value(&name.text, variable_type)
            .map_err(|e| CheckError::duplicate_variable(file, name.span, &e.name))
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Check an expression and its access/invocation chain
    pub(crate) fn check_box(
        &mut self,
        expression_box: &ExpressionBox,
        expected: Option<&VariableType>,
    ) -> Result<Expression, CheckError> {
        let expression = if expression_box.chain.is_empty() {
            self.check_expr(&expression_box.expression, expected)?
        } else {
            let mut current = self.check_expr(&expression_box.expression, None)?;
            let last = expression_box.chain.len() - 1;
            for (i, link) in expression_box.chain.iter().enumerate() {
                if let Some(access) = &link.access {
                    current = self.check_member(current, &access.name)?;
                }
                if let Some(arguments) = &link.arguments {
                    let expected = if i == last { expected } else { None };
                    current = self.check_call(current, arguments, expected, link.span)?;
                }
            }
            current
        };
        if let Some(expected) = expected {
            self.check_assignable(&expression.variable_type(), expected, expression_box.span)?;
        }
        Ok(expression)
    }

    fn check_expr(
        &mut self,
        expression: &ast::Expression,
        expected: Option<&VariableType>,
    ) -> Result<Expression, CheckError> {
        match expression {
            ast::Expression::Literal(literal) => Ok(check_literal(&literal.literal)),
            ast::Expression::ReferenceOrInvocation(reference) => {
                let over = self.check_identifier(&reference.var)?;
                match &reference.arguments {
                    Some(arguments) => self.check_call(over, arguments, expected, reference.span),
                    None => Ok(over),
                }
            }
            ast::Expression::Lambda(lambda) => {
                let shape = match expected {
                    Some(expected) => Some(self.expected_shape(lambda, expected)?),
                    None => None,
                };
                self.check_lambda(lambda, shape).map(Expression::Function)
            }
            ast::Expression::Declaration(declaration) => self.check_var_decl(declaration),
            ast::Expression::If(conditional) => self.check_if(
                &conditional.condition,
                &conditional.then_block,
                &conditional.else_ifs,
                &conditional.else_block,
                expected,
                conditional.span,
            ),
            ast::Expression::List(list) => self.check_list(list, expected),
            ast::Expression::When(when) => self.check_when(when, expected),
        }
    }

    fn check_identifier(&mut self, name: &Name) -> Result<Expression, CheckError> {
        match self.scope.resolve_value(&name.text) {
            Ok(resolved) => Ok(Expression::Reference {
                variable_type: resolved.variable_type,
                package: resolved.package,
                name: resolved.name,
            }),
            Err(LookupError::NotFound) => Err(CheckError::unresolved(
                self.file(),
                name.span,
                format!("Not found in scope: {}", name.text),
            )),
            Err(LookupError::Pending) => {
                self.touched_pending = true;
                Err(CheckError::unresolved(
                    self.file(),
                    name.span,
                    format!("Could not determine the type of '{}', please annotate it", name.text),
                ))
            }
        }
    }

    /// Check a block; the last statement gets the expectation
    pub(crate) fn check_block(
        &mut self,
        block: &Block,
        expected: Option<&VariableType>,
        span: Span,
    ) -> Result<Vec<Expression>, CheckError> {
        if block.is_empty() {
            if let Some(expected) = expected {
                self.check_assignable(&VariableType::void(), expected, span)?;
            }
            return Ok(Vec::new());
        }
        let last = block.len() - 1;
        let mut checked = Vec::with_capacity(block.len());
        for (i, statement) in block.iter().enumerate() {
            let expected = if i == last { expected } else { None };
            checked.push(self.check_box(statement, expected)?);
        }
        Ok(checked)
    }

    fn check_var_decl(&mut self, declaration: &ast::Declaration) -> Result<Expression, CheckError> {
        let name = &declaration.name;
        if name.text == "true" || name.text == "false" {
            return Err(CheckError::type_mismatch(
                self.file(),
                name.span,
                format!("Variable can't be named '{}'", name.text),
            ));
        }
        let expression = match &declaration.annotation {
            Some(annotation) => {
                let variable_type = resolve_annotation(&self.scope, annotation)?;
                // bound first so the value may refer to itself
                self.define(name, variable_type.clone())?;
                self.check_box(&declaration.value, Some(&variable_type))?
            }
            None => {
                let expression = self.check_box(&declaration.value, None)?;
                self.define(name, expression.variable_type())?;
                expression
            }
        };
        Ok(Expression::Declaration {
            name: name.text.clone(),
            expression: Box::new(expression),
        })
    }

    // ------------------------------------------------------------------------
    // Lambdas
    // ------------------------------------------------------------------------

    /// Shape a lambda must take to fit `expected`
    fn expected_shape(&self, lambda: &ast::Lambda, expected: &VariableType) -> Result<LambdaShape, CheckError> {
        let functions: Vec<&Function> = expected
            .as_or()
            .map(|or| or.elements().iter().filter_map(|e| e.as_function()).collect())
            .unwrap_or_else(|| expected.as_function().into_iter().collect());
        let function = match functions.as_slice() {
            [only] => *only,
            _ => {
                return Err(CheckError::type_mismatch(
                    self.file(),
                    lambda.span,
                    format!("Expected {} but got a function", expected),
                ))
            }
        };
        if function.generics.len() != lambda.generics.len() {
            return Err(CheckError::type_mismatch(
                self.file(),
                lambda.span,
                format!(
                    "expected {} generics but got {}",
                    function.generics.len(),
                    lambda.generics.len()
                ),
            ));
        }
        let renames: Substitution = function
            .generics
            .iter()
            .cloned()
            .zip(lambda.generics.iter().map(|g| VariableType::type_argument(&g.text)))
            .collect();
        Ok(LambdaShape {
            arguments: function
                .argument_types()
                .map(|a| resolve_generics(a, &renames))
                .collect(),
            return_type: Some(resolve_generics(&function.return_type, &renames)),
        })
    }

    /// Check a lambda, against a shape when one is known
    pub(crate) fn check_lambda(
        &mut self,
        lambda: &ast::Lambda,
        shape: Option<LambdaShape>,
    ) -> Result<FunctionExpression, CheckError> {
        if lambda.block.is_empty() {
            return Err(CheckError::type_mismatch(
                self.file(),
                lambda.span,
                "empty function block not allowed (maybe you want to return null?)",
            ));
        }
        let file = self.file();
        self.scoped(|this| {
            for generic in &lambda.generics {
                this.scope
                    .define_generic(&generic.text)
                    .map_err(|e| CheckError::duplicate_variable(file, generic.span, &e.name))?;
            }

            if let Some(shape) = &shape {
                if shape.arguments.len() != lambda.parameters.len() {
                    return Err(CheckError::type_mismatch(
                        file,
                        lambda.span,
                        format!(
                            "expected {} params but got {}",
                            shape.arguments.len(),
                            lambda.parameters.len()
                        ),
                    ));
                }
            }

            let mut arguments = Vec::with_capacity(lambda.parameters.len());
            for (i, parameter) in lambda.parameters.iter().enumerate() {
                let annotated = match &parameter.annotation {
                    Some(annotation) => Some(AnnotationResolver::new(&this.scope).resolve(annotation)?),
                    None => None,
                };
                let expected = shape.as_ref().and_then(|s| s.arguments.get(i));
                let variable_type = match (annotated, expected) {
                    (Some(annotated), Some(expected)) => {
                        if &annotated != expected {
                            return Err(CheckError::type_mismatch(
                                file,
                                parameter.name.span,
                                format!(
                                    "in parameter position {} expected type {} but you have annotated {}",
                                    i, expected, annotated
                                ),
                            ));
                        }
                        annotated
                    }
                    (Some(annotated), None) => annotated,
                    (None, Some(expected)) => expected.clone(),
                    (None, None) => {
                        return Err(CheckError::type_mismatch(
                            file,
                            parameter.name.span,
                            format!("Type annotation required for {}", parameter.name.text),
                        ))
                    }
                };
                arguments.push(FunctionArgument {
                    name: parameter.name.text.clone(),
                    variable_type,
                });
            }

            let annotated_return = match &lambda.return_type {
                Some(annotation) => Some(resolve_annotation(&this.scope, annotation)?),
                None => None,
            };
            let return_type = match (annotated_return, shape) {
                (Some(annotated), Some(LambdaShape { return_type: Some(expected), .. })) => {
                    if annotated != expected {
                        return Err(CheckError::type_mismatch(
                            file,
                            lambda.span,
                            format!(
                                "in return type expected type {} but you have annotated {}",
                                expected, annotated
                            ),
                        ));
                    }
                    Some(annotated)
                }
                (Some(annotated), _) => Some(annotated),
                (None, Some(shape)) => shape.return_type,
                (None, None) => {
                    return Err(CheckError::type_mismatch(file, lambda.span, "Return type annotation required"))
                }
            };

            for (parameter, argument) in lambda.parameters.iter().zip(&arguments) {
                this.define(&parameter.name, argument.variable_type.clone())?;
            }
            let block = this.check_block(&lambda.block, return_type.as_ref(), lambda.span)?;
            let return_type = return_type.unwrap_or_else(|| block_type(&block));

            Ok(FunctionExpression {
                variable_type: Function::new(
                    lambda.generics.iter().map(|g| g.text.clone()).collect(),
                    arguments,
                    return_type,
                ),
                parameters: lambda.parameters.iter().map(|p| p.name.text.clone()).collect(),
                block,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------------

    fn check_if(
        &mut self,
        condition: &ExpressionBox,
        then_block: &Block,
        else_ifs: &[ast::ElseIf],
        else_block: &Block,
        expected: Option<&VariableType>,
        span: Span,
    ) -> Result<Expression, CheckError> {
        let condition = self.check_box(condition, Some(&VariableType::boolean()))?;
        let has_else = !else_ifs.is_empty() || !else_block.is_empty();

        if !has_else {
            if let Some(expected) = expected {
                self.check_assignable(&VariableType::void(), expected, span)?;
            }
        }

        let then_checked = self.scoped(|this| this.check_block(then_block, expected, span))?;
        let else_checked = match else_ifs.split_first() {
            Some((first, rest)) => vec![self.check_if(
                &first.condition,
                &first.then_block,
                rest,
                else_block,
                expected,
                first.span,
            )?],
            None => self.scoped(|this| this.check_block(else_block, expected, span))?,
        };

        let variable_type = match (expected, has_else) {
            (Some(expected), _) => expected.clone(),
            (None, false) => VariableType::void(),
            (None, true) => VariableType::or(vec![block_type(&then_checked), block_type(&else_checked)]),
        };
        Ok(Expression::If {
            variable_type,
            condition: Box::new(condition),
            then_block: then_checked,
            else_block: else_checked,
        })
    }

    fn check_list(&mut self, list: &ast::List, expected: Option<&VariableType>) -> Result<Expression, CheckError> {
        if list.generics.len() > 1 {
            return Err(CheckError::type_mismatch(
                self.file(),
                list.span,
                format!("expected 1 generics but got {}", list.generics.len()),
            ));
        }

        if let Some(generic) = list.generics.first() {
            let contained = resolve_annotation(&self.scope, generic)?;
            let arguments = self.check_elements(&list.expressions, &contained)?;
            return Ok(Expression::List { contained, arguments });
        }

        let expected_elements: Vec<VariableType> = expected
            .map(|e| e.flattened().iter().filter_map(|t| t.list_element().cloned()).collect())
            .unwrap_or_default();
        if let [only] = expected_elements.as_slice() {
            let contained = only.clone();
            let arguments = self.check_elements(&list.expressions, &contained)?;
            return Ok(Expression::List { contained, arguments });
        }

        if list.expressions.is_empty() {
            return Err(CheckError::type_mismatch(
                self.file(),
                list.span,
                "Could not infer list generic, please annotate it",
            ));
        }
        let mut arguments = Vec::with_capacity(list.expressions.len());
        for expression in &list.expressions {
            arguments.push(self.check_box(expression, None)?);
        }
        let inferred = VariableType::or(arguments.iter().map(|a| a.variable_type()));
        let contained = expected_elements
            .into_iter()
            .find(|e| contained_in(&inferred, e))
            .unwrap_or(inferred);
        Ok(Expression::List { contained, arguments })
    }

    fn check_elements(&mut self, expressions: &[ExpressionBox], contained: &VariableType) -> Result<Vec<Expression>, CheckError> {
        let mut arguments = Vec::with_capacity(expressions.len());
        for expression in expressions {
            arguments.push(self.check_box(expression, Some(contained))?);
        }
        Ok(arguments)
    }

    // ------------------------------------------------------------------------
    // When
    // ------------------------------------------------------------------------

    fn check_when(&mut self, when: &ast::When, expected: Option<&VariableType>) -> Result<Expression, CheckError> {
        let file = self.file();
        let over = self.check_box(&when.over, None)?;
        let over_type = over.variable_type();
        let mut coverage = CaseCoverage::new(&over_type);
        let mut cases = Vec::with_capacity(when.is.len());

        for case in &when.is {
            let case_type = resolve_annotation(&self.scope, &case.annotation)?;
            let discriminator = DiscriminatorSynthesizer::new(self.scope.table().match_fields())
                .discriminator(&case_type)
                .map_err(|e| CheckError::from_type_error(e, file, case.annotation.span))?;
            coverage
                .consume(&case_type)
                .map_err(|e| coverage_error(file, case.annotation.span, e))?;

            let block = self
                .scoped(|this| {
                    if let Some(name) = &case.name {
                        this.define(name, case_type.clone())?;
                    }
                    this.check_block(&case.then_block, expected, case.span)
                })
                .map_err(|e| residual_error(e, case.origin))?;
            cases.push(WhenCase {
                name: case.name.as_ref().map(|n| n.text.clone()),
                variable_type: case_type,
                discriminator,
                block,
            });
        }

        let other_case = match &when.other {
            Some(other) => {
                let remaining = coverage.take_remaining();
                let block = self
                    .scoped(|this| {
                        if let Some(name) = &other.name {
                            this.define(name, remaining)?;
                        }
                        this.check_block(&other.then_block, expected, other.span)
                    })
                    .map_err(|e| residual_error(e, other.origin))?;
                Some(block)
            }
            None => None,
        };

        if let ExhaustivenessResult::NonExhaustive(missing) = coverage.finish() {
            return Err(CheckError::new(
                ErrorKind::NonExhaustiveMatch,
                file,
                when.span,
                missing_cases_message(&missing),
            ));
        }

        cases.sort_by(|a, b| a.variable_type.printable_name().cmp(&b.variable_type.printable_name()));
        let variable_type = match expected {
            Some(expected) => expected.clone(),
            None => VariableType::or(
                cases
                    .iter()
                    .map(|c| block_type(&c.block))
                    .chain(other_case.iter().map(|b| block_type(b))),
            ),
        };
        Ok(Expression::When {
            variable_type,
            over: Box::new(over),
            cases,
            other_case,
            other_case_name: when.other.as_ref().and_then(|o| o.name.as_ref()).map(|n| n.text.clone()),
        })
    }
}

/// Type a block evaluates to
pub(crate) fn block_type(block: &[Expression]) -> VariableType {
    block.last().map(|e| e.variable_type()).unwrap_or_else(VariableType::void)
}

fn check_literal(literal: &Literal) -> Expression {
    let variable_type = match literal {
        Literal::Float(_) => VariableType::float(),
        Literal::Int(_) => VariableType::int(),
        Literal::String(_) => VariableType::string(),
        Literal::Bool(_) => VariableType::boolean(),
        Literal::Null => VariableType::void(),
    };
    Expression::Literal {
        literal: literal.clone(),
        variable_type,
    }
}

fn coverage_error(file: &str, span: Span, error: CoverageError) -> CheckError {
    CheckError::new(ErrorKind::DuplicateOrUnreachableCase, file, span, error.message())
}

/// Residual arms come from short-circuits; their mismatches mean the
/// enclosing block cannot return the residual
fn residual_error(error: CheckError, origin: CaseOrigin) -> CheckError {
    if origin == CaseOrigin::ShortCircuitResidual && error.kind == ErrorKind::TypeMismatch {
        error.with_kind(ErrorKind::ShortCircuitOutsideReturnCompatibleFunction)
    } else {
        error
    }
}
