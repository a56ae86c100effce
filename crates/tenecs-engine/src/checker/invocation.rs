//! Field access and function invocation
//!
//! Generics of an invoked function are resolved in one of three ways:
//!
//! 1. explicitly, `f<Int>(x)`
//! 2. partially, with `_` standing for the generics to infer, `f<_, Int>(x, y)`
//! 3. by inference from the arguments, and then from the expected type of
//!    the invocation for whatever the arguments leave open
//!
//! Lambda arguments are checked after the other arguments so their
//! parameter types can come from what was inferred so far.

use super::annotation::resolve_annotation;
use super::checker::{LambdaShape, TypeChecker};
use super::error::CheckError;
use crate::program::Expression;
use crate::syntax::{self as ast, ArgumentsList, ExpressionBox, Name, Span, TypeAnnotationElement};
use crate::types::{
    infer_generic, merge_inference, mentions_any, resolve_generics, Function, Substitution, VariableType,
};

impl<'a> TypeChecker<'a> {
    /// `over.name`
    pub(crate) fn check_member(&mut self, over: Expression, name: &Name) -> Result<Expression, CheckError> {
        let over_type = over.variable_type();
        let known = match &over_type {
            VariableType::Known(known) => known,
            other => {
                return Err(CheckError::type_mismatch(
                    self.file(),
                    name.span,
                    format!("can't access over {}", other),
                ))
            }
        };
        let fields = self.scope.fields_of(known).unwrap_or_default();
        let variable_type = fields
            .into_iter()
            .find(|(field, _)| field == &name.text)
            .map(|(_, ty)| ty)
            .ok_or_else(|| {
                CheckError::unresolved(
                    self.file(),
                    name.span,
                    format!("no field named {} on {}", name.text, over_type),
                )
            })?;
        Ok(Expression::Access {
            variable_type,
            over: Box::new(over),
            field: name.text.clone(),
        })
    }

    /// `over<G>(arguments)`
    pub(crate) fn check_call(
        &mut self,
        over: Expression,
        list: &ArgumentsList,
        expected: Option<&VariableType>,
        span: Span,
    ) -> Result<Expression, CheckError> {
        let function = match over.variable_type() {
            VariableType::Function(function) => function,
            other => {
                return Err(CheckError::type_mismatch(
                    self.file(),
                    span,
                    format!("Should be a function in order to be invoked but is {}", other),
                ))
            }
        };

        if list.arguments.len() != function.arguments.len() {
            return Err(CheckError::type_mismatch(
                self.file(),
                list.span,
                format!(
                    "expected {} arguments but got {}",
                    function.arguments.len(),
                    list.arguments.len()
                ),
            ));
        }
        for (argument, parameter) in list.arguments.iter().zip(&function.arguments) {
            if let Some(name) = &argument.name {
                if name.text != parameter.name {
                    return Err(CheckError::type_mismatch(
                        self.file(),
                        name.span,
                        format!("name of argument should be '{}'", parameter.name),
                    ));
                }
            }
        }

        let (substitution, arguments) = self.resolve_function_generics(&function, list, expected, span)?;
        let mut generics = Vec::with_capacity(function.generics.len());
        for generic in &function.generics {
            let resolved = substitution.get(generic).cloned().unwrap_or_else(|| VariableType::type_argument(generic));
            if matches!(resolved, VariableType::Function(_)) {
                return Err(CheckError::type_mismatch(self.file(), span, "Can't pass a function as a generic"));
            }
            generics.push(resolved);
        }

        Ok(Expression::Invocation {
            variable_type: resolve_generics(&function.return_type, &substitution),
            over: Box::new(over),
            generics,
            arguments,
        })
    }

    fn resolve_function_generics(
        &mut self,
        function: &Function,
        list: &ArgumentsList,
        expected: Option<&VariableType>,
        span: Span,
    ) -> Result<(Substitution, Vec<Expression>), CheckError> {
        if !list.generics.is_empty() && list.generics.len() != function.generics.len() {
            return Err(CheckError::type_mismatch(
                self.file(),
                list.span,
                format!(
                    "expected {} generics but got {}",
                    function.generics.len(),
                    list.generics.len()
                ),
            ));
        }

        let mut explicit = Substitution::default();
        let mut open = Vec::new();
        if list.generics.is_empty() {
            open = function.generics.clone();
        } else {
            for (generic, annotation) in function.generics.iter().zip(&list.generics) {
                if matches!(annotation.or_types.as_slice(), [TypeAnnotationElement::Underscore(_)]) {
                    open.push(generic.clone());
                } else {
                    explicit.insert(generic.clone(), resolve_annotation(&self.scope, annotation)?);
                }
            }
        }

        if open.is_empty() {
            let mut arguments = Vec::with_capacity(list.arguments.len());
            for (argument, parameter) in list.arguments.iter().zip(function.argument_types()) {
                let parameter = resolve_generics(parameter, &explicit);
                arguments.push(self.check_box(&argument.argument, Some(&parameter))?);
            }
            return Ok((explicit, arguments));
        }

        let inferred = self.attempt_generic_inference(function, list, &explicit, &open, expected, span)?;
        let mut substitution = explicit;
        substitution.extend(inferred.0);
        Ok((substitution, inferred.1))
    }

    /// Infer the `open` generics, checking every argument on the way
    fn attempt_generic_inference(
        &mut self,
        function: &Function,
        list: &ArgumentsList,
        explicit: &Substitution,
        open: &[String],
        expected: Option<&VariableType>,
        span: Span,
    ) -> Result<(Substitution, Vec<Expression>), CheckError> {
        let parameters: Vec<VariableType> = function
            .argument_types()
            .map(|p| resolve_generics(p, explicit))
            .collect();
        let mut inferred = Substitution::default();
        let mut checked: Vec<Option<Expression>> = vec![None; list.arguments.len()];
        let mut deferred = Vec::new();

        for (i, argument) in list.arguments.iter().enumerate() {
            let parameter = &parameters[i];
            if !mentions_any(parameter, open) {
                checked[i] = Some(self.check_box(&argument.argument, Some(parameter))?);
            } else if plain_lambda(&argument.argument).is_some() && parameter.as_function().is_some() {
                deferred.push(i);
            } else {
                let expression = self.check_box(&argument.argument, None)?;
                self.infer_into(&mut inferred, open, parameter, &expression.variable_type(), argument.argument.span)?;
                checked[i] = Some(expression);
            }
        }

        for i in deferred {
            let argument = &list.arguments[i].argument;
            let parameter = &parameters[i];
            let shaped = resolve_generics(parameter, &inferred);
            let expression = match (plain_lambda(argument), shaped.as_function()) {
                (Some(lambda), Some(shaped_function))
                    if !shaped_function.argument_types().any(|a| mentions_any(a, open)) =>
                {
                    let return_type = if mentions_any(&shaped_function.return_type, open) {
                        None
                    } else {
                        Some((*shaped_function.return_type).clone())
                    };
                    let shape = LambdaShape {
                        arguments: shaped_function.argument_types().cloned().collect(),
                        return_type,
                    };
                    Expression::Function(self.check_lambda(lambda, Some(shape))?)
                }
                _ => self.check_box(argument, None)?,
            };
            self.infer_into(&mut inferred, open, parameter, &expression.variable_type(), argument.span)?;
            checked[i] = Some(expression);
        }

        let unresolved: Vec<&String> = open.iter().filter(|g| !inferred.contains_key(*g)).collect();
        if !unresolved.is_empty() {
            if let Some(expected) = expected {
                let return_type = resolve_generics(&function.return_type, explicit);
                for generic in unresolved {
                    let found = infer_generic(generic, &return_type, expected)
                        .map_err(|e| CheckError::from_type_error(e, self.file(), span))?;
                    if let Some(found) = found {
                        inferred.insert(generic.clone(), found);
                    }
                }
            }
        }
        if open.iter().any(|g| !inferred.contains_key(g)) {
            return Err(CheckError::type_mismatch(
                self.file(),
                span,
                "Could not infer generics, please annotate them",
            ));
        }

        let mut arguments = Vec::with_capacity(checked.len());
        for ((expression, parameter), argument) in checked.into_iter().zip(&parameters).zip(&list.arguments) {
            let parameter = resolve_generics(parameter, &inferred);
            let expression = match expression {
                Some(expression) => expression,
                None => self.check_box(&argument.argument, Some(&parameter))?,
            };
            self.check_assignable(&expression.variable_type(), &parameter, argument.argument.span)?;
            arguments.push(expression);
        }
        Ok((inferred, arguments))
    }

    fn infer_into(
        &self,
        inferred: &mut Substitution,
        open: &[String],
        parameter: &VariableType,
        argument: &VariableType,
        span: Span,
    ) -> Result<(), CheckError> {
        for generic in open {
            let found = infer_generic(generic, parameter, argument)
                .map_err(|e| CheckError::from_type_error(e, self.file(), span))?;
            if let Some(found) = found {
                let merged = merge_inference(generic, inferred.remove(generic), found)
                    .map_err(|e| CheckError::from_type_error(e, self.file(), span))?;
                inferred.insert(generic.clone(), merged);
            }
        }
        Ok(())
    }
}

/// A bare lambda without generics of its own
fn plain_lambda(expression: &ExpressionBox) -> Option<&ast::Lambda> {
    match &expression.expression {
        ast::Expression::Lambda(lambda) if expression.chain.is_empty() && lambda.generics.is_empty() => Some(lambda),
        _ => None,
    }
}
