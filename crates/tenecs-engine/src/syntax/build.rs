//! Terse constructors for building ASTs in code
//!
//! Nodes built here carry default spans unless [`at`] is used.

use super::ast::*;
use super::Span;

pub fn name(text: &str) -> Name {
    Name::new(text, Span::default())
}

fn names(texts: &[&str]) -> Vec<Name> {
    texts.iter().map(|t| name(t)).collect()
}

/// Attach a position to an expression, for diagnostics
pub fn at(mut expression: ExpressionBox, line: u32, column: u32) -> ExpressionBox {
    let span = Span::new(0, 0, line, column);
    expression.span = span;
    match &mut expression.expression {
        Expression::Literal(e) => e.span = span,
        Expression::ReferenceOrInvocation(e) => {
            e.span = span;
            e.var.span = span;
        }
        Expression::Lambda(e) => e.span = span,
        Expression::Declaration(e) => {
            e.span = span;
            e.name.span = span;
        }
        Expression::If(e) => e.span = span,
        Expression::List(e) => e.span = span,
        Expression::When(e) => e.span = span,
    }
    expression
}

// ============================================================================
// File level
// ============================================================================

pub fn file(package: &str, imports: Vec<Import>, declarations: Vec<TopLevelDeclaration>) -> FileTopLevel {
    FileTopLevel {
        package: Package {
            path: package.split('.').map(name).collect(),
            span: Span::default(),
        },
        imports,
        declarations,
    }
}

/// `import a.b.Name`
pub fn import(path: &str) -> Import {
    Import {
        path: path.split('.').map(name).collect(),
        alias: None,
        span: Span::default(),
    }
}

/// `import a.b.Name as Alias`
pub fn import_as(path: &str, alias: &str) -> Import {
    Import {
        alias: Some(name(alias)),
        ..import(path)
    }
}

fn record(type_name: &str, generics: &[&str], fields: Vec<(&str, TypeAnnotation)>) -> RecordDeclaration {
    RecordDeclaration {
        name: name(type_name),
        generics: names(generics),
        fields: fields
            .into_iter()
            .map(|(field, annotation)| Field {
                name: name(field),
                annotation,
            })
            .collect(),
        span: Span::default(),
    }
}

pub fn structure(type_name: &str, generics: &[&str], fields: Vec<(&str, TypeAnnotation)>) -> TopLevelDeclaration {
    TopLevelDeclaration::Struct(record(type_name, generics, fields))
}

pub fn interface(type_name: &str, generics: &[&str], fields: Vec<(&str, TypeAnnotation)>) -> TopLevelDeclaration {
    TopLevelDeclaration::Interface(record(type_name, generics, fields))
}

pub fn type_alias(alias: &str, generics: &[&str], annotation: TypeAnnotation) -> TopLevelDeclaration {
    TopLevelDeclaration::TypeAlias(TypeAlias {
        name: name(alias),
        generics: names(generics),
        annotation,
        span: Span::default(),
    })
}

pub fn top(variable: &str, value: ExpressionBox) -> TopLevelDeclaration {
    TopLevelDeclaration::Declaration(declaration(variable, None, None, value))
}

pub fn top_annotated(variable: &str, annotation: TypeAnnotation, value: ExpressionBox) -> TopLevelDeclaration {
    TopLevelDeclaration::Declaration(declaration(variable, Some(annotation), None, value))
}

// ============================================================================
// Type annotations
// ============================================================================

pub fn ty(type_name: &str) -> TypeAnnotation {
    generic_ty(type_name, vec![])
}

pub fn generic_ty(type_name: &str, generics: Vec<TypeAnnotation>) -> TypeAnnotation {
    TypeAnnotation {
        or_types: vec![TypeAnnotationElement::SingleName {
            name: name(type_name),
            generics,
        }],
        span: Span::default(),
    }
}

/// `A | B | C`
pub fn or_ty(annotations: Vec<TypeAnnotation>) -> TypeAnnotation {
    TypeAnnotation {
        or_types: annotations.into_iter().flat_map(|a| a.or_types).collect(),
        span: Span::default(),
    }
}

pub fn fn_ty(generics: &[&str], arguments: Vec<TypeAnnotation>, return_type: TypeAnnotation) -> TypeAnnotation {
    TypeAnnotation {
        or_types: vec![TypeAnnotationElement::Function(FunctionType {
            generics: names(generics),
            arguments: arguments
                .into_iter()
                .map(|annotation| FunctionTypeArgument {
                    name: None,
                    annotation,
                })
                .collect(),
            return_type: Box::new(return_type),
            span: Span::default(),
        })],
        span: Span::default(),
    }
}

pub fn underscore() -> TypeAnnotation {
    TypeAnnotation {
        or_types: vec![TypeAnnotationElement::Underscore(Span::default())],
        span: Span::default(),
    }
}

// ============================================================================
// Expressions
// ============================================================================

fn literal(literal: Literal) -> ExpressionBox {
    ExpressionBox::new(Expression::Literal(LiteralExpression {
        literal,
        span: Span::default(),
    }))
}

pub fn int(value: i64) -> ExpressionBox {
    literal(Literal::Int(value))
}

pub fn float(value: f64) -> ExpressionBox {
    literal(Literal::Float(value))
}

pub fn string(value: &str) -> ExpressionBox {
    literal(Literal::String(value.to_string()))
}

pub fn boolean(value: bool) -> ExpressionBox {
    literal(Literal::Bool(value))
}

pub fn null() -> ExpressionBox {
    literal(Literal::Null)
}

pub fn var(variable: &str) -> ExpressionBox {
    ExpressionBox::new(Expression::ReferenceOrInvocation(ReferenceOrInvocation {
        var: name(variable),
        arguments: None,
        span: Span::default(),
    }))
}

fn arguments(generics: Vec<TypeAnnotation>, values: Vec<ExpressionBox>) -> ArgumentsList {
    ArgumentsList {
        generics,
        arguments: values
            .into_iter()
            .map(|argument| NamedArgument {
                name: None,
                argument,
                span: Span::default(),
            })
            .collect(),
        span: Span::default(),
    }
}

/// `f(a, b)`
pub fn call(function: &str, values: Vec<ExpressionBox>) -> ExpressionBox {
    call_generic(function, vec![], values)
}

/// `f<G>(a, b)`
pub fn call_generic(function: &str, generics: Vec<TypeAnnotation>, values: Vec<ExpressionBox>) -> ExpressionBox {
    ExpressionBox::new(Expression::ReferenceOrInvocation(ReferenceOrInvocation {
        var: name(function),
        arguments: Some(arguments(generics, values)),
        span: Span::default(),
    }))
}

/// `f(label = value)`
pub fn call_named(function: &str, values: Vec<(&str, ExpressionBox)>) -> ExpressionBox {
    let mut list = arguments(vec![], vec![]);
    list.arguments = values
        .into_iter()
        .map(|(label, argument)| NamedArgument {
            name: Some(name(label)),
            argument,
            span: Span::default(),
        })
        .collect();
    ExpressionBox::new(Expression::ReferenceOrInvocation(ReferenceOrInvocation {
        var: name(function),
        arguments: Some(list),
        span: Span::default(),
    }))
}

/// `over.field`
pub fn access(mut over: ExpressionBox, field: &str) -> ExpressionBox {
    over.chain.push(AccessOrInvocation {
        access: Some(DotOrArrowName {
            name: name(field),
            arrow: false,
        }),
        arguments: None,
        span: Span::default(),
    });
    over
}

/// `over(a, b)`
pub fn invoke(mut over: ExpressionBox, values: Vec<ExpressionBox>) -> ExpressionBox {
    over.chain.push(AccessOrInvocation {
        access: None,
        arguments: Some(arguments(vec![], values)),
        span: Span::default(),
    });
    over
}

/// `over->function(a, b)`
pub fn arrow(mut over: ExpressionBox, function: &str, values: Vec<ExpressionBox>) -> ExpressionBox {
    over.chain.push(AccessOrInvocation {
        access: Some(DotOrArrowName {
            name: name(function),
            arrow: true,
        }),
        arguments: Some(arguments(vec![], values)),
        span: Span::default(),
    });
    over
}

/// Lambda without generics
pub fn lambda(
    parameters: Vec<(&str, Option<TypeAnnotation>)>,
    return_type: Option<TypeAnnotation>,
    block: Block,
) -> ExpressionBox {
    generic_lambda(&[], parameters, return_type, block)
}

pub fn generic_lambda(
    generics: &[&str],
    parameters: Vec<(&str, Option<TypeAnnotation>)>,
    return_type: Option<TypeAnnotation>,
    block: Block,
) -> ExpressionBox {
    ExpressionBox::new(Expression::Lambda(Lambda {
        generics: names(generics),
        parameters: parameters
            .into_iter()
            .map(|(parameter, annotation)| Parameter {
                name: name(parameter),
                annotation,
            })
            .collect(),
        return_type,
        block,
        span: Span::default(),
    }))
}

fn declaration(
    variable: &str,
    annotation: Option<TypeAnnotation>,
    short_circuit: Option<ShortCircuit>,
    value: ExpressionBox,
) -> Declaration {
    Declaration {
        name: name(variable),
        annotation,
        short_circuit,
        value: Box::new(value),
        span: Span::default(),
    }
}

/// `name := value`
pub fn declare(variable: &str, value: ExpressionBox) -> ExpressionBox {
    ExpressionBox::new(Expression::Declaration(declaration(variable, None, None, value)))
}

/// `name: T = value`
pub fn declare_annotated(variable: &str, annotation: TypeAnnotation, value: ExpressionBox) -> ExpressionBox {
    ExpressionBox::new(Expression::Declaration(declaration(variable, Some(annotation), None, value)))
}

/// `name: success ? residual = value`, either side optional
pub fn short_circuit(
    variable: &str,
    success: Option<TypeAnnotation>,
    residual: Option<TypeAnnotation>,
    value: ExpressionBox,
) -> ExpressionBox {
    let short_circuit = ShortCircuit {
        annotation: residual,
        span: Span::default(),
    };
    ExpressionBox::new(Expression::Declaration(declaration(
        variable,
        success,
        Some(short_circuit),
        value,
    )))
}

pub fn if_then(condition: ExpressionBox, then_block: Block) -> ExpressionBox {
    if_else(condition, then_block, vec![])
}

pub fn if_else(condition: ExpressionBox, then_block: Block, else_block: Block) -> ExpressionBox {
    if_chain(condition, then_block, vec![], else_block)
}

pub fn if_chain(
    condition: ExpressionBox,
    then_block: Block,
    else_ifs: Vec<(ExpressionBox, Block)>,
    else_block: Block,
) -> ExpressionBox {
    ExpressionBox::new(Expression::If(If {
        condition: Box::new(condition),
        then_block,
        else_ifs: else_ifs
            .into_iter()
            .map(|(condition, then_block)| ElseIf {
                condition,
                then_block,
                span: Span::default(),
            })
            .collect(),
        else_block,
        span: Span::default(),
    }))
}

/// `[G](items)` or `(items)` when `generic` is `None`
pub fn list(generic: Option<TypeAnnotation>, expressions: Vec<ExpressionBox>) -> ExpressionBox {
    ExpressionBox::new(Expression::List(List {
        generics: generic.into_iter().collect(),
        expressions,
        span: Span::default(),
    }))
}

pub fn when(over: ExpressionBox, is: Vec<WhenIs>, other: Option<WhenOther>) -> ExpressionBox {
    ExpressionBox::new(Expression::When(When {
        over: Box::new(over),
        is,
        other,
        span: Span::default(),
    }))
}

/// `is name: T => { block }`
pub fn is(variable: Option<&str>, annotation: TypeAnnotation, then_block: Block) -> WhenIs {
    WhenIs {
        name: variable.map(name),
        annotation,
        then_block,
        span: Span::default(),
        origin: CaseOrigin::Source,
    }
}

/// `other name => { block }`
pub fn other(variable: Option<&str>, then_block: Block) -> WhenOther {
    WhenOther {
        name: variable.map(name),
        then_block,
        span: Span::default(),
        origin: CaseOrigin::Source,
    }
}
