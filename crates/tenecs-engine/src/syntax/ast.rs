//! AST nodes produced by the parser
//!
//! This module defines the untyped tree the checker consumes:
//! - File level: package, imports and top level declarations
//! - Type annotations, including unions and function types
//! - Expressions, each wrapped in an [`ExpressionBox`] carrying a chain of
//!   field accesses and invocations

use super::Span;
use serde::{Deserialize, Serialize};

/// Identifier with its location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
    pub text: String,
    #[serde(default)]
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// File level
// ============================================================================

/// One parsed source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTopLevel {
    pub package: Package,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub declarations: Vec<TopLevelDeclaration>,
}

/// `package a.b.c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub path: Vec<Name>,
    #[serde(default)]
    pub span: Span,
}

impl Package {
    /// Dotted package name
    pub fn dotted(&self) -> String {
        self.path
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// `import a.b.Name` or `import a.b.Name as Alias`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: Vec<Name>,
    #[serde(default)]
    pub alias: Option<Name>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelDeclaration {
    Declaration(Declaration),
    Struct(RecordDeclaration),
    Interface(RecordDeclaration),
    TypeAlias(TypeAlias),
}

impl TopLevelDeclaration {
    pub fn name(&self) -> &Name {
        match self {
            TopLevelDeclaration::Declaration(d) => &d.name,
            TopLevelDeclaration::Struct(s) | TopLevelDeclaration::Interface(s) => &s.name,
            TopLevelDeclaration::TypeAlias(a) => &a.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TopLevelDeclaration::Declaration(d) => d.span,
            TopLevelDeclaration::Struct(s) | TopLevelDeclaration::Interface(s) => s.span,
            TopLevelDeclaration::TypeAlias(a) => a.span,
        }
    }
}

/// Struct or interface body: `struct Box<T>(value: T)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDeclaration {
    pub name: Name,
    #[serde(default)]
    pub generics: Vec<Name>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: Name,
    pub annotation: TypeAnnotation,
}

/// `typealias Name<T> = Annotation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: Name,
    #[serde(default)]
    pub generics: Vec<Name>,
    pub annotation: TypeAnnotation,
    #[serde(default)]
    pub span: Span,
}

// ============================================================================
// Type annotations
// ============================================================================

/// `A | B<C> | (x: D) ~> E`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnnotation {
    pub or_types: Vec<TypeAnnotationElement>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeAnnotationElement {
    /// `_`, only valid as an invocation generic
    Underscore(Span),
    SingleName {
        name: Name,
        #[serde(default)]
        generics: Vec<TypeAnnotation>,
    },
    Function(FunctionType),
}

impl TypeAnnotationElement {
    pub fn span(&self) -> Span {
        match self {
            TypeAnnotationElement::Underscore(span) => *span,
            TypeAnnotationElement::SingleName { name, .. } => name.span,
            TypeAnnotationElement::Function(f) => f.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionType {
    #[serde(default)]
    pub generics: Vec<Name>,
    pub arguments: Vec<FunctionTypeArgument>,
    pub return_type: Box<TypeAnnotation>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTypeArgument {
    #[serde(default)]
    pub name: Option<Name>,
    pub annotation: TypeAnnotation,
}

// ============================================================================
// Expressions
// ============================================================================

/// Block of statements; the last one is the result
pub type Block = Vec<ExpressionBox>;

/// An expression followed by `.field`, `->f(..)` and `(..)` links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionBox {
    pub expression: Expression,
    #[serde(default)]
    pub chain: Vec<AccessOrInvocation>,
    #[serde(default)]
    pub span: Span,
}

impl ExpressionBox {
    pub fn new(expression: Expression) -> Self {
        let span = expression.span();
        Self {
            expression,
            chain: Vec::new(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessOrInvocation {
    #[serde(default)]
    pub access: Option<DotOrArrowName>,
    #[serde(default)]
    pub arguments: Option<ArgumentsList>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotOrArrowName {
    pub name: Name,
    /// `a->f(b)` rather than `a.f`
    #[serde(default)]
    pub arrow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentsList {
    #[serde(default)]
    pub generics: Vec<TypeAnnotation>,
    pub arguments: Vec<NamedArgument>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    #[serde(default)]
    pub name: Option<Name>,
    pub argument: ExpressionBox,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Literal(LiteralExpression),
    ReferenceOrInvocation(ReferenceOrInvocation),
    Lambda(Lambda),
    Declaration(Declaration),
    If(If),
    List(List),
    When(When),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(e) => e.span,
            Expression::ReferenceOrInvocation(e) => e.span,
            Expression::Lambda(e) => e.span,
            Expression::Declaration(e) => e.span,
            Expression::If(e) => e.span,
            Expression::List(e) => e.span,
            Expression::When(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Float(f64),
    Int(i64),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteralExpression {
    pub literal: Literal,
    #[serde(default)]
    pub span: Span,
}

/// `name` or `name<G>(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrInvocation {
    pub var: Name,
    #[serde(default)]
    pub arguments: Option<ArgumentsList>,
    #[serde(default)]
    pub span: Span,
}

/// `<T>(a: T, b): R => { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    #[serde(default)]
    pub generics: Vec<Name>,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<TypeAnnotation>,
    pub block: Block,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Name,
    #[serde(default)]
    pub annotation: Option<TypeAnnotation>,
}

/// `name: T := value`, or the short-circuit form `name: T ? R = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: Name,
    #[serde(default)]
    pub annotation: Option<TypeAnnotation>,
    #[serde(default)]
    pub short_circuit: Option<ShortCircuit>,
    pub value: Box<ExpressionBox>,
    #[serde(default)]
    pub span: Span,
}

/// The `? R` part of a short-circuit declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuit {
    /// Residual type that ends the enclosing block early
    #[serde(default)]
    pub annotation: Option<TypeAnnotation>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct If {
    pub condition: Box<ExpressionBox>,
    pub then_block: Block,
    #[serde(default)]
    pub else_ifs: Vec<ElseIf>,
    #[serde(default)]
    pub else_block: Block,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIf {
    pub condition: ExpressionBox,
    pub then_block: Block,
    #[serde(default)]
    pub span: Span,
}

/// `[T](a, b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(default)]
    pub generics: Vec<TypeAnnotation>,
    pub expressions: Vec<ExpressionBox>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct When {
    pub over: Box<ExpressionBox>,
    #[serde(default)]
    pub is: Vec<WhenIs>,
    #[serde(default)]
    pub other: Option<WhenOther>,
    #[serde(default)]
    pub span: Span,
}

/// Where a `when` arm came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaseOrigin {
    #[default]
    Source,
    /// Early-exit arm generated from a short-circuit declaration
    ShortCircuitResidual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenIs {
    #[serde(default)]
    pub name: Option<Name>,
    pub annotation: TypeAnnotation,
    pub then_block: Block,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub origin: CaseOrigin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenOther {
    #[serde(default)]
    pub name: Option<Name>,
    pub then_block: Block,
    #[serde(default)]
    pub span: Span,
    #[serde(default)]
    pub origin: CaseOrigin,
}
