//! The typed program handed to code generators
//!
//! Every expression node carries its resolved [`VariableType`]. A
//! [`Program`] is produced once by the driver and is read-only afterwards.

use crate::syntax::Literal;
use crate::types::{
    Discriminator, DiscriminatorSynthesizer, Function, MatchFields, Ref, TypeError, VariableType,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// A resolved `typealias`
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct TypeAlias {
    pub generics: Vec<String>,
    pub variable_type: VariableType,
}

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub package: String,
    /// Top-level declarations in source order
    pub declarations: Vec<Declaration>,
    pub type_aliases: BTreeMap<Ref, TypeAlias>,
    /// Constructors of the package's structs and interfaces
    pub struct_functions: BTreeMap<Ref, Function>,
    /// Imported standard library functions, keyed by their home package
    pub native_functions: BTreeMap<Ref, Function>,
    /// File, then local (possibly aliased) import name, to the package that implements it
    pub native_function_packages: BTreeMap<String, BTreeMap<String, String>>,
    pub fields_by_type: BTreeMap<Ref, Vec<(String, VariableType)>>,
    /// Witness field per generic parameter of every generic struct
    pub struct_type_argument_match_fields: MatchFields,
}

impl Program {
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.name == name)
    }

    /// Package implementing the native function imported as `local` in `file`
    pub fn native_package(&self, file: &str, local: &str) -> Option<&str> {
        self.native_function_packages
            .get(file)
            .and_then(|imports| imports.get(local))
            .map(String::as_str)
    }

    /// Runtime test for values of type `ty`
    pub fn discriminator_for(&self, ty: &VariableType) -> Result<Discriminator, TypeError> {
        DiscriminatorSynthesizer::new(&self.struct_type_argument_match_fields).discriminator(ty)
    }
}

/// A checked top-level binding
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub name: String,
    pub expression: Expression,
}

impl Declaration {
    pub fn variable_type(&self) -> VariableType {
        self.expression.variable_type()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionExpression {
    pub variable_type: Function,
    pub parameters: Vec<String>,
    pub block: Vec<Expression>,
}

/// One `is` arm of a typed `when`
#[derive(Debug, Clone, Serialize)]
pub struct WhenCase {
    pub name: Option<String>,
    pub variable_type: VariableType,
    pub discriminator: Discriminator,
    pub block: Vec<Expression>,
}

#[derive(Debug, Clone, Serialize)]
pub enum Expression {
    Literal {
        literal: Literal,
        variable_type: VariableType,
    },
    Reference {
        variable_type: VariableType,
        /// Package of a package-level target, `None` for locals
        package: Option<String>,
        name: String,
    },
    Access {
        variable_type: VariableType,
        over: Box<Expression>,
        field: String,
    },
    Invocation {
        variable_type: VariableType,
        over: Box<Expression>,
        /// Concrete generics the callee was instantiated with
        generics: Vec<VariableType>,
        arguments: Vec<Expression>,
    },
    Function(FunctionExpression),
    /// Local binding; evaluates to Void
    Declaration {
        name: String,
        expression: Box<Expression>,
    },
    If {
        variable_type: VariableType,
        condition: Box<Expression>,
        then_block: Vec<Expression>,
        else_block: Vec<Expression>,
    },
    List {
        contained: VariableType,
        arguments: Vec<Expression>,
    },
    When {
        variable_type: VariableType,
        over: Box<Expression>,
        /// Sorted by the printable name of the case type
        cases: Vec<WhenCase>,
        other_case: Option<Vec<Expression>>,
        other_case_name: Option<String>,
    },
}

impl Expression {
    pub fn variable_type(&self) -> VariableType {
        match self {
            Expression::Literal { variable_type, .. }
            | Expression::Reference { variable_type, .. }
            | Expression::Access { variable_type, .. }
            | Expression::Invocation { variable_type, .. }
            | Expression::If { variable_type, .. }
            | Expression::When { variable_type, .. } => variable_type.clone(),
            Expression::Function(function) => VariableType::Function(function.variable_type.clone()),
            Expression::Declaration { .. } => VariableType::void(),
            Expression::List { contained, .. } => VariableType::list(contained.clone()),
        }
    }
}
