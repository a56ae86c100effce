//! Type annotation resolution
//!
//! Turns a syntactic [`TypeAnnotation`] into a [`VariableType`] against a
//! [`Scope`]. Generics introduced by a function type annotation are only in
//! scope inside that annotation.

use super::error::CheckError;
use super::symbols::{Scope, TypeSymbol};
use crate::syntax::{FunctionType, Span, TypeAnnotation, TypeAnnotationElement};
use crate::types::{resolve_generics, Function, FunctionArgument, KnownType, Substitution, TypeError, VariableType};

/// Resolve `annotation` in `scope`
pub fn resolve_annotation(scope: &Scope<'_>, annotation: &TypeAnnotation) -> Result<VariableType, CheckError> {
    AnnotationResolver::new(scope).resolve(annotation)
}

/// Resolver carrying the generics bound by enclosing function annotations
pub struct AnnotationResolver<'s, 'a> {
    scope: &'s Scope<'a>,
    generics: Vec<String>,
}

impl<'s, 'a> AnnotationResolver<'s, 'a> {
    pub fn new(scope: &'s Scope<'a>) -> Self {
        Self {
            scope,
            generics: Vec::new(),
        }
    }

    /// Pretend `generics` are in scope, for struct fields and alias bodies
    pub fn with_generics(mut self, generics: impl IntoIterator<Item = String>) -> Self {
        self.generics.extend(generics);
        self
    }

    pub fn resolve(&mut self, annotation: &TypeAnnotation) -> Result<VariableType, CheckError> {
        let mut elements = Vec::with_capacity(annotation.or_types.len());
        for element in &annotation.or_types {
            elements.push(self.element(element)?);
        }
        Ok(VariableType::or(elements))
    }

    fn element(&mut self, element: &TypeAnnotationElement) -> Result<VariableType, CheckError> {
        let file = self.scope.file();
        match element {
            TypeAnnotationElement::Underscore(span) => Err(CheckError::type_mismatch(
                file,
                *span,
                "Generic inference not allowed here",
            )),
            TypeAnnotationElement::Function(function) => self.function(function).map(VariableType::Function),
            TypeAnnotationElement::SingleName { name, generics } => {
                let mut resolved = Vec::with_capacity(generics.len());
                for generic in generics {
                    resolved.push(self.resolve(generic)?);
                }

                if self.generics.iter().any(|g| g == &name.text) {
                    return if resolved.is_empty() {
                        Ok(VariableType::type_argument(&name.text))
                    } else {
                        Err(wrong_count(file, name.span, 0, resolved.len()))
                    };
                }

                let symbol = self.scope.lookup_type(&name.text).ok_or_else(|| {
                    CheckError::not_found_type(file, name.span, format!("not found type: {}", name.text))
                })?;
                match symbol {
                    TypeSymbol::Generic => {
                        if resolved.is_empty() {
                            Ok(VariableType::type_argument(&name.text))
                        } else {
                            Err(wrong_count(file, name.span, 0, resolved.len()))
                        }
                    }
                    TypeSymbol::Known(known) => {
                        if known.declared_generics.len() != resolved.len() {
                            return Err(wrong_count(file, name.span, known.declared_generics.len(), resolved.len()));
                        }
                        Ok(VariableType::Known(KnownType {
                            generics: resolved,
                            ..known
                        }))
                    }
                    TypeSymbol::Alias { generics, ty } => {
                        if generics.len() != resolved.len() {
                            return Err(wrong_count(file, name.span, generics.len(), resolved.len()));
                        }
                        let substitution: Substitution = generics.into_iter().zip(resolved).collect();
                        Ok(resolve_generics(&ty, &substitution))
                    }
                }
            }
        }
    }

    fn function(&mut self, function: &FunctionType) -> Result<Function, CheckError> {
        let outer = self.generics.len();
        self.generics.extend(function.generics.iter().map(|g| g.text.clone()));
        let result = self.function_body(function);
        self.generics.truncate(outer);
        result
    }

    fn function_body(&mut self, function: &FunctionType) -> Result<Function, CheckError> {
        let mut arguments = Vec::with_capacity(function.arguments.len());
        for argument in &function.arguments {
            arguments.push(FunctionArgument {
                name: argument
                    .name
                    .as_ref()
                    .map(|n| n.text.clone())
                    .unwrap_or_else(|| "_".to_string()),
                variable_type: self.resolve(&argument.annotation)?,
            });
        }
        let return_type = self.resolve(&function.return_type)?;
        Ok(Function::new(
            function.generics.iter().map(|g| g.text.clone()).collect(),
            arguments,
            return_type,
        ))
    }
}

fn wrong_count(file: &str, span: Span, expected: usize, actual: usize) -> CheckError {
    CheckError::type_mismatch(file, span, TypeError::WrongGenericCount { expected, actual }.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::error::ErrorKind;
    use crate::checker::symbols::SymbolTable;
    use crate::syntax::build::*;

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new("main");
        let boxed = KnownType {
            package: "main".to_string(),
            name: "Box".to_string(),
            declared_generics: vec!["T".to_string()],
            generics: vec![VariableType::type_argument("T")],
            valid_struct_field: true,
        };
        table.define_type("Box", TypeSymbol::Known(boxed)).unwrap();
        table
            .define_type(
                "Maybe",
                TypeSymbol::Alias {
                    generics: vec!["T".to_string()],
                    ty: VariableType::or(vec![VariableType::type_argument("T"), VariableType::void()]),
                },
            )
            .unwrap();
        table
    }

    #[test]
    fn test_resolve_union() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let resolved = resolve_annotation(&scope, &or_ty(vec![ty("String"), ty("Int")])).unwrap();
        assert_eq!(resolved.to_string(), "Int | String");
    }

    #[test]
    fn test_resolve_alias_substitutes() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let resolved = resolve_annotation(&scope, &generic_ty("Maybe", vec![ty("Int")])).unwrap();
        assert_eq!(resolved.to_string(), "Int | Void");
    }

    #[test]
    fn test_not_found_type() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let err = resolve_annotation(&scope, &ty("Nope")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFoundType);
        assert_eq!(err.message, "not found type: Nope");
    }

    #[test]
    fn test_wrong_generic_count() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let err = resolve_annotation(&scope, &ty("Box")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.message, "wrong number of generics, expected 1 but got 0");
    }

    #[test]
    fn test_function_generics_are_local() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let f = resolve_annotation(&scope, &fn_ty(&["T"], vec![ty("T")], ty("T"))).unwrap();
        assert_eq!(f.to_string(), "<T>(<T>) ~> <T>");
        assert!(resolve_annotation(&scope, &ty("T")).is_err());
    }

    #[test]
    fn test_underscore_rejected() {
        let table = table();
        let scope = Scope::new(&table, "a.10x");
        let err = resolve_annotation(&scope, &underscore()).unwrap_err();
        assert_eq!(err.message, "Generic inference not allowed here");
    }
}
