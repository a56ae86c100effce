//! Name binding - builds the package symbol table
//!
//! The binder runs sequentially before any declaration is checked:
//!
//! 1. Validate the package name shared by all files
//! 2. Register every struct and interface type
//! 3. Resolve imports against the standard library
//! 4. Resolve type aliases, retrying until no alias makes progress
//! 5. Resolve struct fields, build constructors and pick witness fields
//! 6. Desugar top-level declarations and bind their types, inferring
//!    unannotated ones to a fixpoint
//!
//! Failures in steps 1 to 5 and duplicate package-level names abort the
//! whole check. Failures in step 6 belong to a single declaration.

use super::annotation::{resolve_annotation, AnnotationResolver};
use super::builtins::{StdItem, STANDARD_LIBRARY};
use super::checker::TypeChecker;
use super::desugar::Desugarer;
use super::error::{CheckError, ErrorKind};
use super::symbols::{ImportedValue, Scope, SymbolTable, TypeSymbol};
use crate::program::TypeAlias;
use crate::syntax::{self as ast, Name, RecordDeclaration, SourceFile, Span, TopLevelDeclaration};
use crate::types::{witness_fields, Function, FunctionArgument, KnownType, Ref, VariableType};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// A top-level declaration ready for checking
#[derive(Debug, Clone)]
pub struct BoundDeclaration {
    pub file: String,
    pub name: Name,
    pub span: Span,
    /// Desugared declaration and its type, or why it could not be bound
    pub result: Result<(ast::Declaration, VariableType), CheckError>,
}

/// Output of binding
#[derive(Debug)]
pub struct Bound {
    pub table: SymbolTable,
    /// In file order, then source order
    pub declarations: Vec<BoundDeclaration>,
}

/// Bind all files of one package
pub fn bind(files: &[SourceFile]) -> Result<Bound, Vec<CheckError>> {
    Binder::new(files).bind().map_err(|e| vec![e])
}

/// In-progress declaration
struct Slot {
    file: String,
    name: Name,
    span: Span,
    declaration: Result<ast::Declaration, CheckError>,
    variable_type: Option<Result<VariableType, CheckError>>,
}

/// Binder - builds the symbol table from the files of a package
pub struct Binder<'f> {
    files: &'f [SourceFile],
    table: SymbolTable,
    /// Alias names, known before any alias resolves
    alias_names: FxHashSet<String>,
}

impl<'f> Binder<'f> {
    pub fn new(files: &'f [SourceFile]) -> Self {
        let package = files
            .first()
            .map(|f| f.top_level.package.dotted())
            .unwrap_or_default();
        Binder {
            files,
            table: SymbolTable::new(package),
            alias_names: FxHashSet::default(),
        }
    }

    pub fn bind(mut self) -> Result<Bound, CheckError> {
        self.validate_package()?;
        self.bind_types()?;
        self.bind_imports()?;
        self.bind_aliases()?;
        self.bind_records()?;
        let declarations = self.bind_declarations()?;
        Ok(Bound {
            table: self.table,
            declarations,
        })
    }

    fn validate_package(&self) -> Result<(), CheckError> {
        let expected = &self.table.package;
        for file in self.files {
            let package = &file.top_level.package;
            for segment in &package.path {
                let valid = segment.text.chars().next().map_or(false, |c| c.is_lowercase())
                    && segment.text.chars().all(|c| c.is_alphanumeric() || c == '_');
                if !valid {
                    return Err(CheckError::type_mismatch(
                        &file.name,
                        segment.span,
                        "package name should start with a lowercase letter",
                    ));
                }
            }
            let dotted = package.dotted();
            if &dotted != expected {
                return Err(CheckError::type_mismatch(
                    &file.name,
                    package.span,
                    format!("expected package {} but found {}", expected, dotted),
                ));
            }
        }
        Ok(())
    }

    fn records(&self) -> impl Iterator<Item = (&'f SourceFile, &'f RecordDeclaration, bool)> {
        let files: &'f [SourceFile] = self.files;
        files.iter().flat_map(|file| {
            file.top_level.declarations.iter().filter_map(move |d| match d {
                TopLevelDeclaration::Struct(record) => Some((file, record, true)),
                TopLevelDeclaration::Interface(record) => Some((file, record, false)),
                _ => None,
            })
        })
    }

    fn aliases(&self) -> impl Iterator<Item = (&'f SourceFile, &'f ast::TypeAlias)> {
        let files: &'f [SourceFile] = self.files;
        files.iter().flat_map(|file| {
            file.top_level.declarations.iter().filter_map(move |d| match d {
                TopLevelDeclaration::TypeAlias(alias) => Some((file, alias)),
                _ => None,
            })
        })
    }

    fn bind_types(&mut self) -> Result<(), CheckError> {
        let package = self.table.package.clone();
        let mut count = 0;
        for (file, record, is_struct) in self.records() {
            let generics: Vec<String> = record.generics.iter().map(|g| g.text.clone()).collect();
            let known = KnownType {
                package: package.clone(),
                name: record.name.text.clone(),
                declared_generics: generics.clone(),
                generics: generics.iter().map(|g| VariableType::type_argument(g)).collect(),
                valid_struct_field: is_struct,
            };
            self.table
                .define_type(&record.name.text, TypeSymbol::Known(known))
                .map_err(|e| duplicate_type(&file.name, record.name.span, &e.name))?;
            count += 1;
        }

        for (file, alias) in self.aliases() {
            if self.table.has_package_name(&alias.name.text) || !self.alias_names.insert(alias.name.text.clone()) {
                return Err(duplicate_type(&file.name, alias.name.span, &alias.name.text));
            }
        }
        debug!(package = %package, records = count, aliases = self.alias_names.len(), "collected types");
        Ok(())
    }

    fn bind_imports(&mut self) -> Result<(), CheckError> {
        for file in self.files {
            for import in &file.top_level.imports {
                let (name, path) = match import.path.split_last() {
                    Some((name, path)) if !path.is_empty() => (name, path),
                    _ => {
                        return Err(CheckError::unresolved(
                            &file.name,
                            import.span,
                            "all imports belong to a package",
                        ))
                    }
                };
                let package = path.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(".");
                let local = import.alias.as_ref().unwrap_or(name);

                if self.table.has_package_name(&local.text) || self.alias_names.contains(&local.text) {
                    return Err(CheckError::duplicate_declaration(
                        &file.name,
                        local.span,
                        format!("import {} conflicts with a declaration of the same name", local.text),
                    ));
                }

                let item = STANDARD_LIBRARY.lookup(&package, &name.text).ok_or_else(|| {
                    let message = if STANDARD_LIBRARY.has_package(&package) {
                        format!("{} not found in package {}", name.text, package)
                    } else {
                        format!("no package {} found", package)
                    };
                    CheckError::unresolved(&file.name, import.span, message)
                })?;
                let duplicate_import = |_| {
                    CheckError::duplicate_declaration(&file.name, local.span, format!("duplicate import {}", local.text))
                };
                let home = Ref::new(package.clone(), name.text.clone());

                match item {
                    StdItem::Record(record) => {
                        self.table
                            .define_file_type(&file.name, &local.text, TypeSymbol::Known(record.known.clone()))
                            .map_err(duplicate_import)?;
                        let constructor = record.constructor();
                        self.table
                            .define_file_value(
                                &file.name,
                                &local.text,
                                ImportedValue {
                                    package: package.clone(),
                                    name: name.text.clone(),
                                    variable_type: VariableType::Function(constructor.clone()),
                                },
                            )
                            .map_err(duplicate_import)?;
                        self.table.set_fields(home.clone(), record.fields.clone());
                        if !record.known.declared_generics.is_empty() {
                            self.table.match_fields.insert(
                                home.clone(),
                                witness_fields(&record.known.declared_generics, &record.fields),
                            );
                        }
                        self.table.native_functions.insert(home, constructor);
                    }
                    StdItem::Function(function) => {
                        self.table
                            .define_file_value(
                                &file.name,
                                &local.text,
                                ImportedValue {
                                    package: package.clone(),
                                    name: name.text.clone(),
                                    variable_type: VariableType::Function(function.clone()),
                                },
                            )
                            .map_err(duplicate_import)?;
                        self.table.native_functions.insert(home, function.clone());
                    }
                }
                self.table
                    .native_function_packages
                    .entry(file.name.clone())
                    .or_default()
                    .insert(local.text.clone(), package.clone());
                trace!(file = %file.name, import = %local.text, package = %package, "resolved import");
            }
        }
        Ok(())
    }

    fn bind_aliases(&mut self) -> Result<(), CheckError> {
        let mut pending: Vec<(&'f SourceFile, &'f ast::TypeAlias)> = self.aliases().collect();
        let mut rounds = 0;
        while !pending.is_empty() {
            rounds += 1;
            let mut resolved = Vec::new();
            let mut remaining = Vec::new();
            let mut last_error = None;
            for (file, alias) in pending {
                let generics: Vec<String> = alias.generics.iter().map(|g| g.text.clone()).collect();
                let scope = Scope::new(&self.table, &file.name);
                let result = AnnotationResolver::new(&scope)
                    .with_generics(generics.clone())
                    .resolve(&alias.annotation);
                match result {
                    Ok(variable_type) => resolved.push((alias, generics, variable_type)),
                    Err(error) => {
                        last_error = Some(error);
                        remaining.push((file, alias));
                    }
                }
            }
            if resolved.is_empty() {
                if let Some(error) = last_error {
                    return Err(error);
                }
            }
            for (alias, generics, variable_type) in resolved {
                self.table.set_type(
                    &alias.name.text,
                    TypeSymbol::Alias {
                        generics: generics.clone(),
                        ty: variable_type.clone(),
                    },
                );
                self.table.type_aliases.insert(
                    Ref::new(self.table.package.clone(), alias.name.text.clone()),
                    TypeAlias {
                        generics,
                        variable_type,
                    },
                );
            }
            pending = remaining;
        }
        debug!(rounds, "resolved type aliases");
        Ok(())
    }

    fn bind_records(&mut self) -> Result<(), CheckError> {
        let package = self.table.package.clone();
        let mut collected = Vec::new();
        for (file, record, is_struct) in self.records() {
            let generics: Vec<String> = record.generics.iter().map(|g| g.text.clone()).collect();
            let mut seen_generics = FxHashSet::default();
            for generic in &record.generics {
                if !seen_generics.insert(generic.text.as_str()) {
                    return Err(CheckError::duplicate_declaration(
                        &file.name,
                        generic.span,
                        format!("duplicate generic {} in {}", generic.text, record.name.text),
                    ));
                }
            }

            let scope = Scope::new(&self.table, &file.name);
            let mut resolver = AnnotationResolver::new(&scope).with_generics(generics.clone());
            let mut seen_fields = FxHashSet::default();
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                if !seen_fields.insert(field.name.text.as_str()) {
                    return Err(CheckError::duplicate_declaration(
                        &file.name,
                        field.name.span,
                        format!("duplicate field {} in {}", field.name.text, record.name.text),
                    ));
                }
                let variable_type = resolver.resolve(&field.annotation)?;
                if is_struct && !variable_type.can_be_struct_field() {
                    return Err(CheckError::not_found_type(
                        &file.name,
                        field.annotation.span,
                        format!("not found type: {} (are you using an incomparable type?)", variable_type),
                    ));
                }
                fields.push((field.name.text.clone(), variable_type));
            }
            collected.push((file, record, is_struct, generics, fields));
        }

        for (file, record, is_struct, generics, fields) in collected {
            let owner = Ref::new(package.clone(), record.name.text.clone());
            let returns = VariableType::Known(KnownType {
                package: package.clone(),
                name: record.name.text.clone(),
                declared_generics: generics.clone(),
                generics: generics.iter().map(|g| VariableType::type_argument(g)).collect(),
                valid_struct_field: is_struct,
            });
            let constructor = Function::new(
                generics.clone(),
                fields
                    .iter()
                    .map(|(name, ty)| FunctionArgument {
                        name: name.clone(),
                        variable_type: ty.clone(),
                    })
                    .collect(),
                returns,
            );
            self.table
                .define_value(&record.name.text, VariableType::Function(constructor.clone()))
                .map_err(|e| CheckError::duplicate_variable(&file.name, record.name.span, &e.name))?;
            if !generics.is_empty() {
                let witnesses = witness_fields(&generics, &fields);
                trace!(record = %owner, ?witnesses, "witness fields");
                self.table.match_fields.insert(owner.clone(), witnesses);
            }
            self.table.struct_functions.insert(owner.clone(), constructor);
            self.table.set_fields(owner, fields);
        }
        Ok(())
    }

    fn bind_declarations(&mut self) -> Result<Vec<BoundDeclaration>, CheckError> {
        let mut slots = Vec::new();
        let mut names = FxHashSet::default();
        for file in self.files {
            let desugarer = Desugarer::new(&file.name);
            for declaration in &file.top_level.declarations {
                let declaration = match declaration {
                    TopLevelDeclaration::Declaration(declaration) => declaration,
                    _ => continue,
                };
                let name = &declaration.name;
                if self.table.has_package_name(&name.text)
                    || self.alias_names.contains(&name.text)
                    || !names.insert(name.text.clone())
                {
                    return Err(CheckError::duplicate_variable(&file.name, name.span, &name.text));
                }
                let desugared = if name.text == "true" || name.text == "false" {
                    Err(CheckError::type_mismatch(
                        &file.name,
                        name.span,
                        format!("Variable can't be named '{}'", name.text),
                    ))
                } else {
                    desugarer.top_level_declaration(declaration.clone())
                };
                slots.push(Slot {
                    file: file.name.clone(),
                    name: name.clone(),
                    span: declaration.span,
                    declaration: desugared,
                    variable_type: None,
                });
            }
        }

        // annotated declarations are typed up front
        for slot in &mut slots {
            let declaration = match &slot.declaration {
                Ok(declaration) => declaration,
                Err(error) => {
                    slot.variable_type = Some(Err(error.clone()));
                    continue;
                }
            };
            if let Some(annotation) = &declaration.annotation {
                let scope = Scope::new(&self.table, &slot.file);
                let result = resolve_annotation(&scope, annotation);
                if let Ok(variable_type) = &result {
                    self.table
                        .define_value(&slot.name.text, variable_type.clone())
                        .map_err(|e| CheckError::duplicate_variable(&slot.file, slot.name.span, &e.name))?;
                }
                slot.variable_type = Some(result);
            }
        }

        self.infer_declarations(&mut slots)?;

        Ok(slots
            .into_iter()
            .map(|slot| {
                let result = match (slot.declaration, slot.variable_type) {
                    (Ok(declaration), Some(Ok(variable_type))) => Ok((declaration, variable_type)),
                    (_, Some(Err(error))) | (Err(error), _) => Err(error),
                    (Ok(_), None) => Err(CheckError::unresolved(
                        &slot.file,
                        slot.name.span,
                        format!("Could not determine the type of '{}', please annotate it", slot.name.text),
                    )),
                };
                BoundDeclaration {
                    file: slot.file,
                    name: slot.name,
                    span: slot.span,
                    result,
                }
            })
            .collect())
    }

    /// Infer unannotated declarations until no more can be typed
    fn infer_declarations(&mut self, slots: &mut [Slot]) -> Result<(), CheckError> {
        let mut pending: FxHashSet<String> = slots
            .iter()
            .filter(|s| !matches!(s.variable_type, Some(Ok(_))))
            .map(|s| s.name.text.clone())
            .collect();
        let mut worklist: Vec<usize> = (0..slots.len()).filter(|i| slots[*i].variable_type.is_none()).collect();
        let mut rounds = 0;

        while !worklist.is_empty() {
            rounds += 1;
            let mut typed = Vec::new();
            let mut failed = Vec::new();
            let mut waiting = Vec::new();
            for i in worklist {
                let slot = &slots[i];
                let declaration = match &slot.declaration {
                    Ok(declaration) => declaration,
                    Err(_) => continue,
                };
                let scope = Scope::new(&self.table, &slot.file).with_pending(&pending);
                let mut checker = TypeChecker::new(scope);
                match checker.infer_top_level(declaration) {
                    Ok(variable_type) => typed.push((i, variable_type)),
                    Err(error) if checker.touched_pending() => waiting.push((i, error)),
                    Err(error) => failed.push((i, error)),
                }
            }

            // a failed declaration stays pending so its dependents report it
            for (i, error) in failed {
                slots[i].variable_type = Some(Err(error));
            }

            let progress = !typed.is_empty();
            for (i, variable_type) in typed {
                let slot = &mut slots[i];
                pending.remove(&slot.name.text);
                self.table
                    .define_value(&slot.name.text, variable_type.clone())
                    .map_err(|e| CheckError::duplicate_variable(&slot.file, slot.name.span, &e.name))?;
                slot.variable_type = Some(Ok(variable_type));
            }

            if !progress {
                for (i, error) in waiting {
                    slots[i].variable_type = Some(Err(error));
                }
                break;
            }
            worklist = waiting.into_iter().map(|(i, _)| i).collect();
        }
        debug!(rounds, "inferred top-level declarations");
        Ok(())
    }
}

fn duplicate_type(file: &str, span: Span, name: &str) -> CheckError {
    CheckError::new(ErrorKind::DuplicateDeclaration, file, span, format!("duplicate type {}", name))
}
