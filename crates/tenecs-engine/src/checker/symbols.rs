//! Symbol table and lexical scopes
//!
//! The [`SymbolTable`] holds everything declared at package level plus the
//! per-file imports. It is built once by the binder and then shared
//! read-only by every declaration check. A [`Scope`] layers a stack of
//! local frames over the table for one file.
//!
//! Lookup order for values and types:
//! 1. local frames, innermost first
//! 2. imports of the current file
//! 3. package-level declarations
//! 4. default types (types only)

use super::builtins::{default_types, StdItem, STANDARD_LIBRARY};
use crate::program::TypeAlias;
use crate::types::{
    resolve_generics, Function, KnownType, MatchFields, Ref, Substitution, VariableType,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// What a type name refers to
#[derive(Debug, Clone)]
pub enum TypeSymbol {
    /// Nominal type with its declared generics as type arguments
    Known(KnownType),
    /// `typealias Name<G> = ty`
    Alias { generics: Vec<String>, ty: VariableType },
    /// Generic parameter in scope
    Generic,
}

/// Value brought into a file by an import
#[derive(Debug, Clone)]
pub struct ImportedValue {
    pub package: String,
    /// Name in the exporting package, before aliasing
    pub name: String,
    pub variable_type: VariableType,
}

/// A successfully resolved value reference
#[derive(Debug, Clone)]
pub struct Resolved {
    pub variable_type: VariableType,
    /// Package of a package-level target, `None` for locals
    pub package: Option<String>,
    /// Unaliased name
    pub name: String,
}

/// Why a value reference did not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    /// No such name
    NotFound,
    /// Package-level name whose type is still being inferred
    Pending,
}

/// Name defined twice in the same frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSymbolError {
    pub name: String,
}

/// Package-wide declarations
#[derive(Debug, Default)]
pub struct SymbolTable {
    pub package: String,
    defaults: FxHashMap<String, TypeSymbol>,
    types: FxHashMap<String, TypeSymbol>,
    values: FxHashMap<String, VariableType>,
    file_types: FxHashMap<String, FxHashMap<String, TypeSymbol>>,
    file_values: FxHashMap<String, FxHashMap<String, ImportedValue>>,
    fields: BTreeMap<Ref, Vec<(String, VariableType)>>,
    pub(crate) type_aliases: BTreeMap<Ref, TypeAlias>,
    pub(crate) struct_functions: BTreeMap<Ref, Function>,
    pub(crate) native_functions: BTreeMap<Ref, Function>,
    pub(crate) native_function_packages: BTreeMap<String, BTreeMap<String, String>>,
    pub(crate) match_fields: MatchFields,
}

impl SymbolTable {
    /// Create a table for `package` with the default types in scope
    pub fn new(package: impl Into<String>) -> Self {
        let defaults = default_types()
            .into_iter()
            .map(|known| (known.name.clone(), TypeSymbol::Known(known)))
            .collect();
        SymbolTable {
            package: package.into(),
            defaults,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    pub fn define_type(&mut self, name: &str, symbol: TypeSymbol) -> Result<(), DuplicateSymbolError> {
        if self.types.contains_key(name) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        self.types.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Replace a package-level type, used once aliases resolve
    pub fn set_type(&mut self, name: &str, symbol: TypeSymbol) {
        self.types.insert(name.to_string(), symbol);
    }

    pub fn define_value(&mut self, name: &str, ty: VariableType) -> Result<(), DuplicateSymbolError> {
        if self.values.contains_key(name) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        self.values.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn define_file_type(&mut self, file: &str, name: &str, symbol: TypeSymbol) -> Result<(), DuplicateSymbolError> {
        let types = self.file_types.entry(file.to_string()).or_default();
        if types.contains_key(name) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        types.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn define_file_value(&mut self, file: &str, name: &str, value: ImportedValue) -> Result<(), DuplicateSymbolError> {
        let values = self.file_values.entry(file.to_string()).or_default();
        if values.contains_key(name) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set_fields(&mut self, owner: Ref, fields: Vec<(String, VariableType)>) {
        self.fields.insert(owner, fields);
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Whether `name` is declared at package level, as a type or a value
    pub fn has_package_name(&self, name: &str) -> bool {
        self.types.contains_key(name) || self.values.contains_key(name)
    }

    pub fn package_value(&self, name: &str) -> Option<&VariableType> {
        self.values.get(name)
    }

    /// Declared fields of a type, generics unresolved
    pub fn fields(&self, owner: &Ref) -> Option<&[(String, VariableType)]> {
        self.fields.get(owner).map(|f| f.as_slice())
    }

    pub fn all_fields(&self) -> &BTreeMap<Ref, Vec<(String, VariableType)>> {
        &self.fields
    }

    pub fn match_fields(&self) -> &MatchFields {
        &self.match_fields
    }
}

/// Local bindings introduced by one lexical construct
#[derive(Debug, Default)]
struct Frame {
    values: FxHashMap<String, VariableType>,
    generics: FxHashSet<String>,
}

/// Lexical scope over a [`SymbolTable`] for one file
pub struct Scope<'a> {
    table: &'a SymbolTable,
    file: &'a str,
    frames: Vec<Frame>,
    pending: Option<&'a FxHashSet<String>>,
}

impl<'a> Scope<'a> {
    pub fn new(table: &'a SymbolTable, file: &'a str) -> Self {
        Scope {
            table,
            file,
            frames: vec![Frame::default()],
            pending: None,
        }
    }

    /// Treat `pending` package-level names as not yet typed
    pub fn with_pending(mut self, pending: &'a FxHashSet<String>) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn file(&self) -> &'a str {
        self.file
    }

    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Bind a local in the innermost frame; `_` binds nothing
    pub fn define_value(&mut self, name: &str, ty: VariableType) -> Result<(), DuplicateSymbolError> {
        if name == "_" {
            return Ok(());
        }
        let frame = self.innermost();
        if frame.values.contains_key(name) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        frame.values.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn define_generic(&mut self, name: &str) -> Result<(), DuplicateSymbolError> {
        let frame = self.innermost();
        if !frame.generics.insert(name.to_string()) {
            return Err(DuplicateSymbolError { name: name.to_string() });
        }
        Ok(())
    }

    fn innermost(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn resolve_value(&self, name: &str) -> Result<Resolved, LookupError> {
        for frame in self.frames.iter().rev() {
            if let Some(ty) = frame.values.get(name) {
                return Ok(Resolved {
                    variable_type: ty.clone(),
                    package: None,
                    name: name.to_string(),
                });
            }
        }
        if let Some(imported) = self.table.file_values.get(self.file).and_then(|v| v.get(name)) {
            return Ok(Resolved {
                variable_type: imported.variable_type.clone(),
                package: Some(imported.package.clone()),
                name: imported.name.clone(),
            });
        }
        if self.pending.map_or(false, |p| p.contains(name)) {
            return Err(LookupError::Pending);
        }
        match self.table.values.get(name) {
            Some(ty) => Ok(Resolved {
                variable_type: ty.clone(),
                package: Some(self.table.package.clone()),
                name: name.to_string(),
            }),
            None => Err(LookupError::NotFound),
        }
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeSymbol> {
        if self.frames.iter().rev().any(|f| f.generics.contains(name)) {
            return Some(TypeSymbol::Generic);
        }
        self.table
            .file_types
            .get(self.file)
            .and_then(|t| t.get(name))
            .or_else(|| self.table.types.get(name))
            .or_else(|| self.table.defaults.get(name))
            .cloned()
    }

    /// Fields of `known` with its generics substituted
    ///
    /// Standard library records are reachable without an import, e.g. the
    /// `Runtime` passed to a `Main`.
    pub fn fields_of(&self, known: &KnownType) -> Option<Vec<(String, VariableType)>> {
        let fields = match self.table.fields(&Ref::from(known)) {
            Some(fields) => fields,
            None => match STANDARD_LIBRARY.lookup(&known.package, &known.name)? {
                StdItem::Record(record) => record.fields.as_slice(),
                StdItem::Function(_) => return None,
            },
        };
        let substitution: Substitution = known
            .declared_generics
            .iter()
            .cloned()
            .zip(known.generics.iter().cloned())
            .collect();
        Some(
            fields
                .iter()
                .map(|(name, ty)| (name.clone(), resolve_generics(ty, &substitution)))
                .collect(),
        )
    }
}
