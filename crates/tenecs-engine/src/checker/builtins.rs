//! Built-in types and the importable standard library
//!
//! Default types are visible in every file without an import. Everything
//! else lives in a dotted package and has to be imported by full path,
//! e.g. `import tenecs.string.join`.

use crate::types::{Function, FunctionArgument, KnownType, VariableType};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Struct or interface exported by a standard library package
#[derive(Debug, Clone)]
pub struct Record {
    /// Type with its declared generics as type arguments
    pub known: KnownType,
    /// Fields in declaration order
    pub fields: Vec<(String, VariableType)>,
}

impl Record {
    /// Constructor: one parameter per field, in order
    pub fn constructor(&self) -> Function {
        Function::new(
            self.known.declared_generics.clone(),
            self.fields
                .iter()
                .map(|(name, ty)| FunctionArgument {
                    name: name.clone(),
                    variable_type: ty.clone(),
                })
                .collect(),
            VariableType::Known(self.known.clone()),
        )
    }
}

/// One importable item
#[derive(Debug, Clone, Copy)]
pub enum StdItem<'a> {
    Record(&'a Record),
    Function(&'a Function),
}

#[derive(Debug, Default)]
pub struct StdPackage {
    pub records: FxHashMap<String, Record>,
    pub functions: FxHashMap<String, Function>,
}

/// All standard library packages, keyed by dotted name
#[derive(Debug, Default)]
pub struct StandardLibrary {
    packages: FxHashMap<String, StdPackage>,
}

impl StandardLibrary {
    /// Look up `package.name`
    pub fn lookup(&self, package: &str, name: &str) -> Option<StdItem<'_>> {
        let pkg = self.packages.get(package)?;
        if let Some(record) = pkg.records.get(name) {
            return Some(StdItem::Record(record));
        }
        pkg.functions.get(name).map(StdItem::Function)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    fn package(&mut self, name: &str) -> &mut StdPackage {
        self.packages.entry(name.to_string()).or_default()
    }

    fn function(&mut self, package: &str, name: &str, function: Function) {
        self.package(package).functions.insert(name.to_string(), function);
    }

    fn record(&mut self, package: &str, name: &str, generics: &[&str], interface: bool, fields: Vec<(&str, VariableType)>) {
        let known = KnownType {
            package: package.to_string(),
            name: name.to_string(),
            declared_generics: generics.iter().map(|g| g.to_string()).collect(),
            generics: generics.iter().map(|g| VariableType::type_argument(g)).collect(),
            valid_struct_field: !interface,
        };
        let record = Record {
            known,
            fields: fields.into_iter().map(|(n, t)| (n.to_string(), t)).collect(),
        };
        self.package(package).records.insert(name.to_string(), record);
    }
}

/// Types available without import
pub fn default_types() -> Vec<KnownType> {
    let mut types: Vec<KnownType> = [
        VariableType::string(),
        VariableType::float(),
        VariableType::int(),
        VariableType::boolean(),
        VariableType::void(),
        VariableType::list(VariableType::type_argument("T")),
    ]
    .into_iter()
    .filter_map(|ty| match ty {
        VariableType::Known(known) => Some(known),
        _ => None,
    })
    .collect();
    types.sort_by(|a, b| a.name.cmp(&b.name));
    types
}

/// Whether `name` is one of the default types
pub fn is_default_type(name: &str) -> bool {
    matches!(name, "String" | "Float" | "Int" | "Boolean" | "Void" | "List")
}

pub static STANDARD_LIBRARY: Lazy<StandardLibrary> = Lazy::new(build_standard_library);

fn arg(name: &str, ty: VariableType) -> FunctionArgument {
    FunctionArgument {
        name: name.to_string(),
        variable_type: ty,
    }
}

fn func(generics: &[&str], arguments: Vec<FunctionArgument>, return_type: VariableType) -> Function {
    Function::new(generics.iter().map(|g| g.to_string()).collect(), arguments, return_type)
}

fn func_type(arguments: Vec<FunctionArgument>, return_type: VariableType) -> VariableType {
    VariableType::Function(func(&[], arguments, return_type))
}

/// Reference to a non-generic interface
fn interface(package: &str, name: &str) -> VariableType {
    VariableType::Known(KnownType {
        package: package.to_string(),
        name: name.to_string(),
        declared_generics: Vec::new(),
        generics: Vec::new(),
        valid_struct_field: false,
    })
}

fn build_standard_library() -> StandardLibrary {
    let mut lib = StandardLibrary::default();
    let string = VariableType::string;
    let int = VariableType::int;
    let boolean = VariableType::boolean;
    let void = VariableType::void;
    let t = || VariableType::type_argument("T");
    let a = || VariableType::type_argument("A");
    let b = || VariableType::type_argument("B");

    lib.function("tenecs.string", "join", func(&[], vec![arg("left", string()), arg("right", string())], string()));
    lib.function("tenecs.string", "startsWith", func(&[], vec![arg("str", string()), arg("prefix", string())], boolean()));
    lib.function("tenecs.string", "length", func(&[], vec![arg("str", string())], int()));

    for name in ["plus", "minus", "times"] {
        lib.function("tenecs.int", name, func(&[], vec![arg("a", int()), arg("b", int())], int()));
    }
    lib.function("tenecs.int", "lessThan", func(&[], vec![arg("a", int()), arg("b", int())], boolean()));

    lib.function("tenecs.boolean", "and", func(&[], vec![arg("a", boolean()), arg("b", boolean())], boolean()));
    lib.function("tenecs.boolean", "or", func(&[], vec![arg("a", boolean()), arg("b", boolean())], boolean()));
    lib.function("tenecs.boolean", "not", func(&[], vec![arg("b", boolean())], boolean()));

    lib.function("tenecs.compare", "eq", func(&["T"], vec![arg("first", t()), arg("second", t())], boolean()));

    lib.function(
        "tenecs.list",
        "map",
        func(
            &["A", "B"],
            vec![
                arg("list", VariableType::list(a())),
                arg("f", func_type(vec![arg("a", a())], b())),
            ],
            VariableType::list(b()),
        ),
    );
    lib.function(
        "tenecs.list",
        "filter",
        func(
            &["A"],
            vec![
                arg("list", VariableType::list(a())),
                arg("keep", func_type(vec![arg("a", a())], boolean())),
            ],
            VariableType::list(a()),
        ),
    );
    lib.function("tenecs.list", "length", func(&["A"], vec![arg("list", VariableType::list(a()))], int()));
    lib.function(
        "tenecs.list",
        "append",
        func(&["A"], vec![arg("list", VariableType::list(a())), arg("a", a())], VariableType::list(a())),
    );

    lib.record("tenecs.error", "Error", &[], false, vec![("message", string())]);

    let assert = interface("tenecs.test", "Assert");
    let kit = interface("tenecs.test", "UnitTestKit");
    let unit_test = interface("tenecs.test", "UnitTest");
    let registry = interface("tenecs.test", "UnitTestRegistry");
    lib.record(
        "tenecs.test",
        "Assert",
        &[],
        true,
        vec![
            (
                "equal",
                VariableType::function(vec!["T".to_string()], vec![arg("value", t()), arg("expected", t())], void()),
            ),
            ("fail", func_type(vec![arg("message", string())], void())),
        ],
    );
    lib.record("tenecs.test", "UnitTestKit", &[], true, vec![("assert", assert)]);
    lib.record(
        "tenecs.test",
        "UnitTest",
        &[],
        true,
        vec![("name", string()), ("theTest", func_type(vec![arg("testkit", kit)], void()))],
    );
    lib.record(
        "tenecs.test",
        "UnitTestRegistry",
        &[],
        true,
        vec![("test", func_type(vec![arg("test", unit_test)], void()))],
    );
    lib.record(
        "tenecs.test",
        "UnitTestSuite",
        &[],
        true,
        vec![("name", string()), ("tests", func_type(vec![arg("registry", registry)], void()))],
    );

    let console = interface("tenecs.go", "Console");
    let runtime = interface("tenecs.go", "Runtime");
    lib.record("tenecs.go", "Console", &[], true, vec![("log", func_type(vec![arg("message", string())], void()))]);
    lib.record("tenecs.go", "Runtime", &[], true, vec![("console", console)]);
    lib.record("tenecs.go", "Main", &[], true, vec![("main", func_type(vec![arg("runtime", runtime.clone())], void()))]);
    lib.record(
        "tenecs.test",
        "GoIntegrationTest",
        &[],
        true,
        vec![("name", string()), ("theTest", func_type(vec![arg("runtime", runtime)], void()))],
    );

    let model = || VariableType::type_argument("Model");
    let event = || VariableType::type_argument("Event");
    lib.record(
        "tenecs.web",
        "WebApp",
        &["Model", "Event"],
        true,
        vec![
            ("init", func_type(vec![], model())),
            ("update", func_type(vec![arg("model", model()), arg("event", event())], model())),
            ("view", func_type(vec![arg("model", model())], string())),
        ],
    );

    lib
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BUILTIN_PACKAGE;

    #[test]
    fn test_default_types() {
        let names: Vec<String> = default_types().into_iter().map(|k| k.name).collect();
        assert_eq!(names, vec!["Boolean", "Float", "Int", "List", "String", "Void"]);
        assert!(default_types().iter().all(|k| k.package == BUILTIN_PACKAGE));
    }

    #[test]
    fn test_lookup_function() {
        match STANDARD_LIBRARY.lookup("tenecs.string", "join") {
            Some(StdItem::Function(f)) => assert_eq!(f.to_string(), "(String, String) ~> String"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(STANDARD_LIBRARY.lookup("tenecs.string", "nope").is_none());
        assert!(STANDARD_LIBRARY.lookup("tenecs.nope", "join").is_none());
    }

    #[test]
    fn test_record_constructor() {
        match STANDARD_LIBRARY.lookup("tenecs.error", "Error") {
            Some(StdItem::Record(record)) => {
                assert!(record.known.valid_struct_field);
                assert_eq!(record.constructor().to_string(), "(String) ~> tenecs.error.Error");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interfaces_are_not_struct_fields() {
        match STANDARD_LIBRARY.lookup("tenecs.test", "UnitTest") {
            Some(StdItem::Record(record)) => assert!(!record.known.valid_struct_field),
            other => panic!("unexpected {:?}", other),
        }
    }
}
