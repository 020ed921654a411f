//! Best-effort static type inference over expression nodes.
//!
//! Inference is purely syntactic. The only outside knowledge is the current
//! parameter table, the module's recorded global types, the import aliases,
//! and a fixed table of builtin call results. Unresolved names and callees
//! render as written; expressions with no rule are `Any`.

use crate::literal::string_literal;
use crate::syntax::{named_children, node_text};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tree_sitter::Node;

/// Builtin callables with a known result type
const BUILTIN_RESULTS: &[(&str, &str)] = &[
    ("int", "int"),
    ("float", "float"),
    ("str", "str"),
    ("bool", "bool"),
    ("list", "List"),
    ("dict", "Dict"),
    ("set", "Set"),
    ("tuple", "Tuple"),
    ("len", "int"),
    ("range", "range"),
    ("enumerate", "enumerate"),
];

/// Built-in constant types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    Bool,
    NoneType,
    Ellipsis,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Complex => "complex",
            Primitive::Str => "str",
            Primitive::Bytes => "bytes",
            Primitive::Bool => "bool",
            Primitive::NoneType => "NoneType",
            Primitive::Ellipsis => "ellipsis",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Primitive::Int,
            "float" => Primitive::Float,
            "complex" => Primitive::Complex,
            "str" => Primitive::Str,
            "bytes" => Primitive::Bytes,
            "bool" => Primitive::Bool,
            "NoneType" => Primitive::NoneType,
            "ellipsis" => Primitive::Ellipsis,
            _ => return None,
        })
    }
}

/// Result of inferring an expression's type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferredType {
    /// Nothing could be determined
    Any,
    Primitive(Primitive),
    /// A type known only by its rendered name (annotations, builtin results)
    Named(String),
    /// `List[..]`, `Set[..]`, `Tuple[..]`, `Dict[..]`
    Generic {
        name: &'static str,
        args: Vec<InferredType>,
    },
    /// Two or more distinct rendered types, kept sorted
    Union(Vec<String>),
}

impl InferredType {
    /// Type for a rendered name, recognizing primitives
    pub fn from_name(name: &str) -> Self {
        match name {
            "Any" => InferredType::Any,
            _ => Primitive::from_name(name)
                .map(InferredType::Primitive)
                .unwrap_or_else(|| InferredType::Named(name.to_string())),
        }
    }

    fn generic(name: &'static str, args: Vec<InferredType>) -> Self {
        InferredType::Generic { name, args }
    }

    /// Combine the types of a function's return points.
    ///
    /// No return points means `None`; a single distinct rendering is kept as
    /// is; several become a sorted `Union`.
    pub fn unify(types: impl IntoIterator<Item = InferredType>) -> Self {
        let mut distinct: BTreeMap<String, InferredType> = BTreeMap::new();
        for ty in types {
            distinct.entry(ty.to_string()).or_insert(ty);
        }
        match distinct.len() {
            0 => InferredType::Named("None".to_string()),
            1 => distinct
                .into_values()
                .next()
                .unwrap_or(InferredType::Any),
            _ => InferredType::Union(distinct.into_keys().collect()),
        }
    }
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferredType::Any => write!(f, "Any"),
            InferredType::Primitive(p) => write!(f, "{}", p.as_str()),
            InferredType::Named(name) => write!(f, "{name}"),
            InferredType::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}[{}]", args.join(", "))
            }
            InferredType::Union(members) => write!(f, "Union[{}]", members.join(", ")),
        }
    }
}

/// Symbol tables consulted during inference
#[derive(Debug, Clone, Default)]
pub struct TypeInferrer {
    params: HashMap<String, String>,
    globals: HashMap<String, String>,
    imports: HashMap<String, String>,
}

impl TypeInferrer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Swap in a new parameter table, returning the previous one
    pub fn replace_params(&mut self, params: HashMap<String, String>) -> HashMap<String, String> {
        std::mem::replace(&mut self.params, params)
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name).map(String::as_str)
    }

    pub fn set_global(&mut self, name: impl Into<String>, ty: impl Into<String>) {
        self.globals.insert(name.into(), ty.into());
    }

    pub fn imports(&self) -> &HashMap<String, String> {
        &self.imports
    }

    pub fn import(&self, alias: &str) -> Option<&str> {
        self.imports.get(alias).map(String::as_str)
    }

    pub fn add_import(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.imports.insert(alias.into(), target.into());
    }

    /// Infer the type of an expression node
    pub fn infer(&self, node: Node, source: &str) -> InferredType {
        match node.kind() {
            "integer" | "float" => {
                let text = node_text(node, source);
                if text.ends_with(['j', 'J']) {
                    InferredType::Primitive(Primitive::Complex)
                } else if node.kind() == "integer" {
                    InferredType::Primitive(Primitive::Int)
                } else {
                    InferredType::Primitive(Primitive::Float)
                }
            }
            "true" | "false" => InferredType::Primitive(Primitive::Bool),
            "none" => InferredType::Primitive(Primitive::NoneType),
            "ellipsis" => InferredType::Primitive(Primitive::Ellipsis),
            "string" | "concatenated_string" => match string_literal(node, source) {
                Some(literal) if literal.is_formatted => InferredType::Any,
                Some(literal) if literal.is_bytes => InferredType::Primitive(Primitive::Bytes),
                Some(_) => InferredType::Primitive(Primitive::Str),
                None => InferredType::Any,
            },
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.infer(*inner, source),
                None => InferredType::Any,
            },
            "list" => self.first_element(node, "List", source),
            "set" => self.first_element(node, "Set", source),
            "tuple" | "expression_list" => {
                let elements = named_children(node);
                if elements.is_empty() {
                    InferredType::generic(
                        "Tuple",
                        vec![InferredType::Any, InferredType::Named("...".to_string())],
                    )
                } else {
                    let args = elements
                        .into_iter()
                        .map(|element| self.infer(element, source))
                        .collect();
                    InferredType::generic("Tuple", args)
                }
            }
            "dictionary" => self.infer_dict(node, source),
            "identifier" => {
                let name = node_text(node, source);
                self.param(name)
                    .or_else(|| self.global(name))
                    .map(InferredType::from_name)
                    .unwrap_or_else(|| InferredType::Named(name.to_string()))
            }
            "call" => match node.child_by_field_name("function") {
                Some(function) if function.kind() == "identifier" => {
                    let name = node_text(function, source);
                    BUILTIN_RESULTS
                        .iter()
                        .find(|(builtin, _)| *builtin == name)
                        .map(|(_, result)| InferredType::from_name(result))
                        .unwrap_or_else(|| InferredType::Named(format!("{name}(...)")))
                }
                Some(function) if function.kind() == "attribute" => {
                    self.infer_attribute(function, source)
                }
                _ => InferredType::Any,
            },
            "attribute" => self.infer_attribute(node, source),
            "binary_operator" => self.infer_binary(node, source),
            "comparison_operator" | "boolean_operator" | "not_operator" => {
                InferredType::Primitive(Primitive::Bool)
            }
            "unary_operator" => match node.child_by_field_name("argument") {
                Some(operand) => self.infer(operand, source),
                None => InferredType::Any,
            },
            _ => InferredType::Any,
        }
    }

    /// Infer a function's return type from every `return` in its body,
    /// including those of nested definitions.
    pub fn infer_return(&self, body: Node, source: &str) -> InferredType {
        let mut types = Vec::new();
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            if node.kind() == "return_statement" {
                types.push(match named_children(node).first() {
                    Some(value) => self.infer(*value, source),
                    None => InferredType::Named("None".to_string()),
                });
                continue;
            }
            let mut kids = named_children(node);
            kids.reverse();
            stack.extend(kids);
        }
        InferredType::unify(types)
    }

    /// `alias.attr` expands through the import table; any other base
    /// leaves just the attribute name
    fn infer_attribute(&self, node: Node, source: &str) -> InferredType {
        let Some(attribute) = node.child_by_field_name("attribute") else {
            return InferredType::Any;
        };
        let attribute = node_text(attribute, source);
        let module = node
            .child_by_field_name("object")
            .filter(|object| object.kind() == "identifier")
            .and_then(|object| self.import(node_text(object, source)));
        match module {
            Some(module) => InferredType::Named(format!("{module}.{attribute}")),
            None => InferredType::from_name(attribute),
        }
    }

    fn first_element(&self, node: Node, name: &'static str, source: &str) -> InferredType {
        let element = named_children(node)
            .first()
            .map(|first| self.infer(*first, source))
            .unwrap_or(InferredType::Any);
        InferredType::generic(name, vec![element])
    }

    fn infer_dict(&self, node: Node, source: &str) -> InferredType {
        let (key, value) = match named_children(node).first() {
            Some(entry) if entry.kind() == "pair" => (
                entry
                    .child_by_field_name("key")
                    .map(|key| self.infer(key, source))
                    .unwrap_or(InferredType::Any),
                entry
                    .child_by_field_name("value")
                    .map(|value| self.infer(value, source))
                    .unwrap_or(InferredType::Any),
            ),
            // `{**other}` has no key expression
            Some(entry) => (
                InferredType::Any,
                named_children(*entry)
                    .first()
                    .map(|inner| self.infer(*inner, source))
                    .unwrap_or(InferredType::Any),
            ),
            None => (InferredType::Any, InferredType::Any),
        };
        InferredType::generic("Dict", vec![key, value])
    }

    fn infer_binary(&self, node: Node, source: &str) -> InferredType {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return InferredType::Any;
        };
        let left = self.infer(left, source);
        let right = self.infer(right, source);
        let (l, r) = (left.to_string(), right.to_string());

        if l == r && matches!(l.as_str(), "int" | "float" | "str") {
            return left;
        }
        let numeric = |t: &str| matches!(t, "int" | "float");
        if numeric(&l) && numeric(&r) && (l == "float" || r == "float") {
            return InferredType::Primitive(Primitive::Float);
        }
        InferredType::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::python_language;
    use pretty_assertions::assert_eq;
    use tree_sitter::Parser;

    /// Infer the right-hand side of `x = <expr>`
    fn infer_with(inferrer: &TypeInferrer, expr: &str) -> String {
        let source = format!("x = {expr}\n");
        let mut parser = Parser::new();
        parser.set_language(&python_language()).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        let statement = tree.root_node().named_child(0).unwrap();
        let assignment = statement.named_child(0).unwrap();
        let value = assignment.child_by_field_name("right").unwrap();
        inferrer.infer(value, &source).to_string()
    }

    fn infer(expr: &str) -> String {
        infer_with(&TypeInferrer::new(), expr)
    }

    #[test]
    fn test_constants() {
        assert_eq!(infer("42"), "int");
        assert_eq!(infer("4.2"), "float");
        assert_eq!(infer("2j"), "complex");
        assert_eq!(infer("'hi'"), "str");
        assert_eq!(infer("b'hi'"), "bytes");
        assert_eq!(infer("True"), "bool");
        assert_eq!(infer("None"), "NoneType");
        assert_eq!(infer("..."), "ellipsis");
        assert_eq!(infer("f'{x}'"), "Any");
    }

    #[test]
    fn test_collections() {
        assert_eq!(infer("[1, 2]"), "List[int]");
        assert_eq!(infer("[]"), "List[Any]");
        assert_eq!(infer("{'a', 'b'}"), "Set[str]");
        assert_eq!(infer("(1, 'a')"), "Tuple[int, str]");
        assert_eq!(infer("()"), "Tuple[Any, ...]");
        assert_eq!(infer("1, 2.0"), "Tuple[int, float]");
        assert_eq!(infer("{'a': 1}"), "Dict[str, int]");
        assert_eq!(infer("{}"), "Dict[Any, Any]");
    }

    #[test]
    fn test_operators() {
        assert_eq!(infer("1 + 2"), "int");
        assert_eq!(infer("1 + 2.0"), "float");
        assert_eq!(infer("'a' + 'b'"), "str");
        assert_eq!(infer("'a' * 3"), "Any");
        assert_eq!(infer("1 < 2"), "bool");
        assert_eq!(infer("a and b"), "bool");
        assert_eq!(infer("not a"), "bool");
        assert_eq!(infer("-1"), "int");
        assert_eq!(infer("(1.5)"), "float");
    }

    #[test]
    fn test_calls_and_names() {
        assert_eq!(infer("len(items)"), "int");
        assert_eq!(infer("list(items)"), "List");
        assert_eq!(infer("make()"), "make(...)");
        assert_eq!(infer("obj.method()"), "method");
        assert_eq!(infer("obj.attr"), "attr");
        assert_eq!(infer("(lambda: 1)()"), "Any");

        let mut inferrer = TypeInferrer::new();
        inferrer.set_global("count", "int");
        inferrer.replace_params(HashMap::from([("name".to_string(), "str".to_string())]));
        assert_eq!(infer_with(&inferrer, "count"), "int");
        assert_eq!(infer_with(&inferrer, "name + name"), "str");
        assert_eq!(infer_with(&inferrer, "unknown"), "unknown");
    }

    #[test]
    fn test_import_aliases_expand_attributes() {
        let mut inferrer = TypeInferrer::new();
        inferrer.add_import("np", "numpy");
        assert_eq!(infer_with(&inferrer, "np.zeros(3)"), "numpy.zeros");
        assert_eq!(infer_with(&inferrer, "np.pi"), "numpy.pi");
        assert_eq!(infer_with(&inferrer, "np.linalg.norm(v)"), "norm");
        assert_eq!(infer_with(&inferrer, "[np.pi]"), "List[numpy.pi]");
    }

    #[test]
    fn test_unify() {
        assert_eq!(InferredType::unify([]).to_string(), "None");
        assert_eq!(
            InferredType::unify([
                InferredType::Primitive(Primitive::Int),
                InferredType::Primitive(Primitive::Int),
            ])
            .to_string(),
            "int"
        );
        assert_eq!(
            InferredType::unify([
                InferredType::Primitive(Primitive::Str),
                InferredType::Primitive(Primitive::Int),
            ])
            .to_string(),
            "Union[int, str]"
        );
    }
}
