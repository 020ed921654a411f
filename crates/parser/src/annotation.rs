//! Rendering of type annotations to display strings.

use crate::literal::string_literal;
use crate::syntax::{field_text, named_children, node_text};
use std::collections::HashMap;
use tree_sitter::Node;

/// Rendering of an annotation shape that has no textual form
pub const UNKNOWN: &str = "Unknown";

/// Render an annotation (a `type` node or a bare expression) as written,
/// expanding import aliases on bare identifiers.
///
/// An aliased identifier renders as `<alias target>.<identifier>`, so
/// `from typing import List` turns `List` into `typing.List.List`. Downstream
/// data was produced with this rendering and depends on it.
pub fn render_annotation(node: Node, source: &str, imports: &HashMap<String, String>) -> String {
    match node.kind() {
        "type" | "parenthesized_expression" => named_children(node)
            .into_iter()
            .next()
            .map(|inner| render_annotation(inner, source, imports))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        "identifier" => {
            let name = node_text(node, source);
            match imports.get(name) {
                Some(module) => format!("{module}.{name}"),
                None => name.to_string(),
            }
        }
        "generic_type" => {
            let children = named_children(node);
            let Some(base) = children.first() else {
                return UNKNOWN.to_string();
            };
            let base = render_annotation(*base, source, imports);
            let args: Vec<String> = children
                .iter()
                .filter(|child| child.kind() == "type_parameter")
                .flat_map(|param| named_children(*param))
                .map(|arg| render_annotation(arg, source, imports))
                .collect();
            format!("{base}[{}]", render_args(args))
        }
        "subscript" => {
            let base = node
                .child_by_field_name("value")
                .map(|value| render_annotation(value, source, imports))
                .unwrap_or_else(|| "Any".to_string());
            let mut cursor = node.walk();
            let subscripts: Vec<Node> = node
                .children_by_field_name("subscript", &mut cursor)
                .collect();
            let args: Vec<String> = match subscripts.as_slice() {
                [single] if single.kind() == "tuple" => named_children(*single)
                    .into_iter()
                    .map(|element| render_annotation(element, source, imports))
                    .collect(),
                _ => subscripts
                    .iter()
                    .map(|element| render_annotation(*element, source, imports))
                    .collect(),
            };
            format!("{base}[{}]", render_args(args))
        }
        "attribute" => {
            let base = node
                .child_by_field_name("object")
                .map(|object| render_annotation(object, source, imports))
                .unwrap_or_else(|| "Any".to_string());
            match field_text(node, "attribute", source) {
                Some(attr) => format!("{base}.{attr}"),
                None => UNKNOWN.to_string(),
            }
        }
        "member_type" => {
            let children = named_children(node);
            match children.as_slice() {
                [base, attr] => format!(
                    "{}.{}",
                    render_annotation(*base, source, imports),
                    node_text(*attr, source)
                ),
                _ => UNKNOWN.to_string(),
            }
        }
        "tuple" | "expression_list" => named_children(node)
            .into_iter()
            .map(|element| render_annotation(element, source, imports))
            .collect::<Vec<_>>()
            .join(", "),
        "string" | "concatenated_string" => match string_literal(node, source) {
            Some(literal) if literal.is_formatted => UNKNOWN.to_string(),
            Some(literal) if literal.is_bytes => format!("b'{}'", literal.value),
            Some(literal) => literal.value,
            None => UNKNOWN.to_string(),
        },
        "none" => "None".to_string(),
        "true" => "True".to_string(),
        "false" => "False".to_string(),
        "ellipsis" => "Ellipsis".to_string(),
        "integer" | "float" => node_text(node, source).to_string(),
        _ => UNKNOWN.to_string(),
    }
}

fn render_args(args: Vec<String>) -> String {
    if args.is_empty() {
        "Any".to_string()
    } else {
        args.join(", ")
    }
}
