//! Small helpers over tree-sitter nodes.

use tree_sitter::Node;

/// Source text covered by a node; empty on invalid UTF-8 boundaries
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Text of a named field child
pub fn field_text<'s>(node: Node, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field)
        .map(|child| node_text(child, source))
}

/// Named children in order, skipping comments
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// All children in order, named and anonymous
pub fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// First error or missing node in document order, as a 1-based (line, column)
pub fn first_syntax_error(root: Node) -> Option<(usize, usize)> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            return Some((point.row + 1, point.column + 1));
        }
        if node.has_error() {
            let mut kids = children(node);
            kids.reverse();
            stack.extend(kids);
        }
    }
    let point = root.start_position();
    Some((point.row + 1, point.column + 1))
}
