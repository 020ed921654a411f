use crate::error::{GraphError, Result};
use crate::fact::render_fact;
use crate::types::{attr, short_name, Attributes, Node, RelationKind, Relationship, RelationshipKey};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Owned node/relationship accumulation for one parse run.
///
/// Nodes are keyed by uuid and merged on re-insertion; relationships are
/// keyed by `(source, relation, target)` and the first insertion wins. Both
/// keep their insertion order, which is the order callers observe.
#[derive(Debug, Clone, Default)]
pub struct CodeGraph {
    graph: DiGraph<Node, Relationship>,

    /// uuid -> NodeIndex mapping for merges and lookups
    node_index: HashMap<String, NodeIndex>,

    /// Relationship key -> EdgeIndex mapping for deduplication
    edge_index: HashMap<RelationshipKey, EdgeIndex>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or merge its attributes into the existing node with
    /// the same uuid. Keys supplied by `node` overwrite; the stored kind is
    /// kept.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        node.validate()?;
        self.upsert_node(node);
        Ok(())
    }

    /// Insert a relationship unless one with the same key already exists.
    /// Endpoint nodes are created (or merged) with their kind and short name.
    pub fn add_relationship(&mut self, relationship: Relationship) -> Result<()> {
        relationship.validate()?;

        let key = relationship.key();
        if self.edge_index.contains_key(&key) {
            return Ok(());
        }

        let (Some(source_kind), Some(target_kind)) =
            (relationship.source_kind(), relationship.target_kind())
        else {
            // Unknown kind names cannot be materialized as endpoint nodes
            return Err(GraphError::invalid_relationship(
                format!("({}, {}, {})", key.0, key.1, key.2),
                "unrecognized endpoint kind",
            ));
        };

        let from = self.upsert_node(Node::new(
            &relationship.source,
            source_kind,
            short_name(&relationship.source),
        ));
        let to = self.upsert_node(Node::new(
            &relationship.target,
            target_kind,
            short_name(&relationship.target),
        ));

        let idx = self.graph.add_edge(from, to, relationship);
        self.edge_index.insert(key, idx);
        Ok(())
    }

    /// Fold another graph into this one through the idempotent operations
    pub fn merge(&mut self, other: CodeGraph) -> Result<()> {
        let (nodes, relationships) = other.into_parts();
        for node in nodes {
            self.add_node(node)?;
        }
        for relationship in relationships {
            self.add_relationship(relationship)?;
        }
        Ok(())
    }

    fn upsert_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(&node.uuid) {
            if let Some(existing) = self.graph.node_weight_mut(idx) {
                existing.attributes.extend(node.attributes);
            }
            return idx;
        }

        let uuid = node.uuid.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(uuid, idx);
        idx
    }

    /// Find node by uuid
    pub fn node(&self, uuid: &str) -> Option<&Node> {
        self.node_index
            .get(uuid)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Find relationship by key
    pub fn relationship(
        &self,
        source: &str,
        relation: &RelationKind,
        target: &str,
    ) -> Option<&Relationship> {
        let key = (source.to_string(), relation.clone(), target.to_string());
        self.edge_index
            .get(&key)
            .and_then(|&idx| self.graph.edge_weight(idx))
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// All relationships in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.graph
            .edge_indices()
            .filter_map(move |idx| self.graph.edge_weight(idx))
    }

    /// Targets of outgoing `relation` edges from `uuid`, in insertion order
    pub fn targets(&self, uuid: &str, relation: &RelationKind) -> Vec<&Node> {
        let Some(&idx) = self.node_index.get(uuid) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| &e.weight().relation == relation)
            .map(|e| (e.id(), e.target()))
            .collect();
        // petgraph walks adjacency lists newest-first
        edges.sort_by_key(|(edge, _)| edge.index());

        edges
            .into_iter()
            .filter_map(|(_, target)| self.graph.node_weight(target))
            .collect()
    }

    /// Relationship attributes plus the endpoint nodes' docstrings as
    /// `target_docstring` / `source_docstring`
    pub fn enriched_attributes(&self, relationship: &Relationship) -> Attributes {
        let mut attributes = relationship.attributes.clone();
        if let Some(doc) = self.node(&relationship.target).and_then(Node::docstring) {
            attributes.insert(attr::TARGET_DOCSTRING.to_string(), doc.to_string());
        }
        if let Some(doc) = self.node(&relationship.source).and_then(Node::docstring) {
            attributes.insert(attr::SOURCE_DOCSTRING.to_string(), doc.to_string());
        }
        attributes
    }

    /// Render the fact for a relationship, enriched with endpoint docstrings
    pub fn fact(&self, relationship: &Relationship) -> String {
        render_fact(
            &relationship.source,
            &relationship.relation,
            &relationship.target,
            &self.enriched_attributes(relationship),
        )
    }

    /// Facts for every relationship, in relationship order
    pub fn facts(&self) -> Vec<String> {
        self.relationships().map(|rel| self.fact(rel)).collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relationship_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Consume the graph into ordered node and relationship lists
    pub fn into_parts(self) -> (Vec<Node>, Vec<Relationship>) {
        let (nodes, edges) = self.graph.into_nodes_edges();
        (
            nodes.into_iter().map(|n| n.weight).collect(),
            edges.into_iter().map(|e| e.weight).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use pretty_assertions::assert_eq;

    fn has_field(source: &str, target: &str, target_type: &str) -> Relationship {
        Relationship::new(
            source,
            RelationKind::HasField,
            target,
            NodeKind::Class,
            NodeKind::Field,
        )
        .with_attr(attr::TARGET_TYPE, target_type)
    }

    #[test]
    fn relationship_first_write_wins() {
        let mut graph = CodeGraph::new();
        graph.add_relationship(has_field("cb.A", "cb.A.x", "int")).unwrap();
        graph.add_relationship(has_field("cb.A", "cb.A.x", "str")).unwrap();

        assert_eq!(graph.relationship_count(), 1);
        let stored = graph
            .relationship("cb.A", &RelationKind::HasField, "cb.A.x")
            .unwrap();
        assert_eq!(stored.attribute(attr::TARGET_TYPE), Some("int"));
    }

    #[test]
    fn relationship_creates_endpoint_nodes() {
        let mut graph = CodeGraph::new();
        graph.add_relationship(has_field("cb.m.A", "cb.m.A.x", "int")).unwrap();

        let field = graph.node("cb.m.A.x").unwrap();
        assert_eq!(field.kind, NodeKind::Field);
        assert_eq!(field.name(), Some("x"));
        assert_eq!(graph.node("cb.m.A").unwrap().kind, NodeKind::Class);
    }

    #[test]
    fn node_merge_is_union_with_overwrite() {
        let mut graph = CodeGraph::new();
        graph
            .add_node(Node::new("cb.A", NodeKind::Class, "A").with_attr("reference", "a.py"))
            .unwrap();
        graph
            .add_node(Node::new("cb.A", NodeKind::Method, "A").with_attr("docstring", "Doc."))
            .unwrap();

        let node = graph.node("cb.A").unwrap();
        assert_eq!(node.kind, NodeKind::Class);
        assert_eq!(node.attribute("reference"), Some("a.py"));
        assert_eq!(node.docstring(), Some("Doc."));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn rejects_malformed_records() {
        let mut graph = CodeGraph::new();
        let nameless = Node::from_parts("cb.x", NodeKind::Field, Attributes::new());
        assert!(graph.add_node(nameless).is_err());

        let kindless =
            Relationship::from_parts("cb.A", RelationKind::HasField, "cb.A.x", Attributes::new());
        assert!(graph.add_relationship(kindless).is_err());
        assert!(graph.is_empty());
    }

    #[test]
    fn preserves_insertion_order() {
        let mut graph = CodeGraph::new();
        for name in ["c", "a", "b"] {
            graph
                .add_relationship(has_field("cb.K", &format!("cb.K.{name}"), "int"))
                .unwrap();
        }

        let targets: Vec<_> = graph.relationships().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["cb.K.c", "cb.K.a", "cb.K.b"]);

        let fields: Vec<_> = graph
            .targets("cb.K", &RelationKind::HasField)
            .into_iter()
            .map(|n| n.uuid.as_str())
            .collect();
        assert_eq!(fields, vec!["cb.K.c", "cb.K.a", "cb.K.b"]);

        let (nodes, relationships) = graph.into_parts();
        assert_eq!(nodes[0].uuid, "cb.K");
        assert_eq!(relationships.len(), 3);
    }

    #[test]
    fn fact_includes_endpoint_docstrings() {
        let mut graph = CodeGraph::new();
        let rel = Relationship::new(
            "cb.Dog",
            RelationKind::HasMethod,
            "cb.Dog.bark",
            NodeKind::Class,
            NodeKind::Method,
        );
        graph.add_relationship(rel.clone()).unwrap();
        graph
            .add_node(Node::new("cb.Dog", NodeKind::Class, "Dog").with_attr("docstring", "A dog."))
            .unwrap();
        graph
            .add_node(
                Node::new("cb.Dog.bark", NodeKind::Method, "bark")
                    .with_attr("docstring", "Bark\nloudly."),
            )
            .unwrap();

        assert_eq!(
            graph.fact(&rel),
            "CLASS cb.Dog has method cb.Dog.bark\nBark loudly.\nA dog."
        );
        assert_eq!(graph.facts().len(), 1);
    }

    #[test]
    fn merge_keeps_existing_relationship_attributes() {
        let mut run = CodeGraph::new();
        run.add_relationship(has_field("cb.A", "cb.A.x", "int")).unwrap();

        let mut file = CodeGraph::new();
        file.add_relationship(has_field("cb.A", "cb.A.x", "float")).unwrap();
        file.add_relationship(has_field("cb.A", "cb.A.y", "str")).unwrap();

        run.merge(file).unwrap();
        assert_eq!(run.relationship_count(), 2);
        assert_eq!(
            run.relationship("cb.A", &RelationKind::HasField, "cb.A.x")
                .unwrap()
                .attribute(attr::TARGET_TYPE),
            Some("int")
        );
    }
}
