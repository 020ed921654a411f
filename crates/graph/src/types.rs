use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// String attributes attached to nodes and relationships
pub type Attributes = BTreeMap<String, String>;

/// Attribute keys with a fixed meaning for downstream consumers
pub mod attr {
    pub const NAME: &str = "name";
    pub const REFERENCE: &str = "reference";
    pub const DOCSTRING: &str = "docstring";
    pub const SOURCE_KIND: &str = "source_kind";
    pub const TARGET_KIND: &str = "target_kind";
    pub const SOURCE_NAME: &str = "source_name";
    pub const TARGET_NAME: &str = "target_name";
    pub const TARGET_TYPE: &str = "target_type";
    pub const TARGET_SIGNATURE: &str = "target_signature";
    pub const TARGET_RETURN_TYPE: &str = "target_return_type";
    pub const SOURCE_DOCSTRING: &str = "source_docstring";
    pub const TARGET_DOCSTRING: &str = "target_docstring";
}

/// Entity category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Module,
    Class,
    Function,
    Method,
    Field,
    GlobalVariable,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "MODULE",
            NodeKind::Class => "CLASS",
            NodeKind::Function => "FUNCTION",
            NodeKind::Method => "METHOD",
            NodeKind::Field => "FIELD",
            NodeKind::GlobalVariable => "GLOBAL_VARIABLE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MODULE" => Some(NodeKind::Module),
            "CLASS" => Some(NodeKind::Class),
            "FUNCTION" => Some(NodeKind::Function),
            "METHOD" => Some(NodeKind::Method),
            "FIELD" => Some(NodeKind::Field),
            "GLOBAL_VARIABLE" => Some(NodeKind::GlobalVariable),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge category of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationKind {
    /// Module contains a class, function or global variable
    Contains,

    /// Class has a method
    HasMethod,

    /// Class has a field, attribute or property
    HasField,

    /// Class inherits from another class
    Inherits,

    /// Function or method uses a parameter, field or global
    HasParameter,

    /// Relation name produced outside this crate
    Custom(String),
}

impl RelationKind {
    pub fn as_str(&self) -> &str {
        match self {
            RelationKind::Contains => "CONTAINS",
            RelationKind::HasMethod => "HAS_METHOD",
            RelationKind::HasField => "HAS_FIELD",
            RelationKind::Inherits => "INHERITS",
            RelationKind::HasParameter => "HAS_PARAMETER",
            RelationKind::Custom(name) => name,
        }
    }
}

impl From<String> for RelationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CONTAINS" => RelationKind::Contains,
            "HAS_METHOD" => RelationKind::HasMethod,
            "HAS_FIELD" => RelationKind::HasField,
            "INHERITS" => RelationKind::Inherits,
            "HAS_PARAMETER" => RelationKind::HasParameter,
            _ => RelationKind::Custom(value),
        }
    }
}

impl From<&str> for RelationKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<RelationKind> for String {
    fn from(value: RelationKind) -> Self {
        match value {
            RelationKind::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last segment of a dot-joined qualified name
pub fn short_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Entity in the code graph, identified by its qualified name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Dot-joined qualified name (e.g., "codebase.pkg.module.Class.method")
    pub uuid: String,

    /// Entity category
    pub kind: NodeKind,

    /// Attributes; always carries `name`
    pub attributes: Attributes,
}

impl Node {
    /// Create a node whose `name` attribute is `name`
    pub fn new(uuid: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(attr::NAME.to_string(), name.into());
        Self {
            uuid: uuid.into(),
            kind,
            attributes,
        }
    }

    /// Create a node from raw parts (validated when added to a graph)
    pub fn from_parts(uuid: impl Into<String>, kind: NodeKind, attributes: Attributes) -> Self {
        Self {
            uuid: uuid.into(),
            kind,
            attributes,
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get(attr::NAME).map(String::as_str)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn docstring(&self) -> Option<&str> {
        self.attribute(attr::DOCSTRING)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uuid.is_empty() {
            return Err(GraphError::invalid_node(&self.uuid, "empty uuid"));
        }
        match self.name() {
            Some(name) if !name.is_empty() => Ok(()),
            _ => Err(GraphError::invalid_node(
                &self.uuid,
                "missing `name` attribute",
            )),
        }
    }
}

/// Directed, typed edge between two qualified names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub relation: RelationKind,
    pub target: String,

    /// Attributes; always carries `source_kind` and `target_kind`
    pub attributes: Attributes,
}

/// Deduplication key of a relationship
pub type RelationshipKey = (String, RelationKind, String);

impl Relationship {
    /// Create a relationship carrying its endpoint kinds
    pub fn new(
        source: impl Into<String>,
        relation: RelationKind,
        target: impl Into<String>,
        source_kind: NodeKind,
        target_kind: NodeKind,
    ) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(attr::SOURCE_KIND.to_string(), source_kind.as_str().to_string());
        attributes.insert(attr::TARGET_KIND.to_string(), target_kind.as_str().to_string());
        Self {
            source: source.into(),
            relation,
            target: target.into(),
            attributes,
        }
    }

    /// Create a relationship from raw parts (validated when added to a graph)
    pub fn from_parts(
        source: impl Into<String>,
        relation: RelationKind,
        target: impl Into<String>,
        attributes: Attributes,
    ) -> Self {
        Self {
            source: source.into(),
            relation,
            target: target.into(),
            attributes,
        }
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Insert an attribute only if the key is not already set
    pub fn set_default(&mut self, key: &str, value: impl Into<String>) {
        self.attributes
            .entry(key.to_string())
            .or_insert_with(|| value.into());
    }

    pub fn key(&self) -> RelationshipKey {
        (self.source.clone(), self.relation.clone(), self.target.clone())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn source_kind(&self) -> Option<NodeKind> {
        self.attribute(attr::SOURCE_KIND).and_then(NodeKind::parse)
    }

    pub fn target_kind(&self) -> Option<NodeKind> {
        self.attribute(attr::TARGET_KIND).and_then(NodeKind::parse)
    }

    /// Render this relationship as a fact using its own attributes
    pub fn fact(&self) -> String {
        crate::fact::render_fact(&self.source, &self.relation, &self.target, &self.attributes)
    }

    pub fn validate(&self) -> Result<()> {
        for key in [attr::SOURCE_KIND, attr::TARGET_KIND] {
            let present = self.attribute(key).is_some_and(|value| !value.is_empty());
            if !present {
                return Err(GraphError::invalid_relationship(
                    self.key_label(),
                    format!("missing `{key}` attribute"),
                ));
            }
        }
        if self.source.is_empty() || self.target.is_empty() {
            return Err(GraphError::invalid_relationship(
                self.key_label(),
                "empty endpoint",
            ));
        }
        Ok(())
    }

    fn key_label(&self) -> String {
        format!("({}, {}, {})", self.source, self.relation, self.target)
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) --[{}]--> {} ({})",
            self.source,
            self.attribute(attr::SOURCE_KIND).unwrap_or_default(),
            self.relation,
            self.target,
            self.attribute(attr::TARGET_KIND).unwrap_or_default()
        )
    }
}
