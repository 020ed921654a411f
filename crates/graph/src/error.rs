use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Malformed graph records. These indicate a bug in the producer, so callers
/// should propagate them instead of skipping the offending record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Invalid node {uuid}: {reason}")]
    InvalidNode { uuid: String, reason: String },

    #[error("Invalid relationship {key}: {reason}")]
    InvalidRelationship { key: String, reason: String },
}

impl GraphError {
    pub fn invalid_node(uuid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            uuid: uuid.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_relationship(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRelationship {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
