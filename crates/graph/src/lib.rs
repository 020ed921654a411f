//! # Codefacts Graph
//!
//! Typed entity/relationship graph of a codebase plus the natural-language
//! facts rendered from it.
//!
//! ## Model
//!
//! ```text
//! Node          uuid (qualified name) + kind + attributes{name, ...}
//!   │
//! Relationship  (source, relation, target) + attributes{source_kind, target_kind, ...}
//!   │
//! CodeGraph     ordered, idempotent accumulation (petgraph)
//!   │             ├─ nodes merge attributes on re-insertion
//!   │             └─ relationships keep their first insertion
//!   │
//! Fact          "CLASS cb.mod.Dog has method cb.mod.Dog.bark" + docstrings
//! ```

mod error;
mod fact;
mod graph;
mod types;

pub use error::{GraphError, Result};
pub use fact::render_fact;
pub use graph::CodeGraph;
pub use types::{
    attr, short_name, Attributes, Node, NodeKind, RelationKind, Relationship, RelationshipKey,
};
