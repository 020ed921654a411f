//! # Codefacts Parser
//!
//! Static analysis of Python codebases into a [`CodeGraph`] of modules,
//! classes, functions, methods, fields and globals.
//!
//! ## Pipeline
//!
//! ```text
//! root directory
//!     │
//!     ├──> CodebaseParser::parse_dir   walk + filters (ignore)
//!     │
//!     ├──> FileTraverser               one file, fresh state
//!     │    ├─> notebook conversion     .ipynb code cells
//!     │    ├─> tree-sitter-python      syntax tree, syntax errors
//!     │    ├─> NameResolver            qualified names + naming policy
//!     │    └─> TypeInferrer            annotations, literals, returns
//!     │
//!     └──> CodeGraph::merge            idempotent run-wide accumulation
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codefacts_parser::{CodebaseParser, ParserSettings};
//!
//! let mut parser = CodebaseParser::new("shop", ParserSettings::default());
//! parser
//!     .parse_source("class Cart:\n    pass\n", "cart.py", "cart.py")
//!     .unwrap();
//! assert!(parser.graph().node("shop.cart.Cart").is_some());
//! ```

mod annotation;
mod codebase;
mod error;
mod infer;
mod language;
mod literal;
mod names;
mod notebook;
mod settings;
mod syntax;
mod traverser;

pub use annotation::{render_annotation, UNKNOWN};
pub use codebase::{CodebaseParser, ParseStats};
pub use error::{ParserError, Result};
pub use infer::{InferredType, Primitive, TypeInferrer};
pub use language::SourceKind;
pub use literal::clean_docstring;
pub use names::{module_name_from_path, NameContext, NameResolver, Scope, ScopeStack};
pub use notebook::notebook_to_source;
pub use settings::ParserSettings;
pub use traverser::FileTraverser;

pub use codefacts_graph::CodeGraph;
