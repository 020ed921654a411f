use codefacts_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParserError>;

/// Errors that can occur while parsing a codebase
#[derive(Error, Debug)]
pub enum ParserError {
    /// A file named by the caller does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error while reading a file
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid UTF-8
    #[error("Cannot decode {} as UTF-8", path.display())]
    Decode { path: PathBuf },

    /// Source contains a syntax error
    #[error("Syntax error in {} at line {line}, column {column}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    /// Notebook could not be converted to plain source
    #[error("Cannot convert notebook {}: {message}", path.display())]
    Notebook { path: PathBuf, message: String },

    /// Tree-sitter grammar could not be loaded
    #[error("Tree-sitter error: {0}")]
    Language(String),

    /// Invalid parser settings
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed graph record (producer bug)
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl ParserError {
    /// Per-file failures that a directory walk skips over
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Io { .. }
                | Self::Decode { .. }
                | Self::Syntax { .. }
                | Self::Notebook { .. }
        )
    }

    /// Map a read failure to `Decode` or `Io`
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::InvalidData {
            Self::Decode { path }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn notebook(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Notebook {
            path: path.into(),
            message: message.into(),
        }
    }
}
