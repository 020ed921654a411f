use std::path::Path;

/// Kind of source file the traverser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Plain Python source (`.py`, `.pyw`, `.pyi`); a `.py` sibling takes
    /// precedence during directory walks
    Python,
    /// Jupyter notebook; code cells are extracted before parsing
    Notebook,
    Unsupported,
}

impl SourceKind {
    /// Detect source kind from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" | "pyi" => SourceKind::Python,
            "ipynb" => SourceKind::Notebook,
            _ => SourceKind::Unsupported,
        }
    }

    /// Detect source kind from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(SourceKind::Unsupported)
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, SourceKind::Unsupported)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Python => "python",
            SourceKind::Notebook => "notebook",
            SourceKind::Unsupported => "unsupported",
        }
    }
}

/// Tree-sitter grammar used for every supported source kind
pub fn python_language() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceKind::from_extension("py"), SourceKind::Python);
        assert_eq!(SourceKind::from_extension("PY"), SourceKind::Python);
        assert_eq!(SourceKind::from_extension("pyi"), SourceKind::Python);
        assert_eq!(SourceKind::from_extension("ipynb"), SourceKind::Notebook);
        assert_eq!(SourceKind::from_extension("rs"), SourceKind::Unsupported);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(SourceKind::from_path("pkg/mod.py"), SourceKind::Python);
        assert_eq!(SourceKind::from_path("nb/demo.ipynb"), SourceKind::Notebook);
        assert_eq!(SourceKind::from_path("Makefile"), SourceKind::Unsupported);
        assert!(!SourceKind::from_path("README.md").is_supported());
    }
}
