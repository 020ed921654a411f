use crate::error::{ParserError, Result};
use crate::language::SourceKind;
use crate::settings::ParserSettings;
use crate::traverser::FileTraverser;
use codefacts_graph::{CodeGraph, Node, Relationship};
use ignore::{DirEntry, WalkBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Totals of one directory walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub files_parsed: usize,
    pub files_failed: usize,
    pub nodes: usize,
    pub relationships: usize,
}

/// Accumulates the graph of every file parsed under one codebase name
#[derive(Debug, Clone)]
pub struct CodebaseParser {
    codebase_name: String,
    settings: ParserSettings,
    graph: CodeGraph,
}

impl CodebaseParser {
    pub fn new(codebase_name: impl Into<String>, settings: ParserSettings) -> Self {
        Self {
            codebase_name: codebase_name.into(),
            settings,
            graph: CodeGraph::new(),
        }
    }

    pub fn codebase_name(&self) -> &str {
        &self.codebase_name
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn graph(&self) -> &CodeGraph {
        &self.graph
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> Vec<&Node> {
        self.graph.nodes().collect()
    }

    /// Relationships in insertion order
    pub fn relationships(&self) -> Vec<&Relationship> {
        self.graph.relationships().collect()
    }

    pub fn into_graph(self) -> CodeGraph {
        self.graph
    }

    /// Parse every eligible file under `root`.
    ///
    /// Each file's `reference` is `reference_prefix` followed by its path
    /// relative to `root`. Files that cannot be read, decoded or parsed are
    /// logged and skipped.
    pub fn parse_dir(&mut self, root: impl AsRef<Path>, reference_prefix: &str) -> Result<ParseStats> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ParserError::NotFound(root.to_path_buf()));
        }

        let mut stats = ParseStats::default();
        for path in self.scan(root) {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let relative_text = slash_path(relative);
            let virtual_path = format!("./{relative_text}");
            let reference = format!("{reference_prefix}{relative_text}");

            let traverser = FileTraverser::new(
                self.codebase_name.as_str(),
                &virtual_path,
                reference,
                self.settings,
            );
            match traverser.traverse_file(&path) {
                Ok(file_graph) => {
                    self.graph.merge(file_graph)?;
                    stats.files_parsed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    log::warn!("Skipping {}: {e}", path.display());
                    stats.files_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        stats.nodes = self.graph.node_count();
        stats.relationships = self.graph.relationship_count();
        log::info!(
            "Parsed {} files under {} ({} skipped): {} nodes, {} relationships",
            stats.files_parsed,
            root.display(),
            stats.files_failed,
            stats.nodes,
            stats.relationships
        );
        Ok(stats)
    }

    /// Parse a single file. `virtual_path` is its path relative to the
    /// codebase root and determines the module name.
    pub fn parse_file(
        &mut self,
        path: impl AsRef<Path>,
        virtual_path: impl AsRef<Path>,
        reference: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ParserError::NotFound(path.to_path_buf()));
        }
        let traverser =
            FileTraverser::new(self.codebase_name.as_str(), virtual_path, reference, self.settings);
        let file_graph = traverser.traverse_file(path)?;
        self.graph.merge(file_graph)?;
        Ok(())
    }

    /// Parse in-memory text as if it were the file at `virtual_path`
    pub fn parse_source(
        &mut self,
        source: &str,
        virtual_path: impl AsRef<Path>,
        reference: &str,
    ) -> Result<()> {
        let virtual_path = virtual_path.as_ref();
        let traverser =
            FileTraverser::new(self.codebase_name.as_str(), virtual_path, reference, self.settings);
        let file_graph = traverser.traverse_text(source, virtual_path)?;
        self.graph.merge(file_graph)?;
        Ok(())
    }

    /// Eligible files under `root`, in a stable order
    fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let settings = self.settings;
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| Self::is_walkable(entry, &settings));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if !SourceKind::from_path(path).is_supported() {
                        continue;
                    }
                    if Self::is_shadowed(path) {
                        log::debug!("Skipping {}, a sibling .py defines the module", path.display());
                        continue;
                    }
                    if !settings.include_test_files && Self::is_test_file(path) {
                        log::debug!("Skipping test file {}", path.display());
                        continue;
                    }
                    files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        log::debug!("Found {} source files under {}", files.len(), root.display());
        files
    }

    /// Directory filter: dot-directories are never entered, `_`-directories
    /// only when private directories are enabled
    fn is_walkable(entry: &DirEntry, settings: &ParserSettings) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            return true;
        }
        let Some(name) = entry.file_name().to_str() else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        if name.starts_with('_') && !settings.include_private_dirs {
            log::debug!("Skipping private directory {}", entry.path().display());
            return false;
        }
        true
    }

    /// `mod.pyi`, `mod.pyw` and `mod.ipynb` share a module name with
    /// `mod.py`; the `.py` file wins
    fn is_shadowed(path: &Path) -> bool {
        let is_py = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("py"));
        !is_py && path.with_extension("py").is_file()
    }

    fn is_test_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("test_"))
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    fn scanned(dir: &TempDir, settings: ParserSettings) -> Vec<String> {
        CodebaseParser::new("cb", settings)
            .scan(dir.path())
            .iter()
            .map(|path| slash_path(path.strip_prefix(dir.path()).unwrap()))
            .collect()
    }

    #[test]
    fn test_scan_filters() {
        let dir = tree(&[
            ("a.py", ""),
            ("b.ipynb", "{\"cells\": []}"),
            ("notes.txt", ""),
            ("test_a.py", ""),
            ("pkg/mod.py", ""),
            ("_private/hidden.py", ""),
            (".venv/lib.py", ""),
        ]);

        assert_eq!(scanned(&dir, ParserSettings::default()), vec!["a.py", "b.ipynb", "pkg/mod.py"]);

        let open = ParserSettings {
            include_private_dirs: true,
            include_test_files: true,
            ..ParserSettings::default()
        };
        assert_eq!(
            scanned(&dir, open),
            vec!["_private/hidden.py", "a.py", "b.ipynb", "pkg/mod.py", "test_a.py"]
        );
    }

    #[test]
    fn test_scan_prefers_py_over_stub_siblings() {
        let dir = tree(&[
            ("pkg/mod.py", "def run(x): pass\n"),
            ("pkg/mod.pyi", "def run(x: int) -> None: ...\n"),
            ("pkg/gui.pyw", ""),
            ("pkg/only_stub.pyi", ""),
        ]);
        assert_eq!(
            scanned(&dir, ParserSettings::default()),
            vec!["pkg/gui.pyw", "pkg/mod.py", "pkg/only_stub.pyi"]
        );

        let mut parser = CodebaseParser::new("cb", ParserSettings::default());
        parser.parse_dir(dir.path(), "").unwrap();
        let run = parser
            .graph()
            .relationship("cb.pkg.mod", &codefacts_graph::RelationKind::Contains, "cb.pkg.mod.run")
            .unwrap();
        assert_eq!(run.attribute("target_signature"), Some("run(self, x: Any) -> None"));
    }

    #[test]
    fn test_parse_file_missing() {
        let mut parser = CodebaseParser::new("cb", ParserSettings::default());
        let result = parser.parse_file("/nonexistent/file.py", "file.py", "ref");
        assert!(matches!(result, Err(ParserError::NotFound(_))));
    }

    #[test]
    fn test_parse_dir_references() {
        let dir = tree(&[("pkg/mod.py", "x = 1\n")]);
        let mut parser = CodebaseParser::new("cb", ParserSettings::default());
        let stats = parser
            .parse_dir(dir.path(), "https://example.com/blob/main/")
            .unwrap();

        assert_eq!(stats.files_parsed, 1);
        let global = parser.graph().node("cb.pkg.mod.x").unwrap();
        assert_eq!(
            global.attribute("reference"),
            Some("https://example.com/blob/main/pkg/mod.py")
        );
    }
}
