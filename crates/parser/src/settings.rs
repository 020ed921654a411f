use crate::error::{ParserError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusion policy for a parse run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Descend into directories starting with `_`
    pub include_private_dirs: bool,

    /// Parse files starting with `test_`
    pub include_test_files: bool,

    /// Include members starting with `_`
    pub include_private_members: bool,

    /// Include dunder members (`__init__`, `__call__`, ...)
    pub include_dunder: bool,

    /// Include the module path segment in qualified names
    pub include_module_name: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            include_private_dirs: false,
            include_test_files: false,
            include_private_members: false,
            include_dunder: true,
            include_module_name: true,
        }
    }
}

impl ParserSettings {
    /// Parse settings from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ParserError::Config(e.to_string()))
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ParserError::read(path, source))?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ParserSettings::default();
        assert!(!settings.include_private_dirs);
        assert!(!settings.include_test_files);
        assert!(!settings.include_private_members);
        assert!(settings.include_dunder);
        assert!(settings.include_module_name);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = ParserSettings::from_toml_str(
            r#"
include_private_members = true
include_module_name = false
"#,
        )
        .unwrap();

        assert!(settings.include_private_members);
        assert!(!settings.include_module_name);
        assert!(settings.include_dunder);
        assert!(!settings.include_test_files);
    }

    #[test]
    fn test_invalid_toml() {
        let result = ParserSettings::from_toml_str("include_dunder = \"yes\"");
        assert!(matches!(result, Err(ParserError::Config(_))));
    }
}
