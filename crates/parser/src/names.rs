//! Naming policy and qualified-name construction.

use crate::settings::ParserSettings;
use std::collections::HashMap;
use std::path::{Component, Path};

/// Context a name is qualified in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    Module,
    Class,
    Method,
    Function,
}

/// One open definition on the scope stack
#[derive(Debug, Clone)]
pub enum Scope {
    Class(String),
    /// `saved_params` is the parameter table to restore on exit
    Function {
        name: String,
        saved_params: HashMap<String, String>,
    },
}

/// Stack of enclosing class and function definitions
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
    }

    pub fn pop(&mut self) -> Option<Scope> {
        self.frames.pop()
    }

    /// Innermost open class
    pub fn current_class(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Scope::Class(name) => Some(name.as_str()),
            Scope::Function { .. } => None,
        })
    }

    /// Innermost open function
    pub fn current_function(&self) -> Option<&str> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Scope::Function { name, .. } => Some(name.as_str()),
            Scope::Class(_) => None,
        })
    }
}

/// Dotted module name for a path relative to the codebase root.
///
/// Leading `.`, `/` and `\` characters are stripped, the extension is dropped
/// and separators become dots: `pkg/sub/mod.py` gives `pkg.sub.mod`.
pub fn module_name_from_path(path: &Path) -> String {
    let without_ext = path.with_extension("");
    let segments: Vec<String> = without_ext
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    segments
        .join(".")
        .trim_start_matches(['.', '/', '\\'])
        .replace(['/', '\\'], ".")
}

/// Builds qualified names for one file under a codebase
#[derive(Debug, Clone)]
pub struct NameResolver {
    codebase_name: String,
    module_name: String,
    settings: ParserSettings,
}

impl NameResolver {
    pub fn new(
        codebase_name: impl Into<String>,
        module_name: impl Into<String>,
        settings: ParserSettings,
    ) -> Self {
        Self {
            codebase_name: codebase_name.into(),
            module_name: module_name.into(),
            settings,
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Whether a symbol name passes the member naming policy
    pub fn should_include(&self, name: &str) -> bool {
        if name == "self" {
            return false;
        }
        if name.starts_with("__") && name.ends_with("__") {
            return self.settings.include_dunder;
        }
        if name.starts_with('_') {
            return self.settings.include_private_members;
        }
        true
    }

    /// Whether qualified names carry the module segment
    pub fn includes_module(&self) -> bool {
        self.module_segment().is_some()
    }

    fn module_segment(&self) -> Option<&str> {
        (self.settings.include_module_name && !self.module_name.is_empty())
            .then_some(self.module_name.as_str())
    }

    /// Codebase name plus module name (when enabled): the file's root node
    pub fn root_namespace(&self) -> String {
        match self.module_segment() {
            Some(module) => format!("{}.{module}", self.codebase_name),
            None => self.codebase_name.clone(),
        }
    }

    /// Qualified name of `name` in `context`, or `None` if the policy
    /// excludes it. Scope segments are added only when the context's
    /// required enclosing definitions are open.
    pub fn qualify(&self, name: &str, context: NameContext, scopes: &ScopeStack) -> Option<String> {
        if !self.should_include(name) {
            return None;
        }

        let mut parts: Vec<&str> = vec![self.codebase_name.as_str()];
        parts.extend(self.module_segment());

        let class = scopes.current_class();
        let function = scopes.current_function();
        match context {
            NameContext::Class => parts.extend(class),
            NameContext::Method => {
                if let (Some(class), Some(function)) = (class, function) {
                    parts.push(class);
                    parts.push(function);
                }
            }
            NameContext::Function => {
                if let (None, Some(function)) = (class, function) {
                    parts.push(function);
                }
            }
            NameContext::Module => {}
        }

        parts.push(name);
        Some(parts.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver(settings: ParserSettings) -> NameResolver {
        NameResolver::new("cb", "pkg.mod", settings)
    }

    fn function(name: &str) -> Scope {
        Scope::Function {
            name: name.to_string(),
            saved_params: HashMap::new(),
        }
    }

    #[test]
    fn test_module_name_from_path() {
        assert_eq!(module_name_from_path(Path::new("pkg/sub/mod.py")), "pkg.sub.mod");
        assert_eq!(module_name_from_path(Path::new("./1.py")), "1");
        assert_eq!(module_name_from_path(Path::new("nb.ipynb")), "nb");
    }

    #[test]
    fn test_naming_policy() {
        let defaults = resolver(ParserSettings::default());
        assert!(!defaults.should_include("self"));
        assert!(defaults.should_include("__init__"));
        assert!(!defaults.should_include("_helper"));
        assert!(defaults.should_include("public"));

        let open = resolver(ParserSettings {
            include_private_members: true,
            include_dunder: false,
            ..ParserSettings::default()
        });
        assert!(open.should_include("_helper"));
        assert!(!open.should_include("__init__"));
        assert!(!open.should_include("self"));
    }

    #[test]
    fn test_qualify_by_context() {
        let names = resolver(ParserSettings::default());
        let mut scopes = ScopeStack::default();

        assert_eq!(names.root_namespace(), "cb.pkg.mod");
        assert_eq!(
            names.qualify("x", NameContext::Method, &scopes).as_deref(),
            Some("cb.pkg.mod.x")
        );

        scopes.push(Scope::Class("Dog".to_string()));
        assert_eq!(
            names.qualify("name", NameContext::Class, &scopes).as_deref(),
            Some("cb.pkg.mod.Dog.name")
        );

        scopes.push(function("bark"));
        assert_eq!(
            names.qualify("words", NameContext::Method, &scopes).as_deref(),
            Some("cb.pkg.mod.Dog.bark.words")
        );
        // a function inside a class is not a plain function context
        assert_eq!(
            names.qualify("words", NameContext::Function, &scopes).as_deref(),
            Some("cb.pkg.mod.words")
        );
        assert_eq!(names.qualify("_private", NameContext::Module, &scopes), None);

        scopes.pop();
        scopes.pop();
        scopes.push(function("greet"));
        assert_eq!(
            names.qualify("age", NameContext::Function, &scopes).as_deref(),
            Some("cb.pkg.mod.greet.age")
        );
    }

    #[test]
    fn test_without_module_name() {
        let names = resolver(ParserSettings {
            include_module_name: false,
            ..ParserSettings::default()
        });
        let scopes = ScopeStack::default();
        assert_eq!(names.root_namespace(), "cb");
        assert_eq!(
            names.qualify("x", NameContext::Module, &scopes).as_deref(),
            Some("cb.x")
        );
    }
}
