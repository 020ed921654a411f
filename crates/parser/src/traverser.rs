//! Single-file traversal: tree-sitter syntax tree to graph records.

use crate::annotation::{render_annotation, UNKNOWN};
use crate::error::{ParserError, Result};
use crate::infer::TypeInferrer;
use crate::language::{python_language, SourceKind};
use crate::literal::docstring;
use crate::names::{module_name_from_path, NameContext, NameResolver, Scope, ScopeStack};
use crate::notebook::notebook_to_source;
use crate::settings::ParserSettings;
use crate::syntax::{children, field_text, first_syntax_error, named_children, node_text};
use codefacts_graph::{attr, short_name, CodeGraph, NodeKind, RelationKind, Relationship};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Extracts the records of one source file into a fresh [`CodeGraph`].
///
/// Names are qualified with the codebase name and the module name derived
/// from the file's virtual path (its path relative to the codebase root).
#[derive(Debug, Clone)]
pub struct FileTraverser {
    names: NameResolver,
    reference: String,
}

impl FileTraverser {
    pub fn new(
        codebase_name: impl Into<String>,
        virtual_path: impl AsRef<Path>,
        reference: impl Into<String>,
        settings: ParserSettings,
    ) -> Self {
        let module_name = module_name_from_path(virtual_path.as_ref());
        Self {
            names: NameResolver::new(codebase_name, module_name, settings),
            reference: reference.into(),
        }
    }

    pub fn names(&self) -> &NameResolver {
        &self.names
    }

    /// Read and traverse a file on disk
    pub fn traverse_file(&self, path: &Path) -> Result<CodeGraph> {
        let text = std::fs::read_to_string(path).map_err(|e| ParserError::read(path, e))?;
        self.traverse_text(&text, path)
    }

    /// Traverse in-memory text; `.ipynb` paths are read as notebook JSON
    pub fn traverse_text(&self, text: &str, path: &Path) -> Result<CodeGraph> {
        match SourceKind::from_path(path) {
            SourceKind::Notebook => {
                let source =
                    notebook_to_source(text).map_err(|message| ParserError::notebook(path, message))?;
                self.traverse_source(&source, path)
            }
            _ => self.traverse_source(text, path),
        }
    }

    /// Traverse Python source text. `path` is only used in error reports.
    pub fn traverse_source(&self, source: &str, path: &Path) -> Result<CodeGraph> {
        let mut parser = Parser::new();
        parser
            .set_language(&python_language())
            .map_err(|e| ParserError::Language(format!("Failed to set language: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParserError::Language("Failed to parse source code".to_string()))?;

        let root = tree.root_node();
        if let Some((line, column)) = first_syntax_error(root) {
            return Err(ParserError::Syntax {
                path: path.to_path_buf(),
                line,
                column,
            });
        }

        let mut visitor = Visitor::new(&self.names, &self.reference, source);
        visitor.visit_module(root)?;
        log::debug!(
            "Traversed {} ({} nodes, {} relationships)",
            path.display(),
            visitor.graph.node_count(),
            visitor.graph.relationship_count()
        );
        Ok(visitor.graph)
    }
}

/// Per-file traversal state
struct Visitor<'a> {
    names: &'a NameResolver,
    reference: &'a str,
    source: &'a str,
    scopes: ScopeStack,
    inferrer: TypeInferrer,
    /// class uuid -> field names assigned on it
    class_fields: HashMap<String, HashSet<String>>,
    graph: CodeGraph,
}

impl<'a> Visitor<'a> {
    fn new(names: &'a NameResolver, reference: &'a str, source: &'a str) -> Self {
        Self {
            names,
            reference,
            source,
            scopes: ScopeStack::default(),
            inferrer: TypeInferrer::new(),
            class_fields: HashMap::new(),
            graph: CodeGraph::new(),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node_text(node, self.source)
    }

    fn current_class(&self) -> Option<String> {
        self.scopes.current_class().map(str::to_string)
    }

    fn qualify(&self, name: &str, context: NameContext) -> Option<String> {
        self.names.qualify(name, context, &self.scopes)
    }

    fn render(&self, annotation: Node) -> String {
        render_annotation(annotation, self.source, self.inferrer.imports())
    }

    /// Add a relationship if both endpoints survived the naming policy.
    /// Fills `reference`, `source_name` and (except for INHERITS)
    /// `target_name` when the caller did not set them.
    fn relate(
        &mut self,
        source: Option<String>,
        relation: RelationKind,
        target: Option<String>,
        kinds: (NodeKind, NodeKind),
        extras: &[(&str, &str)],
    ) -> Result<()> {
        let (Some(source), Some(target)) = (source, target) else {
            return Ok(());
        };
        let source_name = short_name(&source).to_string();
        let target_name = short_name(&target).to_string();
        let inherits = relation == RelationKind::Inherits;

        let mut relationship = Relationship::new(source, relation, target, kinds.0, kinds.1);
        for (key, value) in extras {
            relationship = relationship.with_attr(key, *value);
        }
        relationship.set_default(attr::REFERENCE, self.reference);
        relationship.set_default(attr::SOURCE_NAME, source_name);
        if !inherits {
            relationship.set_default(attr::TARGET_NAME, target_name);
        }
        self.graph.add_relationship(relationship)?;
        Ok(())
    }

    /// Ensure an entity node carrying `name`, `reference` and `extras`
    fn entity(&mut self, uuid: String, kind: NodeKind, name: &str, extras: &[(&str, &str)]) -> Result<()> {
        let mut node =
            codefacts_graph::Node::new(uuid, kind, name).with_attr(attr::REFERENCE, self.reference);
        for (key, value) in extras {
            node = node.with_attr(key, *value);
        }
        self.graph.add_node(node)?;
        Ok(())
    }

    fn visit(&mut self, node: Node) -> Result<()> {
        match node.kind() {
            "class_definition" => self.visit_class(node, &[]),
            "function_definition" => self.visit_function(node, &[]),
            "decorated_definition" => self.visit_decorated(node),
            "import_statement" => {
                self.record_import(node);
                Ok(())
            }
            "import_from_statement" | "future_import_statement" => {
                self.record_from_import(node);
                Ok(())
            }
            "global_statement" | "nonlocal_statement" | "comment" | "case_pattern" => Ok(()),
            "assignment" => self.visit_assignment(node),
            "augmented_assignment" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.visit_target(left)?;
                }
                match node.child_by_field_name("right") {
                    Some(right) => self.visit(right),
                    None => Ok(()),
                }
            }
            "for_statement" | "for_in_clause" => {
                let left = node.child_by_field_name("left");
                if let Some(left) = left {
                    self.visit_target(left)?;
                }
                for child in named_children(node) {
                    if Some(child) != left {
                        self.visit(child)?;
                    }
                }
                Ok(())
            }
            "named_expression" => match node.child_by_field_name("value") {
                Some(value) => self.visit(value),
                None => Ok(()),
            },
            "delete_statement" => {
                for child in named_children(node) {
                    self.visit_target(child)?;
                }
                Ok(())
            }
            "attribute" => match node.child_by_field_name("object") {
                Some(object) => self.visit(object),
                None => Ok(()),
            },
            "keyword_argument" => match node.child_by_field_name("value") {
                Some(value) => self.visit(value),
                None => Ok(()),
            },
            "parameters" | "lambda_parameters" => self.visit_parameter_parts(node),
            "identifier" => self.visit_load(node),
            _ => self.visit_children(node),
        }
    }

    /// Visit named children; a child right after an `as` keyword is a
    /// binding (`with ... as f`, `except E as e`).
    fn visit_children(&mut self, node: Node) -> Result<()> {
        let mut after_as = false;
        for child in children(node) {
            if !child.is_named() {
                after_as = child.kind() == "as";
                continue;
            }
            if after_as {
                self.visit_target(child)?;
            } else {
                self.visit(child)?;
            }
            after_as = false;
        }
        Ok(())
    }

    /// Visit a binding position: bound names are not loads, but the
    /// expressions inside attribute and subscript targets are.
    fn visit_target(&mut self, node: Node) -> Result<()> {
        match node.kind() {
            "identifier" => Ok(()),
            "attribute" => match node.child_by_field_name("object") {
                Some(object) => self.visit(object),
                None => Ok(()),
            },
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "expression_list" | "parenthesized_expression" | "as_pattern_target"
            | "list_splat_pattern" | "list_splat" => {
                for child in named_children(node) {
                    self.visit_target(child)?;
                }
                Ok(())
            }
            _ => self.visit(node),
        }
    }

    fn visit_module(&mut self, root: Node) -> Result<()> {
        let namespace = self.names.root_namespace();
        let module_name = self.names.module_name();
        let stem = module_name.rsplit('.').next().unwrap_or(module_name);

        let mut module = codefacts_graph::Node::new(
            namespace.clone(),
            NodeKind::Module,
            short_name(&namespace),
        );
        if self.names.includes_module() && self.names.should_include(stem) {
            module = module.with_attr(attr::REFERENCE, self.reference);
            if let Some(doc) = docstring(root, self.source) {
                module = module.with_attr(attr::DOCSTRING, doc);
            }
        }
        self.graph.add_node(module)?;

        self.visit_children(root)
    }

    fn record_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            match name.kind() {
                "dotted_name" => {
                    let full = self.text(name);
                    let alias = full.rsplit('.').next().unwrap_or(full);
                    self.inferrer.add_import(alias, full);
                }
                "aliased_import" => {
                    let (Some(module), Some(alias)) = (
                        field_text(name, "name", self.source),
                        field_text(name, "alias", self.source),
                    ) else {
                        continue;
                    };
                    self.inferrer.add_import(alias, module);
                }
                _ => {}
            }
        }
    }

    fn record_from_import(&mut self, node: Node) {
        let module = if node.kind() == "future_import_statement" {
            "__future__"
        } else {
            match node.child_by_field_name("module_name") {
                // leading dots of a relative import are dropped
                Some(relative) if relative.kind() == "relative_import" => named_children(relative)
                    .into_iter()
                    .find(|child| child.kind() == "dotted_name")
                    .map(|dotted| self.text(dotted))
                    .unwrap_or(""),
                Some(module) => self.text(module),
                None => "",
            }
        };

        let mut cursor = node.walk();
        let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            let (imported, alias) = match name.kind() {
                "dotted_name" => (self.text(name), self.text(name)),
                "aliased_import" => match (
                    field_text(name, "name", self.source),
                    field_text(name, "alias", self.source),
                ) {
                    (Some(imported), Some(alias)) => (imported, alias),
                    _ => continue,
                },
                _ => continue,
            };
            let target = if module.is_empty() {
                imported.to_string()
            } else {
                format!("{module}.{imported}")
            };
            self.inferrer.add_import(alias, target);
        }
    }

    fn visit_decorated(&mut self, node: Node) -> Result<()> {
        let decorators: Vec<Node> = named_children(node)
            .into_iter()
            .filter(|child| child.kind() == "decorator")
            .collect();
        match node.child_by_field_name("definition") {
            Some(definition) if definition.kind() == "class_definition" => {
                self.visit_class(definition, &decorators)
            }
            Some(definition) if definition.kind() == "function_definition" => {
                self.visit_function(definition, &decorators)
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_class(&mut self, node: Node, decorators: &[Node]) -> Result<()> {
        let Some(name) = field_text(node, "name", self.source) else {
            return self.visit_children(node);
        };
        if !self.names.should_include(name) {
            return Ok(());
        }

        let namespace = self.names.root_namespace();
        let class_uuid = self.qualify(name, NameContext::Module);
        let superclasses = node.child_by_field_name("superclasses");
        let bases: Vec<Node> = superclasses
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|base| !matches!(base.kind(), "keyword_argument" | "dictionary_splat"))
            .collect();

        let written: Vec<String> = bases
            .iter()
            .map(|base| match base.kind() {
                "identifier" => self.text(*base).to_string(),
                _ => self.render(*base),
            })
            .collect();
        let signature = if written.is_empty() {
            format!("class {name}")
        } else {
            format!("class {name}({})", written.join(", "))
        };

        self.relate(
            Some(namespace.clone()),
            RelationKind::Contains,
            class_uuid.clone(),
            (NodeKind::Module, NodeKind::Class),
            &[(attr::TARGET_SIGNATURE, signature.as_str())],
        )?;

        let body = node.child_by_field_name("body");
        if let (Some(uuid), Some(doc)) = (&class_uuid, body.and_then(|b| docstring(b, self.source))) {
            self.entity(uuid.clone(), NodeKind::Class, name, &[(attr::DOCSTRING, doc.as_str())])?;
        }

        for (base, written) in bases.iter().zip(&written) {
            let target = match base.kind() {
                "identifier" => {
                    if !self.names.should_include(written) {
                        continue;
                    }
                    match self.inferrer.import(written) {
                        Some(imported) => imported.to_string(),
                        None => format!("{namespace}.{written}"),
                    }
                }
                _ => {
                    if written == UNKNOWN || !self.names.should_include(short_name(written)) {
                        continue;
                    }
                    written.clone()
                }
            };
            self.relate(
                class_uuid.clone(),
                RelationKind::Inherits,
                Some(target),
                (NodeKind::Class, NodeKind::Class),
                &[],
            )?;
        }

        self.scopes.push(Scope::Class(name.to_string()));
        let result = self.visit_class_parts(superclasses, body, decorators);
        self.scopes.pop();
        result
    }

    fn visit_class_parts(
        &mut self,
        superclasses: Option<Node>,
        body: Option<Node>,
        decorators: &[Node],
    ) -> Result<()> {
        for part in superclasses.into_iter().chain(body) {
            self.visit(part)?;
        }
        for decorator in decorators {
            self.visit(*decorator)?;
        }
        Ok(())
    }

    fn visit_function(&mut self, node: Node, decorators: &[Node]) -> Result<()> {
        let Some(name) = field_text(node, "name", self.source) else {
            return self.visit_children(node);
        };
        let params: Vec<(String, String)> = node
            .child_by_field_name("parameters")
            .map(|parameters| self.regular_parameters(parameters))
            .unwrap_or_default()
            .into_iter()
            .filter(|(param, _)| self.names.should_include(param))
            .collect();

        // an excluded definition still contributes its parameters as fields
        if !self.names.should_include(name) {
            self.record_parameter_fields(&params)?;
            return self.visit_function_parts(node, decorators);
        }

        let body = node.child_by_field_name("body");
        let return_type = self.return_type(node, body);
        let rendered: Vec<String> = params.iter().map(|(param, ty)| format!("{param}: {ty}")).collect();
        let signature = format!("{name}(self, {}) -> {return_type}", rendered.join(", "));

        let class = self.current_class();
        let (source, relation, target, kinds) = match &class {
            Some(class) => (
                self.qualify(class, NameContext::Module),
                RelationKind::HasMethod,
                self.qualify(name, NameContext::Class),
                (NodeKind::Class, NodeKind::Method),
            ),
            None => (
                Some(self.names.root_namespace()),
                RelationKind::Contains,
                self.qualify(name, NameContext::Module),
                (NodeKind::Module, NodeKind::Function),
            ),
        };
        self.relate(
            source,
            relation,
            target.clone(),
            kinds,
            &[
                (attr::TARGET_SIGNATURE, signature.as_str()),
                (attr::TARGET_RETURN_TYPE, return_type.as_str()),
            ],
        )?;
        if let (Some(uuid), Some(doc)) = (target, body.and_then(|b| docstring(b, self.source))) {
            self.entity(uuid, kinds.1, name, &[(attr::DOCSTRING, doc.as_str())])?;
        }

        self.record_parameter_fields(&params)?;

        let mut table = self.inferrer.params().clone();
        table.extend(params);
        let saved_params = self.inferrer.replace_params(table);
        self.scopes.push(Scope::Function {
            name: name.to_string(),
            saved_params,
        });
        let result = self.visit_function_parts(node, decorators);
        if let Some(Scope::Function { saved_params, .. }) = self.scopes.pop() {
            self.inferrer.replace_params(saved_params);
        }
        result
    }

    /// Parameters become fields of the enclosing class, qualified before
    /// the function's own frame is pushed
    fn record_parameter_fields(&mut self, params: &[(String, String)]) -> Result<()> {
        let Some(class) = self.current_class() else {
            return Ok(());
        };
        let class_uuid = self.qualify(&class, NameContext::Module);
        for (param, ty) in params {
            let field_uuid = self.qualify(param, NameContext::Method);
            self.relate(
                class_uuid.clone(),
                RelationKind::HasField,
                field_uuid.clone(),
                (NodeKind::Class, NodeKind::Field),
                &[(attr::TARGET_TYPE, ty.as_str())],
            )?;
            if let Some(uuid) = field_uuid {
                self.entity(uuid, NodeKind::Field, param, &[(attr::TARGET_TYPE, ty.as_str())])?;
            }
        }
        Ok(())
    }

    fn visit_function_parts(&mut self, node: Node, decorators: &[Node]) -> Result<()> {
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.visit_parameter_parts(parameters)?;
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body)?;
        }
        for decorator in decorators {
            self.visit(*decorator)?;
        }
        if let Some(returns) = node.child_by_field_name("return_type") {
            self.visit(returns)?;
        }
        Ok(())
    }

    /// Annotations, then default values, of every parameter
    fn visit_parameter_parts(&mut self, parameters: Node) -> Result<()> {
        let params = named_children(parameters);
        for param in &params {
            if let Some(annotation) = param.child_by_field_name("type") {
                self.visit(annotation)?;
            }
        }
        for param in &params {
            if let Some(default) = param.child_by_field_name("value") {
                self.visit(default)?;
            }
        }
        Ok(())
    }

    /// Regular positional parameters with their rendered annotations.
    /// Positional-only parameters, `*args`, keyword-only parameters and
    /// `**kwargs` are left out.
    fn regular_parameters(&self, parameters: Node) -> Vec<(String, String)> {
        let params = named_children(parameters);
        let start = params
            .iter()
            .position(|param| param.kind() == "positional_separator")
            .map_or(0, |separator| separator + 1);

        let mut regular = Vec::new();
        for param in &params[start..] {
            let (name, annotation) = match param.kind() {
                "identifier" => (Some(*param), None),
                "typed_parameter" => match named_children(*param).first() {
                    Some(inner) if inner.kind() == "identifier" => {
                        (Some(*inner), param.child_by_field_name("type"))
                    }
                    // `*args: T` / `**kwargs: T`
                    _ => break,
                },
                "default_parameter" | "typed_default_parameter" => (
                    param
                        .child_by_field_name("name")
                        .filter(|name| name.kind() == "identifier"),
                    param.child_by_field_name("type"),
                ),
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
                _ => (None, None),
            };
            let Some(name) = name else {
                continue;
            };
            let ty = annotation
                .map(|annotation| self.render(annotation))
                .unwrap_or_else(|| "Any".to_string());
            regular.push((self.text(name).to_string(), ty));
        }
        regular
    }

    /// Declared return type, or the inferred one when the annotation is
    /// absent or cannot be rendered
    fn return_type(&self, node: Node, body: Option<Node>) -> String {
        match node.child_by_field_name("return_type").map(|ann| self.render(ann)) {
            Some(declared) if declared != UNKNOWN => declared,
            _ => body
                .map(|body| self.inferrer.infer_return(body, self.source).to_string())
                .unwrap_or_else(|| "None".to_string()),
        }
    }

    fn visit_assignment(&mut self, node: Node) -> Result<()> {
        let Some(left) = node.child_by_field_name("left") else {
            return self.visit_children(node);
        };

        if let Some(annotation) = node.child_by_field_name("type") {
            let value = node.child_by_field_name("right");
            if !self.record_annotated(left, annotation, value)? {
                return Ok(());
            }
            self.visit_target(left)?;
            self.visit(annotation)?;
            return match value {
                Some(value) => self.visit(value),
                None => Ok(()),
            };
        }

        // `a = b = v` nests assignments; only the first target is recorded
        let mut targets = vec![left];
        let mut value = node.child_by_field_name("right");
        while let Some(inner) =
            value.filter(|v| v.kind() == "assignment" && v.child_by_field_name("type").is_none())
        {
            targets.extend(inner.child_by_field_name("left"));
            value = inner.child_by_field_name("right");
        }

        if let Some(value) = value {
            self.record_assigned(left, value)?;
        }
        for target in targets {
            self.visit_target(target)?;
        }
        match value {
            Some(value) => self.visit(value),
            None => Ok(()),
        }
    }

    /// Record `target: T [= value]`. Returns `false` when the statement
    /// must not be visited further (`self.x: T` outside a class).
    fn record_annotated(&mut self, target: Node, annotation: Node, value: Option<Node>) -> Result<bool> {
        // the annotation's rendering is kept even when it is `Unknown`; only
        // an empty one (`x: ""`) lets a field fall back to its value
        let declared = self.render(annotation);
        let class = self.current_class();
        let ty = if !declared.is_empty() {
            declared
        } else if class.is_some() {
            value
                .map(|value| self.inferrer.infer(value, self.source).to_string())
                .unwrap_or_else(|| "Any".to_string())
        } else {
            "Any".to_string()
        };

        let in_function = self.scopes.current_function().is_some();
        match target.kind() {
            "identifier" if !in_function => {
                let name = self.text(target);
                match &class {
                    Some(class) => self.record_field(class, name, &ty)?,
                    None => self.record_global(name, &ty)?,
                }
            }
            "attribute" if self.is_self_attribute(target) => {
                let Some(class) = &class else {
                    return Ok(false);
                };
                if let Some(field) = field_text(target, "attribute", self.source) {
                    self.record_field(class, field, &ty)?;
                }
            }
            _ => {}
        }
        Ok(true)
    }

    /// Record `target = value` for the first target of a plain assignment
    fn record_assigned(&mut self, target: Node, value: Node) -> Result<()> {
        let class = self.current_class();
        let in_function = self.scopes.current_function().is_some();
        match (target.kind(), &class) {
            ("attribute", Some(class)) if self.is_self_attribute(target) => {
                let Some(field) = field_text(target, "attribute", self.source) else {
                    return Ok(());
                };
                let ty = self.inferrer.infer(value, self.source).to_string();
                self.record_field(class, field, &ty)
            }
            ("identifier", None) if !in_function => {
                let ty = self.inferrer.infer(value, self.source).to_string();
                self.record_global(self.text(target), &ty)
            }
            _ => Ok(()),
        }
    }

    fn is_self_attribute(&self, node: Node) -> bool {
        node.kind() == "attribute"
            && node
                .child_by_field_name("object")
                .is_some_and(|object| object.kind() == "identifier" && self.text(object) == "self")
    }

    fn record_global(&mut self, name: &str, ty: &str) -> Result<()> {
        let Some(uuid) = self.qualify(name, NameContext::Module) else {
            return Ok(());
        };
        self.inferrer.set_global(name, ty);
        self.relate(
            Some(self.names.root_namespace()),
            RelationKind::Contains,
            Some(uuid.clone()),
            (NodeKind::Module, NodeKind::GlobalVariable),
            &[(attr::TARGET_TYPE, ty)],
        )?;
        self.entity(uuid, NodeKind::GlobalVariable, name, &[(attr::TARGET_TYPE, ty)])
    }

    fn record_field(&mut self, class: &str, field: &str, ty: &str) -> Result<()> {
        let Some(uuid) = self.qualify(field, NameContext::Class) else {
            return Ok(());
        };
        let class_uuid = self.qualify(class, NameContext::Module);
        if let Some(class_uuid) = &class_uuid {
            self.class_fields
                .entry(class_uuid.clone())
                .or_default()
                .insert(field.to_string());
        }
        self.relate(
            class_uuid,
            RelationKind::HasField,
            Some(uuid.clone()),
            (NodeKind::Class, NodeKind::Field),
            &[(attr::TARGET_TYPE, ty)],
        )?;
        self.entity(uuid, NodeKind::Field, field, &[(attr::TARGET_TYPE, ty)])
    }

    /// Resolve an identifier read inside a function against the global,
    /// class-field and parameter tables; later matches override earlier.
    fn visit_load(&mut self, node: Node) -> Result<()> {
        let Some(function) = self.scopes.current_function().map(str::to_string) else {
            return Ok(());
        };
        let name = self.text(node);
        if !self.names.should_include(name) {
            return Ok(());
        }
        let class = self.current_class();

        let mut resolved: Option<(NodeKind, String, Option<String>)> = None;
        if let Some(ty) = self.inferrer.global(name) {
            resolved = Some((
                NodeKind::GlobalVariable,
                ty.to_string(),
                self.qualify(name, NameContext::Module),
            ));
        }
        if let Some(class) = &class {
            let is_field = self
                .qualify(class, NameContext::Module)
                .and_then(|class_uuid| self.class_fields.get(&class_uuid))
                .is_some_and(|fields| fields.contains(name));
            if is_field {
                resolved = Some((
                    NodeKind::Field,
                    UNKNOWN.to_string(),
                    self.qualify(name, NameContext::Class),
                ));
            }
        }
        if let Some(ty) = self.inferrer.param(name) {
            let context = if class.is_some() {
                NameContext::Method
            } else {
                NameContext::Function
            };
            resolved = Some((NodeKind::Field, ty.to_string(), self.qualify(name, context)));
        }

        let Some((target_kind, ty, Some(target))) = resolved else {
            return Ok(());
        };
        let (source, source_kind) = match class {
            Some(_) => (self.qualify(&function, NameContext::Class), NodeKind::Method),
            None => (self.qualify(&function, NameContext::Module), NodeKind::Function),
        };
        self.relate(
            source,
            RelationKind::HasParameter,
            Some(target.clone()),
            (source_kind, target_kind),
            &[(attr::TARGET_NAME, name), (attr::TARGET_TYPE, ty.as_str())],
        )?;
        self.entity(target, target_kind, name, &[])
    }
}
