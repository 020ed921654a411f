use codefacts_graph::{attr, NodeKind, RelationKind};
use codefacts_parser::{CodebaseParser, ParserError, ParserSettings};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ANIMALS: &str = include_str!("fixtures/animals.py");

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn parse_animals() -> CodebaseParser {
    let mut parser = CodebaseParser::new("cb", ParserSettings::default());
    parser
        .parse_source(ANIMALS, "./animals.py", "repo/animals.py")
        .expect("fixture parses");
    parser
}

#[test]
fn animals_fixture_produces_expected_graph() {
    let parser = parse_animals();
    let graph = parser.graph();

    let modules: Vec<_> = parser
        .nodes()
        .into_iter()
        .filter(|node| node.kind == NodeKind::Module)
        .collect();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].uuid, "cb.animals");
    assert!(modules[0]
        .docstring()
        .is_some_and(|doc| doc.starts_with("Animals used by the parser tests.")));

    for class in ["Animal", "Mammal", "Dog"] {
        let node = graph
            .node(&format!("cb.animals.{class}"))
            .unwrap_or_else(|| panic!("missing class {class}"));
        assert_eq!(node.kind, NodeKind::Class);
    }
    assert_eq!(
        graph.node("cb.animals.Mammal").and_then(|n| n.docstring()),
        Some("Marker base for mammals.")
    );

    for base in ["Animal", "Mammal"] {
        let inherits = graph
            .relationship(
                "cb.animals.Dog",
                &RelationKind::Inherits,
                &format!("cb.animals.{base}"),
            )
            .unwrap_or_else(|| panic!("Dog should inherit {base}"));
        assert_eq!(inherits.attribute(attr::TARGET_NAME), None);
    }

    let bark = graph
        .relationship("cb.animals.Dog", &RelationKind::HasMethod, "cb.animals.Dog.bark")
        .unwrap();
    assert_eq!(
        bark.attribute(attr::TARGET_SIGNATURE),
        Some("bark(self, words: str) -> None")
    );
    assert_eq!(bark.target_kind(), Some(NodeKind::Method));

    let words = graph
        .relationship("cb.animals.Dog", &RelationKind::HasField, "cb.animals.words")
        .unwrap();
    assert_eq!(words.attribute(attr::TARGET_TYPE), Some("str"));

    let global = graph
        .relationship("cb.animals", &RelationKind::Contains, "cb.animals.x")
        .unwrap();
    assert_eq!(global.attribute(attr::TARGET_TYPE), Some("int"));
    assert_eq!(global.target_kind(), Some(NodeKind::GlobalVariable));

    let greet = graph
        .relationship("cb.animals", &RelationKind::Contains, "cb.animals.greet")
        .unwrap();
    assert_eq!(
        greet.attribute(attr::TARGET_SIGNATURE),
        Some("greet(self, animal: Animal, age: int) -> int")
    );
    for (param, ty) in [("animal", "Animal"), ("age", "int")] {
        let rel = graph
            .relationship(
                "cb.animals.greet",
                &RelationKind::HasParameter,
                &format!("cb.animals.greet.{param}"),
            )
            .unwrap_or_else(|| panic!("greet should use {param}"));
        assert_eq!(rel.attribute(attr::TARGET_TYPE), Some(ty));
    }

    let init_param = graph
        .relationship(
            "cb.animals.Animal.__init__",
            &RelationKind::HasParameter,
            "cb.animals.Animal.__init__.name",
        )
        .unwrap();
    assert_eq!(init_param.attribute(attr::TARGET_TYPE), Some("str"));
    assert!(graph
        .relationship("cb.animals.Animal", &RelationKind::HasField, "cb.animals.Animal.name")
        .is_some());
}

#[test]
fn every_uuid_starts_with_codebase_name() {
    let parser = parse_animals();
    for node in parser.nodes() {
        assert_eq!(node.uuid.split('.').next(), Some("cb"), "{}", node.uuid);
    }
    for rel in parser.relationships() {
        assert_eq!(rel.source.split('.').next(), Some("cb"), "{rel}");
        assert_eq!(rel.target.split('.').next(), Some("cb"), "{rel}");
    }
}

#[test]
fn facts_carry_docstrings() {
    let parser = parse_animals();
    let graph = parser.graph();
    let bark = graph
        .relationship("cb.animals.Dog", &RelationKind::HasMethod, "cb.animals.Dog.bark")
        .unwrap();
    assert_eq!(
        graph.fact(bark),
        "CLASS cb.animals.Dog has method cb.animals.Dog.bark\nPrint the given words.\nA dog that barks."
    );
}

#[test]
fn differing_returns_become_union() {
    let mut parser = CodebaseParser::new("cb", ParserSettings::default());
    parser
        .parse_source(
            "def pick(flag):\n    if flag:\n        return 1\n    return \"one\"\n",
            "pick.py",
            "pick.py",
        )
        .unwrap();
    let pick = parser
        .graph()
        .relationship("cb.pick", &RelationKind::Contains, "cb.pick.pick")
        .unwrap();
    assert_eq!(pick.attribute(attr::TARGET_RETURN_TYPE), Some("Union[int, str]"));
}

#[test]
fn invalid_file_is_skipped_during_walk() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    write(root, "animals.py", ANIMALS);
    write(root, "broken.py", "def broken(:\n    pass\n");
    write(root, "pkg/util.py", "RATE = 0.5\n");

    let mut parser = CodebaseParser::new("cb", ParserSettings::default());
    let stats = parser.parse_dir(root, "https://example.com/").unwrap();

    assert_eq!(stats.files_parsed, 2);
    assert_eq!(stats.files_failed, 1);
    assert!(parser.graph().node("cb.animals.Dog").is_some());
    assert_eq!(
        parser
            .graph()
            .node("cb.pkg.util.RATE")
            .and_then(|node| node.attribute(attr::REFERENCE)),
        Some("https://example.com/pkg/util.py")
    );
    assert!(parser
        .nodes()
        .iter()
        .all(|node| !node.uuid.starts_with("cb.broken")));
}

#[test]
fn direct_parse_of_invalid_file_fails() {
    let temp = tempdir().unwrap();
    write(temp.path(), "broken.py", "class (:\n");

    let mut parser = CodebaseParser::new("cb", ParserSettings::default());
    let result = parser.parse_file(temp.path().join("broken.py"), "broken.py", "broken.py");
    assert!(matches!(result, Err(ParserError::Syntax { .. })));
}

#[test]
fn module_name_can_be_omitted() {
    let settings = ParserSettings {
        include_module_name: false,
        ..ParserSettings::default()
    };
    let mut parser = CodebaseParser::new("cb", settings);
    parser
        .parse_source(ANIMALS, "./animals.py", "animals.py")
        .unwrap();

    let graph = parser.graph();
    assert!(graph.relationship("cb", &RelationKind::Contains, "cb.Dog").is_some());
    let module = graph.node("cb").unwrap();
    assert_eq!(module.kind, NodeKind::Module);
    assert_eq!(module.docstring(), None);
}

#[test]
fn notebooks_are_parsed_from_code_cells() {
    let temp = tempdir().unwrap();
    write(
        temp.path(),
        "analysis.ipynb",
        r##"{
  "cells": [
    {"cell_type": "markdown", "source": ["# Analysis"]},
    {"cell_type": "code", "source": ["!pip install pandas\n", "import pandas as pd\n"]},
    {"cell_type": "code", "source": ["def load(path: str) -> pd.DataFrame:\n", "    return pd.read_csv(path)\n"]}
  ],
  "metadata": {},
  "nbformat": 4,
  "nbformat_minor": 5
}"##,
    );

    let mut parser = CodebaseParser::new("cb", ParserSettings::default());
    let stats = parser.parse_dir(temp.path(), "").unwrap();
    assert_eq!(stats.files_parsed, 1);

    let load = parser
        .graph()
        .relationship("cb.analysis", &RelationKind::Contains, "cb.analysis.load")
        .unwrap();
    assert_eq!(
        load.attribute(attr::TARGET_SIGNATURE),
        Some("load(self, path: str) -> pandas.pd.DataFrame")
    );
}
