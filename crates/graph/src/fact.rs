use crate::types::{attr, Attributes, RelationKind};

/// Render a relationship as a natural-language sentence.
///
/// The wording is consumed verbatim by downstream embedding and search, so
/// each template must stay byte-for-byte stable. Docstrings found in
/// `docstring`, `target_docstring` and `source_docstring` (in that order) are
/// appended on their own lines, flattened to a single line each.
pub fn render_fact(
    source: &str,
    relation: &RelationKind,
    target: &str,
    attributes: &Attributes,
) -> String {
    let source_kind = attributes
        .get(attr::SOURCE_KIND)
        .map(String::as_str)
        .unwrap_or_default();
    let target_kind = attributes
        .get(attr::TARGET_KIND)
        .map(String::as_str)
        .unwrap_or_default();

    let mut fact = match relation {
        RelationKind::Contains => {
            format!("{source_kind} {source} contains {target_kind} {target}")
        }
        RelationKind::HasMethod => format!("{source_kind} {source} has method {target}"),
        RelationKind::HasField => {
            format!("{source_kind} {source} has field or attribute or property {target}")
        }
        RelationKind::Inherits => {
            format!("{source_kind} {source} inherits from or is a subclass of {target}")
        }
        RelationKind::HasParameter => {
            format!("{source_kind} {source} has parameter or accepts argument {target}")
        }
        RelationKind::Custom(name) => {
            format!("{source_kind} {source} {name} {target_kind} {target}")
        }
    };

    for key in [attr::DOCSTRING, attr::TARGET_DOCSTRING, attr::SOURCE_DOCSTRING] {
        if let Some(doc) = attributes.get(key).filter(|doc| !doc.is_empty()) {
            fact.push('\n');
            fact.push_str(doc.replace('\n', " ").trim());
        }
    }

    fact
}
