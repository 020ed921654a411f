use anyhow::Result;
use clap::ValueEnum;
use codefacts_graph::{CodeGraph, Node, Relationship};
use codefacts_parser::ParseStats;
use serde::Serialize;
use std::collections::BTreeMap;

/// How a parsed graph is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `{codebase, stats, nodes, relationships}` as pretty JSON
    Json,
    /// One fact per relationship, separated by blank lines
    Facts,
    /// Relationships grouped by relation, with counts
    Summary,
}

#[derive(Serialize)]
struct GraphReport<'a> {
    codebase: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ParseStats>,
    nodes: Vec<&'a Node>,
    relationships: Vec<&'a Relationship>,
}

pub fn render(
    codebase: &str,
    graph: &CodeGraph,
    stats: Option<ParseStats>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = GraphReport {
                codebase,
                stats,
                nodes: graph.nodes().collect(),
                relationships: graph.relationships().collect(),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Facts => Ok(graph.facts().join("\n\n")),
        OutputFormat::Summary => Ok(render_summary(codebase, graph, stats)),
    }
}

fn render_summary(codebase: &str, graph: &CodeGraph, stats: Option<ParseStats>) -> String {
    let mut out = format!(
        "{codebase}: {} nodes, {} relationships\n",
        graph.node_count(),
        graph.relationship_count()
    );
    if let Some(stats) = stats {
        out.push_str(&format!(
            "files: {} parsed, {} skipped\n",
            stats.files_parsed, stats.files_failed
        ));
    }

    let mut groups: BTreeMap<String, Vec<&Relationship>> = BTreeMap::new();
    for rel in graph.relationships() {
        groups.entry(rel.relation.to_string()).or_default().push(rel);
    }
    for (relation, rels) in groups {
        out.push_str(&format!("\n{relation} ({})\n", rels.len()));
        for rel in rels {
            out.push_str(&format!("  {rel}\n"));
        }
    }
    out
}
