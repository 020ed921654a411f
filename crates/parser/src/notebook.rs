//! Jupyter notebook to plain source conversion.
//!
//! Only code cells contribute. IPython line magics (`%time`) and shell
//! escapes (`!pip install`) are not Python, so they are kept as comments to
//! preserve line structure without breaking the parse. A cell magic
//! (`%%bash`) makes its whole cell foreign, so every line of it is commented.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Notebook {
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

/// nbformat stores cell source either as one string or as a list of lines
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    fn joined(self) -> String {
        match self {
            CellSource::Text(text) => text,
            CellSource::Lines(lines) => lines.concat(),
        }
    }
}

/// Concatenate a notebook's code cells, in order, into one source text
pub fn notebook_to_source(content: &str) -> Result<String, String> {
    let notebook: Notebook = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let cells: Vec<String> = notebook
        .cells
        .into_iter()
        .filter(|cell| cell.cell_type == "code")
        .map(|cell| neutralize_magics(&cell.source.joined()))
        .collect();

    let mut source = cells.join("\n\n");
    if !source.is_empty() && !source.ends_with('\n') {
        source.push('\n');
    }
    Ok(source)
}

fn neutralize_magics(cell: &str) -> String {
    let cell_magic = cell
        .lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| line.trim_start().starts_with("%%"));

    cell.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let foreign = cell_magic || trimmed.starts_with('%') || trimmed.starts_with('!');
            if foreign && !trimmed.is_empty() {
                let indent = &line[..line.len() - trimmed.len()];
                format!("{indent}# {trimmed}")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
