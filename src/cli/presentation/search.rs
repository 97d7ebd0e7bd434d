//! Search presentation.

use super::{display_key, render_json};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::search::SearchResult;
use crate::wire::{path_strings, SearchOutput};
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_search_result(
    result: &SearchResult,
    format: OutputFormat,
    color: bool,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&SearchOutput::from(result));
    }
    if result.items.is_empty() {
        return Ok("No matches.".to_string());
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Path", "Key", "Type", "Size"]);
    for item in &result.items {
        let path = format!("/{}", path_strings(&item.path).join("/"));
        let (kind, size) = if item.is_bucket {
            ("bucket", "-".to_string())
        } else {
            ("value", item.value_size.to_string())
        };
        table.add_row(vec![path, display_key(&item.key), kind.to_string(), size]);
    }

    let summary = if result.limited {
        format!("{} match(es), limit reached", result.total)
    } else {
        format!("{} match(es)", result.total)
    };
    let summary = if color && result.limited {
        summary.yellow().to_string()
    } else {
        summary
    };
    Ok(format!("{}\n{}", table, summary))
}
