//! Meta report and listing presentation: meta, lsb, lsk.

use super::{display_key, render_json};
use crate::cli::parse::OutputFormat;
use crate::error::ApiError;
use crate::listing::ListPage;
use crate::meta::StoreMeta;
use crate::wire::{encode_base64, BucketsOutput, ListOutput, MetaOutput};
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_meta(meta: &StoreMeta, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&MetaOutput::from(meta));
    }
    let modified = meta
        .modified
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    Ok(format!(
        "Store: {}\n  Size: {} bytes\n  Modified: {}",
        meta.path.display(),
        meta.size,
        modified
    ))
}

pub fn format_buckets(
    names: &[Vec<u8>],
    format: OutputFormat,
    color: bool,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&BucketsOutput::new(names));
    }
    if names.is_empty() {
        return Ok("No buckets.".to_string());
    }
    let lines: Vec<String> = names
        .iter()
        .map(|name| {
            let name = display_key(name);
            if color {
                format!("  {}/", name.cyan())
            } else {
                format!("  {}/", name)
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn format_list_page(
    page: &ListPage,
    root: bool,
    format: OutputFormat,
    color: bool,
) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&ListOutput::from(page));
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    let size_header = if root { "Entries" } else { "Size" };
    table.set_header(vec!["Key", "Type", size_header]);
    for item in &page.items {
        let kind = if item.is_bucket { "bucket" } else { "value" };
        let size = if item.is_bucket && !root {
            "-".to_string()
        } else {
            item.value_size.to_string()
        };
        table.add_row(vec![display_key(&item.key), kind.to_string(), size]);
    }

    let mut out = table.to_string();
    out.push_str(&format!("\n{} item(s)", page.items.len()));
    if let Some(next) = &page.next_after_key {
        let token = encode_base64(next);
        if color {
            out.push_str(&format!("; more after {}", token.bold()));
        } else {
            out.push_str(&format!("; more after {}", token));
        }
    }
    Ok(out)
}
