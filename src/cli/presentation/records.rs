//! Value, export and write presentation.

use super::render_json;
use crate::cli::parse::{OutputFormat, WriteOp};
use crate::error::ApiError;
use crate::value::ValueHead;
use crate::wire::{ExportOutput, HeadOutput, SaveOutput, WriteOutput};
use std::path::Path;

pub fn format_head(head: &ValueHead, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&HeadOutput::from(head));
    }
    Ok(match head.total_size {
        Some(total) => format!(
            "Total size: {} bytes (showing {})\n{}",
            total,
            head.head.len(),
            String::from_utf8_lossy(&head.head)
        ),
        None => "Key not found.".to_string(),
    })
}

pub fn format_save(total: usize, out: &Path, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&SaveOutput {
            mode: "save",
            total_size: total,
            written_path: out.display().to_string(),
        });
    }
    Ok(format!("Wrote {} bytes to {}", total, out.display()))
}

pub fn format_export(records: usize, out: &Path, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&ExportOutput {
            ok: true,
            written: out.display().to_string(),
            records,
        });
    }
    Ok(format!("Exported {} record(s) to {}", records, out.display()))
}

pub fn format_write(op: WriteOp, path: &str, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return render_json(&WriteOutput {
            ok: true,
            op: op.as_str(),
            path: path.to_string(),
        });
    }
    Ok(format!("{}: {}", op.as_str(), path))
}
