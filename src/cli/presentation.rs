//! CLI presentation: json and text formatters per command family.

mod browse;
mod records;
mod search;

pub use browse::{format_buckets, format_list_page, format_meta};
pub use records::{format_export, format_head, format_save, format_write};
pub use search::format_search_result;

use crate::error::ApiError;
use serde::Serialize;

/// Compact single-line JSON, one document per command.
pub(crate) fn render_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string(value)?)
}

/// Key bytes for display; invalid UTF-8 is shown as base64.
pub(crate) fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(text) => text.to_string(),
        Err(_) => format!("b64:{}", crate::wire::encode_base64(key)),
    }
}
