//! JSON wire shapes and byte-string encoding at the process boundary.
//!
//! Keys and values cross the boundary as standard base64. Field names are
//! camelCase so existing consumers of the tool's output keep working.

use crate::error::{ApiError, ErrorKind};
use crate::export::{ExportRecord, ExportSink};
use crate::listing::{ListItem, ListPage};
use crate::meta::StoreMeta;
use crate::search::{SearchItem, SearchResult};
use crate::value::ValueHead;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::io::Write;

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a base64 argument, naming `field` in the error.
pub fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, ApiError> {
    STANDARD
        .decode(value.trim())
        .map_err(|e| ApiError::InvalidArgument(format!("{} is not valid base64: {}", field, e)))
}

/// Path segments as display strings; non-UTF-8 bytes are replaced.
pub fn path_strings(segments: &[Vec<u8>]) -> Vec<String> {
    segments
        .iter()
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

#[derive(Debug, Serialize)]
pub struct MetaOutput {
    pub ok: bool,
    pub path: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl From<&StoreMeta> for MetaOutput {
    fn from(meta: &StoreMeta) -> Self {
        Self {
            ok: true,
            path: meta.path.display().to_string(),
            size: meta.size,
            modified: meta.modified.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BucketsOutput {
    pub buckets: Vec<String>,
}

impl BucketsOutput {
    pub fn new(names: &[Vec<u8>]) -> Self {
        Self {
            buckets: names.iter().map(|n| encode_base64(n)).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemOutput {
    pub key_base64: String,
    pub value_size: usize,
    pub is_bucket: bool,
}

impl From<&ListItem> for ListItemOutput {
    fn from(item: &ListItem) -> Self {
        Self {
            key_base64: encode_base64(&item.key),
            value_size: item.value_size,
            is_bucket: item.is_bucket,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub items: Vec<ListItemOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_after_key: Option<String>,
    pub approx_returned: usize,
}

impl From<&ListPage> for ListOutput {
    fn from(page: &ListPage) -> Self {
        Self {
            items: page.items.iter().map(ListItemOutput::from).collect(),
            next_after_key: page.next_after_key.as_deref().map(encode_base64),
            approx_returned: page.items.len(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemOutput {
    pub path: Vec<String>,
    pub key_base64: String,
    pub value_size: usize,
    pub is_bucket: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&SearchItem> for SearchItemOutput {
    fn from(item: &SearchItem) -> Self {
        Self {
            path: path_strings(&item.path),
            key_base64: encode_base64(&item.key),
            value_size: item.value_size,
            is_bucket: item.is_bucket,
            kind: if item.is_bucket { "bucket" } else { "key" },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub items: Vec<SearchItemOutput>,
    pub total: usize,
    pub limited: bool,
}

impl From<&SearchResult> for SearchOutput {
    fn from(result: &SearchResult) -> Self {
        Self {
            items: result.items.iter().map(SearchItemOutput::from).collect(),
            total: result.total,
            limited: result.limited,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadOutput {
    pub mode: &'static str,
    /// `null` when the key holds no value.
    pub total_size: Option<usize>,
    pub value_head_base64: String,
}

impl From<&ValueHead> for HeadOutput {
    fn from(head: &ValueHead) -> Self {
        Self {
            mode: "head",
            total_size: head.total_size,
            value_head_base64: encode_base64(&head.head),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutput {
    pub mode: &'static str,
    pub total_size: usize,
    pub written_path: String,
}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    pub ok: bool,
    pub written: String,
    pub records: usize,
}

#[derive(Debug, Serialize)]
pub struct WriteOutput {
    pub ok: bool,
    pub op: &'static str,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: ErrorBody {
                kind: kind.as_str(),
                message: message.into(),
            },
        }
    }
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(err: &ApiError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportLine {
    path: Vec<String>,
    key_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_base64: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_bucket: bool,
}

/// Writes one JSON object per exported record, newline terminated.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExportSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &ExportRecord<'_>) -> Result<(), ApiError> {
        let line = ExportLine {
            path: path_strings(record.path),
            key_base64: encode_base64(record.key),
            value_base64: record.value.map(encode_base64),
            is_bucket: record.value.is_none(),
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ApiError> {
        self.writer.flush()?;
        Ok(())
    }
}
