//! CLI output: error mapping from domain errors to the stable CLI surface.

use crate::error::ApiError;
use crate::wire::ErrorEnvelope;

/// Render an error as the `{ok:false, error:{kind, message}}` envelope.
pub fn map_error(e: &ApiError) -> String {
    serde_json::to_string(&ErrorEnvelope::from(e)).unwrap_or_else(|_| e.to_string())
}

/// Process exit status for a failed command.
pub fn exit_code(e: &ApiError) -> i32 {
    e.kind().exit_code()
}
