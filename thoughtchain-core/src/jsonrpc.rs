//! Transport-agnostic JSON-RPC 2.0 message classification and framing.
//!
//! Classification works on an already-parsed `serde_json::Value`; the stdio
//! layer owns line splitting and size limits. Response builders always
//! produce a single-line JSON object suitable for NDJSON framing.

use serde::{Deserialize, Serialize};

use crate::error::jsonrpc::JsonRpcError;

/// JSON-RPC request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    Number(i64),
    String(String),
    Null,
}

impl std::fmt::Display for JsonRpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// Message kind, determined by presence of `id` and `method`:
/// - Request: has both `id` and `method`
/// - Response: has `id` but no `method`
/// - Notification: has `method` but no `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonRpcMessageKind {
    /// Has both `id` and `method`: a request expecting a response.
    Request { id: JsonRpcId, method: String },
    /// Has `id` but no `method`: a response to a previous request.
    Response { id: JsonRpcId },
    /// Has `method` but no `id`: a fire-and-forget notification.
    Notification { method: String },
}

/// Classify a parsed JSON-RPC value without taking ownership.
///
/// # Errors
///
/// Returns `JsonRpcClassifyError` if:
/// - The `jsonrpc` field is missing or not `"2.0"` (`InvalidVersion`)
/// - The `id` field is present but not a valid JSON-RPC ID (`InvalidId`)
/// - Neither `id` nor `method` is present (`Unclassifiable`)
pub fn classify_jsonrpc(
    value: &serde_json::Value,
) -> Result<JsonRpcMessageKind, JsonRpcClassifyError> {
    let version = value.get("jsonrpc").and_then(|v| v.as_str());
    if version != Some("2.0") {
        return Err(JsonRpcClassifyError::InvalidVersion);
    }

    let id = value
        .get("id")
        .map(parse_id)
        .transpose()
        .map_err(|_| JsonRpcClassifyError::InvalidId)?;
    let method = value
        .get("method")
        .and_then(|v| v.as_str())
        .map(String::from);

    match (id, method) {
        (Some(id), Some(method)) => Ok(JsonRpcMessageKind::Request { id, method }),
        (Some(id), None) => Ok(JsonRpcMessageKind::Response { id }),
        (None, Some(method)) => Ok(JsonRpcMessageKind::Notification { method }),
        (None, None) => Err(JsonRpcClassifyError::Unclassifiable),
    }
}

/// Accepts string, integer, or null. Rejects floats, booleans, arrays, objects.
fn parse_id(value: &serde_json::Value) -> Result<JsonRpcId, ()> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().map(JsonRpcId::Number).ok_or(()),
        serde_json::Value::String(s) => Ok(JsonRpcId::String(s.clone())),
        serde_json::Value::Null => Ok(JsonRpcId::Null),
        _ => Err(()),
    }
}

/// Errors that can occur during JSON-RPC message classification.
#[derive(Debug, thiserror::Error)]
pub enum JsonRpcClassifyError {
    /// The `jsonrpc` field is missing or not `"2.0"`.
    #[error("missing or invalid jsonrpc version field")]
    InvalidVersion,
    /// The `id` field is present but not a valid JSON-RPC ID.
    #[error("invalid id field")]
    InvalidId,
    /// The message has neither `id` nor `method`.
    #[error("message has neither id nor method")]
    Unclassifiable,
}

// ─────────────────────────────────────────────────────────────────────────────
// Response Framing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SuccessFrame<'a> {
    jsonrpc: &'static str,
    id: &'a JsonRpcId,
    result: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ErrorFrame<'a> {
    jsonrpc: &'static str,
    id: &'a JsonRpcId,
    error: &'a JsonRpcError,
}

/// Static fallback used when a frame cannot be encoded.
///
/// Encoding a `serde_json::Value` or the error structs above does not fail
/// in practice, but the output stream must never receive a partial frame.
pub const INTERNAL_ERROR_FRAME: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error: response encoding failed"}}"#;

/// Encode a success response as a single JSON line (no trailing newline).
pub fn success_response_string(id: &JsonRpcId, result: &serde_json::Value) -> String {
    serde_json::to_string(&SuccessFrame {
        jsonrpc: "2.0",
        id,
        result,
    })
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, %id, "failed to encode success response");
        INTERNAL_ERROR_FRAME.to_string()
    })
}

/// Encode an error response as a single JSON line (no trailing newline).
pub fn error_response_string(id: &JsonRpcId, error: &JsonRpcError) -> String {
    serde_json::to_string(&ErrorFrame {
        jsonrpc: "2.0",
        id,
        error,
    })
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, %id, "failed to encode error response");
        INTERNAL_ERROR_FRAME.to_string()
    })
}
