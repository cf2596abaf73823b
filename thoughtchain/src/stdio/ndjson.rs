//! NDJSON message parsing for the stdio transport.
//!
//! Pure parsing only. The read loop in [`super::server`] owns line splitting
//! and calls [`parse_stdio_message`] once per line.

use serde_json::Value;
use thoughtchain_core::error::jsonrpc::JsonRpcError;
use thoughtchain_core::jsonrpc::{JsonRpcClassifyError, JsonRpcMessageKind, classify_jsonrpc};

use crate::error::FramingError;

/// Maximum NDJSON message size (10 MB).
///
/// Lines exceeding this limit are rejected before JSON parsing.
pub const MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

/// A parsed NDJSON line.
#[derive(Debug, Clone)]
pub struct StdioMessage {
    /// Classified message kind (Request, Response, or Notification).
    pub kind: JsonRpcMessageKind,
    /// The `params` field, if present.
    pub params: Option<Value>,
}

/// Parse a single NDJSON line into a [`StdioMessage`].
///
/// Performs size validation, JSON parsing, batch rejection, and JSON-RPC
/// classification in sequence.
///
/// # Errors
///
/// Returns [`FramingError`] for:
/// - Oversized messages (`MessageTooLarge`), checked before JSON parsing
/// - Invalid JSON (`MalformedJson`)
/// - Non-object values, bad `id`, or no `id`/`method` (`InvalidRequest`)
/// - JSON arrays (`UnsupportedBatch`)
/// - Missing `jsonrpc` field (`MissingVersion`)
/// - Wrong `jsonrpc` version (`UnsupportedVersion`)
pub fn parse_stdio_message(line: &str) -> Result<StdioMessage, FramingError> {
    if line.len() > MAX_MESSAGE_BYTES {
        return Err(FramingError::MessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        });
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(FramingError::MalformedJson {
            reason: "empty message".to_string(),
        });
    }

    let mut value: Value =
        serde_json::from_str(trimmed).map_err(|e| FramingError::MalformedJson {
            reason: e.to_string(),
        })?;

    if value.is_array() {
        return Err(FramingError::UnsupportedBatch);
    }
    if !value.is_object() {
        return Err(FramingError::InvalidRequest {
            reason: "message is not a JSON object".to_string(),
        });
    }

    let kind = classify_jsonrpc(&value).map_err(|e| match e {
        JsonRpcClassifyError::InvalidVersion => match value.get("jsonrpc") {
            Some(Value::String(v)) => FramingError::UnsupportedVersion { version: v.clone() },
            Some(other) => FramingError::UnsupportedVersion {
                version: other.to_string(),
            },
            None => FramingError::MissingVersion,
        },
        other @ (JsonRpcClassifyError::InvalidId | JsonRpcClassifyError::Unclassifiable) => {
            FramingError::InvalidRequest {
                reason: other.to_string(),
            }
        }
    })?;

    let params = value.as_object_mut().and_then(|obj| obj.remove("params"));

    Ok(StdioMessage { kind, params })
}

impl FramingError {
    /// The JSON-RPC error answered for this framing failure.
    ///
    /// Unparseable text is a parse error; everything that parsed but is not
    /// an acceptable request object is an invalid request.
    pub fn to_jsonrpc(&self) -> JsonRpcError {
        match self {
            Self::MalformedJson { reason } => JsonRpcError::parse_error(reason),
            Self::InvalidRequest { reason } => JsonRpcError::invalid_request(reason),
            Self::Io(_) => JsonRpcError::internal(self),
            _ => JsonRpcError::invalid_request(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thoughtchain_core::error::jsonrpc::{INVALID_REQUEST, PARSE_ERROR};
    use thoughtchain_core::jsonrpc::JsonRpcId;

    #[test]
    fn test_parse_request() {
        let msg = parse_stdio_message(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"x"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg.kind,
            JsonRpcMessageKind::Request {
                id: JsonRpcId::Number(1),
                method: "tools/call".to_string(),
            }
        );
        assert_eq!(msg.params.unwrap()["name"], "x");
    }

    #[test]
    fn test_parse_notification() {
        let msg =
            parse_stdio_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(matches!(msg.kind, JsonRpcMessageKind::Notification { .. }));
        assert!(msg.params.is_none());
    }

    #[test]
    fn test_trailing_whitespace_tolerated() {
        assert!(parse_stdio_message("{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":2}\r").is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = parse_stdio_message("hello world").unwrap_err();
        assert!(matches!(err, FramingError::MalformedJson { .. }));
        assert_eq!(err.to_jsonrpc().code, PARSE_ERROR);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            parse_stdio_message("   ").unwrap_err(),
            FramingError::MalformedJson { .. }
        ));
    }

    #[test]
    fn test_rejects_batch() {
        let err = parse_stdio_message(r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#).unwrap_err();
        assert!(matches!(err, FramingError::UnsupportedBatch));
        assert_eq!(err.to_jsonrpc().code, INVALID_REQUEST);
    }

    #[test]
    fn test_rejects_scalar() {
        let err = parse_stdio_message("42").unwrap_err();
        assert_eq!(err.to_jsonrpc().code, INVALID_REQUEST);
    }

    #[test]
    fn test_version_errors() {
        assert!(matches!(
            parse_stdio_message(r#"{"id":1,"method":"ping"}"#).unwrap_err(),
            FramingError::MissingVersion
        ));
        match parse_stdio_message(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap_err() {
            FramingError::UnsupportedVersion { version } => assert_eq!(version, "1.0"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_id_is_invalid_request() {
        let err = parse_stdio_message(r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).unwrap_err();
        assert_eq!(err.to_jsonrpc().code, INVALID_REQUEST);
    }

    #[test]
    fn test_oversized_rejected_before_parse() {
        let line = "x".repeat(MAX_MESSAGE_BYTES + 1);
        assert!(matches!(
            parse_stdio_message(&line).unwrap_err(),
            FramingError::MessageTooLarge { .. }
        ));
    }
}
