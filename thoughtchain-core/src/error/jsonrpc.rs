//! JSON-RPC 2.0 error objects.

use serde::{Deserialize, Serialize};

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters (including an unknown tool name).
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error, including a timed-out call.
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 error object.
///
/// Embedded under `error` in error responses. Step rejections are *not*
/// reported this way: they are successful `tools/call` results with
/// `isError: true`, so the caller can read the guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Standard JSON-RPC error code.
    pub code: i32,

    /// Human-readable error message.
    pub message: String,

    /// Additional error data (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Build an error with no `data` member.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a `data` member.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(reason: impl std::fmt::Display) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {reason}"))
    }

    pub fn invalid_request(reason: impl std::fmt::Display) -> Self {
        Self::new(INVALID_REQUEST, format!("Invalid request: {reason}"))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn invalid_params(reason: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {reason}"))
    }

    pub fn internal(reason: impl std::fmt::Display) -> Self {
        Self::new(INTERNAL_ERROR, format!("Internal error: {reason}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_without_data() {
        let error = JsonRpcError::parse_error("expected value at line 1 column 1");
        let json = serde_json::to_string(&error).unwrap();

        // data field should be omitted when None
        assert!(!json.contains("\"data\""));
        assert!(json.contains("-32700"));
    }

    #[test]
    fn test_error_with_data() {
        let error = JsonRpcError::invalid_params("unknown tool 'nope'")
            .with_data(serde_json::json!({"tool": "nope"}));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], INVALID_PARAMS);
        assert_eq!(json["data"]["tool"], "nope");
    }

    #[test]
    fn test_method_not_found_message() {
        let error = JsonRpcError::method_not_found("resources/list");
        assert_eq!(error.code, METHOD_NOT_FOUND);
        assert_eq!(error.message, "Method not found: resources/list");
    }
}
