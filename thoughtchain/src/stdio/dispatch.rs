//! MCP method dispatch for the stdio server.
//!
//! Only the subset needed to expose a single tool is implemented:
//! `initialize`, `ping`, `tools/list` and `tools/call`. Notifications are
//! accepted and ignored.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use thoughtchain_core::error::jsonrpc::JsonRpcError;
use thoughtchain_core::jsonrpc::{
    JsonRpcId, JsonRpcMessageKind, error_response_string, success_response_string,
};
use thoughtchain_core::reasoning::fields;
use thoughtchain_core::{ReasoningEngine, StepResponse};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::ndjson::{StdioMessage, parse_stdio_message};

/// Name under which the engine is advertised in `tools/list`.
pub const TOOL_NAME: &str = "sequential_thinking";

/// MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const TOOL_DESCRIPTION: &str = "Record one step of a structured reasoning chain. \
Steps are numbered; a step may revise an earlier one (is_revision + revises_thought) \
or fork an alternative line (branch_from_thought + branch_id, then branch_id alone \
to continue it). Set next_thought_needed=false when the line is finished. Rejected \
steps come back with a reason, a hint and a corrected example.";

/// Routes decoded JSON-RPC messages to the shared engine.
pub struct Dispatcher {
    engine: Arc<Mutex<ReasoningEngine>>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(engine: ReasoningEngine) -> Self {
        let timeout = engine.config().operation_timeout;
        Self {
            engine: Arc::new(Mutex::new(engine)),
            timeout,
        }
    }

    /// Shared handle to the engine, for inspection.
    pub fn engine(&self) -> Arc<Mutex<ReasoningEngine>> {
        Arc::clone(&self.engine)
    }

    /// Handle one raw NDJSON line.
    ///
    /// Returns the response frame to write, or `None` for notifications and
    /// stray responses.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        match parse_stdio_message(line) {
            Ok(msg) => self.handle_message(msg).await,
            Err(e) => {
                warn!(error = %e, "Rejecting malformed line");
                Some(error_response_string(&JsonRpcId::Null, &e.to_jsonrpc()))
            }
        }
    }

    pub async fn handle_message(&self, msg: StdioMessage) -> Option<String> {
        match msg.kind {
            JsonRpcMessageKind::Request { id, method } => {
                let frame = match self.handle_request(&method, msg.params).await {
                    Ok(result) => success_response_string(&id, &result),
                    Err(error) => {
                        debug!(%id, %method, code = error.code, "Request failed");
                        error_response_string(&id, &error)
                    }
                };
                Some(frame)
            }
            JsonRpcMessageKind::Notification { method } => {
                debug!(%method, "Ignoring notification");
                None
            }
            JsonRpcMessageKind::Response { id } => {
                debug!(%id, "Ignoring unsolicited response");
                None
            }
        }
    }

    async fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [tool_definition()] })),
            "tools/call" => self.call_tool(params.unwrap_or(Value::Null)).await,
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }

    async fn call_tool(&self, params: Value) -> Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("missing tool name"))?;
        if name != TOOL_NAME {
            return Err(JsonRpcError::invalid_params(format!("unknown tool '{name}'")));
        }

        let arguments = params.get("arguments").unwrap_or(&Value::Null);
        let response = self.process(arguments).await?;
        let text = response.to_json_string().map_err(JsonRpcError::internal)?;

        Ok(json!({
            "content": [{ "type": "text", "text": text }],
            "isError": response.is_error(),
        }))
    }

    /// Run one step through the engine, bounded by the configured timeout.
    ///
    /// The timeout covers waiting for the engine lock only; once the lock is
    /// held the step runs to completion, so an abandoned call never leaves a
    /// partial mutation behind.
    async fn process(&self, arguments: &Value) -> Result<StepResponse, JsonRpcError> {
        let mut engine = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.engine.lock())
                .await
                .map_err(|_| {
                    warn!(timeout_ms = limit.as_millis() as u64, "Engine busy past timeout");
                    JsonRpcError::internal(format!(
                        "operation timed out after {}ms",
                        limit.as_millis()
                    ))
                })?,
            None => self.engine.lock().await,
        };
        Ok(engine.process(arguments))
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

fn tool_definition() -> Value {
    let positive = json!({ "type": "integer", "minimum": 1 });
    json!({
        "name": TOOL_NAME,
        "description": TOOL_DESCRIPTION,
        "inputSchema": {
            "type": "object",
            "properties": {
                (fields::THOUGHT): { "type": "string", "description": "The current reasoning step" },
                (fields::THOUGHT_NUMBER): positive.clone(),
                (fields::TOTAL_THOUGHTS): positive.clone(),
                (fields::NEXT_THOUGHT_NEEDED): { "type": "boolean" },
                (fields::IS_REVISION): { "type": "boolean" },
                (fields::REVISES_THOUGHT): positive.clone(),
                (fields::BRANCH_FROM_THOUGHT): positive,
                (fields::BRANCH_ID): { "type": "string" },
                (fields::NEEDS_MORE_THOUGHTS): { "type": "boolean" },
            },
            "required": [
                fields::THOUGHT,
                fields::THOUGHT_NUMBER,
                fields::TOTAL_THOUGHTS,
                fields::NEXT_THOUGHT_NEEDED,
            ],
        },
    })
}
