//! Stdio transport: NDJSON framing, MCP dispatch and the guarded stdout.
//!
//! ```text
//! stdin ──▶ bounded_read_line ──▶ parse_stdio_message ──▶ Dispatcher
//!                                                             │
//! stray prints ──▶ fd 1 pipe ──▶ FrameFilter ─┐               ▼
//!                                             ├──▶ original stdout
//!                         frame_writer ───────┘
//! ```

pub mod channel;
pub mod dispatch;
pub mod ndjson;
pub mod server;

pub use channel::{FilterStats, FrameFilter, OutputChannel, SharedSink, is_protocol_frame};
pub use dispatch::{Dispatcher, PROTOCOL_VERSION, TOOL_NAME};
pub use ndjson::{MAX_MESSAGE_BYTES, StdioMessage, parse_stdio_message};
pub use server::{ServeSummary, bounded_read_line, run_server, serve};
