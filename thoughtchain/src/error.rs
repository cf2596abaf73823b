//! Error types for the stdio transport and the output channel.
//!
//! `FramingError` covers NDJSON line parsing failures: size limits, malformed
//! JSON, JSON-RPC version validation, batch rejection and IO.
//!
//! `ServerError` covers failures that end the serve loop, and `ChannelError`
//! covers installing and restoring the protocol-safe stdout redirection.

/// Errors that can occur when parsing an NDJSON-framed JSON-RPC message.
///
/// Every variant except `Io` is answered with a JSON-RPC error frame and the
/// loop continues with the next line.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// A single NDJSON line exceeds the maximum size.
    ///
    /// Checked before JSON parsing to prevent allocation of oversized values.
    #[error("Message exceeds maximum size of {max_bytes} bytes")]
    MessageTooLarge {
        /// The maximum message size in bytes.
        max_bytes: usize,
    },

    /// The line is not valid JSON.
    #[error("Malformed JSON: {reason}")]
    MalformedJson {
        /// Human-readable description of the parse failure.
        reason: String,
    },

    /// The line parsed as JSON but is not a JSON-RPC message object.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What made the message unacceptable.
        reason: String,
    },

    /// The `jsonrpc` field is absent from the JSON object.
    #[error("Missing required jsonrpc field")]
    MissingVersion,

    /// The `jsonrpc` field is present but not `"2.0"`.
    #[error("Unsupported JSON-RPC version: {version}")]
    UnsupportedVersion {
        /// The version string found in the message.
        version: String,
    },

    /// The message is a JSON array (a JSON-RPC batch).
    #[error("JSON-RPC batch requests (arrays) are not supported")]
    UnsupportedBatch,

    /// An underlying IO error occurred while reading stdin.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors installing or restoring the protocol-safe output channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Another channel already owns stdout in this process.
    #[error("stdout is already owned by another output channel")]
    AlreadyInstalled,

    /// Duplicating, piping or redirecting a file descriptor failed.
    #[cfg(unix)]
    #[error("stdout redirection failed during {op}: {source}")]
    Redirect {
        /// The failing operation (`dup`, `pipe`, `dup2`).
        op: &'static str,
        source: nix::Error,
    },

    /// The background drain thread panicked.
    #[error("stdout drain thread panicked")]
    DrainPanicked,

    /// An underlying IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end the stdio server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The output channel could not be installed or restored.
    #[error("output channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Reading stdin failed.
    #[error("stdin read failed: {0}")]
    Read(#[source] FramingError),

    /// Writing a response frame failed.
    #[error("stdout write failed: {0}")]
    Write(#[source] std::io::Error),
}
