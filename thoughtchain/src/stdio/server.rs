//! Stdin read loop.
//!
//! Reads one NDJSON line at a time, hands it to the [`Dispatcher`] and writes
//! any response frame before reading the next line. Requests are therefore
//! handled strictly in arrival order.

use std::io::Write;
use std::time::Duration;

use thoughtchain_core::ReasoningEngine;
use thoughtchain_core::config::EngineConfig;
use thoughtchain_core::jsonrpc::{JsonRpcId, error_response_string};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use super::channel::OutputChannel;
use super::dispatch::Dispatcher;
use super::ndjson::MAX_MESSAGE_BYTES;
use crate::error::{FramingError, ServerError};

/// How long to keep skipping an oversized line before giving up on it.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    pub lines_read: u64,
    pub frames_written: u64,
}

/// Serve the stdio transport until stdin closes.
///
/// Installs the output channel for the lifetime of the loop and restores
/// stdout before returning, on success and on error alike.
pub async fn run_server(config: EngineConfig) -> Result<ServeSummary, ServerError> {
    let channel = OutputChannel::install()?;
    let dispatcher = Dispatcher::new(ReasoningEngine::new(config));
    let mut writer = channel.frame_writer();

    info!("thoughtchain serving on stdio");
    let result = serve(BufReader::new(tokio::io::stdin()), &mut writer, &dispatcher).await;

    let restored = channel.uninstall();
    let summary = result?;
    let stray = restored?;
    let chain = dispatcher.engine().lock().await.stats();
    info!(
        lines = summary.lines_read,
        frames = summary.frames_written,
        stray_forwarded = stray.forwarded,
        stray_discarded = stray.discarded,
        history_len = chain.history_len,
        branch_count = chain.branch_count,
        revision_count = chain.revision_count,
        "stdin closed, shutting down"
    );
    Ok(summary)
}

/// Drive the read loop over any buffered reader and frame writer.
pub async fn serve<R, W>(
    mut reader: R,
    writer: &mut W,
    dispatcher: &Dispatcher,
) -> Result<ServeSummary, ServerError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut summary = ServeSummary::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match bounded_read_line(&mut reader, &mut buf, MAX_MESSAGE_BYTES).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e @ FramingError::MessageTooLarge { .. }) => {
                summary.lines_read += 1;
                warn!(error = %e, "Skipping oversized line");
                write_frame(writer, &error_response_string(&JsonRpcId::Null, &e.to_jsonrpc()))?;
                summary.frames_written += 1;
                continue;
            }
            Err(e) => return Err(ServerError::Read(e)),
        }
        summary.lines_read += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                let err = FramingError::MalformedJson {
                    reason: format!("invalid UTF-8: {e}"),
                };
                warn!(error = %err, "Rejecting line");
                write_frame(writer, &error_response_string(&JsonRpcId::Null, &err.to_jsonrpc()))?;
                summary.frames_written += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Some(frame) = dispatcher.handle_line(line).await {
            write_frame(writer, &frame)?;
            summary.frames_written += 1;
        }
    }

    debug!(
        lines = summary.lines_read,
        frames = summary.frames_written,
        "Reached end of input"
    );
    Ok(summary)
}

/// Write one frame and its newline in a single write, then flush.
fn write_frame<W: Write>(writer: &mut W, frame: &str) -> Result<(), ServerError> {
    let mut line = Vec::with_capacity(frame.len() + 1);
    line.extend_from_slice(frame.as_bytes());
    line.push(b'\n');
    writer.write_all(&line).map_err(ServerError::Write)?;
    writer.flush().map_err(ServerError::Write)
}

/// Read a single line from an async buffered reader, enforcing a byte limit.
///
/// Unlike bare `read_line`, this will not allocate unbounded memory if the
/// peer sends a continuous stream of bytes without a newline. If the
/// accumulated bytes exceed `max_bytes` before a newline is found, the rest
/// of the line is drained and `FramingError::MessageTooLarge` is returned.
///
/// Raw bytes are accumulated so multi-byte UTF-8 characters that straddle
/// internal buffer boundaries are not split.
///
/// # Returns
///
/// - `Ok(n)` where `n > 0`: a line (with its newline, if any) was read into `buf`
/// - `Ok(0)`: EOF reached
/// - `Err(FramingError::MessageTooLarge)`: line exceeded `max_bytes`
/// - `Err(FramingError::Io)`: underlying I/O error
pub async fn bounded_read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, FramingError> {
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await.map_err(FramingError::Io)?;

        if available.is_empty() {
            return Ok(total);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let to_consume = pos + 1;
                if total + to_consume > max_bytes {
                    reader.consume(to_consume);
                    return Err(FramingError::MessageTooLarge { max_bytes });
                }

                buf.extend_from_slice(&available[..to_consume]);
                total += to_consume;
                reader.consume(to_consume);
                return Ok(total);
            }
            None => {
                let len = available.len();
                if total + len > max_bytes {
                    reader.consume(len);
                    drain_until_newline(reader).await;
                    return Err(FramingError::MessageTooLarge { max_bytes });
                }

                buf.extend_from_slice(available);
                total += len;
                reader.consume(len);
            }
        }
    }
}

/// Skip the remainder of an oversized line so the reader is positioned at
/// the start of the next one.
async fn drain_until_newline<R: AsyncBufRead + Unpin>(reader: &mut R) {
    let drain = async {
        loop {
            match reader.fill_buf().await {
                Ok([]) => return,
                Ok(buf) => {
                    if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                        reader.consume(pos + 1);
                        return;
                    }
                    let len = buf.len();
                    reader.consume(len);
                }
                Err(e) => {
                    warn!(error = %e, "IO error while draining oversized line");
                    return;
                }
            }
        }
    };
    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
        warn!(
            timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "Gave up draining oversized line"
        );
    }
}
