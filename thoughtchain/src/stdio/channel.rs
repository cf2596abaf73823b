//! Protocol-safe stdout.
//!
//! Stdout carries JSON-RPC frames and nothing else. `OutputChannel` takes
//! ownership of file descriptor 1 for the lifetime of the server: the real
//! stdout is duplicated and kept as the frame sink, fd 1 is pointed at a pipe,
//! and a drain thread pushes whatever arrives on that pipe through a
//! [`FrameFilter`] before it reaches the sink. Anything that writes to fd 1
//! directly (a stray `println!`, a library banner) is therefore dropped
//! unless the line is itself a JSON frame.
//!
//! The transport writes through [`OutputChannel::frame_writer`], which goes
//! straight to the duplicated descriptor. Both paths hold the sink lock for a
//! whole line, so a response and a stray print never interleave mid-line.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::ChannelError;

/// Longest line a filter will buffer before giving up on it.
pub const MAX_PENDING_BYTES: usize = 10 * 1024 * 1024;

/// Set while an [`OutputChannel`] owns fd 1.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// True iff the first non-whitespace byte of `line` opens a JSON object or
/// array.
pub fn is_protocol_frame(line: &[u8]) -> bool {
    matches!(
        line.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'{') | Some(b'[')
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Filter
// ─────────────────────────────────────────────────────────────────────────────

/// Counters kept by a [`FrameFilter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Lines forwarded to the inner writer.
    pub forwarded: u64,
    /// Lines dropped because they were not frames (or were too long).
    pub discarded: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Only whitespace seen so far.
    Undecided,
    /// First significant byte opened a frame; buffering until newline.
    Frame,
    /// Not a frame; dropping bytes until newline.
    Discard,
}

/// A `Write` adapter that forwards whole lines whose first non-whitespace byte
/// is `{` or `[`, byte for byte, and silently drops every other line.
///
/// Lines are assembled across `write` calls, so a frame and its newline may
/// arrive separately. A forwarded line is handed to the inner writer with a
/// single `write_all`. `flush` terminates a pending partial line: a partial
/// frame is forwarded as-is and anything else is dropped.
pub struct FrameFilter<W: Write> {
    inner: W,
    pending: Vec<u8>,
    line_len: usize,
    state: LineState,
    stats: FilterStats,
}

impl<W: Write> FrameFilter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            line_len: 0,
            state: LineState::Undecided,
            stats: FilterStats::default(),
        }
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the inner writer. Any pending partial line is lost; call
    /// `flush` first to keep it.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn feed(&mut self, chunk: &[u8]) {
        self.line_len += chunk.len();
        match self.state {
            LineState::Discard => {}
            LineState::Frame => self.pending.extend_from_slice(chunk),
            LineState::Undecided => match chunk.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(pos) if matches!(chunk[pos], b'{' | b'[') => {
                    self.state = LineState::Frame;
                    self.pending.extend_from_slice(chunk);
                }
                Some(_) => {
                    self.state = LineState::Discard;
                    self.pending.clear();
                }
                None => self.pending.extend_from_slice(chunk),
            },
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            warn!(
                buffered = self.pending.len(),
                limit = MAX_PENDING_BYTES,
                "Dropping oversized stdout line"
            );
            self.pending = Vec::new();
            self.state = LineState::Discard;
        }
    }

    fn finish_line(&mut self) -> io::Result<()> {
        let result = match self.state {
            LineState::Frame => {
                self.stats.forwarded += 1;
                self.inner.write_all(&self.pending)
            }
            LineState::Undecided | LineState::Discard => {
                self.stats.discarded += 1;
                debug!(bytes = self.line_len, "Discarded non-frame stdout line");
                Ok(())
            }
        };
        self.line_len = 0;
        self.pending.clear();
        self.state = LineState::Undecided;
        result
    }
}

impl<W: Write> Write for FrameFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while !rest.is_empty() {
            match rest.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.feed(&rest[..=pos]);
                    self.finish_line()?;
                    rest = &rest[pos + 1..];
                }
                None => {
                    self.feed(rest);
                    rest = &[];
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let has_partial = self.line_len > 0;
        if has_partial {
            self.finish_line()?;
        }
        self.inner.flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable handle to the real stdout (or a test buffer).
///
/// Each `write` holds the lock for the whole buffer, which is what keeps
/// lines from different writers intact.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl SharedSink {
    pub fn new(inner: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(inner))),
        }
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output Channel
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of stdout for the lifetime of the server.
///
/// At most one channel exists per process. Dropping the channel restores
/// fd 1; call [`uninstall`](Self::uninstall) to observe errors and stats.
pub struct OutputChannel {
    sink: SharedSink,
    #[cfg(unix)]
    redirect: Option<unix::Redirect>,
    restored: AtomicBool,
}

impl OutputChannel {
    /// Take over the process stdout, sending frames to the real stdout.
    pub fn install() -> Result<Self, ChannelError> {
        #[cfg(unix)]
        {
            use std::os::fd::AsFd;
            io::stdout().flush()?;
            let original = io::stdout().as_fd().try_clone_to_owned()?;
            Self::install_with_sink(std::fs::File::from(original))
        }
        #[cfg(not(unix))]
        {
            Self::install_with_sink(io::stdout())
        }
    }

    /// Take over the process stdout, sending frames to `sink`.
    ///
    /// On non-Unix targets fd 1 is left alone and only frames written through
    /// [`frame_writer`](Self::frame_writer) are filtered.
    pub fn install_with_sink(sink: impl Write + Send + 'static) -> Result<Self, ChannelError> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChannelError::AlreadyInstalled);
        }

        let sink = SharedSink::new(sink);

        #[cfg(unix)]
        let redirect = match unix::Redirect::start(sink.clone()) {
            Ok(redirect) => Some(redirect),
            Err(e) => {
                INSTALLED.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        debug!("Output channel installed");
        Ok(Self {
            sink,
            #[cfg(unix)]
            redirect,
            restored: AtomicBool::new(false),
        })
    }

    /// Whether a channel currently owns stdout.
    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::SeqCst)
    }

    /// A writer for protocol frames.
    ///
    /// Non-frame lines written here are dropped like any other stray output.
    pub fn frame_writer(&self) -> FrameFilter<SharedSink> {
        FrameFilter::new(self.sink.clone())
    }

    /// Restore fd 1 and return the drain thread's counters.
    pub fn uninstall(self) -> Result<FilterStats, ChannelError> {
        self.restore()
    }

    fn restore(&self) -> Result<FilterStats, ChannelError> {
        if self.restored.swap(true, Ordering::SeqCst) {
            return Ok(FilterStats::default());
        }

        #[cfg(unix)]
        let result = match &self.redirect {
            Some(redirect) => redirect.stop(),
            None => Ok(FilterStats::default()),
        };
        #[cfg(not(unix))]
        let result: Result<FilterStats, ChannelError> = Ok(FilterStats::default());

        let mut sink = self.sink.clone();
        let flushed = sink.flush();
        INSTALLED.store(false, Ordering::SeqCst);

        let stats = result?;
        flushed?;
        debug!(
            forwarded = stats.forwarded,
            discarded = stats.discarded,
            "Output channel restored"
        );
        Ok(stats)
    }
}

impl Drop for OutputChannel {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!(error = %e, "Failed to restore stdout");
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{self, Read, Write};
    use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
    use std::sync::Mutex;
    use std::thread::JoinHandle;

    use nix::unistd::{dup2, pipe};
    use tracing::warn;

    use super::{FilterStats, FrameFilter, SharedSink};
    use crate::error::ChannelError;

    const STDOUT_FD: i32 = 1;

    /// fd 1 pointed at a pipe, with the original descriptor saved.
    pub(super) struct Redirect {
        saved: OwnedFd,
        drain: Mutex<Option<JoinHandle<FilterStats>>>,
    }

    impl Redirect {
        pub(super) fn start(sink: SharedSink) -> Result<Self, ChannelError> {
            io::stdout().flush()?;
            let saved = io::stdout().as_fd().try_clone_to_owned()?;

            let (read_end, write_end) =
                pipe().map_err(|source| ChannelError::Redirect { op: "pipe", source })?;
            dup2(write_end.as_raw_fd(), STDOUT_FD)
                .map_err(|source| ChannelError::Redirect { op: "dup2", source })?;
            drop(write_end);

            let drain = match std::thread::Builder::new()
                .name("stdout-drain".to_string())
                .spawn(move || pump(File::from(read_end), sink))
            {
                Ok(handle) => handle,
                Err(e) => {
                    if let Err(restore) = restore_stdout(saved.as_raw_fd()) {
                        warn!(error = %restore, "Failed to restore stdout after drain spawn failure");
                    }
                    return Err(e.into());
                }
            };

            Ok(Self {
                saved,
                drain: Mutex::new(Some(drain)),
            })
        }

        /// Point fd 1 back at the saved descriptor. That closes the last
        /// write end of the pipe, so the drain thread sees EOF.
        pub(super) fn stop(&self) -> Result<FilterStats, ChannelError> {
            let _ = io::stdout().flush();
            restore_stdout(self.saved.as_raw_fd())?;

            let handle = self
                .drain
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take();
            match handle {
                Some(handle) => handle.join().map_err(|_| ChannelError::DrainPanicked),
                None => Ok(FilterStats::default()),
            }
        }
    }

    /// Point fd 1 at `saved`.
    pub(super) fn restore_stdout(saved: RawFd) -> Result<(), ChannelError> {
        dup2(saved, STDOUT_FD)
            .map(drop)
            .map_err(|source| ChannelError::Redirect { op: "dup2", source })
    }

    fn pump(mut pipe: File, sink: SharedSink) -> FilterStats {
        let mut filter = FrameFilter::new(sink);
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Err(e) = filter.write_all(&buf[..n]) {
                        warn!(error = %e, "stdout drain write failed");
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "stdout drain read failed");
                    break;
                }
            }
        }
        if let Err(e) = filter.flush() {
            warn!(error = %e, "stdout drain flush failed");
        }
        filter.stats()
    }
}
