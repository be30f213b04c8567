//! # Stream Session Module
//!
//! The per-request emission loop behind the event stream server.
//!
//! ## Overview
//!
//! Each request gets one [`StreamSession`]: a requested event count, a count
//! of lines emitted so far, and a cancellation flag. The session writes one
//! `Event emitted: N` line per tick until the count is reached, then
//! terminates the response with the empty trailing chunk. If the client
//! disconnects mid-stream the session instead terminates with a final
//! `Cancelled.` payload.
//!
//! ## Cancellation
//!
//! The disconnect signal comes from a close-watcher coroutine
//! ([`spawn_close_watcher`]) blocked on a read of the connection: EOF or a
//! read error flips the session's `AtomicBool`. The flag is single-writer,
//! single-reader and is only polled at tick boundaries, so a disconnect is
//! observed with up to one tick of latency and at most one extra line may be
//! written after the client goes away.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use eventdrip::server::response::ChunkedWriter;
//! use eventdrip::stream::StreamSession;
//!
//! let mut res = ChunkedWriter::new(Vec::new());
//! let session = StreamSession::new(3, Duration::from_millis(10));
//! let outcome = session.run(&mut res)?;
//! # Ok::<(), std::io::Error>(())
//! ```

use crate::server::response::ChunkedWriter;
use may::coroutine;
use may::net::TcpStream;
use std::io;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Final payload written when a stream is cut short by a client disconnect.
pub const CANCELLED_PAYLOAD: &str = "Cancelled.";

/// Stack size for close-watcher coroutines; they only read into a small
/// buffer.
const WATCHER_STACK_SIZE: usize = 0x2000;

/// Format one event line. Numbering starts at 1.
pub fn event_line(n: u64) -> String {
    format!("Event emitted: {n}\n")
}

/// How a stream session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// All requested lines were emitted and the response was terminated
    /// normally.
    Completed { emitted: u64 },
    /// The client disconnected; the response was terminated with the
    /// [`CANCELLED_PAYLOAD`] chunk after `emitted` lines.
    Cancelled { emitted: u64 },
}

/// Per-request mutable state driving one chunked event stream.
///
/// Created when a request arrives, mutated only by the tick loop and the
/// close watcher, and dropped when the response is terminated. Sessions are
/// never shared across requests.
pub struct StreamSession {
    requested: u64,
    emitted: u64,
    cancelled: Arc<AtomicBool>,
    tick: Duration,
}

impl StreamSession {
    pub fn new(requested: u64, tick: Duration) -> Self {
        Self {
            requested,
            emitted: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            tick,
        }
    }

    /// Clone of the cancellation flag, for handing to a close watcher.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Run the emission loop to completion.
    ///
    /// Per tick: an observed cancellation terminates the response with the
    /// cancellation payload; an exhausted count terminates it with the empty
    /// trailing chunk; otherwise the next line is written and the session
    /// sleeps one tick. Lines are numbered `1..=requested` in strictly
    /// increasing order, and no line is written after cancellation is
    /// observed.
    ///
    /// # Errors
    ///
    /// Returns the underlying `io::Error` if a write fails, which on this
    /// path means the peer is gone; the response cannot be terminated then
    /// and the connection is simply dropped.
    pub fn run<W: Write>(mut self, res: &mut ChunkedWriter<W>) -> io::Result<SessionOutcome> {
        loop {
            if self.cancelled.load(Ordering::SeqCst) {
                res.finish_with(CANCELLED_PAYLOAD)?;
                return Ok(SessionOutcome::Cancelled {
                    emitted: self.emitted,
                });
            }
            if self.emitted >= self.requested {
                res.finish()?;
                return Ok(SessionOutcome::Completed {
                    emitted: self.emitted,
                });
            }
            self.emitted += 1;
            res.write_chunk(&event_line(self.emitted))?;
            coroutine::sleep(self.tick);
        }
    }
}

/// Spawn the connection-close observer for one session.
///
/// Blocks on reads of a cloned connection handle; EOF or a read error means
/// the peer is gone, and either one sets the session's cancellation flag.
/// Stray bytes the client sends after its request head are drained and
/// ignored.
///
/// The watcher outlives the session only until the connection is torn down,
/// at which point its read fails and the coroutine exits.
pub fn spawn_close_watcher(conn: TcpStream, cancelled: Arc<AtomicBool>) -> io::Result<()> {
    // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may
    // runtime. The closure owns its stream and flag (both 'static), and the
    // coroutine exits as soon as the connection is torn down.
    let spawn_result = unsafe {
        coroutine::Builder::new()
            .name("eventdrip_close_watcher".to_string())
            .stack_size(WATCHER_STACK_SIZE)
            .spawn(move || {
                let mut conn = conn;
                let mut buf = [0u8; 64];
                loop {
                    match conn.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                cancelled.store(true, Ordering::SeqCst);
                debug!("connection no longer readable; cancellation flagged");
            })
    };
    spawn_result.map(|_| ())
}
