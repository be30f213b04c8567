use super::request::{requested_count, ParsedRequest};
use super::response::ChunkedWriter;
use crate::runtime_config::RuntimeConfig;
use crate::stream::{spawn_close_watcher, SessionOutcome, StreamSession};
use may::net::TcpStream;
use std::io;
use std::net::Shutdown;
use std::time::Duration;
use tracing::info;

/// Service driving one accepted connection.
///
/// The server is generic over this trait so tests can stand up variants with
/// their own counts and tick intervals. Implementations receive the parsed
/// request head and ownership of the connection, and are responsible for
/// writing a complete response.
pub trait StreamService: Clone + Send + 'static {
    fn call(&mut self, req: ParsedRequest, conn: TcpStream) -> io::Result<()>;
}

/// The one handler of this server: streams `Event emitted: N` lines for
/// every path and method.
///
/// The requested count comes from the path (`GET /250` streams 250 lines);
/// anything that does not parse as a decimal integer falls back to
/// `default_count` rather than failing the request.
#[derive(Debug, Clone)]
pub struct EventStreamService {
    pub default_count: u64,
    pub tick: Duration,
}

impl EventStreamService {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            default_count: config.default_count,
            tick: config.tick,
        }
    }
}

impl StreamService for EventStreamService {
    fn call(&mut self, req: ParsedRequest, conn: TcpStream) -> io::Result<()> {
        let requested = requested_count(&req.path).unwrap_or(self.default_count);
        info!(
            method = %req.method,
            path = %req.path,
            requested,
            "stream session start"
        );

        let session = StreamSession::new(requested, self.tick);
        spawn_close_watcher(conn.try_clone()?, session.cancel_flag())?;

        let mut res = ChunkedWriter::new(conn);
        res.send_head()?;
        match session.run(&mut res)? {
            SessionOutcome::Completed { emitted } => {
                info!(emitted, "stream session complete");
            }
            SessionOutcome::Cancelled { emitted } => {
                info!(emitted, "stream session cancelled by client");
            }
        }
        // The close watcher still holds a cloned handle, so dropping ours
        // would not send FIN; shut the socket down so the client sees the
        // stream end and the watcher unblocks.
        let _ = res.into_inner().shutdown(Shutdown::Both);
        Ok(())
    }
}
