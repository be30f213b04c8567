use super::request::read_request;
use super::response::write_error_response;
use super::service::StreamService;
use may::coroutine::{self, JoinHandle};
use may::net::TcpListener;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

/// HTTP server running one coroutine per accepted connection.
///
/// Generic over [`StreamService`] so tests can run services with their own
/// configuration. The server speaks just enough HTTP for the fixture: it
/// reads a request head, hands the connection to the service, and closes it
/// when the service is done.
pub struct HttpServer<T>(pub T);

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it
/// gracefully, or joining the acceptor coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    /// Useful in tests to ensure the server is fully started before sending requests.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if std::net::TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server gracefully
    ///
    /// Cancels the acceptor coroutine and waits for it to finish. Streams
    /// already in flight run to their own termination. Consumes the handle,
    /// preventing further operations.
    pub fn stop(self) {
        // SAFETY: may::CoroutineHandle::coroutine().cancel() is marked unsafe
        // by the may runtime. The handle is valid (we hold it) and
        // cancellation is the intended shutdown path for the acceptor.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Wait for the acceptor coroutine to complete
    ///
    /// Blocks until the acceptor finishes. The server runs indefinitely
    /// unless stopped externally or an error occurs.
    ///
    /// # Errors
    ///
    /// Returns an error if the acceptor coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

impl<T: StreamService> HttpServer<T> {
    /// Start the HTTP server on the given address
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind to (e.g., `"0.0.0.0:9000"` or `"127.0.0.1:3000"`)
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, the port cannot be bound,
    /// or the acceptor coroutine cannot be spawned.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let listener = TcpListener::bind(addr)?;
        let service = self.0;

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may
        // runtime. The closure owns the listener and service (both 'static),
        // and the acceptor is only torn down through ServerHandle::stop.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("eventdrip_acceptor".to_string())
                .spawn(move || accept_loop(listener, service))?
        };
        Ok(ServerHandle { addr, handle })
    }
}

fn accept_loop<T: StreamService>(listener: TcpListener, service: T) {
    for stream in listener.incoming() {
        let conn = match stream {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let service = service.clone();
        // SAFETY: as above; the connection coroutine owns its stream and its
        // clone of the service and exits when the response is done.
        let spawned = unsafe {
            coroutine::Builder::new()
                .name("eventdrip_conn".to_string())
                .spawn(move || handle_connection(service, conn))
        };
        if let Err(e) = spawned {
            // resources exhausted; drop the connection rather than the server
            error!(error = %e, "failed to spawn connection coroutine");
        }
    }
}

fn handle_connection<T: StreamService>(mut service: T, mut conn: may::net::TcpStream) {
    let req = match read_request(&mut conn) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "rejecting connection with malformed request head");
            let _ = write_error_response(&mut conn, 400, "malformed request\n");
            return;
        }
    };
    if let Err(e) = service.call(req, conn) {
        // the peer is gone; there is no response left to terminate
        debug!(error = %e, "stream aborted");
    }
}
