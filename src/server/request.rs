use std::io;
use std::io::Read;
use tracing::debug;

/// Maximum number of header slots accepted when parsing a request head.
///
/// 32 handles modern API gateway/proxy traffic; anything beyond that is
/// rejected as malformed.
pub const MAX_HEADERS: usize = 32;

/// Upper bound on the request head size before the connection is rejected.
const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Parsed HTTP request data used by the stream service.
///
/// The fixture only routes on the path, so only the request line survives
/// parsing; headers are validated by `httparse` and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path including query string
    pub path: String,
}

/// Read and parse an HTTP request head from the connection.
///
/// Reads until the head is complete, then parses it with `httparse`.
///
/// # Errors
///
/// Returns `InvalidData` for a malformed head or one larger than 8 KiB, and
/// `UnexpectedEof` if the peer closes before the head is complete.
pub fn read_request<R: Read>(conn: &mut R) -> io::Result<ParsedRequest> {
    let mut buf = Vec::with_capacity(512);
    let mut tmp = [0u8; 512];
    loop {
        let n = conn.read(&mut tmp)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before request head was complete",
            ));
        }
        buf.extend_from_slice(&tmp[..n]);

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);
        match req.parse(&buf) {
            Ok(httparse::Status::Complete(head_len)) => {
                let method = req.method.unwrap_or("GET").to_string();
                let path = req.path.unwrap_or("/").to_string();
                debug!(
                    method = %method,
                    path = %path,
                    head_bytes = head_len,
                    "HTTP request parsed"
                );
                return Ok(ParsedRequest { method, path });
            }
            Ok(httparse::Status::Partial) => {
                if buf.len() > MAX_HEAD_BYTES {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "request head too large",
                    ));
                }
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        }
    }
}

/// Extract the requested event count from a request path.
///
/// The path is expected to be a single leading-slash-prefixed decimal integer
/// (e.g. `/250`); any query string is ignored. Returns `None` for anything
/// non-numeric, leaving the caller to fall back to the configured default.
/// `/0` is valid and yields a stream with zero events.
pub fn requested_count(path: &str) -> Option<u64> {
    let segment = path
        .split('?')
        .next()
        .unwrap_or("")
        .trim_start_matches('/');
    if segment.is_empty() {
        return None;
    }
    segment.parse().ok()
}
