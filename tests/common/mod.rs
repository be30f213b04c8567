use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Once;
use std::time::Duration;

/// Ensures may coroutines are configured only once
static MAY_INIT: Once = Once::new();

pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

/// Pick an ephemeral port by binding and immediately dropping a listener.
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Send a raw HTTP request and collect everything the server writes until it
/// closes the connection (or goes quiet past the read timeout).
pub fn send_request(addr: &SocketAddr, req: &str) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req.as_bytes()).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(e) => panic!("read error: {:?}", e),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Split a raw response into head and body at the first blank line.
pub fn split_response(resp: &str) -> (&str, &str) {
    let mut parts = resp.splitn(2, "\r\n\r\n");
    let head = parts.next().unwrap_or("");
    let body = parts.next().unwrap_or("");
    (head, body)
}

/// Strictly decode a chunked body into its chunk payloads.
///
/// Returns the payloads and whether the body ended with the empty terminal
/// chunk. Panics on malformed framing so tests catch encoder bugs.
pub fn dechunk(body: &str) -> (Vec<String>, bool) {
    let mut chunks = Vec::new();
    let mut rest = body;
    loop {
        let Some(line_end) = rest.find("\r\n") else {
            // ran out of data mid-stream (e.g. the client hung up early)
            return (chunks, false);
        };
        let size_line = &rest[..line_end];
        let size = usize::from_str_radix(size_line, 16)
            .unwrap_or_else(|_| panic!("bad chunk size line: {size_line:?}"));
        rest = &rest[line_end + 2..];
        if size == 0 {
            assert!(
                rest.starts_with("\r\n"),
                "terminal chunk not followed by CRLF: {rest:?}"
            );
            assert_eq!(&rest[2..], "", "data after the terminal chunk");
            return (chunks, true);
        }
        if rest.len() < size + 2 {
            return (chunks, false);
        }
        chunks.push(rest[..size].to_string());
        assert_eq!(&rest[size..size + 2], "\r\n", "chunk payload not CRLF-terminated");
        rest = &rest[size + 2..];
    }
}
