use std::io;
use std::io::Write;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Writer for a chunked `text/plain` response.
///
/// Emits the fixed success head once, then one chunked-encoding frame per
/// event line, flushing after every frame so each tick reaches the client
/// immediately. No content length is declared up front since the total size
/// is not known ahead of emission.
pub struct ChunkedWriter<W: Write> {
    inner: W,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write the response head: status line plus the headers declaring a
    /// plain-text chunked body on a connection that closes after this
    /// response.
    pub fn send_head(&mut self) -> io::Result<()> {
        self.inner.write_all(
            b"HTTP/1.1 200 OK\r\n\
              Content-Type: text/plain; charset=UTF-8\r\n\
              Transfer-Encoding: chunked\r\n\
              Connection: close\r\n\
              \r\n",
        )?;
        self.inner.flush()
    }

    /// Write one chunk frame: hex length, CRLF, payload, CRLF.
    pub fn write_chunk(&mut self, data: &str) -> io::Result<()> {
        write!(self.inner, "{:x}\r\n", data.len())?;
        self.inner.write_all(data.as_bytes())?;
        self.inner.write_all(b"\r\n")?;
        self.inner.flush()
    }

    /// Terminate the response with the empty trailing chunk.
    pub fn finish(&mut self) -> io::Result<()> {
        self.inner.write_all(b"0\r\n\r\n")?;
        self.inner.flush()
    }

    /// Write a final payload chunk, then terminate the response.
    pub fn finish_with(&mut self, payload: &str) -> io::Result<()> {
        self.write_chunk(payload)?;
        self.finish()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Write a complete non-streamed plain-text response.
///
/// Used for the malformed-request path, which is the only response this
/// server produces with a known length.
pub fn write_error_response<W: Write>(conn: &mut W, status: u16, body: &str) -> io::Result<()> {
    let reason = status_reason(status);
    write!(
        conn,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/plain; charset=UTF-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    )?;
    conn.flush()
}
