use eventdrip::{EventStreamService, HttpServer, ServerHandle};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

mod common;
use common::{dechunk, free_addr, send_request, setup_may_runtime, split_response};

fn start_server(default_count: u64, tick_ms: u64) -> (ServerHandle, SocketAddr) {
    setup_may_runtime();
    let service = EventStreamService {
        default_count,
        tick: Duration::from_millis(tick_ms),
    };
    let addr = free_addr();
    let handle = HttpServer(service).start(addr).unwrap();
    handle.wait_ready().unwrap();
    (handle, addr)
}

fn get(addr: &SocketAddr, path: &str) -> String {
    send_request(
        addr,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\n\r\n"),
    )
}

fn event_lines(resp: &str) -> (Vec<String>, bool) {
    let (_, body) = split_response(resp);
    dechunk(body)
}

#[test]
fn test_requested_count_is_honored() {
    let (handle, addr) = start_server(100, 10);
    let resp = get(&addr, "/3");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert_eq!(
        lines,
        vec![
            "Event emitted: 1\n",
            "Event emitted: 2\n",
            "Event emitted: 3\n"
        ]
    );
    assert!(terminated, "stream did not end with the terminal chunk");
}

#[test]
fn test_non_numeric_path_falls_back_to_default() {
    let (handle, addr) = start_server(4, 10);
    let resp = get(&addr, "/abc");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert_eq!(lines.len(), 4);
    assert!(terminated);
}

#[test]
fn test_missing_count_uses_default() {
    let (handle, addr) = start_server(2, 10);
    let resp = get(&addr, "/");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert_eq!(lines.len(), 2);
    assert!(terminated);
}

#[test]
fn test_query_string_is_ignored() {
    let (handle, addr) = start_server(100, 10);
    let resp = get(&addr, "/2?verbose=1");
    handle.stop();
    let (lines, _) = event_lines(&resp);
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_zero_count_closes_immediately() {
    let (handle, addr) = start_server(100, 10);
    let resp = get(&addr, "/0");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert!(lines.is_empty());
    assert!(terminated);
}

#[test]
fn test_response_head_declares_chunked_plain_text() {
    let (handle, addr) = start_server(100, 10);
    let resp = get(&addr, "/1");
    handle.stop();
    let (head, _) = split_response(&resp);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Type: text/plain; charset=UTF-8"));
    assert!(head.contains("Transfer-Encoding: chunked"));
    assert!(head.contains("Connection: close"));
    assert!(!head.contains("Content-Length"));
}

#[test]
fn test_lines_are_numbered_in_order() {
    let (handle, addr) = start_server(100, 5);
    let resp = get(&addr, "/5");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert!(terminated);
    let numbers: Vec<u64> = lines
        .iter()
        .map(|l| {
            l.trim_end()
                .strip_prefix("Event emitted: ")
                .unwrap()
                .parse()
                .unwrap()
        })
        .collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_client_disconnect_stops_stream() {
    let (handle, addr) = start_server(100, 20);
    {
        // ask for far more events than we are willing to read
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /1000 HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(500)))
            .unwrap();
        let mut seen = String::new();
        let mut tmp = [0u8; 256];
        while seen.matches("Event emitted:").count() < 2 {
            let n = stream.read(&mut tmp).unwrap();
            assert!(n > 0, "server closed before two lines were streamed");
            seen.push_str(&String::from_utf8_lossy(&tmp[..n]));
        }
        // hang up mid-stream
    }
    // the watcher flags cancellation at the next tick; the server must keep
    // serving new requests afterwards
    std::thread::sleep(Duration::from_millis(100));
    let resp = get(&addr, "/2");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert_eq!(lines.len(), 2);
    assert!(terminated);
}

#[test]
fn test_malformed_head_gets_400() {
    let (handle, addr) = start_server(100, 10);
    let resp = send_request(&addr, "\u{1}\u{2}garbage\r\n\r\n");
    handle.stop();
    let (head, body) = split_response(&resp);
    assert!(head.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(head.contains("Content-Length"));
    assert_eq!(body, "malformed request\n");
}

#[test]
fn test_sequential_requests_are_independent() {
    let (handle, addr) = start_server(100, 10);
    let first = get(&addr, "/2");
    let second = get(&addr, "/3");
    handle.stop();
    let (first_lines, _) = event_lines(&first);
    let (second_lines, _) = event_lines(&second);
    assert_eq!(first_lines.len(), 2);
    assert_eq!(second_lines.len(), 3);
    // numbering restarts per session
    assert_eq!(second_lines[0], "Event emitted: 1\n");
}

#[test]
fn test_post_streams_like_get() {
    let (handle, addr) = start_server(100, 10);
    let resp = send_request(&addr, "POST /2 HTTP/1.1\r\nHost: localhost\r\n\r\n");
    handle.stop();
    let (lines, terminated) = event_lines(&resp);
    assert_eq!(lines.len(), 2);
    assert!(terminated);
}
