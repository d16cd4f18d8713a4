//! Loopback HTTP collector for tests that exercise the ureq mechanisms.
//!
//! Each accepted connection carries one request; the collector publishes
//! what it received on a channel, answers with the next scripted status
//! code, and closes the connection. Publishing comes first, so a sender that
//! has seen the response can rely on the request already being on the
//! channel.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// A request as seen by the collector. Header names are lower-cased.
#[derive(Debug)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value.as_str()))
    }

    fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
}

fn read_request(stream: &TcpStream) -> std::io::Result<CapturedRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut reader = BufReader::new(stream);
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end().to_owned();
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }

    let mut lines = lines.into_iter();
    let start = lines.next().unwrap_or_default();
    let mut parts = start.split_whitespace();
    let mut request = CapturedRequest {
        method: parts.next().unwrap_or_default().to_owned(),
        path: parts.next().unwrap_or_default().to_owned(),
        headers: lines
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((key.trim().to_ascii_lowercase(), value.trim().to_owned()))
            })
            .collect(),
        body: String::new(),
    };

    let mut body = vec![0; request.content_length()];
    reader.read_exact(&mut body)?;
    request.body = String::from_utf8_lossy(&body).into_owned();
    Ok(request)
}

fn respond(mut stream: &TcpStream, status: u16) -> std::io::Result<()> {
    let reason = match status {
        200..=299 => "OK",
        400..=499 => "Client Error",
        _ => "Server Error",
    };
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )?;
    stream.flush()
}

/// Spawn a collector answering successive requests with `statuses`.
pub fn spawn_collector(statuses: Vec<u16>) -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind loopback collector");
    let addr = listener.local_addr().expect("collector address");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for status in statuses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let Ok(request) = read_request(&stream) else {
                continue;
            };
            let _ = tx.send(request);
            let _ = respond(&stream, status);
        }
    });

    (addr, rx)
}

/// A collector that never accepts: connections complete in the listen
/// backlog and every request waits until the client times out. Requests
/// stall for as long as the returned listener is alive.
pub fn stalled_collector() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind stalled collector");
    let addr = listener.local_addr().expect("collector address");
    (listener, addr)
}

/// An address nothing listens on.
pub fn closed_address() -> SocketAddr {
    TcpListener::bind(("127.0.0.1", 0))
        .and_then(|listener| listener.local_addr())
        .expect("reserve loopback address")
}
