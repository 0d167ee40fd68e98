//! Asset server integration tests over a real `TcpListener`.

use smart_photo::server::serve_listener;
use std::fs;
use std::io::{Read as _, Write as _};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// ===========================================================================
// Helpers
// ===========================================================================

/// Start serving `root` on an ephemeral port; the thread lives for the test binary.
fn start(root: &Path) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let root = root.to_path_buf();
    thread::spawn(move || serve_listener(listener, root));
    port
}

struct Reply {
    status: u16,
    headers: String,
    body: Vec<u8>,
}

fn request(port: u16, method: &str, path: &str) -> Reply {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    write!(stream, "{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header terminator");
    let headers = String::from_utf8_lossy(&raw[..split]).into_owned();
    let status = headers
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    Reply {
        status,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}

fn site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("index.html"), "<!doctype html><div id=root></div>").unwrap();
    fs::create_dir(tmp.path().join("assets")).unwrap();
    fs::write(tmp.path().join("assets/index.css"), "body{margin:0}").unwrap();
    fs::write(tmp.path().join("logo.png"), b"\x89PNG fake").unwrap();
    tmp
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn root_serves_entry_document() {
    let site = site();
    let port = start(site.path());
    let reply = request(port, "GET", "/");
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("Content-Type: text/html"));
    assert!(reply.headers.contains("Connection: close"));
    assert_eq!(reply.body, b"<!doctype html><div id=root></div>");
}

#[test]
fn missing_file_falls_back_with_200() {
    let site = site();
    let port = start(site.path());
    let reply = request(port, "GET", "/nonexistent.xyz");
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"<!doctype html><div id=root></div>");
}

#[test]
fn client_routes_fall_back() {
    let site = site();
    let port = start(site.path());
    let reply = request(port, "GET", "/gallery?page=2");
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("text/html"));
}

#[test]
fn existing_assets_get_their_mime_type() {
    let site = site();
    let port = start(site.path());

    let css = request(port, "GET", "/assets/index.css");
    assert_eq!(css.status, 200);
    assert!(css.headers.contains("Content-Type: text/css"));
    assert_eq!(css.body, b"body{margin:0}");

    let png = request(port, "GET", "/logo.png");
    assert!(png.headers.contains("Content-Type: image/png"));
}

#[test]
fn head_sends_headers_only() {
    let site = site();
    let port = start(site.path());
    let reply = request(port, "HEAD", "/assets/index.css");
    assert_eq!(reply.status, 200);
    assert!(reply.headers.contains("Content-Length: 14"));
    assert!(reply.body.is_empty());
}

#[test]
fn unreadable_entry_document_is_500() {
    let empty = TempDir::new().unwrap();
    let port = start(empty.path());
    let reply = request(port, "GET", "/anything");
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body, b"Error loading index.html");
}
