//! Static asset server with single-page fallback.
//!
//! Serves files from an asset root over plain HTTP/1.1, one thread per
//! connection, `Connection: close`. Anything that is not a real file (a
//! client-side route, a missing asset, a path trying to climb out of the
//! root) is answered with the entry document, `index.html`, so the app's
//! router can take over.
//!
//! | Request | Served |
//! |---|---|
//! | `/` | `index.html` |
//! | `/app.js` (exists) | `app.js` |
//! | `/gallery` (no extension) | `index.html` |
//! | `/missing.png` | `index.html` |
//! | `/../secret.txt` | `index.html` |
//!
//! When `index.html` itself cannot be read the response is
//! `500 Error loading index.html`.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

const ENTRY_DOCUMENT: &str = "index.html";
const FALLBACK_ERROR: &str = "Error loading index.html";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("Asset root {0} is not a directory")]
    MissingRoot(PathBuf),
}

/// MIME type for a file name, by extension.
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "html" => "text/html",
        "js" => "text/javascript",
        "css" => "text/css",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Map a request path onto a file under `root`.
///
/// Pure: does not touch the filesystem. Missing files are handled when the
/// response is built.
pub fn resolve_request(root: &Path, request_path: &str) -> PathBuf {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('/');

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    let escapes = path.split('/').any(|segment| segment == "..");
    if path.is_empty() || escapes || !last_segment.contains('.') {
        return root.join(ENTRY_DOCUMENT);
    }
    root.join(path)
}

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn ok(path: &Path, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type(path),
            body,
        }
    }

    fn fallback_failed() -> Self {
        Self {
            status: 500,
            content_type: "text/plain",
            body: FALLBACK_ERROR.as_bytes().to_vec(),
        }
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            500 => "Internal Server Error",
            _ => "",
        }
    }

    /// Serialise, omitting the body for `HEAD`.
    pub fn to_bytes(&self, include_body: bool) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        if include_body {
            out.extend_from_slice(&self.body);
        }
        out
    }
}

/// Build the response for `request_path`, falling back to the entry document.
pub fn respond(root: &Path, request_path: &str) -> Response {
    let target = resolve_request(root, request_path);
    if let Ok(body) = std::fs::read(&target) {
        return Response::ok(&target, body);
    }
    let entry = root.join(ENTRY_DOCUMENT);
    match std::fs::read(&entry) {
        Ok(body) => {
            log::debug!("{request_path} -> {ENTRY_DOCUMENT}");
            Response::ok(&entry, body)
        }
        Err(e) => {
            log::error!("{FALLBACK_ERROR} ({}): {e}", entry.display());
            Response::fallback_failed()
        }
    }
}

/// Read one request from `stream` and answer it.
pub fn handle_connection(stream: TcpStream, root: &Path) -> io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(());
    }
    // Drain headers so the client sees a clean close.
    let mut header = String::new();
    while reader.read_line(&mut header)? > 2 {
        header.clear();
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("GET");
    let path = parts.next().unwrap_or("/");

    let response = respond(root, path);
    log::info!("{method} {path} {}", response.status);
    let mut stream = &stream;
    stream.write_all(&response.to_bytes(method != "HEAD"))?;
    stream.flush()
}

/// Accept connections forever, each on its own thread.
pub fn serve_listener(listener: TcpListener, root: PathBuf) -> Result<(), ServerError> {
    let root = Arc::new(root);
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                log::warn!("accept failed: {e}");
                continue;
            }
        };
        let root = Arc::clone(&root);
        thread::spawn(move || {
            if let Err(e) = handle_connection(stream, &root) {
                log::warn!("connection dropped: {e}");
            }
        });
    }
    Ok(())
}

/// Bind `addr` and serve `root` until the process exits.
pub fn serve(addr: impl ToSocketAddrs + std::fmt::Display, root: PathBuf) -> Result<(), ServerError> {
    if !root.is_dir() {
        return Err(ServerError::MissingRoot(root));
    }
    if !root.join(ENTRY_DOCUMENT).is_file() {
        log::warn!("{} has no {ENTRY_DOCUMENT}", root.display());
    }
    let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;
    log::info!("Serving {} on {}", root.display(), listener.local_addr()?);
    serve_listener(listener, root)
}
