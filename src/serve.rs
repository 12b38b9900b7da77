//! Read-only preview server for the build output.
//!
//! Built on `tiny_http`:
//!
//! - Static file serving from the build output directory
//! - Automatic `index.html` resolution for directories
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (Watch Loop)    │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Handle requests         Rebuild on change
//! └─────────────────────────────────────────────┘
//!                    │
//!                    ▼
//!            config.build.output
//!              (public/ dir)
//! ```
//!
//! The output tree is read without locking; a request that lands mid-rebuild
//! may see a partially written tree.

use crate::{config::ServeConfig, log};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

// ============================================================================
// Server
// ============================================================================

/// HTTP server bound to one address, serving files under `root`.
pub struct PreviewServer {
    server: Arc<Server>,
    addr: SocketAddr,
    root: PathBuf,
}

impl PreviewServer {
    /// Bind to `[serve].interface:[serve].port`.
    pub fn bind(config: &ServeConfig, root: &Path) -> Result<Self> {
        let interface: IpAddr = config
            .interface
            .parse()
            .with_context(|| format!("Invalid interface `{}`", config.interface))?;
        Self::bind_addr(SocketAddr::new(interface, config.port), root)
    }

    /// Bind to an explicit address. Port 0 picks a free port.
    pub fn bind_addr(addr: SocketAddr, root: &Path) -> Result<Self> {
        let server = Server::http(addr).map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?;
        let addr = server.server_addr().to_ip().unwrap_or(addr);
        Ok(Self {
            server: Arc::new(server),
            addr,
            root: root.to_path_buf(),
        })
    }

    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Unblock a running server from a Ctrl+C handler.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let server = Arc::clone(&self.server);
        ctrlc::set_handler(move || {
            log!("serve"; "shutting down...");
            server.unblock();
        })
        .context("Failed to set Ctrl+C handler")
    }

    /// Stop a running server.
    #[cfg(test)]
    pub fn shutdown(&self) {
        self.server.unblock();
    }

    /// Handle requests until unblocked.
    pub fn run(&self) {
        log!("serve"; "http://{}", self.local_addr());

        for request in self.server.incoming_requests() {
            if let Err(e) = handle_request(request, &self.root) {
                log!("serve"; "request error: {e:#}");
            }
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Request resolution order:
/// 1. Exact file match → serve file
/// 2. Directory with index.html → serve index.html
/// 3. Anything else → 404
fn handle_request(request: Request, root: &Path) -> Result<()> {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return serve_status(request, 405, "405 Method Not Allowed");
    }

    match resolve_path(root, request.url()) {
        Some(path) => serve_file(request, &path),
        None => serve_status(request, 404, "404 Not Found"),
    }
}

/// Map a request URL onto a file under `root`.
///
/// Query strings are dropped and percent-encoding decoded. Any `..`
/// component is rejected.
fn resolve_path(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = urlencoding::decode(path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));

    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    let local = root.join(relative);
    if local.is_file() {
        return Some(local);
    }
    let index = local.join("index.html");
    (local.is_dir() && index.is_file()).then_some(index)
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content).with_header(content_type(guess_content_type(path)));
    request.respond(response)?;
    Ok(())
}

fn serve_status(request: Request, code: u16, body: &str) -> Result<()> {
    let response = Response::from_string(body)
        .with_status_code(StatusCode(code))
        .with_header(content_type("text/plain; charset=utf-8"));
    request.respond(response)?;
    Ok(())
}

fn content_type(value: &'static str) -> Header {
    Header::from_bytes("Content-Type", value).unwrap()
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpStream,
        thread,
    };
    use tempfile::TempDir;

    fn output_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("index.html"), "<h1>index</h1>").unwrap();
        fs::write(dir.path().join("posts/2024-01-01-hello_world.html"), "hello").unwrap();
        fs::write(dir.path().join("assets/my logo.png"), "png").unwrap();
        dir
    }

    #[test]
    fn test_resolve_files_and_index() {
        let dir = output_tree();
        let root = dir.path();

        assert_eq!(resolve_path(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve_path(root, ""), Some(root.join("index.html")));
        assert_eq!(
            resolve_path(root, "/posts/2024-01-01-hello_world.html?t=123"),
            Some(root.join("posts/2024-01-01-hello_world.html"))
        );
        assert_eq!(
            resolve_path(root, "/assets/my%20logo.png"),
            Some(root.join("assets/my logo.png"))
        );
    }

    #[test]
    fn test_resolve_not_found() {
        let dir = output_tree();
        let root = dir.path();

        assert_eq!(resolve_path(root, "/missing.html"), None);
        // directory without index.html
        assert_eq!(resolve_path(root, "/posts/"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = output_tree();
        let root = dir.path().join("posts");

        assert_eq!(resolve_path(&root, "/../index.html"), None);
        assert_eq!(resolve_path(&root, "/%2e%2e/index.html"), None);
        assert_eq!(resolve_path(&root, "/a/../../index.html"), None);
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a.html")), "text/html; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("style.css")), "text/css; charset=utf-8");
        assert_eq!(guess_content_type(Path::new("logo.png")), "image/png");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_live_requests() {
        let dir = output_tree();
        let addr = "127.0.0.1:0".parse().unwrap();
        let server = Arc::new(PreviewServer::bind_addr(addr, dir.path()).unwrap());
        let addr = server.local_addr();
        assert_ne!(addr.port(), 0);

        let handle = {
            let server = Arc::clone(&server);
            thread::spawn(move || server.run())
        };

        let ok = get(addr, "/");
        assert!(ok.starts_with("HTTP/1.1 200"));
        assert!(ok.contains("text/html"));
        assert!(ok.ends_with("<h1>index</h1>"));

        let missing = get(addr, "/nope.html");
        assert!(missing.starts_with("HTTP/1.1 404"));

        server.shutdown();
        handle.join().unwrap();
    }
}
