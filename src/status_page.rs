//! Local HTTP status page for a Claire client.
//!
//! Serves `/.current`:
//! - `GET /.current` → 200 with the current status document
//! - `GET /.current?build` (or `?b`) → build info as JSON (`null` if unset)
//! - `GET /.current?runtime` (or `?r`) → runtime status, 503 if no callback is registered
//! - `POST /.current?initiate_keepalive` → force a keepalive, 503 if not registered
//! - Other methods → 405, other paths → 404
//!
//! Uses raw TCP + manual HTTP to avoid adding a web framework dependency.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::beacon::Claire;
use crate::error::Result;

/// Path the status page is served under.
pub const STATUS_PATH: &str = "/.current";

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// A running status page listener.
pub struct StatusPage {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl StatusPage {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

/// Bind `host:port` and serve the status page for `claire`.
pub async fn start_status_page(host: &str, port: u16, claire: Claire) -> Result<StatusPage> {
    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Status page listening on http://{}{}", addr, STATUS_PATH);

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut stream, _peer)) => {
                    let claire = claire.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let n = match tokio::time::timeout(
                            Duration::from_secs(5),
                            stream.read(&mut buf),
                        )
                        .await
                        {
                            Ok(Ok(n)) => n,
                            _ => return,
                        };

                        let request = String::from_utf8_lossy(&buf[..n]);
                        let request_line = request.lines().next().unwrap_or_default();
                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or_default();
                        let target = parts.next().unwrap_or_default();

                        let (status_line, content_type, body) =
                            route(&claire, method, target).await;

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line,
                            content_type,
                            body.len(),
                            body
                        );

                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Status page accept error");
                }
            }
        }
    });

    Ok(StatusPage { addr, handle })
}

/// Map a request line to `(status line, content type, body)`.
async fn route(claire: &Claire, method: &str, target: &str) -> (&'static str, &'static str, String) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != STATUS_PATH {
        return ("404 Not Found", TEXT, "Not found.\n".to_string());
    }
    let has = |names: &[&str]| {
        query
            .split('&')
            .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
            .any(|key| names.contains(&key))
    };

    match method {
        "GET" => {
            let all = has(&["all", "a"]);
            if !all && has(&["build", "b"]) {
                let build = claire.identity().build_info.clone().unwrap_or_default();
                ("200 OK", JSON, to_json(&build))
            } else if !all && has(&["runtime", "r"]) {
                match claire.runtime_status() {
                    Some(runtime) => ("200 OK", JSON, to_json(&runtime)),
                    None => ("503 Service Unavailable", TEXT, "Not ready.\n".to_string()),
                }
            } else {
                ("200 OK", JSON, to_json(&claire.current_status()))
            }
        }
        "POST" if has(&["initiate_keepalive"]) => {
            if claire.force_send_keepalive().await {
                ("200 OK", TEXT, "Keepalive will be sent shortly.\n".to_string())
            } else {
                ("503 Service Unavailable", TEXT, "Not registered.\n".to_string())
            }
        }
        "POST" => (
            "400 Bad Request",
            TEXT,
            "Valid URL parameter required.\n".to_string(),
        ),
        _ => (
            "405 Method Not Allowed",
            TEXT,
            "Method not allowed.\n".to_string(),
        ),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
