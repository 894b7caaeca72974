//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use webhook_router::config::RouterConfig;
use webhook_router::http::HttpServer;
use webhook_router::lifecycle::Shutdown;

/// Bind an ephemeral local port.
pub async fn bind_local() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing listens on.
pub async fn refused_addr() -> SocketAddr {
    let (listener, addr) = bind_local().await;
    drop(listener);
    addr
}

/// Read one HTTP/1.1 request (head + `Content-Length` body) and return its raw bytes.
pub async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            return raw;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(head_end) = find_head_end(&raw) {
            let wanted = head_end + content_length(&raw[..head_end]);
            while raw.len() < wanted {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            return raw;
        }
    }
}

fn find_head_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &str) {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("OK");
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a simple mock backend that returns a fixed 200 response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let (listener, addr) = bind_local().await;
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let (status, body) = f().await;
                write_response(&mut socket, status, &body).await;
            });
        }
    });
    addr
}

/// Backend that answers after `delay`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (200, "late".to_string())
    })
    .await
}

/// Backend that hands every raw request to the returned receiver, then answers 200.
pub async fn start_recording_backend() -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let (listener, addr) = bind_local().await;
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let raw = read_request(&mut socket).await;
                let _ = tx.send(raw);
                write_response(&mut socket, 200, "recorded").await;
            });
        }
    });
    (addr, rx)
}

/// Backend that reads the request and closes the connection without answering
/// for its first `failures` connections, then answers 200 with `body`.
/// The counter tracks accepted connections.
pub async fn start_flaky_backend(failures: u32, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let (listener, addr) = bind_local().await;
    let accepted = Arc::new(AtomicU32::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                read_request(&mut socket).await;
                if seen < failures {
                    drop(socket);
                } else {
                    write_response(&mut socket, 200, body).await;
                }
            });
        }
    });
    (addr, accepted)
}

/// A running router bound to an ephemeral port.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestRouter {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the router over real TCP.
pub async fn start_router(config: RouterConfig) -> TestRouter {
    let (listener, addr) = bind_local().await;
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();

    tokio::spawn(async move {
        let _ = server.run(listener, signalled).await;
    });
    TestRouter { addr, shutdown }
}

/// Non-pooled client so every request is a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
