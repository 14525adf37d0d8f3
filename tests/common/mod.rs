//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use arweave_uploader::config::UploaderConfig;
use arweave_uploader::Transaction;
use arweave_uploader::Wallet;

/// Anchor every mock gateway hands out.
pub const ANCHOR: &str = "YW5jaG9yLWZvci1pbnRlZ3JhdGlvbi10ZXN0cyEhISE";

/// Observable state of a mock gateway.
#[derive(Default)]
pub struct GatewayState {
    /// Raw bodies received on `POST /tx`.
    pub commits: Mutex<Vec<Vec<u8>>>,
    /// Number of `GET /tx/{id}` requests.
    pub polls: AtomicUsize,
    /// Answer 202 to this many polls before returning a committed transaction.
    pub pending_polls: AtomicUsize,
    /// Reject commits with 400.
    pub reject_commits: AtomicBool,
}

impl GatewayState {
    pub fn committed(&self) -> Vec<Transaction> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .map(|body| Transaction::unmarshal(body).unwrap())
            .collect()
    }

    fn find(&self, id: &str) -> Option<Vec<u8>> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .find(|body| {
                Transaction::unmarshal(body)
                    .map(|tx| tx.id() == id)
                    .unwrap_or(false)
            })
            .cloned()
    }
}

/// Price quoted for `len` bytes.
pub fn price_for(len: usize) -> String {
    (len * 1000 + 12345).to_string()
}

/// Start a mock gateway on an ephemeral local port.
pub async fn start_mock_gateway() -> (SocketAddr, Arc<GatewayState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(GatewayState::default());

    let shared = state.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let state = shared.clone();
                    tokio::spawn(async move {
                        handle(socket, state).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, state)
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn handle(mut socket: TcpStream, state: Arc<GatewayState>) {
    let Some((method, path, body)) = read_request(&mut socket).await else {
        return;
    };

    let (status, body) = match (method.as_str(), path.as_str()) {
        ("GET", "/tx_anchor") => (200, ANCHOR.as_bytes().to_vec()),
        ("GET", p) if p.starts_with("/price/") => {
            let len: usize = p["/price/".len()..].parse().unwrap_or(0);
            (200, price_for(len).into_bytes())
        }
        ("POST", "/tx") => {
            if state.reject_commits.load(Ordering::SeqCst) {
                (400, b"Transaction verification failed.".to_vec())
            } else {
                state.commits.lock().unwrap().push(body);
                (200, b"OK".to_vec())
            }
        }
        ("GET", p) if p.starts_with("/tx/") => {
            let id = &p["/tx/".len()..];
            let seen = state.polls.fetch_add(1, Ordering::SeqCst);
            match state.find(id) {
                Some(_) if seen < state.pending_polls.load(Ordering::SeqCst) => {
                    (202, b"Pending".to_vec())
                }
                Some(found) => (200, found),
                None => (404, b"Not Found".to_vec()),
            }
        }
        _ => (500, b"unexpected request".to_vec()),
    };

    let status_text = match status {
        200 => "200 OK",
        202 => "202 Accepted",
        400 => "400 Bad Request",
        404 => "404 Not Found",
        _ => "500 Internal Server Error",
    };
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_text,
        body.len()
    );
    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(&body).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some((method, path, body))
}

static WALLET: OnceLock<Wallet> = OnceLock::new();

/// A 1024-bit wallet shared by every test in the binary.
pub fn test_wallet() -> &'static Wallet {
    WALLET.get_or_init(|| Wallet::generate(1024).unwrap())
}

/// Write the test wallet's JWK into `dir`.
pub fn write_wallet(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("wallet.json");
    let jwk = test_wallet().to_jwk().unwrap();
    std::fs::write(&path, serde_json::to_vec(&jwk).unwrap()).unwrap();
    path
}

/// Config pointing at a local mock gateway.
pub fn local_config(addr: SocketAddr, wallet: Option<PathBuf>) -> UploaderConfig {
    let mut config = UploaderConfig::default();
    config.gateway.host = addr.ip().to_string();
    config.gateway.port = addr.port();
    config.gateway.protocol = "http".to_string();
    config.gateway.request_timeout_secs = 5;
    config.wallet.path = wallet;
    config.upload.poll_interval_ms = 20;
    config
}
