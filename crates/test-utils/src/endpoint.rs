use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// Minimal HTTP server standing in for the target server's reload endpoint.
///
/// Responds with the queued statuses in order, then with `fallback`.
/// Records the request line of every request it answered.
#[derive(Clone)]
pub struct ScriptedEndpoint {
    addr: SocketAddr,
    statuses: Arc<Mutex<VecDeque<u16>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEndpoint {
    pub async fn start(statuses: impl IntoIterator<Item = u16>, fallback: u16) -> Self {
        Self::start_with_delay(statuses, fallback, Duration::ZERO).await
    }

    /// Like [`ScriptedEndpoint::start`], but waits `delay` before answering.
    pub async fn start_with_delay(
        statuses: impl IntoIterator<Item = u16>,
        fallback: u16,
        delay: Duration,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = Self {
            addr,
            statuses: Arc::new(Mutex::new(statuses.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let server = endpoint.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move {
                    let Some(request_line) = read_request_head(&mut socket).await else {
                        return;
                    };
                    tokio::time::sleep(delay).await;

                    let status = server.statuses.lock().unwrap().pop_front().unwrap_or(fallback);
                    server.requests.lock().unwrap().push(request_line);

                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status,
                        reason(status)
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        endpoint
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/-/reload", self.addr)).unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn push_statuses(&self, statuses: impl IntoIterator<Item = u16>) {
        self.statuses.lock().unwrap().extend(statuses);
    }
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines().next().map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
