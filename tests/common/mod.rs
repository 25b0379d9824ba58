//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;

use rpc_fallback::config::{ClientConfig, NetworkConfig};
use rpc_fallback::rpc::{HttpReply, JsonRpcRequest, RpcTransport, TransportFailure};

pub fn rpc_result(result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string()
}

pub fn rpc_error(code: i64, message: &str) -> String {
    json!({"jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}}).to_string()
}

/// Client config with one network and the periodic health check off.
pub fn test_config(network: &str, urls: &[&str], retry_attempts: u32, retry_delay_ms: u64) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.health_check.enabled = false;
    let mut net = NetworkConfig::new(network, urls.iter().map(|u| u.to_string()).collect());
    net.retry_attempts = retry_attempts;
    net.retry_delay_ms = retry_delay_ms;
    config.networks.push(net);
    config
}

/// Start a programmable JSON-RPC backend on an ephemeral port.
///
/// The whole request is read before `f` is asked for the `(status, body)` reply.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        if read_request(&mut socket).await.is_none() {
                            return;
                        }
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read headers and a `Content-Length` body. `None` if the peer went away.
async fn read_request(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return Some(buf[end + 4..end + 4 + length].to_vec());
            }
        }
    }
}

/// One scripted reaction of [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(u16, String),
    Delayed(Duration, u16, String),
    /// Never answers.
    Hang,
    Refused,
}

impl Scripted {
    pub fn ok(result: Value) -> Self {
        Scripted::Reply(200, rpc_result(result))
    }
}

/// In-memory transport answering from per-URL scripts.
///
/// Each URL plays its queued reactions in order, then repeats its
/// `always` reaction. URLs with neither are refused.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    always: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<(String, Instant)>>,
    active: Arc<AtomicUsize>,
    peak: AtomicUsize,
}

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, url: &str, reaction: Scripted) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reaction);
        self
    }

    pub fn always(self, url: &str, reaction: Scripted) -> Self {
        self.always.lock().unwrap().insert(url.to_string(), reaction);
        self
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// URLs in the order they were called.
    pub fn call_order(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_reaction(&self, url: &str) -> Scripted {
        if let Some(reaction) = self.queued.lock().unwrap().get_mut(url).and_then(VecDeque::pop_front) {
            return reaction;
        }
        self.always
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Scripted::Refused)
    }
}

impl RpcTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        url: &'a str,
        _request: &'a JsonRpcRequest,
    ) -> BoxFuture<'a, Result<HttpReply, TransportFailure>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push((url.to_string(), Instant::now()));
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_active, Ordering::SeqCst);
            let _guard = ActiveGuard(self.active.clone());

            match self.next_reaction(url) {
                Scripted::Reply(status, body) => Ok(HttpReply::new(status, body)),
                Scripted::Delayed(delay, status, body) => {
                    tokio::time::sleep(delay).await;
                    Ok(HttpReply::new(status, body))
                }
                Scripted::Hang => std::future::pending().await,
                Scripted::Refused => Err(TransportFailure::Connection("connection refused".to_string())),
            }
        })
    }
}
