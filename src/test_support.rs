//! In-process stand-in for the JADX plugin's HTTP server.
//!
//! Serves canned bodies per path and records every request so tests can
//! check what was sent and how often.

use crate::config::BackendConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Decoded query parameters followed by form fields.
    pub params: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Routes = Arc<Mutex<HashMap<String, (u16, String)>>>;
type Log = Arc<Mutex<Vec<RecordedRequest>>>;
type Delays = Arc<Mutex<HashMap<String, Duration>>>;

pub struct MockBackend {
    addr: SocketAddr,
    routes: Routes,
    requests: Log,
    delays: Delays,
    task: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock address");
        let routes: Routes = Arc::default();
        let requests: Log = Arc::default();
        let delays: Delays = Arc::default();

        let task = {
            let routes = routes.clone();
            let requests = requests.clone();
            let delays = delays.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let routes = routes.clone();
                    let requests = requests.clone();
                    let delays = delays.clone();
                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            handle(req, routes.clone(), requests.clone(), delays.clone())
                        });
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
            })
        };

        Self {
            addr,
            routes,
            requests,
            delays,
            task,
        }
    }

    /// Answer `path` with `status` and `body` from now on.
    pub fn respond(&self, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .expect("routes")
            .insert(path.to_string(), (status, body.into()));
    }

    /// Answer `path` with `body` when the request asks for `page_index`.
    /// Takes precedence over [`respond`](Self::respond).
    pub fn respond_page(&self, path: &str, page_index: u64, body: impl Into<String>) {
        self.routes
            .lock()
            .expect("routes")
            .insert(format!("{path}?page_index={page_index}"), (200, body.into()));
    }

    /// Hold every answer on `path` for `delay` after the request arrives.
    pub fn hold(&self, path: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("delays")
            .insert(path.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests").clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            timeout_secs: 5,
        }
    }

    /// A config pointing at a local port nothing listens on.
    pub fn unreachable_config() -> BackendConfig {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind spare port");
        let port = listener.local_addr().expect("spare address").port();
        drop(listener);
        BackendConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout_secs: 2,
        }
    }
}

/// A backend that announces a body and closes the connection halfway
/// through it.
pub async fn truncating_backend() -> (BackendConfig, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind truncating backend");
    let addr = listener.local_addr().expect("truncating address");
    let task = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 4096\r\n\r\n{\"content\": \"package com.",
                )
                .await;
            let _ = stream.shutdown().await;
        }
    });
    let config = BackendConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        timeout_secs: 5,
    };
    (config, task)
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    req: Request<Incoming>,
    routes: Routes,
    requests: Log,
    delays: Delays,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().trim_start_matches('/').to_string();
    let mut params = decode_pairs(req.uri().query().unwrap_or(""));
    let body = req
        .into_body()
        .collect()
        .await
        .map(|b| b.to_bytes())
        .unwrap_or_default();
    params.extend(decode_pairs(&String::from_utf8_lossy(&body)));

    let paged_route = params
        .iter()
        .find(|(k, _)| k == "page_index")
        .map(|(_, v)| format!("{path}?page_index={v}"));
    requests.lock().expect("requests").push(RecordedRequest {
        method,
        path: path.clone(),
        params,
    });

    let delay = delays.lock().expect("delays").get(&path).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = {
        let routes = routes.lock().expect("routes");
        paged_route
            .and_then(|route| routes.get(&route))
            .or_else(|| routes.get(&path))
            .cloned()
            .unwrap_or((404, format!(r#"{{"error":"no route for {path}"}}"#)))
    };
    let response = Response::builder()
        .status(status)
        .body(Full::new(Bytes::from(body)))
        .expect("mock response");
    Ok(response)
}

fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    if encoded.is_empty() {
        return Vec::new();
    }
    reqwest::Url::parse(&format!("http://mock/?{encoded}"))
        .map(|url| url.query_pairs().into_owned().collect())
        .unwrap_or_default()
}
