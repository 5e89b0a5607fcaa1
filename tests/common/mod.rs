//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use video_relay::config::RelayConfig;
use video_relay::{HttpServer, Shutdown};

/// Request head as seen by a mock origin.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What a mock origin does with a request.
pub enum Reply {
    /// Fixed status, headers and body, then close.
    Full {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
    },
    /// Read the request and never answer.
    Hang,
    /// Never answer; report how long until the peer closed the socket.
    AwaitClose {
        closed: mpsc::UnboundedSender<Duration>,
    },
    /// Send headers, then a chunk every `interval` until the peer goes away.
    Trickle {
        chunk: Vec<u8>,
        interval: Duration,
        closed: mpsc::UnboundedSender<()>,
    },
    /// Promise `declared` bytes, send `sent`, then close.
    Truncated { declared: usize, sent: usize },
}

impl Reply {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Reply::Full {
            status: 200,
            headers: vec![("Content-Type", content_type.to_string())],
            body: body.to_vec(),
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Reply::Full {
            status,
            headers: vec![("Location", location.to_string())],
            body: Vec::new(),
        }
    }
}

/// A running mock origin.
pub struct Origin {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    connections: Arc<AtomicUsize>,
}

impl Origin {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a programmable origin on an ephemeral port.
pub async fn start_origin<F>(f: F) -> Origin
where
    F: Fn(&CapturedRequest) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let connections = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);

    let (req_log, conn_count) = (requests.clone(), connections.clone());
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    conn_count.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    let req_log = req_log.clone();
                    tokio::spawn(async move {
                        let Some((request, socket)) = read_head(socket).await else {
                            return;
                        };
                        req_log.lock().unwrap().push(request.clone());
                        let reply = (*f)(&request);
                        write_reply(socket, reply, &request.method).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    Origin {
        addr,
        requests,
        connections,
    }
}

async fn read_head(socket: TcpStream) -> Option<(CapturedRequest, TcpStream)> {
    let mut reader = BufReader::new(socket);
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            break;
        }
        if let Some((k, v)) = trimmed.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    Some((CapturedRequest { method, path, headers }, reader.into_inner()))
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        404 => "Not Found",
        416 => "Range Not Satisfiable",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

async fn write_reply(mut socket: TcpStream, reply: Reply, method: &str) {
    match reply {
        Reply::Full { status, headers, body } => {
            let mut head = format!("HTTP/1.1 {} {}\r\n", status, status_text(status));
            for (k, v) in &headers {
                head.push_str(&format!("{}: {}\r\n", k, v));
            }
            if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-length")) {
                head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
            head.push_str("Connection: close\r\n\r\n");
            let _ = socket.write_all(head.as_bytes()).await;
            if method != "HEAD" {
                let _ = socket.write_all(&body).await;
            }
            let _ = socket.shutdown().await;
        }
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Reply::AwaitClose { closed } => {
            let started = tokio::time::Instant::now();
            let mut buf = [0u8; 1024];
            let deadline = tokio::time::sleep(Duration::from_secs(30));
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => return,
                    read = socket.read(&mut buf) => match read {
                        Ok(0) | Err(_) => break,
                        Ok(_) => continue,
                    },
                }
            }
            let _ = closed.send(started.elapsed());
        }
        Reply::Trickle { chunk, interval, closed } => {
            let head = "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: 1000000000\r\nConnection: close\r\n\r\n";
            if socket.write_all(head.as_bytes()).await.is_err() {
                let _ = closed.send(());
                return;
            }
            for _ in 0..1000 {
                if socket.write_all(&chunk).await.is_err() || socket.flush().await.is_err() {
                    let _ = closed.send(());
                    return;
                }
                tokio::time::sleep(interval).await;
            }
        }
        Reply::Truncated { declared, sent } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![b'x'; sent]).await;
            let _ = socket.shutdown().await;
        }
    }
}

/// A relay server running on an ephemeral port.
pub struct RelayHandle {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl RelayHandle {
    /// Relay URL for `target` on the default `/proxy` path.
    pub fn proxy_url(&self, target: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
        format!("http://{}/proxy?url={}", self.addr, encoded)
    }

    pub fn path_url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

pub async fn start_relay(config: RelayConfig) -> RelayHandle {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    RelayHandle { addr, shutdown }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
