//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use fuel::http::Response;
use fuel::transport::{Transport, TransportError, TransportRequest};
use fuel::FuelManager;

type Handler = dyn Fn(&TransportRequest) -> Result<Response, TransportError> + Send + Sync;

/// In-memory transport with a scripted handler, a call counter and a log of
/// every request it received.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: AtomicUsize,
    recorded: Mutex<Vec<TransportRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&TransportRequest) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Same as `new`, but every call waits `delay` before answering.
    pub fn slow<F>(delay: Duration, handler: F) -> Arc<Self>
    where
        F: Fn(&TransportRequest) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            recorded: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    /// Always answers `status` with `body`.
    pub fn fixed(status: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |req| Ok(respond(req, status, body)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<TransportRequest> {
        self.recorded.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn execute<'a>(
        &'a self,
        request: &'a TransportRequest,
    ) -> BoxFuture<'a, Result<Response, TransportError>> {
        async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.recorded.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            (self.handler)(request)
        }
        .boxed()
    }
}

/// Response for `req` with a status, a text body and no headers.
pub fn respond(req: &TransportRequest, status: u16, body: &str) -> Response {
    Response::new(req.url.clone(), status)
        .with_message(reason(status))
        .with_body(body.to_string())
}

/// Redirect response pointing at `location`.
pub fn redirect_to(req: &TransportRequest, status: u16, location: &str) -> Response {
    Response::new(req.url.clone(), status)
        .with_message(reason(status))
        .with_header("Location", location)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        404 => "Not Found",
        418 => "I'm a teapot",
        500 => "Internal Server Error",
        _ => "",
    }
}

/// Manager on the ambient test runtime, using `transport`.
pub fn manager_with(transport: Arc<MockTransport>) -> FuelManager {
    FuelManager::builder()
        .transport(transport)
        .build()
        .unwrap()
}

/// Start a raw-TCP backend on an ephemeral port.
///
/// `f` receives the request line (`GET /path HTTP/1.1`) and returns status,
/// extra headers and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<(String, String)>, String)> + Send + 'static,
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
                        let head = read_head(&mut socket).await;
                        let request_line = head.lines().next().unwrap_or_default().to_string();
                        let (status, headers, body) = f(request_line).await;

                        let mut response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status,
                            reason(status),
                            body.len()
                        );
                        for (name, value) in headers {
                            response.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        response.push_str("\r\n");
                        response.push_str(&body);

                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that sends its headers at once and then `body` one byte
/// per `interval`.
pub async fn start_trickle_backend(body: &'static [u8], interval: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_head(&mut socket).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for byte in body {
                    tokio::time::sleep(interval).await;
                    if socket.write_all(&[*byte]).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
