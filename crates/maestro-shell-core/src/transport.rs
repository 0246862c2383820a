//! Transport — HTTP/1.1 over the daemon's Unix domain socket.
//!
//! [`UnixTransport::open`] connects once at startup so an unreachable
//! daemon is reported before the shell starts. Afterwards each request takes
//! an idle HTTP/1.1 sender from a small pool, or dials a fresh stream when
//! all of them are busy, so a held long-poll never blocks a user command.
//! Failures are returned to the caller as-is; nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1::{self, SendRequest};
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tracing::debug;

use crate::BoxFuture;

/// Idle senders kept around for reuse.
const MAX_IDLE_SENDERS: usize = 2;

/// Errors from the socket transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("maestro is not running (socket not found at {0})")]
    NotRunning(PathBuf),

    #[error("failed to connect to maestro socket at {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("request failed: {0}")]
    Request(String),
}

/// Status and body of one daemon response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the daemon answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The status as the daemon would print it, e.g. `200 OK`.
    pub fn status_line(&self) -> String {
        self.status.to_string()
    }
}

/// A request/response channel to the daemon.
///
/// Implementations must accept concurrent calls: the interactive loop and the
/// event poller share one transport.
pub trait Transport: Send + Sync {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Vec<u8>>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>>;
}

/// Transport to the daemon over a Unix socket.
pub struct UnixTransport {
    socket_path: PathBuf,
    idle: Mutex<Vec<SendRequest<Full<Bytes>>>>,
}

impl UnixTransport {
    /// Connect to the daemon socket and keep the connection for reuse.
    pub async fn open(socket_path: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let transport = Self {
            socket_path: socket_path.into(),
            idle: Mutex::new(Vec::new()),
        };
        let sender = transport.dial().await?;
        transport.release(sender);
        debug!(path = %transport.socket_path.display(), "connected to maestro");
        Ok(transport)
    }

    /// The socket this transport talks to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn dial(&self) -> Result<SendRequest<Full<Bytes>>, TransportError> {
        if !self.socket_path.exists() {
            return Err(TransportError::NotRunning(self.socket_path.clone()));
        }

        let stream =
            UnixStream::connect(&self.socket_path)
                .await
                .map_err(|e| TransportError::Connect {
                    path: self.socket_path.clone(),
                    source: e,
                })?;

        let (sender, conn) = http1::handshake::<_, Full<Bytes>>(TokioIo::new(stream))
            .await
            .map_err(|e| TransportError::Request(format!("HTTP handshake failed: {e}")))?;

        // Drive the connection in the background
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "maestro connection closed with error");
            }
        });

        Ok(sender)
    }

    fn checkout(&self) -> Option<SendRequest<Full<Bytes>>> {
        let mut idle = self.idle.lock().ok()?;
        while let Some(sender) = idle.pop() {
            if !sender.is_closed() && sender.is_ready() {
                return Some(sender);
            }
        }
        None
    }

    fn release(&self, sender: SendRequest<Full<Bytes>>) {
        if sender.is_closed() {
            return;
        }
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_SENDERS {
                idle.push(sender);
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, TransportError> {
        let mut sender = match self.checkout() {
            Some(sender) => sender,
            None => self.dial().await?,
        };

        sender
            .ready()
            .await
            .map_err(|e| TransportError::Request(format!("connection not ready: {e}")))?;

        debug!(%method, path, "maestro request");

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        if body.is_some() {
            builder = builder.header("content-type", "application/json; charset=utf-8");
        }

        let req_body = match body {
            Some(data) => Full::new(Bytes::from(data)),
            None => Full::new(Bytes::new()),
        };

        let req = builder
            .body(req_body)
            .map_err(|e| TransportError::Request(format!("failed to build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status();

        let resp_body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| TransportError::Request(format!("failed to read response body: {e}")))?
            .to_bytes();

        debug!(%status, bytes = resp_body.len(), "maestro response");

        self.release(sender);
        Ok(RawResponse::new(status, resp_body))
    }
}

impl Transport for UnixTransport {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Vec<u8>>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>> {
        Box::pin(self.send(method, path, body))
    }
}
