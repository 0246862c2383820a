//! Daemon client — typed operations against the maestro API.
//!
//! Every operation is one request/response round-trip over the shared
//! [`Transport`], except [`DaemonClient::subscribe_net_events`], which also
//! starts the background listener in [`events`].
//!
//! | operation | request |
//! |---|---|
//! | alive | `GET /alive` |
//! | interfaces | `GET`/`PUT /net/interfaces` |
//! | events | `GET /net/events`, then `GET /net/events/{id}` |
//! | DNS | `GET`/`PUT`/`DELETE /net/dns` |
//! | logging | `GET`/`PUT`/`DELETE /log/filter` |
//! | jobs | `GET /jobs` |

pub mod events;
pub mod options;
pub mod types;

use std::sync::Arc;

use hyper::Method;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

pub use events::Notification;
pub use options::ValidationError;
pub use types::{AliveResponse, ErrorResponse, InterfaceConfig, LogFilter, SubscribeResponse};

use crate::render::{self, RenderError};
use crate::transport::{RawResponse, Transport, TransportError};

pub const ALIVE_PATH: &str = "/alive";
pub const NET_INTERFACES_PATH: &str = "/net/interfaces";
pub const NET_EVENTS_PATH: &str = "/net/events";
pub const NET_DNS_PATH: &str = "/net/dns";
pub const LOG_FILTER_PATH: &str = "/log/filter";
pub const JOBS_PATH: &str = "/jobs";

/// Errors from daemon operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Maestro could not connect.")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to encode request: {0}")]
    Encode(serde_json::Error),

    /// The daemon answered, but with a failure.
    #[error("{0}")]
    Daemon(String),
}

/// Client for the maestro daemon API.
pub struct DaemonClient {
    transport: Arc<dyn Transport>,
    events: events::NetEvents,
}

impl DaemonClient {
    /// Create a client over `transport`. Network events are delivered to
    /// `notifications`.
    pub fn new(transport: Arc<dyn Transport>, notifications: mpsc::Sender<Notification>) -> Self {
        Self {
            transport,
            events: events::NetEvents::new(notifications),
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ClientError> {
        let resp = self.transport.request(method, path, body).await?;
        debug!(path, status = %resp.status_line(), body = %String::from_utf8_lossy(&resp.body), "maestro replied");
        if resp.is_success() {
            return Ok(resp);
        }
        if let Ok(err) = serde_json::from_slice::<ErrorResponse>(&resp.body) {
            if !err.error.is_empty() {
                return Err(ClientError::Daemon(err.error));
            }
        }
        Err(ClientError::Daemon(format!(
            "maestro returned {}",
            resp.status_line()
        )))
    }

    /// `GET` a path and render the body under `label`.
    async fn get_rendered(&self, path: &str, label: &str) -> Result<String, ClientError> {
        let resp = self.call(Method::GET, path, None).await?;
        let text = render::render(&resp.body)?;
        Ok(format!("{label}:\n{text}"))
    }

    /// Send `body` as JSON and return the status line.
    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<String, ClientError> {
        let bytes = serde_json::to_vec(body).map_err(ClientError::Encode)?;
        let resp = self.call(method, path, Some(bytes)).await?;
        Ok(resp.status_line())
    }

    // ── Typed API methods ──────────────────────────────────────────────

    /// Liveness check.
    pub async fn alive(&self) -> Result<AliveResponse, ClientError> {
        let resp = self.call(Method::GET, ALIVE_PATH, None).await?;
        serde_json::from_slice(&resp.body).map_err(|e| ClientError::Decode {
            what: "alive",
            source: e,
        })
    }

    /// All interfaces and their configuration, rendered.
    pub async fn net_interfaces(&self) -> Result<String, ClientError> {
        self.get_rendered(NET_INTERFACES_PATH, "interfaces").await
    }

    /// Configure one interface from `key=value` options.
    pub async fn config_net_interface(&self, options: &[&str]) -> Result<String, ClientError> {
        let config = InterfaceConfig::from_options(options.iter().copied())?;
        debug!(?config, "configuring interface");
        self.send_json(Method::PUT, NET_INTERFACES_PATH, &[config])
            .await
    }

    /// Subscribe to network events, starting the listener if needed.
    pub async fn subscribe_net_events(&self) -> Result<String, ClientError> {
        self.events.subscribe(&self.transport).await
    }

    /// The live network events subscription ID, if any.
    pub fn net_events_subscription(&self) -> Option<String> {
        self.events.subscription_id()
    }

    /// Whether the network events listener is running.
    pub fn net_events_running(&self) -> bool {
        self.events.is_running()
    }

    /// Configured DNS servers, rendered.
    pub async fn dns(&self) -> Result<String, ClientError> {
        self.get_rendered(NET_DNS_PATH, "dns").await
    }

    pub async fn add_dns(&self, servers: &[&str]) -> Result<String, ClientError> {
        let servers = options::dns_servers(servers.iter().copied())?;
        self.send_json(Method::PUT, NET_DNS_PATH, &servers).await
    }

    pub async fn delete_dns(&self, servers: &[&str]) -> Result<String, ClientError> {
        let servers = options::dns_servers(servers.iter().copied())?;
        self.send_json(Method::DELETE, NET_DNS_PATH, &servers).await
    }

    /// Logging target filters, rendered.
    pub async fn logging(&self) -> Result<String, ClientError> {
        self.get_rendered(LOG_FILTER_PATH, "logging").await
    }

    pub async fn set_logging(&self, options: &[&str]) -> Result<String, ClientError> {
        let filter = LogFilter::from_options(options.iter().copied())?;
        self.send_json(Method::PUT, LOG_FILTER_PATH, &[filter]).await
    }

    pub async fn delete_logging(&self, options: &[&str]) -> Result<String, ClientError> {
        let filter = LogFilter::from_options(options.iter().copied())?;
        self.send_json(Method::DELETE, LOG_FILTER_PATH, &[filter])
            .await
    }

    /// Status of all jobs, rendered.
    pub async fn job_status(&self) -> Result<String, ClientError> {
        self.get_rendered(JOBS_PATH, "jobs").await
    }

    /// Stop the network events listener and wait for it.
    pub async fn shutdown(&self) {
        self.events.shutdown().await;
    }
}
