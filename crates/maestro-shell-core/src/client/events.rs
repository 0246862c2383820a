//! Network event subscription and the long-poll listener task.
//!
//! Subscribing asks the daemon for a subscription ID and, if no listener is
//! running yet, spawns one. The listener repeatedly long-polls
//! `/net/events/{id}` and forwards each batch of events as a rendered
//! [`Notification`]. A failing status or transport error ends the
//! subscription that was polled. If a newer subscribe replaced the ID while
//! that poll was out, the listener carries on with the new ID instead. An
//! empty ID or the stop signal also stops it. A later subscribe starts a
//! fresh listener.
//!
//! The ID and the running flag share one mutex, and every decision to stop
//! is taken while holding it, so a non-empty ID always means a listener is
//! alive and at most one listener exists at a time.

use std::fmt;
use std::sync::{Arc, Mutex};

use hyper::Method;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::types::SubscribeResponse;
use super::{ClientError, NET_EVENTS_PATH};
use crate::render;
use crate::transport::Transport;

/// An asynchronous message for the operator, printed outside the command
/// loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub category: String,
    pub text: String,
}

impl Notification {
    pub fn new(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[event({})] {}", self.category, self.text)
    }
}

#[derive(Debug, Default)]
struct SubscriptionState {
    id: String,
    running: bool,
    task: Option<JoinHandle<()>>,
}

/// Owner of the subscription ID and the listener task.
pub(crate) struct NetEvents {
    state: Arc<Mutex<SubscriptionState>>,
    stop_tx: watch::Sender<bool>,
    notifications: mpsc::Sender<Notification>,
}

impl NetEvents {
    pub(crate) fn new(notifications: mpsc::Sender<Notification>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(SubscriptionState::default())),
            stop_tx,
            notifications,
        }
    }

    /// Current subscription ID, if any.
    pub(crate) fn subscription_id(&self) -> Option<String> {
        let state = self.state.lock().ok()?;
        (!state.id.is_empty()).then(|| state.id.clone())
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.lock().map(|s| s.running).unwrap_or(false)
    }

    /// Subscribe, or refresh the ID of the running listener.
    pub(crate) async fn subscribe(
        &self,
        transport: &Arc<dyn Transport>,
    ) -> Result<String, ClientError> {
        let resp = transport.request(Method::GET, NET_EVENTS_PATH, None).await?;
        if !resp.is_success() {
            return Err(ClientError::Daemon(format!(
                "failed to subscribe to network events ({})",
                resp.status_line()
            )));
        }

        let sub: SubscribeResponse =
            serde_json::from_slice(&resp.body).map_err(|e| ClientError::Decode {
                what: "net events",
                source: e,
            })?;
        if !sub.error.is_empty() {
            return Err(ClientError::Daemon(format!(
                "failed to subscribe to network events: {}",
                sub.error
            )));
        }
        if sub.id.is_empty() {
            return Err(ClientError::Daemon(
                "failed to subscribe to network events: no subscription id".to_string(),
            ));
        }

        let started = self.install(&sub.id, transport);
        debug!(id = %sub.id, started, "subscribed to network events");
        Ok(format!("Subscribed to network events (id {})", sub.id))
    }

    /// Record the ID and spawn a listener unless one is already running.
    fn install(&self, id: &str, transport: &Arc<dyn Transport>) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        state.id = id.to_string();
        if state.running {
            return false;
        }
        state.running = true;
        let listener = Listener {
            transport: Arc::clone(transport),
            state: Arc::clone(&self.state),
            stop_rx: self.stop_tx.subscribe(),
            notifications: self.notifications.clone(),
        };
        state.task = Some(tokio::spawn(listener.run()));
        true
    }

    /// Stop the listener, if any, and wait for it to finish.
    pub(crate) async fn shutdown(&self) {
        self.stop_tx.send_replace(true);
        let task = self.state.lock().ok().and_then(|mut s| s.task.take());
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

struct Listener {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<SubscriptionState>>,
    stop_rx: watch::Receiver<bool>,
    notifications: mpsc::Sender<Notification>,
}

impl Listener {
    async fn run(mut self) {
        debug!("network events listener starting");

        while let Some(id) = self.next_id() {
            let path = format!("{NET_EVENTS_PATH}/{id}");
            let polled = tokio::select! {
                _ = self.stop_rx.changed() => None,
                result = self.transport.request(Method::GET, &path, None) => Some(result),
            };
            let Some(result) = polled else {
                debug!("network events listener stop requested");
                self.stop();
                break;
            };

            let failure = match result {
                Ok(resp) if resp.is_success() => {
                    if !self.forward(&resp.body).await {
                        self.stop();
                        break;
                    }
                    continue;
                }
                Ok(resp) => format!("status {}", resp.status_line()),
                Err(e) => e.to_string(),
            };

            if self.retire(&id) {
                warn!(%id, %failure, "failed to get network events - stopping listener");
                break;
            }
            debug!(%id, %failure, "poll for a replaced subscription failed");
        }

        debug!("network events listener stopped");
    }

    /// The ID to poll next. When there is none, or a stop was requested,
    /// the listener is marked stopped under the same lock and `None` is
    /// returned.
    fn next_id(&self) -> Option<String> {
        let stop = *self.stop_rx.borrow();
        let mut state = self.state.lock().ok()?;
        if stop || state.id.is_empty() {
            state.id.clear();
            state.running = false;
            return None;
        }
        Some(state.id.clone())
    }

    /// End the subscription after a failed poll of `id`, unless a newer
    /// subscribe replaced the ID meanwhile. Returns whether the listener
    /// must stop.
    fn retire(&self, id: &str) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return true;
        };
        if state.id != id && !state.id.is_empty() {
            return false;
        }
        state.id.clear();
        state.running = false;
        true
    }

    /// Render one poll result and hand it to the printer. Returns `false`
    /// once nobody is listening.
    async fn forward(&self, body: &[u8]) -> bool {
        if body.iter().all(u8::is_ascii_whitespace) {
            return true;
        }
        match render::render(body) {
            Ok(text) => self
                .notifications
                .send(Notification::new("network", format!("events:\n{text}")))
                .await
                .is_ok(),
            Err(e) => {
                warn!(error = %e, "could not parse network events");
                true
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.id.clear();
            state.running = false;
        }
    }
}
