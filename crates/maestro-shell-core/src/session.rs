//! Shell session — the state one shell process owns.
//!
//! Built once at startup and passed by reference to the dispatcher. Holds
//! the daemon client (absent when no connection was configured) and the
//! debug flag that [`crate::logging::DebugGate`] reads.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::client::{ClientError, DaemonClient, Notification};
use crate::transport::{TransportError, UnixTransport};

pub struct Session {
    client: Option<DaemonClient>,
    debug: Arc<AtomicBool>,
}

impl Session {
    pub fn new(client: Option<DaemonClient>) -> Self {
        Self {
            client,
            debug: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A session with no daemon connection.
    pub fn disconnected() -> Self {
        Self::new(None)
    }

    /// Open the daemon socket and build a session around it.
    pub async fn connect(
        socket_path: &Path,
        notifications: mpsc::Sender<Notification>,
    ) -> Result<Self, TransportError> {
        let transport = UnixTransport::open(socket_path).await?;
        let client = DaemonClient::new(Arc::new(transport), notifications);
        Ok(Self::new(Some(client)))
    }

    /// Share an existing debug flag (e.g. one already wired into logging).
    pub fn with_debug_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.debug = flag;
        self
    }

    /// The daemon client, or [`ClientError::NotConnected`].
    pub fn client(&self) -> Result<&DaemonClient, ClientError> {
        self.client.as_ref().ok_or(ClientError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, on: bool) {
        self.debug.store(on, Ordering::Relaxed);
    }

    pub fn debug_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.debug)
    }

    /// Stop background work before the process exits.
    pub async fn close(&self) {
        if let Some(client) = &self.client {
            client.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_session() {
        let session = Session::disconnected();
        assert!(!session.is_connected());
        let err = session.client().err().unwrap();
        assert_eq!(err.to_string(), "Maestro could not connect.");
    }

    #[test]
    fn test_debug_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(true));
        let session = Session::disconnected().with_debug_flag(Arc::clone(&flag));
        assert!(session.debug_enabled());

        session.set_debug(false);
        assert!(!flag.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_connect_missing_socket() {
        let dir = tempfile::TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let result = Session::connect(&dir.path().join("none.sock"), tx).await;
        assert!(matches!(result, Err(TransportError::NotRunning(_))));
    }
}
