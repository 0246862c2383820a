//! Scriptable fake maestro daemon.
//!
//! [`FakeDaemon`] serves HTTP/1.1 on a Unix socket inside a temp directory.
//! Replies are scripted per method and path: queued one-shot replies are
//! used first, then the standing reply set with [`FakeDaemon::always`]. A
//! request with neither is held open until [`FakeDaemon::release_held`] is
//! called (or the daemon is dropped) and then answered `204 No Content`,
//! the way a long-poll that times out with no events is answered.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::sync::watch;
use tracing::debug;

/// One request as the fake daemon received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    /// The body decoded as JSON. Panics if it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: String,
}

impl Reply {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            body: body.to_string(),
        }
    }
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    standing: HashMap<String, Reply>,
    requests: Vec<RecordedRequest>,
}

struct FakeState {
    script: Mutex<Script>,
    release: watch::Sender<bool>,
}

impl FakeState {
    fn new() -> Self {
        let (release, _) = watch::channel(false);
        Self {
            script: Mutex::new(Script::default()),
            release,
        }
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("fake daemon script lock poisoned")
    }

    /// Record the request and pick its scripted reply, if any.
    fn take_reply(&self, request: RecordedRequest) -> Option<Reply> {
        let key = route_key(&request.method, &request.path);
        let mut script = self.script();
        script.requests.push(request);
        let queued = script.queued.get_mut(&key).and_then(VecDeque::pop_front);
        queued.or_else(|| script.standing.get(&key).cloned())
    }
}

fn route_key(method: &str, path: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), path)
}

fn router(state: Arc<FakeState>) -> axum::Router {
    axum::Router::new().fallback(handle).with_state(state)
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    debug!(method = %request.method, path = %request.path, "fake daemon request");

    let reply = match state.take_reply(request) {
        Some(reply) => reply,
        None => {
            let mut released = state.release.subscribe();
            let _ = released.wait_for(|r| *r).await;
            Reply::new(204, "")
        }
    };

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
        .into_response()
}

/// A fake daemon listening on a socket in its own temp directory.
///
/// The server shuts down and the directory is deleted when this value is
/// dropped.
pub struct FakeDaemon {
    socket_path: PathBuf,
    state: Arc<FakeState>,
    shutdown: watch::Sender<bool>,
    _temp_dir: TempDir,
}

impl FakeDaemon {
    /// Bind a fresh socket and start serving.
    pub async fn start() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let socket_path = temp_dir.path().join("maestroapi.sock");
        let listener = UnixListener::bind(&socket_path).expect("failed to bind fake daemon");

        let state = Arc::new(FakeState::new());
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|s| *s).await;
                })
                .await;
        });

        Self {
            socket_path,
            state,
            shutdown,
            _temp_dir: temp_dir,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Queue a one-shot reply for `method path`.
    pub fn reply(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.state
            .script()
            .queued
            .entry(route_key(method, path))
            .or_default()
            .push_back(Reply::new(status, body));
        self
    }

    /// Queue a one-shot JSON reply.
    pub fn reply_json(
        &self,
        method: &str,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) -> &Self {
        self.reply(method, path, status, &body.to_string())
    }

    /// Answer `method path` with this reply whenever nothing is queued.
    pub fn always(&self, method: &str, path: &str, status: u16, body: &str) -> &Self {
        self.state
            .script()
            .standing
            .insert(route_key(method, path), Reply::new(status, body));
        self
    }

    /// Answer every held request, and every later unscripted one, with 204.
    pub fn release_held(&self) {
        self.state.release.send_replace(true);
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.script().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

impl Drop for FakeDaemon {
    fn drop(&mut self) {
        self.release_held();
        self.shutdown.send_replace(true);
    }
}
