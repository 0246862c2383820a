#![deny(unsafe_code)]

//! maestro-shell core — the daemon communication layer.
//!
//! Talks HTTP/1.1 + JSON to the maestro management daemon over its Unix
//! socket, keeps one long-poll subscription for network events running in the
//! background, and renders arbitrary JSON responses as indented text. The
//! [`dispatch`] module maps typed command lines onto all of this.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future. Returned by
/// [`transport::Transport`] so the client can hold it as `dyn Transport`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Typed daemon operations and the network event subscription.
pub mod client;
/// Command tables and line dispatch.
pub mod dispatch;
/// Debug-toggle filter for the shell's tracing output.
pub mod logging;
/// Indented text rendering of JSON payloads.
pub mod render;
/// Process-wide shell state: the connection and the debug flag.
pub mod session;
/// HTTP/1.1 request/response over the daemon's Unix socket.
pub mod transport;

pub use client::{ClientError, DaemonClient, Notification};
pub use dispatch::{Dispatcher, Outcome};
pub use logging::DebugGate;
pub use render::{RenderError, render};
pub use session::Session;
pub use transport::{RawResponse, Transport, TransportError, UnixTransport};
