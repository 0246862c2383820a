//! Debug output toggle for the shell.
//!
//! [`DebugGate`] is a per-layer `tracing` filter that lets DEBUG and TRACE
//! events from the shell's own crates through while the session's debug flag
//! is on. Combine it with the normal level filter so `debug on` adds request
//! and response traces without touching the configured verbosity:
//!
//! ```ignore
//! let filter = EnvFilter::new("warn").or(DebugGate::new(session.debug_flag()));
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_filter(filter))
//!     .init();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::subscriber::Interest;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter};

/// Target prefix shared by all of the shell's crates.
pub const SHELL_TARGET_PREFIX: &str = "maestro_shell";

#[derive(Debug, Clone)]
pub struct DebugGate {
    enabled: Arc<AtomicBool>,
}

impl DebugGate {
    pub fn new(enabled: Arc<AtomicBool>) -> Self {
        Self { enabled }
    }

    /// Whether an event or span with this metadata passes the gate.
    pub fn allows(&self, metadata: &Metadata<'_>) -> bool {
        *metadata.level() >= Level::DEBUG
            && metadata.target().starts_with(SHELL_TARGET_PREFIX)
            && self.enabled.load(Ordering::Relaxed)
    }
}

impl<S> Filter<S> for DebugGate {
    fn enabled(&self, metadata: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.allows(metadata)
    }

    // The flag changes at runtime, so never cache a decision per callsite.
    fn callsite_enabled(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tracing::{Event, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    use super::*;

    /// Counts the events that reach it.
    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for Counter {
        fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Counter {
        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_gate_follows_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let counter = Counter::default();
        let _guard = tracing_subscriber::registry()
            .with(counter.clone().with_filter(DebugGate::new(Arc::clone(&flag))))
            .set_default();

        tracing::debug!("hidden while off");
        assert_eq!(counter.get(), 0);

        flag.store(true, Ordering::Relaxed);
        tracing::debug!("shown while on");
        tracing::trace!("trace too");
        assert_eq!(counter.get(), 2);

        flag.store(false, Ordering::Relaxed);
        tracing::debug!("hidden again");
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_gate_ignores_other_targets_and_levels() {
        let flag = Arc::new(AtomicBool::new(true));
        let counter = Counter::default();
        let _guard = tracing_subscriber::registry()
            .with(counter.clone().with_filter(DebugGate::new(flag)))
            .set_default();

        tracing::debug!(target: "hyper::proto", "not ours");
        tracing::warn!("left to the level filter");
        assert_eq!(counter.get(), 0);
    }
}
