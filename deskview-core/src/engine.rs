//! Wires the shared state, the producer and per-viewer dispatchers together.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::Backends;
use crate::control::ControlDispatcher;
use crate::protocol::Outbound;
use crate::stream::{ConnectionRegistry, FrameProducer, RateController, StreamState, ViewerId};
use crate::types::DisplaySelector;

// ── EngineConfig ─────────────────────────────────────────────────

/// Tunables for an [`Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Starting frame rate (clamped to `1..=120`).
    pub initial_fps: u32,
    /// Starting display selector.
    pub initial_selector: DisplaySelector,
    /// Capacity of each viewer's outbound queue.
    pub outbound_slots: usize,
    /// Host clipboard push interval; `None` disables it.
    pub clipboard_sync: Option<Duration>,
    /// Minimum spacing between statistics reports.
    pub stats_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_fps: 10,
            initial_selector: DisplaySelector::All,
            outbound_slots: 1,
            clipboard_sync: Some(Duration::from_secs(2)),
            stats_interval: Duration::from_secs(5),
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────

/// A newly attached viewer.
///
/// The transport drains `outbound` into the connection and feeds inbound
/// messages to `dispatcher`.
pub struct Viewer {
    pub id: ViewerId,
    pub outbound: mpsc::Receiver<Outbound>,
    pub dispatcher: ControlDispatcher,
}

/// Shared streaming engine.
///
/// # Usage
///
/// ```no_run
/// # use deskview_core::{Engine, EngineConfig, Backends};
/// # use tokio_util::sync::CancellationToken;
/// # fn example(backends: Backends) {
/// let engine = Engine::new(EngineConfig::default(), backends);
/// let cancel = CancellationToken::new();
/// tokio::spawn(engine.producer().run(cancel.clone()));
/// // per connection:
/// let viewer = engine.attach();
/// # }
/// ```
pub struct Engine {
    config: EngineConfig,
    backends: Backends,
    state: Arc<StreamState>,
    registry: Arc<ConnectionRegistry>,
    rate: RateController,
}

impl Engine {
    pub fn new(config: EngineConfig, backends: Backends) -> Self {
        let rate = RateController::new(config.initial_fps);
        let state = Arc::new(StreamState::new(config.initial_selector, rate.requested()));
        Self {
            config,
            backends,
            state,
            registry: Arc::new(ConnectionRegistry::new()),
            rate,
        }
    }

    pub fn state(&self) -> &Arc<StreamState> {
        &self.state
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn rate(&self) -> &RateController {
        &self.rate
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Build the frame producer. Only one should run at a time.
    pub fn producer(&self) -> FrameProducer {
        FrameProducer::new(
            Arc::clone(&self.state),
            Arc::clone(&self.registry),
            &self.rate,
            self.backends.clone(),
            self.config.stats_interval,
        )
    }

    /// Register a new viewer and hand back its queue and dispatcher.
    pub fn attach(&self) -> Viewer {
        let (tx, rx) = mpsc::channel(self.config.outbound_slots.max(1));
        let id = self.registry.add(tx.clone());
        let dispatcher = ControlDispatcher::new(
            id,
            Arc::clone(&self.registry),
            Arc::clone(&self.state),
            self.rate.clone(),
            Arc::clone(&self.backends.topology),
            Arc::clone(&self.backends.injector),
            tx,
            self.config.clipboard_sync,
        );
        Viewer {
            id,
            outbound: rx,
            dispatcher,
        }
    }
}
