//! Per-viewer control loop.
//!
//! Reads one message at a time and fully applies it before reading the
//! next, so a viewer's commands take effect in the order they were sent.
//! Bad messages are dropped without reply; only the end of the inbound
//! stream (or a read error) ends the loop and unregisters the viewer.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{DisplayTopology, InputInjector};
use crate::control::router::InputRouter;
use crate::control::sync::clipboard_sync;
use crate::error::{DeskviewError, Result};
use crate::protocol::{self, Command, Inbound, Outbound};
use crate::stream::{ConnectionRegistry, RateController, StreamState, ViewerId};

/// One message read from a viewer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Text(String),
    /// Interpreted as text when it is valid UTF-8.
    Binary(Bytes),
}

impl InboundMessage {
    fn as_text(&self) -> Result<&str> {
        match self {
            Self::Text(s) => Ok(s),
            Self::Binary(b) => std::str::from_utf8(b)
                .map_err(|e| DeskviewError::MalformedControl(format!("binary message: {e}"))),
        }
    }
}

/// Applies one viewer's control messages.
pub struct ControlDispatcher {
    id: ViewerId,
    registry: Arc<ConnectionRegistry>,
    state: Arc<StreamState>,
    rate: RateController,
    topology: Arc<dyn DisplayTopology>,
    injector: Arc<dyn InputInjector>,
    router: InputRouter,
    outbound: mpsc::Sender<Outbound>,
    clipboard_sync: Option<Duration>,
}

impl ControlDispatcher {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ViewerId,
        registry: Arc<ConnectionRegistry>,
        state: Arc<StreamState>,
        rate: RateController,
        topology: Arc<dyn DisplayTopology>,
        injector: Arc<dyn InputInjector>,
        outbound: mpsc::Sender<Outbound>,
        clipboard_sync: Option<Duration>,
    ) -> Self {
        let router = InputRouter::new(Arc::clone(&injector), Arc::clone(&topology), Arc::clone(&state));
        Self {
            id,
            registry,
            state,
            rate,
            topology,
            injector,
            router,
            outbound,
            clipboard_sync,
        }
    }

    pub fn id(&self) -> ViewerId {
        self.id
    }

    /// Consume `inbound` until it ends or fails, then unregister the viewer.
    pub async fn run<S>(self, mut inbound: S)
    where
        S: Stream<Item = Result<InboundMessage>> + Unpin,
    {
        let stop = CancellationToken::new();
        if let Some(interval) = self.clipboard_sync.filter(|d| !d.is_zero()) {
            tokio::spawn(clipboard_sync(
                Arc::clone(&self.injector),
                self.outbound.clone(),
                interval,
                stop.clone(),
            ));
        }

        while let Some(next) = inbound.next().await {
            match next {
                Ok(msg) => self.handle(&msg).await,
                Err(e) => {
                    info!("{} read failed: {e}", self.id);
                    break;
                }
            }
        }

        stop.cancel();
        self.registry.remove(self.id);
    }

    /// Apply a single message. Never fails; problems are logged.
    pub async fn handle(&self, msg: &InboundMessage) {
        if let Err(e) = self.apply(msg).await {
            if e.is_silent() {
                debug!("{} dropped message: {e}", self.id);
            } else {
                warn!("{}: {e}", self.id);
            }
        }
    }

    async fn apply(&self, msg: &InboundMessage) -> Result<()> {
        match protocol::classify(msg.as_text()?)? {
            Inbound::Command(Command::Refresh) => Ok(()),
            Inbound::Command(Command::Screen(selector)) => {
                self.state.select(selector, self.topology.count())?;
                info!("{} selected display {selector}", self.id);
                Ok(())
            }
            Inbound::Command(Command::Fps(fps)) => self.rate.request_fps(fps),
            Inbound::Event(event) => self.router.route(event, &self.outbound).await,
        }
    }
}
