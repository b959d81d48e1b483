//! Set of connected viewers and best-effort frame fan-out.
//!
//! ```text
//!                   ┌──────────────┐ try_send  ┌──────── slot ───────┐
//!  FrameProducer ──►│  Connection  │──────────►│ viewer 1  [frame]   │──► writer task
//!                   │   Registry   │──────────►│ viewer 2  [     ]   │──► writer task
//!                   └──────────────┘           └─────────────────────┘
//! ```
//!
//! Each viewer owns a bounded outbound queue. Broadcasting never waits:
//! a full queue means that viewer is still writing the previous frame and
//! simply misses this one, a closed queue means the viewer is gone and it
//! is evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

use crate::protocol::Outbound;

/// Opaque per-connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// Outcome of one [`ConnectionRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Viewers the frame was queued for.
    pub delivered: usize,
    /// Viewers whose queue was still full.
    pub skipped: usize,
    /// Viewers removed because their queue was closed.
    pub evicted: usize,
}

/// The set of live viewer connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    viewers: Mutex<HashMap<ViewerId, mpsc::Sender<Outbound>>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer's outbound queue and return its fresh id.
    pub fn add(&self, tx: mpsc::Sender<Outbound>) -> ViewerId {
        let id = ViewerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let total = {
            let mut viewers = self.viewers.lock();
            viewers.insert(id, tx);
            viewers.len()
        };
        info!("{id} connected ({total} total)");
        id
    }

    /// Remove a viewer. Removing an id twice is a no-op; returns whether
    /// the id was present.
    pub fn remove(&self, id: ViewerId) -> bool {
        let (removed, total) = {
            let mut viewers = self.viewers.lock();
            let removed = viewers.remove(&id).is_some();
            (removed, viewers.len())
        };
        if removed {
            info!("{id} disconnected ({total} remaining)");
        }
        removed
    }

    pub fn contains(&self, id: ViewerId) -> bool {
        self.viewers.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.viewers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.lock().is_empty()
    }

    /// Queue `frame` for every viewer without blocking.
    ///
    /// Each viewer receives at most one copy; a viewer whose queue is
    /// full misses it. Viewers whose queue is closed are removed.
    pub fn broadcast(&self, frame: Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut viewers = self.viewers.lock();
        viewers.retain(|id, tx| match tx.try_send(Outbound::Frame(frame.clone())) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!("{id} busy, frame skipped");
                report.skipped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                info!("{id} evicted: connection closed");
                report.evicted += 1;
                false
            }
        });
        report
    }
}
