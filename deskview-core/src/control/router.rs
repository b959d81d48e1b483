//! Routes decoded input events to the platform injector.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::backend::{DisplayTopology, InputInjector};
use crate::error::{DeskviewError, Result};
use crate::protocol::{ClipboardEvent, ControlEvent, KeyEvent, MouseEvent, Outbound, ServerMessage};
use crate::stream::StreamState;
use crate::types::{DisplayBounds, DisplaySelector};

/// Translates viewer events into injector calls.
///
/// Pointer coordinates arrive relative to the streamed frame and are shifted
/// by that frame's origin on the virtual desktop. For a single display that
/// is the display's origin; the union frame starts at the top-left of all
/// displays, which is `(0,0)` on a typical layout.
#[derive(Clone)]
pub struct InputRouter {
    injector: Arc<dyn InputInjector>,
    topology: Arc<dyn DisplayTopology>,
    state: Arc<StreamState>,
}

impl InputRouter {
    pub fn new(
        injector: Arc<dyn InputInjector>,
        topology: Arc<dyn DisplayTopology>,
        state: Arc<StreamState>,
    ) -> Self {
        Self {
            injector,
            topology,
            state,
        }
    }

    /// Dispatch one event.
    ///
    /// Clipboard reads are answered on `reply`. Injector failures are
    /// returned as [`DeskviewError::Injection`]; the caller logs them.
    pub async fn route(&self, event: ControlEvent, reply: &mpsc::Sender<Outbound>) -> Result<()> {
        match event {
            ControlEvent::Mouse(mouse) => self.mouse(mouse).await,
            ControlEvent::Keyboard(KeyEvent {
                key,
                action,
                modifiers,
            }) => {
                trace!("key {key:?} {action:?} {modifiers:?}");
                self.injector.keyboard(&key, action, modifiers).await
            }
            ControlEvent::Clipboard(ClipboardEvent::Get) => {
                let text = self.injector.clipboard_get().await?;
                let msg = ServerMessage::clipboard(text).to_outbound()?;
                reply.send(msg).await.map_err(DeskviewError::from)
            }
            ControlEvent::Clipboard(ClipboardEvent::Set(text)) => {
                self.injector.clipboard_set(&text).await
            }
            ControlEvent::Clipboard(ClipboardEvent::Content(_)) => {
                debug!("ignoring clipboard content sent by viewer");
                Ok(())
            }
        }
    }

    /// Absolute host coordinates for a frame-relative point.
    ///
    /// The origin is the selected display's, or the virtual desktop's
    /// top-left corner under [`DisplaySelector::All`]. Results saturate at
    /// the `i32` range.
    pub fn to_host(&self, x: i32, y: i32) -> (i32, i32) {
        let selector = self.state.selector().resolve(self.topology.count());
        let origin = match selector {
            DisplaySelector::Index(n) => self.topology.bounds(n),
            DisplaySelector::All => DisplayBounds::union(&self.topology.all_bounds()),
        };
        match origin {
            Some(b) => (x.saturating_add(b.x), y.saturating_add(b.y)),
            None => (x, y),
        }
    }

    async fn mouse(&self, event: MouseEvent) -> Result<()> {
        let (x, y) = self.to_host(event.x, event.y);
        trace!("mouse {:?} {:?} at ({x},{y})", event.button, event.action);
        self.injector.mouse(x, y, event.button, event.action).await
    }
}
