//! Collaborator seams: display topology, capture, encoding and input.
//!
//! The engine never touches the platform directly. Concrete backends live in
//! the server crate; tests plug in mocks.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::protocol::{KeyAction, Modifiers, MouseAction, MouseButton};
use crate::types::{DisplayBounds, DisplaySelector, RawFrame};

/// Reports the displays attached to the host.
pub trait DisplayTopology: Send + Sync {
    /// Number of displays currently attached.
    fn count(&self) -> usize;

    /// Bounds of display `index`, or `None` past the end.
    fn bounds(&self, index: usize) -> Option<DisplayBounds>;

    /// Bounds of every display, in index order.
    fn all_bounds(&self) -> Vec<DisplayBounds> {
        (0..self.count()).filter_map(|i| self.bounds(i)).collect()
    }
}

/// Grabs the pixels of one display, or of the union of all displays.
///
/// Called synchronously from the producer task once per tick. The selector
/// passed in has already been resolved against the topology.
pub trait CaptureProvider: Send + Sync {
    fn capture(&self, selector: DisplaySelector) -> Result<RawFrame>;
}

/// Compresses a raw frame into a transmittable still image.
pub trait ImageEncoder: Send + Sync {
    /// `quality` is in `1..=100`.
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Bytes>;
}

/// Executes pointer, keyboard and clipboard actions on the controlled host.
///
/// Coordinates are absolute virtual-desktop coordinates.
#[async_trait]
pub trait InputInjector: Send + Sync {
    async fn mouse(&self, x: i32, y: i32, button: MouseButton, action: MouseAction) -> Result<()>;

    async fn keyboard(&self, key: &str, action: KeyAction, modifiers: Modifiers) -> Result<()>;

    async fn clipboard_get(&self) -> Result<String>;

    async fn clipboard_set(&self, text: &str) -> Result<()>;
}

/// The full set of collaborators an [`Engine`](crate::Engine) runs against.
#[derive(Clone)]
pub struct Backends {
    pub topology: Arc<dyn DisplayTopology>,
    pub capture: Arc<dyn CaptureProvider>,
    pub encoder: Arc<dyn ImageEncoder>,
    pub injector: Arc<dyn InputInjector>,
}
