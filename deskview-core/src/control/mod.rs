//! Viewer → host control path.

pub mod dispatcher;
pub mod router;
pub mod sync;

pub use dispatcher::{ControlDispatcher, InboundMessage};
pub use router::InputRouter;
pub use sync::clipboard_sync;
