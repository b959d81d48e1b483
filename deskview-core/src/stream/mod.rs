//! Frame pipeline: shared tuning, rate control, viewer fan-out and the
//! producer loop.

pub mod producer;
pub mod rate;
pub mod registry;
pub mod state;
pub mod stats;

pub use producer::{FrameProducer, TickOutcome};
pub use rate::{MAX_FPS, MIN_FPS, RateController, quality_for};
pub use registry::{BroadcastReport, ConnectionRegistry, ViewerId};
pub use state::{StreamState, Tuning};
pub use stats::{FrameStats, StatsReport};
