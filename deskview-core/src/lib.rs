//! # deskview-core
//!
//! Streaming and control engine for remote desktop viewing.
//!
//! ```text
//!        ┌──────────────── FrameProducer (one task) ───────────────┐
//!        │ capture ──► encode(quality_for(fps)) ──► broadcast      │
//!        └───────▲──────────────────────────────────────┬──────────┘
//!                │ selector / fps                       │ try_send
//!        ┌───────┴───────┐   ┌────────────────┐   ┌─────▼──────────────┐
//!        │  StreamState  │◄──│ RateController │   │ ConnectionRegistry │
//!        └───────▲───────┘   └───────▲────────┘   └─────┬──────────────┘
//!                │ screen:          │ fps:              │ Outbound
//!        ┌───────┴──────────────────┴────────┐   ┌─────▼──────┐
//!        │ ControlDispatcher (one per viewer)│   │   viewer   │
//!        │   └─► InputRouter ─► InputInjector│◄──│ connection │
//!        └───────────────────────────────────┘   └────────────┘
//! ```
//!
//! This crate contains:
//! - **Protocol**: the text command grammar, typed input events and outbound messages
//! - **Stream**: shared tuning, rate control, viewer registry and the producer loop
//! - **Control**: per-viewer dispatcher, input routing and clipboard push
//! - **Backend**: collaborator traits for capture, encoding and input injection
//! - **Error**: `DeskviewError`, a `thiserror`-based taxonomy

pub mod backend;
pub mod control;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod stream;
pub mod types;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use backend::{Backends, CaptureProvider, DisplayTopology, ImageEncoder, InputInjector};
pub use control::{ControlDispatcher, InboundMessage, InputRouter};
pub use engine::{Engine, EngineConfig, Viewer};
pub use error::{DeskviewError, Result};
pub use protocol::{
    ClipboardEvent, Command, ControlEvent, Inbound, KeyAction, KeyEvent, Modifiers, MouseAction,
    MouseButton, MouseEvent, Outbound, ServerMessage,
};
pub use stream::{
    BroadcastReport, ConnectionRegistry, FrameProducer, RateController, StreamState, TickOutcome,
    ViewerId, quality_for,
};
pub use types::{DisplayBounds, DisplaySelector, PixelFormat, RawFrame};
