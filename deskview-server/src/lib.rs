//! # deskview-server: remote desktop streaming service
//!
//! Serves a browser viewer over HTTP, streams the host desktop to every
//! connected viewer as JPEG frames over WebSocket, and relays the viewers'
//! pointer, keyboard and clipboard events back to the host.
//!
//! ## Capture backends
//!
//! - **native**: platform capture via `scrap` (cargo feature `native-capture`).
//! - **pattern**: synthetic gradient displays, for headless hosts and demos.

pub mod backend;
pub mod config;
pub mod server;
