//! Viewer wire protocol: one duplex message channel per viewer.
//!
//! # Downstream (engine → viewer)
//!
//! ```text
//! binary   one encoded frame, raw bytes, no header
//! text     {"type":"clipboard","data":{"action":"content","text":"..."}}
//! ```
//!
//! # Upstream (viewer → engine)
//!
//! ```text
//! refresh
//! screen:all | screen:<n>
//! fps:<1..120>
//! {"type":"mouse","data":{"x":..,"y":..,"button":..,"action":..,"scroll":..}}
//! {"type":"keyboard","data":{"key":..,"action":..,"ctrl":..,"alt":..,"shift":..}}
//! {"type":"clipboard","data":{"action":"get"}}
//! {"type":"clipboard","data":{"action":"set","text":..}}
//! ```
//!
//! A message whose JSON object carries one of the event `type`s is decoded
//! strictly as an event and never falls back to the text grammar.

mod command;
mod event;
mod outbound;

pub use command::Command;
pub use event::{
    ClipboardEvent, ControlEvent, KeyAction, KeyEvent, Modifiers, MouseAction, MouseButton,
    MouseEvent,
};
pub use outbound::{ClipboardContent, Outbound, ServerMessage};

use crate::error::{DeskviewError, Result};

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Event(ControlEvent),
    Command(Command),
}

/// Classify one inbound text message.
///
/// Returns [`DeskviewError::MalformedControl`] for anything that is neither
/// a well-formed event nor a known command.
pub fn classify(message: &str) -> Result<Inbound> {
    let trimmed = message.trim();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            let is_event = value
                .get("type")
                .and_then(|t| t.as_str())
                .is_some_and(|t| ControlEvent::TYPES.contains(&t));
            if is_event {
                return serde_json::from_value(value)
                    .map(Inbound::Event)
                    .map_err(DeskviewError::from);
            }
        }
    }
    trimmed.parse().map(Inbound::Command)
}
