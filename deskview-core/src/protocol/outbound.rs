//! Messages travelling from the engine to a viewer.

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// One message queued for a viewer's socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// An encoded frame, sent as a binary message with no extra framing.
    Frame(Bytes),
    /// A JSON side-channel message, sent as text.
    Text(String),
}

/// Structured side-channel messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ServerMessage {
    Clipboard(ClipboardContent),
}

/// Host clipboard text delivered to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClipboardContent {
    action: &'static str,
    pub text: String,
}

impl ServerMessage {
    /// `{"type":"clipboard","data":{"action":"content","text":...}}`
    pub fn clipboard(text: impl Into<String>) -> Self {
        Self::Clipboard(ClipboardContent {
            action: "content",
            text: text.into(),
        })
    }

    /// Serialize into a text [`Outbound`] message.
    pub fn to_outbound(&self) -> Result<Outbound> {
        Ok(Outbound::Text(serde_json::to_string(self)?))
    }
}
