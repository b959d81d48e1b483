//! Domain-specific error types for the streaming engine.
//!
//! All fallible operations return `Result<T, DeskviewError>`.
//! Nothing here is fatal to the process except [`DeskviewError::NoDisplays`]
//! at startup; everything else is scoped to one tick, one message or one
//! viewer.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DeskviewError>;

/// The canonical error type for Deskview.
#[derive(Debug, Error)]
pub enum DeskviewError {
    // ── Frame pipeline ───────────────────────────────────────────
    /// The capture backend could not produce a frame.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The image codec rejected a frame.
    #[error("encode failed: {0}")]
    Encode(String),

    /// No display was detected on the host.
    #[error("no displays detected")]
    NoDisplays,

    // ── Viewer connections ───────────────────────────────────────
    /// A read or write on a viewer connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound control message could not be decoded.
    #[error("malformed control message: {0}")]
    MalformedControl(String),

    /// An out-of-range FPS or display index was requested.
    #[error("invalid tuning: {0}")]
    InvalidTuning(String),

    /// The platform input injector failed.
    #[error("input injection failed: {0}")]
    Injection(String),

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    // ── Setup ────────────────────────────────────────────────────
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The I/O layer reported an error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

impl DeskviewError {
    /// Whether the error only aborts the current producer tick.
    ///
    /// The next tick retries naturally; nothing else is affected.
    pub fn is_tick_local(&self) -> bool {
        matches!(self, Self::Capture(_) | Self::Encode(_))
    }

    /// Whether the error is dropped silently without any reply to the viewer.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::MalformedControl(_) | Self::InvalidTuning(_))
    }
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for DeskviewError {
    fn from(s: String) -> Self {
        DeskviewError::Other(s)
    }
}

impl From<&str> for DeskviewError {
    fn from(s: &str) -> Self {
        DeskviewError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for DeskviewError {
    fn from(e: serde_json::Error) -> Self {
        DeskviewError::MalformedControl(e.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for DeskviewError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        DeskviewError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = DeskviewError::Capture("display 3 gone".into());
        assert_eq!(e.to_string(), "capture failed: display 3 gone");

        let e = DeskviewError::NoDisplays;
        assert!(e.to_string().contains("no displays"));
    }

    #[test]
    fn tick_local_classification() {
        assert!(DeskviewError::Capture("x".into()).is_tick_local());
        assert!(DeskviewError::Encode("x".into()).is_tick_local());
        assert!(!DeskviewError::Transport("x".into()).is_tick_local());
        assert!(!DeskviewError::NoDisplays.is_tick_local());
    }

    #[test]
    fn silent_classification() {
        assert!(DeskviewError::MalformedControl("x".into()).is_silent());
        assert!(DeskviewError::InvalidTuning("x".into()).is_silent());
        assert!(!DeskviewError::Injection("x".into()).is_silent());
    }

    #[test]
    fn from_json_error_is_malformed() {
        let err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let e: DeskviewError = err.into();
        assert!(matches!(e, DeskviewError::MalformedControl(_)));
    }

    #[test]
    fn from_string() {
        let e: DeskviewError = "something broke".into();
        assert!(matches!(e, DeskviewError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: DeskviewError = io_err.into();
        assert!(matches!(e, DeskviewError::Io(_)));
    }
}
