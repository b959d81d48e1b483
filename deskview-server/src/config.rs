//! Configuration for the Deskview server.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use deskview_core::stream::{MAX_FPS, MIN_FPS};
use deskview_core::{DeskviewError, DisplayBounds, DisplaySelector, EngineConfig, Result};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening socket.
    pub network: NetworkConfig,
    /// Frame stream tuning.
    pub stream: StreamConfig,
    /// Capture backend selection.
    pub capture: CaptureConfig,
    /// Host clipboard push.
    pub clipboard: ClipboardConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind the HTTP/WebSocket listener on.
    pub bind_address: String,
    /// TCP port.
    pub port: u16,
}

/// Stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Initial target FPS (1..=120).
    pub fps: u32,
    /// Initial display: "all" or a display index such as "1".
    pub display: String,
    /// Frames that may wait per viewer while its socket is busy.
    pub outbound_slots: usize,
    /// Seconds between throughput reports.
    pub stats_interval_secs: u64,
}

/// Which capture backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureBackend {
    /// Platform screen capture (requires the `native-capture` feature).
    Native,
    /// Synthetic gradient frames.
    Pattern,
}

/// Capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub backend: CaptureBackend,
    /// Display layout. The pattern backend synthesises these displays; the
    /// native backend takes their origins, in detection order, when a host
    /// has more than one display.
    pub displays: Vec<DisplayConfig>,
}

/// One display's position on the virtual desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Clipboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipboardConfig {
    /// Poll interval for pushing host clipboard changes; 0 disables.
    pub sync_interval_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            display: "all".into(),
            outbound_slots: 1,
            stats_interval_secs: 5,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "native-capture") {
                CaptureBackend::Native
            } else {
                CaptureBackend::Pattern
            },
            displays: vec![DisplayConfig {
                x: 0,
                y: 0,
                width: 1280,
                height: 720,
            }],
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 2000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl From<DisplayConfig> for DisplayBounds {
    fn from(d: DisplayConfig) -> Self {
        DisplayBounds::new(d.x, d.y, d.width, d.height)
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file is
    /// an error, so a typo never silently resets every setting.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .map_err(|e| DeskviewError::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.network.bind_address, self.network.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| DeskviewError::Config(format!("listen address {addr}: {e}")))
    }

    /// Initial display selector. Unparseable values fall back to all displays.
    pub fn initial_selector(&self) -> DisplaySelector {
        let raw = self.stream.display.trim();
        if raw.eq_ignore_ascii_case("all") {
            return DisplaySelector::All;
        }
        match raw.parse() {
            Ok(n) => DisplaySelector::Index(n),
            Err(_) => {
                tracing::warn!("invalid stream.display {raw:?}; streaming all displays");
                DisplaySelector::All
            }
        }
    }

    /// Convert stream settings into an [`EngineConfig`].
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_fps: self.stream.fps.clamp(MIN_FPS, MAX_FPS),
            initial_selector: self.initial_selector(),
            outbound_slots: self.stream.outbound_slots.max(1),
            clipboard_sync: (self.clipboard.sync_interval_ms > 0)
                .then(|| Duration::from_millis(self.clipboard.sync_interval_ms)),
            stats_interval: Duration::from_secs(self.stream.stats_interval_secs.max(1)),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
