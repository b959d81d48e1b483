//! Deskview: entry point.
//!
//! ```text
//! deskview                       Serve on the configured port (default 8080)
//! deskview --port 9000           Override the port
//! deskview --config <path>       Load a custom config TOML
//! deskview --gen-config          Write default config to stdout
//! deskview --list-displays       Print the display layout and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use deskview_core::{DeskviewError, Engine};
use deskview_server::backend;
use deskview_server::config::ServerConfig;
use deskview_server::server;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "deskview", about = "Stream this desktop to browser viewers")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "deskview.toml")]
    config: PathBuf,

    /// Listening port (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Print the detected displays and exit.
    #[arg(long)]
    list_displays: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ServerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // An unreadable or invalid config aborts start-up.
    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("deskview v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        info!("config loaded from {}", cli.config.display());
    } else {
        info!("no config at {}; using defaults", cli.config.display());
    }

    let backends = backend::build(&config)?;
    let layout = backend::describe(backends.topology.as_ref());
    if cli.list_displays {
        for line in &layout {
            println!("{line}");
        }
        return Ok(());
    }
    if layout.is_empty() {
        return Err(DeskviewError::NoDisplays.into());
    }
    info!("{} display(s) detected", layout.len());
    for line in &layout {
        info!("  {line}");
    }

    let engine_config = config.to_engine_config();
    info!("target FPS: {}", engine_config.initial_fps);
    info!("display: {}", engine_config.initial_selector);
    let engine = Arc::new(Engine::new(engine_config, backends));

    let cancel = CancellationToken::new();
    let producer = tokio::spawn(engine.producer().run(cancel.clone()));

    // Ctrl-C handler.
    let stop = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
        stop.cancel();
    });

    let listener = TcpListener::bind(config.listen_addr()?).await?;
    server::serve(listener, engine, cancel.clone()).await?;

    cancel.cancel();
    producer.await?;
    Ok(())
}
