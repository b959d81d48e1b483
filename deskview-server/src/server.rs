//! HTTP and WebSocket surface.
//!
//! - `GET /` - embedded viewer page
//! - `GET /ws` - viewer connection (binary JPEG frames down, control up)
//! - `GET /status` - stream status as JSON
//!
//! Each WebSocket is split in two: a writer task drains the viewer's
//! outbound queue into the socket, and the engine's control dispatcher
//! consumes the read half.

use std::io;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::{Html, IntoResponse, Json},
    routing::get,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use deskview_core::{DeskviewError, Engine, InboundMessage, Outbound, Viewer, ViewerId};

use crate::backend;

/// The embedded viewer page.
pub const VIEWER_HTML: &str = include_str!("viewer.html");

/// Shared state for the HTTP handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    cancel: CancellationToken,
}

/// Build the router.
pub fn router(engine: Arc<Engine>, cancel: CancellationToken) -> Router {
    Router::new()
        .route("/", get(viewer_page))
        .route("/ws", get(ws_upgrade))
        .route("/status", get(status))
        .with_state(AppState { engine, cancel })
}

/// Serve until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    engine: Arc<Engine>,
    cancel: CancellationToken,
) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("viewer available at http://{addr}/");
    }
    let app = router(engine, cancel.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

async fn viewer_page() -> Html<&'static str> {
    Html(VIEWER_HTML)
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let tuning = engine.state().snapshot();
    Json(serde_json::json!({
        "viewers": engine.registry().len(),
        "fps": tuning.target_fps,
        "requested_fps": engine.rate().requested(),
        "display": tuning.selector.to_string(),
        "displays": backend::describe(engine.backends().topology.as_ref()),
    }))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Unregisters a viewer and stops its writer however the socket handler
/// exits, including by unwinding.
struct Detach {
    engine: Arc<Engine>,
    id: ViewerId,
    writer: AbortHandle,
}

impl Drop for Detach {
    fn drop(&mut self) {
        self.writer.abort();
        self.engine.registry().remove(self.id);
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let Viewer {
        id,
        mut outbound,
        dispatcher,
    } = state.engine.attach();
    let (mut sink, stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let msg = match msg {
                Outbound::Frame(bytes) => Message::Binary(bytes.to_vec()),
                Outbound::Text(text) => Message::Text(text),
            };
            if let Err(e) = sink.send(msg).await {
                debug!("{id} write failed: {e}");
                break;
            }
        }
        let _ = sink.close().await;
    });
    let _detach = Detach {
        engine: Arc::clone(&state.engine),
        id,
        writer: writer.abort_handle(),
    };

    let inbound = stream.filter_map(|msg| async move {
        match msg {
            Ok(Message::Text(text)) => Some(Ok(InboundMessage::Text(text))),
            Ok(Message::Binary(data)) => Some(Ok(InboundMessage::Binary(Bytes::from(data)))),
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_)) => None,
            Err(e) => Some(Err(DeskviewError::Transport(e.to_string()))),
        }
    });

    tokio::select! {
        _ = dispatcher.run(Box::pin(inbound)) => {}
        _ = state.cancel.cancelled() => {}
    }
}
