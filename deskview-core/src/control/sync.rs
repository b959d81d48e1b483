//! Pushes host clipboard changes to one viewer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::InputInjector;
use crate::protocol::{Outbound, ServerMessage};

/// Poll the host clipboard every `interval` and send its text to `tx`
/// whenever it differs from what was last sent.
///
/// Ends on `cancel` or when the viewer's queue closes.
pub async fn clipboard_sync(
    injector: Arc<dyn InputInjector>,
    tx: mpsc::Sender<Outbound>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_sent = String::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            _ = ticker.tick() => {}
        }

        let text = match injector.clipboard_get().await {
            Ok(text) => text,
            Err(e) => {
                debug!("clipboard poll failed: {e}");
                continue;
            }
        };
        if text == last_sent {
            continue;
        }
        let msg = match ServerMessage::clipboard(text.clone()).to_outbound() {
            Ok(msg) => msg,
            Err(e) => {
                debug!("clipboard push skipped: {e}");
                continue;
            }
        };
        if tx.send(msg).await.is_err() {
            break;
        }
        last_sent = text;
    }
}
