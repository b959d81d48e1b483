//! Integration tests: producer timing, viewer fan-out, control commands and
//! input routing, all against mock collaborators.

mod mocks;

use std::time::Duration;

use bytes::Bytes;
use futures::stream;
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use deskview_core::{
    DeskviewError, DisplayBounds, DisplaySelector, Engine, EngineConfig, InboundMessage, KeyAction,
    Modifiers, MouseAction, MouseButton, Outbound, Result, TickOutcome, quality_for,
};
use mocks::{InjectorCall, MockBackends};

// ── Helpers ──────────────────────────────────────────────────────

fn engine(mocks: &MockBackends) -> Engine {
    let config = EngineConfig {
        clipboard_sync: None,
        ..EngineConfig::default()
    };
    Engine::new(config, mocks.backends())
}

fn text(s: &str) -> InboundMessage {
    InboundMessage::Text(s.to_string())
}

/// Drain a viewer's queue in the background, counting frames.
fn spawn_drain(mut rx: mpsc::Receiver<Outbound>) -> tokio::task::JoinHandle<usize> {
    tokio::spawn(async move {
        let mut frames = 0;
        while let Some(msg) = rx.recv().await {
            if matches!(msg, Outbound::Frame(_)) {
                frames += 1;
            }
        }
        frames
    })
}

// ── Rate control ─────────────────────────────────────────────────

#[test]
fn test_quality_table_range() {
    for fps in 1..=120 {
        let q = quality_for(fps);
        assert!((30..=90).contains(&q));
    }
    assert_eq!(quality_for(10), 70);
}

#[tokio::test]
async fn test_out_of_range_fps_is_ignored() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let viewer = engine.attach();

    for bad in ["fps:0", "fps:121", "fps:-5", "fps:ten"] {
        viewer.dispatcher.handle(&text(bad)).await;
    }

    assert_eq!(producer.apply_pending_rate(), None);
    assert_eq!(engine.state().target_fps(), 10);
    assert_eq!(producer.fps(), 10);
}

#[tokio::test]
async fn test_rapid_fps_requests_coalesce() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let viewer = engine.attach();

    viewer.dispatcher.handle(&text("fps:15")).await;
    viewer.dispatcher.handle(&text("fps:30")).await;

    assert_eq!(producer.apply_pending_rate(), Some(30));
    assert_eq!(producer.apply_pending_rate(), None);
    assert_eq!(engine.state().target_fps(), 30);
}

#[tokio::test(start_paused = true)]
async fn test_running_producer_applies_latest_rate_only() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    let drain = spawn_drain(viewer.outbound);

    let cancel = CancellationToken::new();
    let producer = tokio::spawn(engine.producer().run(cancel.clone()));

    viewer.dispatcher.handle(&text("fps:15")).await;
    viewer.dispatcher.handle(&text("fps:30")).await;
    tokio::time::sleep(Duration::from_millis(1010)).await;

    cancel.cancel();
    assert_ok!(producer.await);
    assert_eq!(engine.state().target_fps(), 30);

    let qualities = mocks.encoder.qualities.lock().clone();
    assert!(!qualities.is_empty());
    assert!(qualities.iter().all(|&q| q == quality_for(30)));
    assert!((28..=31).contains(&mocks.capture.calls()), "{}", mocks.capture.calls());

    drop(viewer.dispatcher);
    engine.registry().remove(viewer.id);
    assert!(drain.await.unwrap() > 0);
}

// ── Producer ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_idle_producer_never_captures() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let cancel = CancellationToken::new();
    let producer = tokio::spawn(engine.producer().run(cancel.clone()));

    tokio::time::sleep(Duration::from_secs(10)).await;
    cancel.cancel();
    assert_ok!(producer.await);

    assert_eq!(mocks.capture.calls(), 0);
    assert!(mocks.encoder.qualities.lock().is_empty());
}

#[tokio::test]
async fn test_idle_tick_skips_capture() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    for _ in 0..50 {
        assert_eq!(producer.tick(), TickOutcome::Idle);
    }
    assert_eq!(mocks.capture.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_producer_runs_at_target_rate() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    let _drain = spawn_drain(viewer.outbound);

    let cancel = CancellationToken::new();
    let producer = tokio::spawn(engine.producer().run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(1050)).await;
    cancel.cancel();
    assert_ok!(producer.await);

    let calls = mocks.capture.calls();
    assert!((9..=11).contains(&calls), "captured {calls} frames");
}

#[tokio::test]
async fn test_capture_failure_only_drops_tick() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let mut viewer = engine.attach();

    mocks.capture.set_failing(true);
    assert_eq!(producer.tick(), TickOutcome::Dropped);
    assert!(viewer.outbound.try_recv().is_err());

    mocks.capture.set_failing(false);
    assert!(matches!(producer.tick(), TickOutcome::Broadcast(r) if r.delivered == 1));
    assert!(matches!(viewer.outbound.try_recv(), Ok(Outbound::Frame(_))));
}

#[tokio::test]
async fn test_encode_failure_only_drops_tick() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let mut viewer = engine.attach();

    mocks.encoder.set_failing(true);
    assert_eq!(producer.tick(), TickOutcome::Dropped);
    assert!(viewer.outbound.try_recv().is_err());
    assert!(engine.registry().contains(viewer.id));

    mocks.encoder.set_failing(false);
    producer.tick();
    assert_eq!(
        viewer.outbound.try_recv().unwrap(),
        Outbound::Frame(Bytes::from(vec![quality_for(10), 8, 4]))
    );
}

#[tokio::test]
async fn test_stale_selector_captures_all_displays() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let _viewer = engine.attach();

    assert_ok!(engine.state().select(DisplaySelector::Index(1), 2));
    producer.tick();

    mocks.topology.unplug_last();
    producer.tick();

    let selectors = mocks.capture.selectors.lock().clone();
    assert_eq!(selectors, vec![DisplaySelector::Index(1), DisplaySelector::All]);
    // The stored selector is left alone; it resolves per tick.
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
}

// ── Fan-out ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_viewer_is_evicted_others_continue() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let a = engine.attach();
    let mut b = engine.attach();

    // A's connection is gone.
    drop(a.outbound);

    let TickOutcome::Broadcast(report) = producer.tick() else {
        panic!("expected a broadcast");
    };
    assert_eq!(report.evicted, 1);
    assert_eq!(report.delivered, 1);
    assert!(!engine.registry().contains(a.id));
    assert!(engine.registry().contains(b.id));
    assert!(matches!(b.outbound.try_recv(), Ok(Outbound::Frame(_))));

    producer.tick();
    assert!(matches!(b.outbound.try_recv(), Ok(Outbound::Frame(_))));
    assert_eq!(engine.registry().len(), 1);
}

#[tokio::test]
async fn test_busy_viewer_skips_frame_without_eviction() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut producer = engine.producer();
    let mut viewer = engine.attach();

    producer.tick();
    let TickOutcome::Broadcast(report) = producer.tick() else {
        panic!("expected a broadcast");
    };
    assert_eq!(report.skipped, 1);
    assert!(engine.registry().contains(viewer.id));

    assert!(viewer.outbound.try_recv().is_ok());
    assert!(viewer.outbound.try_recv().is_err());
}

// ── Control dispatcher ───────────────────────────────────────────

#[tokio::test]
async fn test_screen_out_of_range_keeps_selector() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();

    viewer.dispatcher.handle(&text("screen:1")).await;
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));

    viewer.dispatcher.handle(&text("screen:7")).await;
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));

    viewer.dispatcher.handle(&text("screen:all")).await;
    assert_eq!(engine.state().selector(), DisplaySelector::All);
}

#[tokio::test]
async fn test_tuning_is_shared_across_viewers() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let a = engine.attach();
    let b = engine.attach();

    a.dispatcher.handle(&text("screen:0")).await;
    b.dispatcher.handle(&text("screen:1")).await;
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
}

#[tokio::test]
async fn test_malformed_event_is_dropped_and_loop_continues() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    let id = viewer.id;

    let inbound = stream::iter(vec![
        Ok(text(r#"{"type":"mouse","data":{"x":"not-a-number"}}"#)),
        Ok(text("bogus")),
        Ok(text("refresh")),
        Ok(text(r#"{"type":"keyboard","data":{"key":"a","action":"down","ctrl":false,"alt":false,"shift":true}}"#)),
    ]);
    viewer.dispatcher.run(inbound).await;

    assert_eq!(
        mocks.injector.calls(),
        vec![InjectorCall::Keyboard(
            "a".into(),
            KeyAction::Down,
            Modifiers {
                ctrl: false,
                alt: false,
                shift: true
            }
        )]
    );
    // Stream end unregisters the viewer.
    assert!(!engine.registry().contains(id));
}

#[tokio::test]
async fn test_read_error_ends_dispatcher() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    let id = viewer.id;

    let inbound = stream::iter(vec![
        Ok(text("screen:1")),
        Err(DeskviewError::Transport("connection reset".into())),
        Ok(text("screen:0")),
    ]);
    viewer.dispatcher.run(inbound).await;

    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
    assert!(!engine.registry().contains(id));
    assert!(!engine.registry().remove(id));
}

#[tokio::test]
async fn test_binary_message_is_read_as_text() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();

    viewer
        .dispatcher
        .handle(&InboundMessage::Binary(Bytes::from_static(b"screen:1")))
        .await;
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));

    viewer
        .dispatcher
        .handle(&InboundMessage::Binary(Bytes::from_static(&[0xFF, 0xFE])))
        .await;
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
}

// ── Input routing ────────────────────────────────────────────────

#[tokio::test]
async fn test_mouse_offset_for_single_display() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();

    viewer.dispatcher.handle(&text("screen:1")).await;
    viewer
        .dispatcher
        .handle(&text(r#"{"type":"mouse","data":{"x":10,"y":20,"button":"left","action":"down"}}"#))
        .await;

    assert_eq!(
        mocks.injector.calls(),
        vec![InjectorCall::Mouse(1930, 20, MouseButton::Left, MouseAction::Down)]
    );
}

#[tokio::test]
async fn test_mouse_offset_saturates_instead_of_overflowing() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    let id = viewer.id;

    let inbound = stream::iter(vec![
        Ok(text("screen:1")),
        Ok(text(
            r#"{"type":"mouse","data":{"x":2147483647,"y":-2147483648,"button":"none","action":"move"}}"#,
        )),
        Ok(text(r#"{"type":"mouse","data":{"x":5,"y":6,"button":"none","action":"move"}}"#)),
    ]);
    viewer.dispatcher.run(inbound).await;

    assert_eq!(
        mocks.injector.calls(),
        vec![
            InjectorCall::Mouse(i32::MAX, i32::MIN, MouseButton::None, MouseAction::Move),
            InjectorCall::Mouse(1925, 6, MouseButton::None, MouseAction::Move),
        ]
    );
    assert!(!engine.registry().contains(id));
}

#[tokio::test]
async fn test_mouse_passes_through_after_selected_display_unplugged() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();

    viewer.dispatcher.handle(&text("screen:1")).await;
    mocks.topology.unplug_last();
    viewer
        .dispatcher
        .handle(&text(r#"{"type":"mouse","data":{"x":10,"y":20,"button":"left","action":"up"}}"#))
        .await;

    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
    assert_eq!(
        mocks.injector.calls(),
        vec![InjectorCall::Mouse(10, 20, MouseButton::Left, MouseAction::Up)]
    );
}

#[tokio::test]
async fn test_mouse_uses_real_display_origins() {
    let mocks = MockBackends::dual();
    // Second display stacked below the first, a third left of the primary.
    *mocks.topology.displays.lock() = vec![
        DisplayBounds::new(0, 0, 1920, 1080),
        DisplayBounds::new(0, 1080, 1920, 1080),
        DisplayBounds::new(-1280, 0, 1280, 1024),
    ];
    let engine = engine(&mocks);
    let viewer = engine.attach();

    let move_to = r#"{"type":"mouse","data":{"x":10,"y":20,"button":"none","action":"move"}}"#;
    viewer.dispatcher.handle(&text("screen:1")).await;
    viewer.dispatcher.handle(&text(move_to)).await;
    viewer.dispatcher.handle(&text("screen:all")).await;
    viewer.dispatcher.handle(&text(move_to)).await;

    assert_eq!(
        mocks.injector.calls(),
        vec![
            InjectorCall::Mouse(10, 1100, MouseButton::None, MouseAction::Move),
            InjectorCall::Mouse(-1270, 20, MouseButton::None, MouseAction::Move),
        ]
    );
}

#[tokio::test]
async fn test_mouse_passthrough_for_all_displays() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();

    viewer
        .dispatcher
        .handle(&text(
            r#"{"type":"mouse","data":{"x":2500,"y":40,"button":"wheel","action":"scroll","scroll":-3}}"#,
        ))
        .await;

    assert_eq!(
        mocks.injector.calls(),
        vec![InjectorCall::Mouse(2500, 40, MouseButton::Wheel, MouseAction::Scroll(-3))]
    );
}

#[tokio::test]
async fn test_injector_failure_is_swallowed() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let viewer = engine.attach();
    mocks
        .injector
        .fail
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let inbound = stream::iter(vec![
        Ok(text(r#"{"type":"mouse","data":{"x":1,"y":2,"button":"none","action":"move"}}"#)),
        Ok(text("screen:1")),
    ]);
    viewer.dispatcher.run(inbound).await;

    assert_eq!(mocks.injector.calls().len(), 1);
    assert_eq!(engine.state().selector(), DisplaySelector::Index(1));
}

#[tokio::test]
async fn test_clipboard_get_replies_on_same_connection() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut viewer = engine.attach();
    mocks.injector.set_clipboard("host text");

    viewer
        .dispatcher
        .handle(&text(r#"{"type":"clipboard","data":{"action":"get"}}"#))
        .await;

    assert_eq!(
        viewer.outbound.try_recv().unwrap(),
        Outbound::Text(
            r#"{"type":"clipboard","data":{"action":"content","text":"host text"}}"#.into()
        )
    );
}

#[tokio::test]
async fn test_clipboard_set_writes_host() {
    let mocks = MockBackends::dual();
    let engine = engine(&mocks);
    let mut viewer = engine.attach();

    viewer
        .dispatcher
        .handle(&text(r#"{"type":"clipboard","data":{"action":"set","text":"from viewer"}}"#))
        .await;
    viewer
        .dispatcher
        .handle(&text(r#"{"type":"clipboard","data":{"action":"content","text":"echo"}}"#))
        .await;

    assert_eq!(
        mocks.injector.calls(),
        vec![InjectorCall::ClipboardSet("from viewer".into())]
    );
    assert!(viewer.outbound.try_recv().is_err());
}

// ── Clipboard push ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_clipboard_push_sends_changes_only() {
    let mocks = MockBackends::dual();
    let config = EngineConfig {
        clipboard_sync: Some(Duration::from_secs(2)),
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, mocks.backends());
    let mut viewer = engine.attach();
    let dispatcher = tokio::spawn(viewer.dispatcher.run(stream::pending::<Result<InboundMessage>>()));

    // Empty clipboard matches the initial state; nothing is sent.
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(viewer.outbound.try_recv().is_err());

    mocks.injector.set_clipboard("copied");
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(
        viewer.outbound.try_recv().unwrap(),
        Outbound::Text(r#"{"type":"clipboard","data":{"action":"content","text":"copied"}}"#.into())
    );

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(viewer.outbound.try_recv().is_err());

    dispatcher.abort();
}
