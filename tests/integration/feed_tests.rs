//! Feed ingestion end to end: connection lifecycle, decode, dedup and the
//! memory watchdog, all through `MonitorService`.

use quakewatch::app::events::{AppEvent, DropReason};
use quakewatch::app::service::MonitorService;
use quakewatch::error::DecodeError;
use quakewatch::events::TransportEvent;
use quakewatch::feed::{ConnectionState, HexJsonDecoder, MemoryPressure};
use quakewatch::record::Severity;

use crate::mock_platform::{
    ADDRESS, FEED_URL, MockPlatform, PortCall, RecordingSink, SIGNER, config, event_frame, payload,
    run, subscribed,
};

// ── Connection lifecycle ─────────────────────────────────────

#[test]
fn connects_and_subscribes_with_session_id() {
    let mut app = MonitorService::new(&config(), HexJsonDecoder);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::Started { feed_enabled: true }));

    app.tick(0, &mut hw, &mut sink);
    assert!(hw.calls.contains(&PortCall::Connect { url: FEED_URL.to_owned(), at: 0 }));
    assert_eq!(hw.connects(), [0]);
    assert_eq!(app.feed().state(), ConnectionState::Connecting);

    app.on_transport_event(TransportEvent::Opened, 10, &mut hw, &mut sink);
    assert_eq!(app.feed().state(), ConnectionState::AwaitingHandshakeId);

    app.on_feed_frame(r#"{"uid":"ZX9k2"}"#, 20, &mut hw, &mut sink);
    assert!(app.is_connected());
    assert_eq!(app.feed().session_id(), Some("ZX9k2"));
    let expected = format!(r#"{{"uid":"ZX9k2","subscribe":"confirmedAdded/{ADDRESS}"}}"#);
    assert_eq!(hw.sent(), [expected.as_str()]);
    assert!(sink.contains(&AppEvent::FeedStateChanged {
        from: ConnectionState::AwaitingHandshakeId,
        to: ConnectionState::Subscribed,
    }));
}

#[test]
fn unprovisioned_feed_never_connects() {
    let mut app = MonitorService::new(&quakewatch::config::SystemConfig::default(), HexJsonDecoder);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::Started { feed_enabled: false }));
    run(&mut app, &mut hw, &mut sink, 0, 120_000, 1_000);
    assert!(hw.connects().is_empty());
}

#[test]
fn five_failures_switch_to_long_backoff() {
    let mut app = MonitorService::new(&config(), HexJsonDecoder);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    hw.refuse_connect = true;
    app.start(&mut hw, &mut sink);
    app.tick(0, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 0, 100_000, 500);

    let attempts = hw.connects();
    assert!(attempts.len() >= 6, "attempts: {attempts:?}");
    for pair in attempts[..5].windows(2) {
        assert!(pair[1] - pair[0] >= 5_000, "short backoff violated: {attempts:?}");
    }
    assert!(
        attempts[5] - attempts[4] >= 60_000,
        "6th attempt must wait the long backoff: {attempts:?}"
    );
}

#[test]
fn close_before_open_counts_as_failure() {
    let mut app = MonitorService::new(&config(), HexJsonDecoder);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    app.tick(0, &mut hw, &mut sink);
    app.on_transport_event(TransportEvent::Closed, 100, &mut hw, &mut sink);
    assert_eq!(app.feed().state(), ConnectionState::Disconnected);
    assert_eq!(app.feed().failures(), 1);

    hw.clock = 4_000;
    app.tick(4_000, &mut hw, &mut sink);
    assert_eq!(hw.connects(), [0], "backoff not yet elapsed");
    hw.clock = 5_100;
    app.tick(5_100, &mut hw, &mut sink);
    assert_eq!(hw.connects(), [0, 5_100]);
}

#[test]
fn link_loss_drops_connection_and_resets_failures() {
    let (mut app, mut hw, mut sink) = subscribed();
    hw.link = false;
    app.tick(100, &mut hw, &mut sink);
    assert_eq!(app.feed().state(), ConnectionState::Disconnected);
    assert_eq!(app.feed().failures(), 0);
    assert_eq!(hw.closes(), 1);

    run(&mut app, &mut hw, &mut sink, 100, 30_000, 1_000);
    assert!(hw.connects().is_empty(), "no attempts while the link is down");
}

#[test]
fn missing_pong_forces_reconnect() {
    let (mut app, mut hw, mut sink) = subscribed();
    // The first ping goes out immediately and is never answered.
    app.tick(100, &mut hw, &mut sink);
    assert!(hw.calls.contains(&PortCall::Ping));

    run(&mut app, &mut hw, &mut sink, 100, 30_000, 1_000);
    assert!(app.is_connected());
    run(&mut app, &mut hw, &mut sink, 30_000, 31_000, 1_000);
    assert_eq!(app.feed().state(), ConnectionState::Disconnected);
    assert_eq!(app.feed().failures(), 0);
}

#[test]
fn answered_pings_keep_connection_alive() {
    let (mut app, mut hw, mut sink) = subscribed();
    let mut now = 20;
    while now < 300_000 {
        now += 1_000;
        app.tick(now, &mut hw, &mut sink);
        if hw.calls.last() == Some(&PortCall::Ping) {
            app.on_transport_event(TransportEvent::Pong, now + 50, &mut hw, &mut sink);
        }
    }
    assert!(app.is_connected());
    let pings = hw.calls.iter().filter(|c| **c == PortCall::Ping).count();
    assert_eq!(pings, 5, "one immediate ping, then one per minute");
}

// ── Events ───────────────────────────────────────────────────

#[test]
fn strong_event_notifies_and_lands_in_list() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("abc123", SIGNER, &payload("Noto Peninsula", 45, 5.8));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);

    let admitted = sink.events.iter().find_map(|e| match e {
        AppEvent::EventAdmitted(r) => Some(r.clone()),
        _ => None,
    });
    let record = admitted.expect("event admitted");
    assert_eq!(record.severity(), Severity::Shindo5Lower);
    assert_eq!(hw.flashes().first(), Some(&0xC320), "orange flash");

    run(&mut app, &mut hw, &mut sink, 20, 2_000, 50);
    assert_eq!(hw.tones(), 3);
    assert!(app.notifier().is_idle());
    assert_eq!(app.list().newest(), Some(&record));
    assert_eq!(app.list().len(), 1);
}

#[test]
fn duplicate_identifier_is_dropped() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("abc123", SIGNER, &payload("Noto Peninsula", 45, 5.8));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 20, 2_000, 50);
    let tones = hw.tones();

    app.on_feed_frame(&frame, 2_100, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::EventDropped(DropReason::Duplicate)));
    assert!(app.notifier().is_idle());
    run(&mut app, &mut hw, &mut sink, 2_100, 4_000, 50);
    assert_eq!(hw.tones(), tones, "no second notification");
    assert_eq!(app.list().len(), 1);
}

#[test]
fn reinitialising_feed_reconnects_and_forgets_seen_events() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("abc123", SIGNER, &payload("Noto Peninsula", 45, 5.8));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 20, 2_000, 50);
    assert!(app.feed().dedup().contains("abc123"));

    app.reinitialize_feed(&config(), &mut hw, &mut sink);
    assert_eq!(hw.closes(), 1);
    assert_eq!(app.feed().state(), ConnectionState::Disconnected);
    assert!(sink.contains(&AppEvent::FeedStateChanged {
        from: ConnectionState::Subscribed,
        to: ConnectionState::Disconnected,
    }));
    assert!(!app.feed().dedup().contains("abc123"));

    hw.clock = 2_050;
    app.tick(2_050, &mut hw, &mut sink);
    assert_eq!(hw.connects(), [2_050], "first attempt after re-init is immediate");
}

#[test]
fn empty_location_is_rejected_at_decode() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("h-empty", SIGNER, &payload("  ", 30, 4.0));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::EventDropped(DropReason::Decode(
        DecodeError::EmptyLocation
    ))));
    assert!(app.notifier().is_idle());
    assert!(app.list().is_empty());
    assert!(!app.feed().dedup().contains("h-empty"), "rejected events never enter the dedup ring");
}

#[test]
fn unknown_severity_is_rejected() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("h-odd", SIGNER, &payload("Tokyo", 35, 4.0));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::EventDropped(DropReason::Decode(
        DecodeError::UnknownSeverity(35)
    ))));
}

#[test]
fn other_signers_are_filtered_silently() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("h-other", "SOMEONEELSE", &payload("Tokyo", 30, 4.0));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    assert!(sink.events.is_empty());
    assert!(app.list().is_empty());
}

#[test]
fn events_flow_through_transport_channel_types() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("via-event", SIGNER, &payload("Sendai", 40, 5.0));
    let text = quakewatch::events::FrameText::try_from(frame.as_str()).unwrap();
    app.on_transport_event(TransportEvent::Message(text), 30, &mut hw, &mut sink);
    assert_eq!(app.notifier().active().map(|r| r.location()), Some("Sendai"));
}

// ── Memory watchdog ──────────────────────────────────────────

#[test]
fn critical_memory_forces_disconnect_and_long_backoff() {
    let (mut app, mut hw, mut sink) = subscribed();
    hw.free_memory = 10_000;
    hw.clock = 10_000;
    app.tick(10_000, &mut hw, &mut sink);

    assert_eq!(app.feed().state(), ConnectionState::Disconnected);
    assert_eq!(app.feed().failures(), config().feed.max_failures);
    assert!(hw.closes() >= 1);
    assert!(sink.contains(&AppEvent::MemoryPressure {
        level: MemoryPressure::Critical,
        free_bytes: 10_000,
    }));

    hw.free_memory = 200_000;
    run(&mut app, &mut hw, &mut sink, 10_000, 69_000, 1_000);
    assert!(hw.connects().is_empty(), "long backoff after forced disconnect");
    run(&mut app, &mut hw, &mut sink, 69_000, 71_000, 1_000);
    assert_eq!(hw.connects().len(), 1);
}

#[test]
fn low_memory_only_warns() {
    let (mut app, mut hw, mut sink) = subscribed();
    hw.free_memory = 18_000;
    app.tick(10_000, &mut hw, &mut sink);
    assert!(app.is_connected());
    assert!(sink.contains(&AppEvent::MemoryPressure {
        level: MemoryPressure::Warning,
        free_bytes: 18_000,
    }));
}

#[test]
fn event_arriving_below_heap_floor_is_not_notified() {
    let (mut app, mut hw, mut sink) = subscribed();
    hw.free_memory = 12_000;
    let frame = event_frame("lowmem1", SIGNER, &payload("Chiba", 40, 4.9));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);

    assert!(sink.contains(&AppEvent::EventDropped(DropReason::LowMemory { free_bytes: 12_000 })));
    assert!(app.notifier().is_idle());
    assert!(app.list().is_empty());
    assert_eq!(hw.tones(), 0);
    assert!(app.feed().dedup().contains("lowmem1"), "still remembered as seen");

    hw.free_memory = 200_000;
    app.on_feed_frame(&frame, 40, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::EventDropped(DropReason::Duplicate)));
    assert!(app.list().is_empty());
}
