//! Notification sequencing, cancellation and history seeding through
//! `MonitorService`.

use quakewatch::app::events::AppEvent;
use quakewatch::app::ports::PayloadDecoder;
use quakewatch::feed::{HexJsonDecoder, decode_history};
use quakewatch::list_store::TouchEvent;
use quakewatch::notify::{AudioState, VisualState};

use crate::mock_platform::{SIGNER, event_frame, payload, run, subscribed};

#[test]
fn beep_count_follows_severity() {
    for (scale, beeps) in [(10, 1), (20, 1), (30, 2), (40, 2), (50, 3), (60, 3), (70, 3)] {
        let (mut app, mut hw, mut sink) = subscribed();
        let frame = event_frame(&format!("h{scale}"), SIGNER, &payload("Chiba", scale, 4.5));
        app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
        run(&mut app, &mut hw, &mut sink, 20, 3_000, 50);
        assert_eq!(hw.tones(), beeps, "scale {scale}");
        assert!(app.notifier().is_idle());
    }
}

#[test]
fn notifications_play_in_arrival_order_and_evict_oldest_pending() {
    let (mut app, mut hw, mut sink) = subscribed();
    for (i, name) in ["A", "B", "C", "D", "E"].iter().enumerate() {
        let frame = event_frame(&format!("id-{name}"), SIGNER, &payload(name, 30, 4.0));
        app.on_feed_frame(&frame, 20 + i as u64, &mut hw, &mut sink);
    }

    assert_eq!(app.notifier().active().map(|r| r.location()), Some("A"));
    assert_eq!(app.notifier().pending_len(), 3);
    let evicted: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::NotificationEvicted(r) => Some(r.location().to_owned()),
            _ => None,
        })
        .collect();
    assert_eq!(evicted, ["B"]);

    let mut started = vec!["A".to_owned()];
    let mut now = 30;
    while now < 10_000 {
        now += 50;
        app.tick(now, &mut hw, &mut sink);
        if let Some(active) = app.notifier().active() {
            if started.last().map(String::as_str) != Some(active.location()) {
                started.push(active.location().to_owned());
            }
        }
    }
    assert_eq!(started, ["A", "C", "D", "E"]);

    let list: Vec<_> = app.list().iter().map(|r| r.location()).collect();
    assert_eq!(list, ["E", "D", "C", "A"], "newest first, evicted never listed");
}

#[test]
fn touch_cancels_active_notification() {
    let (mut app, mut hw, mut sink) = subscribed();
    let frame = event_frame("cancel-me", SIGNER, &payload("Kobe", 70, 6.9));
    app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 20, 300, 50);
    let tones = hw.tones();
    let renders = hw.renders();

    app.on_touch(TouchEvent::Pressed { x: 100, y: 120 }, 320, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::NotificationCancelled));
    assert!(app.notifier().is_idle());
    assert_eq!(app.notifier().audio_state(), AudioState::Idle);
    assert_eq!(app.notifier().visual_state(), VisualState::Idle);
    assert_eq!(hw.renders(), renders + 1, "list restored");
    assert_eq!(app.list().newest().map(|r| r.location()), Some("Kobe"));

    app.on_touch(TouchEvent::Released, 340, &mut hw, &mut sink);
    run(&mut app, &mut hw, &mut sink, 340, 3_000, 50);
    assert_eq!(hw.tones(), tones, "no beeps after cancel");
}

#[test]
fn touch_without_notification_only_scrolls() {
    let (mut app, mut hw, mut sink) = subscribed();
    app.on_touch(TouchEvent::Pressed { x: 100, y: 120 }, 30, &mut hw, &mut sink);
    assert!(!sink.contains(&AppEvent::NotificationCancelled));
    assert!(app.list().is_dragging());
}

#[test]
fn cancel_starts_next_pending() {
    let (mut app, mut hw, mut sink) = subscribed();
    for name in ["First", "Second"] {
        let frame = event_frame(name, SIGNER, &payload(name, 40, 5.0));
        app.on_feed_frame(&frame, 20, &mut hw, &mut sink);
    }
    app.on_touch(TouchEvent::Pressed { x: 0, y: 200 }, 100, &mut hw, &mut sink);
    assert_eq!(app.notifier().active().map(|r| r.location()), Some("Second"));
    assert_eq!(app.list().len(), 2);
}

// ── History ──────────────────────────────────────────────────

fn history_body() -> String {
    let item = |signer: &str, message: &str| {
        format!(r#"{{"transaction":{{"signerPublicKey":"{signer}","message":"{message}"}}}}"#)
    };
    format!(
        r#"{{"data":[{},{},{},{}]}}"#,
        item(SIGNER, &payload("Iwate", 40, 5.1)),
        item("STRANGER", &payload("Nowhere", 10, 2.0)),
        item(SIGNER, "ZZ"),
        item(SIGNER, &payload("Miyagi", 30, 4.4)),
    )
}

#[test]
fn history_page_seeds_list_without_notifying() {
    let (mut app, mut hw, mut sink) = subscribed();
    let page = decode_history(&history_body(), Some(SIGNER), 10, &HexJsonDecoder).unwrap();
    assert_eq!((page.records.len(), page.skipped, page.failed), (2, 1, 1));

    let count = app.enqueue_historical(page.records, &mut hw, &mut sink);
    assert_eq!(count, 2);
    assert!(sink.contains(&AppEvent::HistorySeeded { count: 2 }));
    assert_eq!(hw.tones(), 0);
    assert!(app.notifier().is_idle());

    let list: Vec<_> = app.list().iter().map(|r| r.location()).collect();
    assert_eq!(list, ["Iwate", "Miyagi"]);

    // A live event lands on top of the seeded history.
    let live = HexJsonDecoder.decode(&payload("Aomori", 30, 4.0)).unwrap();
    let frame = event_frame("live-1", SIGNER, &payload("Aomori", 30, 4.0));
    app.on_feed_frame(&frame, 50, &mut hw, &mut sink);
    assert_eq!(app.list().newest(), Some(&live));
    assert_eq!(app.list().len(), 3);
}

#[test]
fn history_limit_is_respected() {
    let page = decode_history(&history_body(), None, 1, &HexJsonDecoder).unwrap();
    assert_eq!(page.records.len(), 1);
    assert_eq!(page.records[0].location(), "Iwate");
}
