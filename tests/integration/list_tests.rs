//! Event list scrolling through `MonitorService`: drag, inertia, redraws
//! and how live inserts interact with a user who is reading.

use quakewatch::app::ports::PayloadDecoder;
use quakewatch::feed::HexJsonDecoder;
use quakewatch::list_store::TouchEvent;
use quakewatch::record::EventRecord;

use crate::mock_platform::{
    MockPlatform, RecordingSink, SIGNER, Service, event_frame, payload, run, subscribed,
};

fn seeded(count: usize) -> (Service, MockPlatform, RecordingSink) {
    let (mut app, mut hw, mut sink) = subscribed();
    let records: Vec<EventRecord> = (0..count)
        .map(|i| {
            HexJsonDecoder
                .decode(&payload(&format!("Past {i}"), 20, 3.0))
                .unwrap()
        })
        .collect();
    app.enqueue_historical(records, &mut hw, &mut sink);
    hw.clear();
    (app, hw, sink)
}

fn fling(app: &mut Service, hw: &mut MockPlatform, sink: &mut RecordingSink, now: u64) {
    app.on_touch(TouchEvent::Pressed { x: 50, y: 200 }, now, hw, sink);
    app.on_touch(TouchEvent::Held { x: 50, y: 150 }, now + 20, hw, sink);
    app.on_touch(TouchEvent::Released, now + 40, hw, sink);
}

#[test]
fn idle_list_is_not_redrawn() {
    let (mut app, mut hw, mut sink) = seeded(10);
    run(&mut app, &mut hw, &mut sink, 20, 5_000, 20);
    assert_eq!(hw.renders(), 0);
}

#[test]
fn fling_scrolls_with_decaying_inertia() {
    let (mut app, mut hw, mut sink) = seeded(10);
    fling(&mut app, &mut hw, &mut sink, 100);
    assert_eq!(app.list().offset(), 50);

    run(&mut app, &mut hw, &mut sink, 140, 200, 20);
    assert!(app.list().offset() > 50, "inertia keeps scrolling");
    assert!(hw.renders() > 0, "moved list is redrawn");

    run(&mut app, &mut hw, &mut sink, 200, 2_000, 20);
    assert_eq!(app.list().velocity(), 0);
    let settled = app.list().offset();
    assert!(settled <= app.list().max_offset());

    let renders = hw.renders();
    run(&mut app, &mut hw, &mut sink, 2_000, 3_000, 20);
    assert_eq!(hw.renders(), renders, "no redraw once settled");
    assert_eq!(app.list().offset(), settled);
}

#[test]
fn short_list_does_not_scroll() {
    let (mut app, mut hw, mut sink) = seeded(2);
    fling(&mut app, &mut hw, &mut sink, 100);
    run(&mut app, &mut hw, &mut sink, 140, 1_000, 20);
    assert_eq!(app.list().offset(), 0);
    assert!(app.list().scroll_thumb().is_none());
}

#[test]
fn live_insert_keeps_position_of_reading_user() {
    let (mut app, mut hw, mut sink) = seeded(10);
    fling(&mut app, &mut hw, &mut sink, 100);
    run(&mut app, &mut hw, &mut sink, 140, 2_000, 20);
    let reading_at = app.list().offset();
    assert!(reading_at > 0);

    let frame = event_frame("live", SIGNER, &payload("Hokkaido", 40, 5.5));
    app.on_feed_frame(&frame, 2_010, &mut hw, &mut sink);
    assert_eq!(app.list().len(), 11);
    assert_eq!(app.list().offset(), reading_at);
}

#[test]
fn live_insert_resets_offset_when_not_engaged() {
    let (mut app, mut hw, mut sink) = seeded(10);
    let frame = event_frame("live", SIGNER, &payload("Hokkaido", 40, 5.5));
    app.on_feed_frame(&frame, 30, &mut hw, &mut sink);
    assert_eq!(app.list().offset(), 0);
    assert_eq!(app.list().newest().map(|r| r.location()), Some("Hokkaido"));
}

#[test]
fn list_is_capped_at_fifty() {
    let (mut app, mut hw, mut sink) = seeded(60);
    assert_eq!(app.list().len(), 50);
    let frame = event_frame("live", SIGNER, &payload("Hokkaido", 40, 5.5));
    app.on_feed_frame(&frame, 30, &mut hw, &mut sink);
    assert_eq!(app.list().len(), 50);
    assert_eq!(app.list().get(49).map(|r| r.location()), Some("Past 48"));
}
