//! Fuzz target: `ConnectionManager::on_frame`
//!
//! Drives arbitrary text through a subscribed connection manager and
//! asserts that no frame panics, that the manager never leaves the
//! subscribed state on a data frame, and that the dedup ring stays bounded.
//!
//! cargo fuzz run fuzz_frame_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use quakewatch::app::ports::FeedTransport;
use quakewatch::config::FeedConfig;
use quakewatch::events::TransportEvent;
use quakewatch::feed::dedup::DEDUP_CAPACITY;
use quakewatch::feed::frame::parse_frame;
use quakewatch::feed::{ConnectionManager, ConnectionState, HexJsonDecoder};

struct Sink;

impl FeedTransport for Sink {
    fn connect(&mut self, _url: &str) -> bool {
        true
    }
    fn send(&mut self, _text: &str) -> bool {
        true
    }
    fn ping(&mut self) -> bool {
        true
    }
    fn close(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let _ = parse_frame(text);

    let mut config = FeedConfig::default();
    let _ = config.node_url.push_str("http://node:3001");
    let _ = config.address.push_str("TADDR");
    let mut feed = ConnectionManager::new(&config, HexJsonDecoder);
    let mut t = Sink;
    feed.tick(0, true, &mut t);
    feed.on_transport_event(TransportEvent::Opened, 1, &mut t);
    feed.on_frame(r#"{"uid":"fuzz"}"#, &mut t);
    assert_eq!(feed.state(), ConnectionState::Subscribed);

    for line in text.split('\n') {
        feed.on_frame(line, &mut t);
        assert_eq!(feed.state(), ConnectionState::Subscribed);
    }
    assert!(feed.dedup().len() <= DEDUP_CAPACITY);
});
