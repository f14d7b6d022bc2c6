//! Mock platform for integration tests.
//!
//! Records every outbound port call so tests can assert on the full
//! history without a socket, speaker or panel.

use quakewatch::app::events::AppEvent;
use quakewatch::app::ports::{AudioPort, DisplayPort, EventSink, FeedTransport, SystemPort};
use quakewatch::app::service::MonitorService;
use quakewatch::config::SystemConfig;
use quakewatch::feed::HexJsonDecoder;
use quakewatch::list_store::ListStore;
use quakewatch::record::Rgb565;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Connect { url: String, at: u64 },
    Send(String),
    Ping,
    Close,
    Tone { hz: u16, ms: u32 },
    Flash(Rgb565),
    Render { len: usize, offset: i32 },
}

// ── MockPlatform ──────────────────────────────────────────────

pub struct MockPlatform {
    pub calls: Vec<PortCall>,
    /// Timestamp stamped onto `Connect` records; tests keep it in step.
    pub clock: u64,
    pub free_memory: u32,
    pub link: bool,
    pub refuse_connect: bool,
}

#[allow(dead_code)]
impl MockPlatform {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            clock: 0,
            free_memory: 200_000,
            link: true,
            refuse_connect: false,
        }
    }

    pub fn connects(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Connect { at, .. } => Some(*at),
                _ => None,
            })
            .collect()
    }

    pub fn sent(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Send(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn tones(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, PortCall::Tone { .. })).count()
    }

    pub fn flashes(&self) -> Vec<Rgb565> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Flash(colour) => Some(*colour),
                _ => None,
            })
            .collect()
    }

    pub fn renders(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, PortCall::Render { .. })).count()
    }

    pub fn closes(&self) -> usize {
        self.calls.iter().filter(|c| **c == PortCall::Close).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedTransport for MockPlatform {
    fn connect(&mut self, url: &str) -> bool {
        self.calls.push(PortCall::Connect {
            url: url.to_owned(),
            at: self.clock,
        });
        !self.refuse_connect
    }

    fn send(&mut self, text: &str) -> bool {
        self.calls.push(PortCall::Send(text.to_owned()));
        true
    }

    fn ping(&mut self) -> bool {
        self.calls.push(PortCall::Ping);
        true
    }

    fn close(&mut self) {
        self.calls.push(PortCall::Close);
    }
}

impl AudioPort for MockPlatform {
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) {
        self.calls.push(PortCall::Tone {
            hz: frequency_hz,
            ms: duration_ms,
        });
    }
}

impl DisplayPort for MockPlatform {
    fn flash_region(&mut self, colour: Rgb565) {
        self.calls.push(PortCall::Flash(colour));
    }

    fn render_list(&mut self, list: &ListStore) {
        self.calls.push(PortCall::Render {
            len: list.len(),
            offset: list.offset(),
        });
    }
}

impl SystemPort for MockPlatform {
    fn available_memory(&self) -> u32 {
        self.free_memory
    }

    fn link_up(&self) -> bool {
        self.link
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub const NODE_URL: &str = "https://node.example.jp:3001";
pub const FEED_URL: &str = "ws://node.example.jp:3000/ws";
pub const ADDRESS: &str = "TADDRESS";
pub const SIGNER: &str = "SIGNERKEY";

pub fn config() -> SystemConfig {
    let mut config = SystemConfig::default();
    config.feed.node_url.push_str(NODE_URL).unwrap();
    config.feed.address.push_str(ADDRESS).unwrap();
    config.feed.signer_public_key.push_str(SIGNER).unwrap();
    config
}

/// Hex message for a report (plain-message type byte first).
pub fn payload(location: &str, scale: i32, magnitude: f32) -> String {
    let json = format!(
        r#"{{"earthquake":{{"time":"2025-01-15T10:30:00+09:00","hypocenter":{{"name":"{location}","latitude":37.5,"longitude":137.2,"depth":10,"magnitude":{magnitude}}},"maxScale":{scale},"domesticTsunami":"None"}}}}"#
    );
    format!("00{}", hex::encode_upper(json))
}

/// One `confirmedAdded` frame.
pub fn event_frame(hash: &str, signer: &str, payload: &str) -> String {
    format!(
        r#"{{"topic":"confirmedAdded/{ADDRESS}","data":{{"transaction":{{"signerPublicKey":"{signer}","message":"{payload}"}},"meta":{{"hash":"{hash}"}}}}}}"#
    )
}

pub type Service = MonitorService<HexJsonDecoder>;

/// A started service already subscribed to the feed at t = 20 ms.
pub fn subscribed() -> (Service, MockPlatform, RecordingSink) {
    use quakewatch::events::TransportEvent;

    let mut app = MonitorService::new(&config(), HexJsonDecoder);
    let mut hw = MockPlatform::new();
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    app.tick(0, &mut hw, &mut sink);
    app.on_transport_event(TransportEvent::Opened, 10, &mut hw, &mut sink);
    app.on_feed_frame(r#"{"uid":"S1"}"#, 20, &mut hw, &mut sink);
    assert!(app.is_connected());
    hw.clear();
    sink.events.clear();
    (app, hw, sink)
}

/// Tick every `step` ms over `(from, to]`.
pub fn run(app: &mut Service, hw: &mut MockPlatform, sink: &mut RecordingSink, from: u64, to: u64, step: u64) {
    let mut now = from;
    while now < to {
        now = (now + step).min(to);
        hw.clock = now;
        app.tick(now, hw, sink);
    }
}
