//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (WebSocket client, speaker, panel, heap monitor, event
//! sinks) implement these traits.  The
//! [`MonitorService`](super::service::MonitorService) consumes them via
//! generics, so the domain core never touches the network or hardware
//! directly.
//!
//! Every output port is fire-and-forget: a failure inside an adapter is
//! the adapter's to log, and the core carries on.

use crate::error::DecodeError;
use crate::list_store::{ListStore, TouchEvent};
use crate::record::{EventRecord, Rgb565};

// ───────────────────────────────────────────────────────────────
// Payload decoder (domain collaborator)
// ───────────────────────────────────────────────────────────────

/// Turns one transaction message into a validated record.
///
/// The default implementation is
/// [`HexJsonDecoder`](crate::feed::HexJsonDecoder).
pub trait PayloadDecoder {
    fn decode(&self, payload: &str) -> Result<EventRecord, DecodeError>;
}

// ───────────────────────────────────────────────────────────────
// Feed transport (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the feed connection.
///
/// Inbound traffic (open, close, frames, pongs) arrives separately as
/// [`TransportEvent`](crate::events::TransportEvent)s.
pub trait FeedTransport {
    /// Start connecting to `url`.  `false` means the attempt failed
    /// immediately; `true` means an `Opened` or `Closed` event will follow.
    fn connect(&mut self, url: &str) -> bool;

    /// Send one text frame.
    fn send(&mut self, text: &str) -> bool;

    /// Send a liveness ping.
    fn ping(&mut self) -> bool;

    /// Give a polled transport a chance to run.  Callback-driven
    /// transports leave this empty.
    fn poll(&mut self) {}

    /// Close the connection.  Must be safe to call when already closed.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Notification outputs (driven adapters: domain → speaker / panel)
// ───────────────────────────────────────────────────────────────

/// Speaker.
pub trait AudioPort {
    /// Start a tone; returns immediately.
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32);
}

/// Panel.
pub trait DisplayPort {
    /// Fill the list viewport with a solid colour.
    fn flash_region(&mut self, colour: Rgb565);

    /// Redraw the list viewport from the store.
    fn render_list(&mut self, list: &ListStore);
}

// ───────────────────────────────────────────────────────────────
// Touch input (driving adapter: panel → domain)
// ───────────────────────────────────────────────────────────────

/// Panel touch controller, read once per cycle by the driver loop.
pub trait TouchPort {
    fn poll_touch(&mut self) -> TouchEvent;
}

// ───────────────────────────────────────────────────────────────
// System status (driven adapter: platform → domain)
// ───────────────────────────────────────────────────────────────

pub trait SystemPort {
    /// Free heap in bytes.
    fn available_memory(&self) -> u32;

    /// Whether the network link (WiFi) is up.
    fn link_up(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Everything the service drives in one cycle.
///
/// Blanket-implemented, so a single adapter struct (or a test mock) that
/// implements the individual ports can be passed as one `&mut` without
/// splitting borrows.
pub trait Platform: FeedTransport + AudioPort + DisplayPort + SystemPort {}

impl<T: FeedTransport + AudioPort + DisplayPort + SystemPort> Platform for T {}
