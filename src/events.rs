//! Transport event channel.
//!
//! The WebSocket client delivers its callbacks on its own task.  Those
//! callbacks never touch monitor state: they push a [`TransportEvent`] into
//! a bounded `embassy-sync` channel, and the main loop drains it at the start
//! of every cycle.  A single consumer keeps arrival order, so the handshake
//! frame is always processed before the first event frame.
//!
//! ```text
//! ┌──────────────┐  TransportEvent  ┌──────────────┐
//! │  WS client   │─────────────────▶│  Main loop   │
//! │  (callback)  │  (8 + 4 reserve) │  (consumer)  │
//! └──────────────┘                  └──────────────┘
//! ```
//!
//! Frames, pings and pongs may only fill [`EVENT_DEPTH`] slots.  The last
//! [`LIFECYCLE_RESERVE`] slots are kept for open, close and error events.
//! A close or error that still finds the channel full is latched and
//! delivered after everything queued ahead of it.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

/// Largest text frame carried through the channel.
pub const FRAME_CAP: usize = 2048;

/// Slots available to frames, pings and pongs.
pub const EVENT_DEPTH: usize = 8;

/// Extra slots only lifecycle events may use.
pub const LIFECYCLE_RESERVE: usize = 4;

/// Owned text of one feed frame.
pub type FrameText = heapless::String<FRAME_CAP>;

/// Everything the transport can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open.
    Opened,
    /// The peer or the network closed the connection.
    Closed,
    /// The transport failed.
    Error,
    /// The server pinged us (answered by the transport itself).
    Ping,
    /// The server answered our liveness ping.
    Pong,
    /// A complete text frame.
    Message(FrameText),
}

impl TransportEvent {
    /// Open, close and error change the connection state and are never
    /// dropped.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Opened | Self::Closed | Self::Error)
    }
}

static TRANSPORT_CHANNEL: Channel<
    CriticalSectionRawMutex,
    TransportEvent,
    { EVENT_DEPTH + LIFECYCLE_RESERVE },
> = Channel::new();

/// Set when a close could not be queued.
static CLOSE_LATCHED: AtomicBool = AtomicBool::new(false);

/// Queue an event.
///
/// Returns `false` when a frame, ping or pong is dropped because its share
/// of the channel is full.  Lifecycle events always return `true`.
pub fn push_event(event: TransportEvent) -> bool {
    if !event.is_lifecycle() {
        if TRANSPORT_CHANNEL.len() >= EVENT_DEPTH {
            warn!("Transport: event channel full, dropping {:?}", kind(&event));
            return false;
        }
        return TRANSPORT_CHANNEL.try_send(event).is_ok();
    }

    match TRANSPORT_CHANNEL.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(TransportEvent::Opened)) => {
            // The connect timeout recovers a lost open.
            warn!("Transport: lifecycle reserve full, open not queued");
            true
        }
        Err(_) => {
            warn!("Transport: lifecycle reserve full, latching close");
            CLOSE_LATCHED.store(true, Ordering::Release);
            true
        }
    }
}

fn kind(event: &TransportEvent) -> &'static str {
    match event {
        TransportEvent::Opened => "open",
        TransportEvent::Closed => "close",
        TransportEvent::Error => "error",
        TransportEvent::Ping => "ping",
        TransportEvent::Pong => "pong",
        TransportEvent::Message(_) => "frame",
    }
}

/// Queue a text frame.  Frames longer than [`FRAME_CAP`] are dropped.
pub fn push_message(text: &str) -> bool {
    match FrameText::try_from(text) {
        Ok(frame) => push_event(TransportEvent::Message(frame)),
        Err(()) => {
            warn!("Transport: dropping {}-byte frame (cap {})", text.len(), FRAME_CAP);
            false
        }
    }
}

/// Take the oldest pending event.  A latched close comes out once the
/// channel is empty.
pub fn pop_event() -> Option<TransportEvent> {
    TRANSPORT_CHANNEL.try_receive().ok().or_else(|| {
        CLOSE_LATCHED
            .swap(false, Ordering::AcqRel)
            .then_some(TransportEvent::Closed)
    })
}

/// Hand every pending event to `f`, oldest first.
pub fn drain_events(mut f: impl FnMut(TransportEvent)) {
    while let Some(event) = pop_event() {
        f(event);
    }
}
