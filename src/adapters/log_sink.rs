//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{AppEvent, DropReason};
use crate::app::ports::EventSink;
use crate::feed::MemoryPressure;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written since construction.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started { feed_enabled } => {
                info!("START | feed={}", if *feed_enabled { "on" } else { "off" });
            }
            AppEvent::FeedStateChanged { from, to } => {
                info!("FEED  | {:?} -> {:?}", from, to);
            }
            AppEvent::EventAdmitted(r) => {
                info!(
                    "QUAKE | {} | {} | M{:.1} | depth={}km | {} | effect={}",
                    r.timestamp(),
                    r.location(),
                    r.magnitude(),
                    r.depth_km(),
                    r.severity(),
                    r.secondary_effect(),
                );
            }
            AppEvent::EventDropped(reason) => match reason {
                DropReason::Duplicate => info!("DROP  | duplicate"),
                DropReason::Frame(e) => warn!("DROP  | frame: {}", e),
                DropReason::Decode(e) => warn!("DROP  | decode: {}", e),
                DropReason::LowMemory { free_bytes } => {
                    warn!("DROP  | not notified, {} bytes free", free_bytes);
                }
            },
            AppEvent::NotificationEvicted(r) => {
                warn!("QUEUE | evicted {} ({})", r.location(), r.severity());
            }
            AppEvent::NotificationCancelled => {
                info!("QUEUE | cancelled by touch");
            }
            AppEvent::MemoryPressure { level, free_bytes } => match level {
                MemoryPressure::Critical => {
                    warn!("MEM   | critical, free={}B, feed dropped", free_bytes);
                }
                MemoryPressure::Warning => warn!("MEM   | low, free={}B", free_bytes),
                MemoryPressure::Normal => info!("MEM   | ok, free={}B", free_bytes),
            },
            AppEvent::HistorySeeded { count } => {
                info!("LIST  | seeded {} historical records", count);
            }
        }
    }
}
