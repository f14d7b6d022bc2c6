//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, forward to a status
//! line on the panel, and so on.

use crate::error::{DecodeError, FrameError};
use crate::feed::{ConnectionState, MemoryPressure};
use crate::record::EventRecord;

/// Why an inbound event never reached the notification queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Frame(FrameError),
    Decode(DecodeError),
    Duplicate,
    /// Free heap was below the notification floor when the event arrived.
    LowMemory { free_bytes: u32 },
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started.  `feed_enabled` is false when no node is
    /// configured.
    Started { feed_enabled: bool },

    /// The feed connection moved between states.
    FeedStateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A novel earthquake was admitted and queued for notification.
    EventAdmitted(EventRecord),

    /// An inbound event was discarded.
    EventDropped(DropReason),

    /// A pending notification was evicted by a newer one.
    NotificationEvicted(EventRecord),

    /// The user cancelled the active notification.
    NotificationCancelled,

    /// The memory watchdog reported pressure.
    MemoryPressure { level: MemoryPressure, free_bytes: u32 },

    /// Historical records were loaded into the list.
    HistorySeeded { count: usize },
}
