//! Application service, the hexagonal core.
//!
//! [`MonitorService`] owns the feed connection, memory watchdog,
//! notification scheduler and event list.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  TransportEvent ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!      TouchEvent ──▶ │        MonitorService        │
//!                     │ Feed · Watchdog · Notify ·   │ ──▶ FeedTransport
//!      SystemPort ──▶ │ ListStore                    │ ──▶ Audio/Display
//!                     └──────────────────────────────┘
//! ```
//!
//! ## Cycle order
//!
//! The driver loop first drains transport events through
//! [`on_transport_event`](MonitorService::on_transport_event), then feeds
//! touch state to [`on_touch`](MonitorService::on_touch), then calls
//! [`tick`](MonitorService::tick) once with the same timestamp.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::events::TransportEvent;
use crate::feed::{ConnectionManager, ConnectionState, FrameOutcome, MemoryPressure, ResourceWatchdog};
use crate::list_store::{ListStore, TouchEvent};
use crate::notify::{NotificationScheduler, VisualState};
use crate::record::EventRecord;

use super::events::{AppEvent, DropReason};
use super::ports::{EventSink, PayloadDecoder, Platform};

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct MonitorService<D> {
    feed: ConnectionManager<D>,
    watchdog: ResourceWatchdog,
    notifier: NotificationScheduler,
    list: ListStore,
    /// Admitted events are dropped instead of notified below this.
    min_free_heap: u32,
    /// Scroll offset at the last full list render.
    rendered_offset: i32,
    tick_count: u64,
}

impl<D: PayloadDecoder> MonitorService<D> {
    /// Construct the service from configuration.
    pub fn new(config: &SystemConfig, decoder: D) -> Self {
        Self {
            feed: ConnectionManager::new(&config.feed, decoder),
            watchdog: ResourceWatchdog::new(&config.watchdog),
            notifier: NotificationScheduler::new(&config.notify),
            list: ListStore::new(&config.list),
            min_free_heap: config.notify.min_free_heap_bytes,
            rendered_offset: 0,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Draw the initial screen and announce startup.
    pub fn start(&mut self, platform: &mut impl Platform, sink: &mut impl EventSink) {
        platform.render_list(&self.list);
        self.rendered_offset = self.list.offset();
        let feed_enabled = self.feed.endpoint().is_some();
        sink.emit(&AppEvent::Started { feed_enabled });
        info!("MonitorService started (feed {})", if feed_enabled { "enabled" } else { "disabled" });
    }

    /// Re-apply feed configuration, dropping the current connection and
    /// the dedup window.
    pub fn reinitialize_feed(
        &mut self,
        config: &SystemConfig,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        let before = self.feed.state();
        if before != ConnectionState::Disconnected {
            platform.close();
        }
        self.feed.initialize(&config.feed);
        self.emit_transition(before, sink);
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Apply one transport event drained from the event channel.
    pub fn on_transport_event(
        &mut self,
        event: TransportEvent,
        now: u64,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        let before = self.feed.state();
        let outcome = self.feed.on_transport_event(event, now, platform);
        self.emit_transition(before, sink);
        if let Some(outcome) = outcome {
            self.handle_outcome(outcome, now, platform, sink);
        }
    }

    /// Apply one raw feed frame.
    pub fn on_feed_frame(
        &mut self,
        raw: &str,
        now: u64,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        let before = self.feed.state();
        let outcome = self.feed.on_frame(raw, platform);
        self.emit_transition(before, sink);
        self.handle_outcome(outcome, now, platform, sink);
    }

    /// Feed one cycle of touch state.  A fresh press cancels the active
    /// notification; every touch also drives list scrolling.
    pub fn on_touch(
        &mut self,
        touch: TouchEvent,
        now: u64,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        if matches!(touch, TouchEvent::Pressed { .. })
            && self.notifier.cancel(now, platform, &mut self.list)
        {
            self.rendered_offset = self.list.offset();
            sink.emit(&AppEvent::NotificationCancelled);
        }
        self.list.handle_touch(touch);
    }

    /// Seed the list with past events (newest first).  They are not
    /// notified and bypass deduplication.
    pub fn enqueue_historical(
        &mut self,
        records: impl IntoIterator<Item = EventRecord>,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) -> usize {
        let count = self.list.seed(records);
        platform.render_list(&self.list);
        self.rendered_offset = self.list.offset();
        sink.emit(&AppEvent::HistorySeeded { count });
        info!("History: seeded {} records", count);
        count
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one cycle: watchdog → feed → notifications → scroll inertia.
    pub fn tick(&mut self, now: u64, platform: &mut impl Platform, sink: &mut impl EventSink) {
        self.tick_count += 1;

        // 1. Memory watchdog may pre-empt the feed for this cycle.
        let before = self.feed.state();
        let pressure = self.watchdog.poll(now, || platform.available_memory());
        let free_bytes = self.watchdog.last_sample().unwrap_or_default();
        match pressure {
            Some(MemoryPressure::Critical) => {
                sink.emit(&AppEvent::MemoryPressure {
                    level: MemoryPressure::Critical,
                    free_bytes,
                });
                self.feed.force_disconnect(now, platform);
            }
            Some(MemoryPressure::Warning) => {
                sink.emit(&AppEvent::MemoryPressure {
                    level: MemoryPressure::Warning,
                    free_bytes,
                });
                let link_up = platform.link_up();
                self.feed.tick(now, link_up, platform);
            }
            Some(MemoryPressure::Normal) | None => {
                let link_up = platform.link_up();
                self.feed.tick(now, link_up, platform);
            }
        }
        self.emit_transition(before, sink);

        // 2. Notification playback.
        let was_flashing = self.notifier.visual_state() != VisualState::Idle;
        self.notifier.tick(now, platform, &mut self.list);
        if was_flashing && self.notifier.visual_state() == VisualState::Idle {
            self.rendered_offset = self.list.offset();
        }

        // 3. Scroll inertia, redrawn only when the offset moved and no
        //    flash owns the viewport.
        self.list.apply_inertia();
        if self.list.offset() != self.rendered_offset
            && self.notifier.visual_state() == VisualState::Idle
        {
            platform.render_list(&self.list);
            self.rendered_offset = self.list.offset();
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// True while subscribed to the feed.
    pub fn is_connected(&self) -> bool {
        self.feed.is_live()
    }

    pub fn feed(&self) -> &ConnectionManager<D> {
        &self.feed
    }

    pub fn notifier(&self) -> &NotificationScheduler {
        &self.notifier
    }

    pub fn list(&self) -> &ListStore {
        &self.list
    }

    /// Total cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internals ─────────────────────────────────────────────

    fn emit_transition(&self, before: ConnectionState, sink: &mut impl EventSink) {
        let after = self.feed.state();
        if after != before {
            sink.emit(&AppEvent::FeedStateChanged {
                from: before,
                to: after,
            });
        }
    }

    fn handle_outcome(
        &mut self,
        outcome: FrameOutcome,
        now: u64,
        platform: &mut impl Platform,
        sink: &mut impl EventSink,
    ) {
        match outcome {
            FrameOutcome::Admitted(record) => {
                let free_bytes = platform.available_memory();
                if free_bytes < self.min_free_heap {
                    warn!("Notify: skipping {}, only {} bytes free", record.location(), free_bytes);
                    sink.emit(&AppEvent::EventDropped(DropReason::LowMemory { free_bytes }));
                    return;
                }
                sink.emit(&AppEvent::EventAdmitted(record.clone()));
                if let Some(evicted) = self.notifier.enqueue(record, now, platform, &mut self.list) {
                    warn!("Notify: evicted pending {}", evicted.location());
                    sink.emit(&AppEvent::NotificationEvicted(evicted));
                }
            }
            FrameOutcome::Duplicate => sink.emit(&AppEvent::EventDropped(DropReason::Duplicate)),
            FrameOutcome::Rejected(e) => sink.emit(&AppEvent::EventDropped(DropReason::Decode(e))),
            FrameOutcome::Discarded(e) => sink.emit(&AppEvent::EventDropped(DropReason::Frame(e))),
            FrameOutcome::Filtered | FrameOutcome::Subscribed | FrameOutcome::Ignored => {}
        }
    }
}
