//! Notification scheduler.
//!
//! Holds up to [`QUEUE_CAPACITY`] pending records and plays them strictly
//! in arrival order, one at a time.  When the queue is full the oldest
//! pending record is dropped so the newest always gets in.
//!
//! Dequeuing a record commits it to the [`ListStore`] and starts both
//! playback channels.  The next record is dequeued once both channels are
//! idle, either naturally or through [`cancel`](NotificationScheduler::cancel).

use heapless::Deque;
use log::{info, warn};

use crate::app::ports::{AudioPort, DisplayPort};
use crate::config::NotifyConfig;
use crate::list_store::ListStore;
use crate::record::EventRecord;

use super::playback::{AudioChannel, AudioState, VisualChannel, VisualState};

/// Pending notifications held while one is playing.
pub const QUEUE_CAPACITY: usize = 3;

pub struct NotificationScheduler {
    pending: Deque<EventRecord, QUEUE_CAPACITY>,
    active: Option<EventRecord>,
    audio: AudioChannel,
    visual: VisualChannel,
}

impl NotificationScheduler {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            pending: Deque::new(),
            active: None,
            audio: AudioChannel::new(config),
            visual: VisualChannel::new(config),
        }
    }

    /// Queue `record`, starting playback immediately when idle.
    ///
    /// Returns the pending record evicted to make room, if any.
    pub fn enqueue(
        &mut self,
        record: EventRecord,
        now: u64,
        out: &mut (impl AudioPort + DisplayPort),
        list: &mut ListStore,
    ) -> Option<EventRecord> {
        let evicted = if self.pending.is_full() {
            let dropped = self.pending.pop_front();
            if let Some(d) = &dropped {
                warn!("Notify: queue full, dropping {} ({})", d.location(), d.severity());
            }
            dropped
        } else {
            None
        };
        // Room was made above.
        let _ = self.pending.push_back(record);

        if self.active.is_none() {
            self.start_next(now, out, list);
        }
        evicted
    }

    /// Advance both channels; move to the next record once both are idle.
    pub fn tick(&mut self, now: u64, out: &mut (impl AudioPort + DisplayPort), list: &mut ListStore) {
        if self.active.is_none() {
            return;
        }
        self.audio.tick(now, out);
        self.visual.tick(now, out, list);

        if self.audio.is_idle() && self.visual.is_idle() {
            if let Some(done) = self.active.take() {
                info!("Notify: finished {}", done.location());
            }
            self.start_next(now, out, list);
        }
    }

    /// Stop the active notification and restore the list.
    ///
    /// Returns `false` (and does nothing) when nothing is playing.  The
    /// cancelled record stays in the list; the next pending record, if any,
    /// starts immediately.
    pub fn cancel(&mut self, now: u64, out: &mut (impl AudioPort + DisplayPort), list: &mut ListStore) -> bool {
        let Some(cancelled) = self.active.take() else {
            return false;
        };
        self.audio.stop();
        self.visual.stop();
        out.render_list(list);
        info!("Notify: cancelled {}", cancelled.location());
        self.start_next(now, out, list);
        true
    }

    // ── Queries ───────────────────────────────────────────────

    /// Records waiting behind the active one.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> impl Iterator<Item = &EventRecord> {
        self.pending.iter()
    }

    /// The record currently playing.
    pub fn active(&self) -> Option<&EventRecord> {
        self.active.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn audio_state(&self) -> AudioState {
        self.audio.state()
    }

    pub fn visual_state(&self) -> VisualState {
        self.visual.state()
    }

    // ── Internals ─────────────────────────────────────────────

    fn start_next(&mut self, now: u64, out: &mut (impl AudioPort + DisplayPort), list: &mut ListStore) {
        let Some(record) = self.pending.pop_front() else {
            return;
        };
        let severity = record.severity();
        info!(
            "Notify: playing {} M{:.1} {} ({} beeps, {} pending)",
            record.location(),
            record.magnitude(),
            severity,
            severity.beep_count(),
            self.pending.len()
        );
        list.insert(record.clone());
        self.audio.start(severity.beep_count(), now, out);
        self.visual.start(severity.colour(), now, out);
        self.active = Some(record);
    }
}
