//! Capped, scrollable list of recent events.
//!
//! Newest first, at most [`LIST_CAPACITY`] entries; inserting into a full
//! list drops the oldest (tail) entry.  The store also owns the scroll
//! state the renderer needs:
//!
//! ```text
//!  y = 0 ┌──────────────────────┐
//!        │ header (no scroll)   │
//!  y = H ├──────────────────────┤ ◀─ viewport top, offset 0
//!        │ item 0   (height)    │
//!        │ margin               │
//!        │ item 1               │   pitch = height + margin
//!        │ ...                  │
//!        └──────────────────────┘ ◀─ H + visible_height
//! ```
//!
//! **Engagement.**  While the user is dragging, or has scrolled away from
//! the top (`offset > 0`), an insert leaves the offset alone so the list
//! doesn't jump under their finger.  Otherwise inserts snap back to the top
//! so the newest event is on screen.

use core::ops::Range;

use heapless::Deque;
use log::debug;

use crate::config::ListConfig;
use crate::record::EventRecord;

/// Maximum number of events retained.
pub const LIST_CAPACITY: usize = 50;

/// Smallest scroll thumb the renderer draws.
const MIN_THUMB_HEIGHT: i32 = 20;

/// Touch panel state for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// The finger went down this cycle.
    Pressed { x: i32, y: i32 },
    /// The finger is still down.
    Held { x: i32, y: i32 },
    /// The finger lifted this cycle.
    Released,
    /// No contact.
    Idle,
}

/// Scroll thumb geometry in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollThumb {
    pub y: i32,
    pub height: i32,
}

pub struct ListStore {
    items: Deque<EventRecord, LIST_CAPACITY>,
    offset: i32,
    velocity: i32,
    dragging: bool,
    last_y: Option<i32>,
    geometry: ListConfig,
}

impl ListStore {
    pub fn new(config: &ListConfig) -> Self {
        Self {
            items: Deque::new(),
            offset: 0,
            velocity: 0,
            dragging: false,
            last_y: None,
            geometry: config.clone(),
        }
    }

    // ── Contents ──────────────────────────────────────────────

    /// Prepend `record`, evicting the oldest entry when full.
    ///
    /// Returns the evicted record, if any.
    pub fn insert(&mut self, record: EventRecord) -> Option<EventRecord> {
        let evicted = if self.items.is_full() {
            self.items.pop_back()
        } else {
            None
        };
        debug!("List: insert {} ({} items)", record.location(), self.items.len() + 1);
        // Room was made above.
        let _ = self.items.push_front(record);

        if !self.is_engaged() {
            self.offset = 0;
        }
        self.clamp_offset();
        evicted
    }

    /// Append historical records (already newest first) until full.
    ///
    /// Returns how many were stored.
    pub fn seed(&mut self, records: impl IntoIterator<Item = EventRecord>) -> usize {
        let mut stored = 0;
        for record in records {
            if self.items.push_back(record).is_err() {
                break;
            }
            stored += 1;
        }
        stored
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entry `index` positions from the newest.
    pub fn get(&self, index: usize) -> Option<&EventRecord> {
        self.items.iter().nth(index)
    }

    pub fn newest(&self) -> Option<&EventRecord> {
        self.items.front()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.items.iter()
    }

    // ── Scroll state ──────────────────────────────────────────

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// True while the user holds or has moved the scroll position.
    pub fn is_engaged(&self) -> bool {
        self.dragging || self.offset > 0
    }

    pub fn geometry(&self) -> &ListConfig {
        &self.geometry
    }

    fn content_height(&self) -> i32 {
        self.items.len() as i32 * self.geometry.pitch()
    }

    /// Largest valid offset for the current contents.
    pub fn max_offset(&self) -> i32 {
        (self.content_height() - self.geometry.visible_height).max(0)
    }

    /// Set the offset, clamped to `[0, max_offset]`.
    pub fn set_offset(&mut self, offset: i32) {
        self.offset = offset.clamp(0, self.max_offset());
    }

    fn clamp_offset(&mut self) {
        self.set_offset(self.offset);
    }

    /// Scroll by a finger movement of `delta_y` pixels (positive = down).
    pub fn apply_drag(&mut self, delta_y: i32) {
        self.set_offset(self.offset - delta_y);
        self.velocity = -delta_y;
    }

    /// One inertia step after the finger lifts.
    ///
    /// Returns `true` when the offset moved.
    pub fn apply_inertia(&mut self) -> bool {
        if self.dragging {
            return false;
        }
        if self.velocity.abs() < 1 {
            self.velocity = 0;
            return false;
        }
        let before = self.offset;
        self.set_offset(self.offset + self.velocity);
        self.velocity = (self.velocity as f32 * self.geometry.inertia_decay) as i32;
        self.offset != before
    }

    /// Feed one cycle of touch panel state.
    pub fn handle_touch(&mut self, touch: TouchEvent) {
        match touch {
            TouchEvent::Pressed { y, .. } | TouchEvent::Held { y, .. } => {
                if y < self.geometry.header_height {
                    return;
                }
                match self.last_y {
                    Some(last) if self.dragging => {
                        let delta = y - last;
                        if delta != 0 {
                            self.apply_drag(delta);
                            self.last_y = Some(y);
                        }
                    }
                    _ => {
                        self.dragging = true;
                        self.last_y = Some(y);
                        self.velocity = 0;
                        debug!("List: drag start y={}", y);
                    }
                }
            }
            TouchEvent::Released => {
                if self.dragging {
                    debug!("List: drag end velocity={}", self.velocity);
                }
                self.dragging = false;
                self.last_y = None;
            }
            TouchEvent::Idle => {
                self.dragging = false;
                self.last_y = None;
            }
        }
    }

    // ── Rendering helpers ─────────────────────────────────────

    /// Indices of the items that intersect the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        visible_range(
            self.offset,
            self.items.len(),
            self.geometry.pitch(),
            self.geometry.visible_height,
        )
    }

    /// Screen y of the top edge of item `index`.
    pub fn item_top(&self, index: usize) -> i32 {
        self.geometry.header_height + index as i32 * self.geometry.pitch() - self.offset
    }

    /// Scroll thumb, or `None` when everything fits on screen.
    pub fn scroll_thumb(&self) -> Option<ScrollThumb> {
        let max = self.max_offset();
        if max <= 0 {
            return None;
        }
        let track = self.geometry.visible_height;
        let height = (track * track / self.content_height()).max(MIN_THUMB_HEIGHT);
        let y = self.geometry.header_height + self.offset * (track - height) / max;
        Some(ScrollThumb { y, height })
    }
}

/// Indices `[first, last)` of items visible at `offset`.
///
/// `first = offset / pitch`, `last = min(count, (offset + visible) / pitch + 1)`.
pub fn visible_range(offset: i32, count: usize, pitch: i32, visible_height: i32) -> Range<usize> {
    if count == 0 || pitch <= 0 {
        return 0..0;
    }
    let offset = offset.max(0);
    let first = (offset / pitch) as usize;
    let last = (((offset + visible_height) / pitch + 1) as usize).min(count);
    first.min(last)..last
}
