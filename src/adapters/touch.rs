//! Touch input adapter.
//!
//! Turns per-cycle contact samples into the edge events the list and the
//! notification cancel logic consume.  The panel controller driver calls
//! [`TouchInput::feed_sample`] with the latest reading; without one every
//! cycle reads as no contact.
//!
//! ```text
//!  sample:   none  (x,y)    (x,y)  (x,y)   none      none
//!  event:    Idle  Pressed  Held   Held    Released  Idle
//! ```

use log::debug;

use crate::app::ports::TouchPort;
use crate::list_store::TouchEvent;

#[derive(Debug, Default)]
pub struct TouchInput {
    sample: Option<(i32, i32)>,
    was_down: bool,
    presses: u32,
}

impl TouchInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest controller reading; `None` means no contact.
    pub fn feed_sample(&mut self, contact: Option<(i32, i32)>) {
        self.sample = contact;
    }

    /// Presses seen since boot.
    pub fn presses(&self) -> u32 {
        self.presses
    }
}

impl TouchPort for TouchInput {
    fn poll_touch(&mut self) -> TouchEvent {
        let event = match (self.sample, self.was_down) {
            (Some((x, y)), false) => {
                self.presses += 1;
                debug!("TOUCH | press at ({}, {})", x, y);
                TouchEvent::Pressed { x, y }
            }
            (Some((x, y)), true) => TouchEvent::Held { x, y },
            (None, true) => {
                debug!("TOUCH | release");
                TouchEvent::Released
            }
            (None, false) => TouchEvent::Idle,
        };
        self.was_down = self.sample.is_some();
        event
    }
}
