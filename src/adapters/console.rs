//! Console output adapter.
//!
//! Implements [`AudioPort`] and [`DisplayPort`] by describing what the
//! speaker and panel would do on the serial log.  Boards without a panel
//! driver run with this adapter; the monitor core cannot tell the
//! difference.

use log::{debug, info};

use crate::app::ports::{AudioPort, DisplayPort};
use crate::list_store::ListStore;
use crate::record::{BACKGROUND, Rgb565};

#[derive(Debug, Default)]
pub struct ConsoleOutput {
    /// Speaker volume, 0-255, applied to every tone.
    volume: u8,
    tones: u32,
    flashes: u32,
    renders: u32,
}

impl ConsoleOutput {
    pub fn new(volume: u8) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }

    pub fn tones(&self) -> u32 {
        self.tones
    }

    pub fn flashes(&self) -> u32 {
        self.flashes
    }

    pub fn renders(&self) -> u32 {
        self.renders
    }
}

impl AudioPort for ConsoleOutput {
    fn play_tone(&mut self, frequency_hz: u16, duration_ms: u32) {
        self.tones = self.tones.wrapping_add(1);
        info!(
            "AUDIO | beep {} Hz for {} ms at volume {}",
            frequency_hz, duration_ms, self.volume
        );
    }
}

impl DisplayPort for ConsoleOutput {
    fn flash_region(&mut self, colour: Rgb565) {
        self.flashes = self.flashes.wrapping_add(1);
        if colour == BACKGROUND {
            debug!("PANEL | flash off");
        } else {
            info!("PANEL | flash 0x{:04X}", colour);
        }
    }

    fn render_list(&mut self, list: &ListStore) {
        self.renders = self.renders.wrapping_add(1);
        if list.is_empty() {
            info!("PANEL | list empty");
            return;
        }
        info!(
            "PANEL | list {} items, offset {}/{}",
            list.len(),
            list.offset(),
            list.max_offset()
        );
        for index in list.visible_range() {
            if let Some(r) = list.get(index) {
                info!(
                    "PANEL |  y={:>4} {} {} M{:.1} {}",
                    list.item_top(index),
                    r.severity().label(),
                    r.location(),
                    r.magnitude(),
                    r.timestamp()
                );
            }
        }
        if let Some(thumb) = list.scroll_thumb() {
            debug!("PANEL | thumb y={} h={}", thumb.y, thumb.height);
        }
    }
}
