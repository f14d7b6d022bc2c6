//! Audio and visual playback channels.
//!
//! Two independent, non-blocking state machines advanced by the scheduler
//! on every tick.  Both are started together for a record and may finish at
//! different times.
//!
//! ```text
//! audio   ▕beep▏ gap ▕beep▏ gap ▕beep▏ gap │ idle
//!         0    150   250  400   500  650   750 ms
//!
//! visual  ▕colour▏ bg ▕colour▏ bg ▕colour▏│ restore list
//!         0      300  600    900  1200   1500 ms
//! ```

use log::debug;

use crate::app::ports::{AudioPort, DisplayPort};
use crate::config::NotifyConfig;
use crate::list_store::ListStore;
use crate::record::{BACKGROUND, Rgb565};

// ───────────────────────────────────────────────────────────────
// Audio
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Idle,
    /// `played` beeps have completed; one is sounding or in its gap.
    Playing { count: u8, played: u8, last_start: u64 },
}

pub struct AudioChannel {
    state: AudioState,
    tone_hz: u16,
    beep_ms: u32,
    period_ms: u64,
}

impl AudioChannel {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            state: AudioState::Idle,
            tone_hz: config.tone_hz,
            beep_ms: config.beep_on_ms,
            period_ms: u64::from(config.beep_period_ms()),
        }
    }

    pub fn state(&self) -> AudioState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == AudioState::Idle
    }

    /// Sound the first of `count` beeps now.
    pub fn start(&mut self, count: u8, now: u64, audio: &mut impl AudioPort) {
        if count == 0 {
            self.state = AudioState::Idle;
            return;
        }
        audio.play_tone(self.tone_hz, self.beep_ms);
        self.state = AudioState::Playing {
            count,
            played: 0,
            last_start: now,
        };
    }

    /// Advance; returns `true` on the tick the last beep completes.
    pub fn tick(&mut self, now: u64, audio: &mut impl AudioPort) -> bool {
        let AudioState::Playing { count, played, last_start } = self.state else {
            return false;
        };
        if now.saturating_sub(last_start) < self.period_ms {
            return false;
        }
        let played = played + 1;
        if played >= count {
            self.state = AudioState::Idle;
            debug!("Notify: audio done ({} beeps)", count);
            return true;
        }
        audio.play_tone(self.tone_hz, self.beep_ms);
        self.state = AudioState::Playing {
            count,
            played,
            last_start: now,
        };
        false
    }

    /// Drop any remaining beeps.
    pub fn stop(&mut self) {
        self.state = AudioState::Idle;
    }
}

// ───────────────────────────────────────────────────────────────
// Visual
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Idle,
    /// `lit` is whether the colour (not the background) is on screen.
    Flashing { started: u64, colour: Rgb565, lit: bool },
}

pub struct VisualChannel {
    state: VisualState,
    duration_ms: u64,
    toggle_ms: u64,
}

impl VisualChannel {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            state: VisualState::Idle,
            duration_ms: u64::from(config.flash_duration_ms),
            toggle_ms: u64::from(config.flash_toggle_ms).max(1),
        }
    }

    pub fn state(&self) -> VisualState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == VisualState::Idle
    }

    pub fn start(&mut self, colour: Rgb565, now: u64, display: &mut impl DisplayPort) {
        display.flash_region(colour);
        self.state = VisualState::Flashing {
            started: now,
            colour,
            lit: true,
        };
    }

    /// Advance; returns `true` on the tick the flash completes.
    ///
    /// The panel is only written when the phase changes.
    pub fn tick(&mut self, now: u64, display: &mut impl DisplayPort, list: &ListStore) -> bool {
        let VisualState::Flashing { started, colour, lit } = self.state else {
            return false;
        };
        let elapsed = now.saturating_sub(started);
        if elapsed >= self.duration_ms {
            self.state = VisualState::Idle;
            display.render_list(list);
            debug!("Notify: flash done");
            return true;
        }
        let should_light = (elapsed / self.toggle_ms) % 2 == 0;
        if should_light != lit {
            display.flash_region(if should_light { colour } else { BACKGROUND });
            self.state = VisualState::Flashing {
                started,
                colour,
                lit: should_light,
            };
        }
        false
    }

    pub fn stop(&mut self) {
        self.state = VisualState::Idle;
    }
}
