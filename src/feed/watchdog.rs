//! Free-memory watchdog.
//!
//! Samples available heap on a fixed interval.  A sample below the hard
//! threshold asks the caller to drop the feed connection (the TLS and
//! WebSocket buffers are the largest heap users on the device); a sample
//! between the hard and soft thresholds is only reported.

use log::{error, warn};

use crate::config::WatchdogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    Normal,
    /// Below the soft threshold.
    Warning,
    /// Below the hard threshold.
    Critical,
}

pub struct ResourceWatchdog {
    interval_ms: u64,
    soft_threshold: u32,
    hard_threshold: u32,
    last_check: u64,
    last_sample: Option<u32>,
}

impl ResourceWatchdog {
    pub fn new(config: &WatchdogConfig) -> Self {
        Self {
            interval_ms: u64::from(config.interval_ms),
            soft_threshold: config.soft_threshold_bytes,
            hard_threshold: config.hard_threshold_bytes,
            last_check: 0,
            last_sample: None,
        }
    }

    /// Sample memory if an interval has elapsed since the previous sample.
    ///
    /// `available` is only called when a sample is due.  Returns `None`
    /// between samples.
    pub fn poll(&mut self, now: u64, available: impl FnOnce() -> u32) -> Option<MemoryPressure> {
        if now.saturating_sub(self.last_check) < self.interval_ms {
            return None;
        }
        self.last_check = now;
        let free = available();
        self.last_sample = Some(free);
        Some(self.classify(free))
    }

    /// Pressure level for a free-bytes sample.
    pub fn classify(&self, free: u32) -> MemoryPressure {
        if free < self.hard_threshold {
            error!("Watchdog: free heap {} B below hard limit {} B", free, self.hard_threshold);
            MemoryPressure::Critical
        } else if free < self.soft_threshold {
            warn!("Watchdog: free heap {} B below soft limit {} B", free, self.soft_threshold);
            MemoryPressure::Warning
        } else {
            MemoryPressure::Normal
        }
    }

    /// Most recent sample, if any.
    pub fn last_sample(&self) -> Option<u32> {
        self.last_sample
    }
}
