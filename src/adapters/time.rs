//! Monotonic clock adapter.
//!
//! Every timestamp the monitor core sees is milliseconds from this clock.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` for
//!   host-side testing and simulation.

/// Monotonic millisecond clock.
pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot.
    pub fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    /// Seconds since boot.
    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads a free-running hardware timer; no preconditions.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}
