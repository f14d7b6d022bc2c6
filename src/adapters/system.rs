//! Heap monitor adapter.
//!
//! Reports free heap to the memory watchdog.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_get_free_heap_size()`.
//! - **all other targets**: a settable simulated figure, so host runs can
//!   walk the watchdog through its thresholds.

use log::debug;

/// Simulated free heap on host builds, comfortably above every threshold.
#[cfg(not(target_os = "espidf"))]
pub const SIM_FREE_HEAP: u32 = 180_000;

pub struct HeapMonitor {
    #[cfg(not(target_os = "espidf"))]
    sim_free: u32,
}

impl Default for HeapMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeapMonitor {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim_free: SIM_FREE_HEAP,
        }
    }

    /// Free heap in bytes.
    #[cfg(target_os = "espidf")]
    pub fn free_bytes(&self) -> u32 {
        // SAFETY: allocator statistics query with no preconditions.
        unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
    }

    /// Free heap in bytes.
    #[cfg(not(target_os = "espidf"))]
    pub fn free_bytes(&self) -> u32 {
        self.sim_free
    }

    /// Smallest free heap seen since boot.
    #[cfg(target_os = "espidf")]
    pub fn low_water_mark(&self) -> u32 {
        // SAFETY: as above.
        unsafe { esp_idf_svc::sys::esp_get_minimum_free_heap_size() }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn low_water_mark(&self) -> u32 {
        self.sim_free
    }

    /// Override the simulated reading.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_simulated_free(&mut self, bytes: u32) {
        debug!("Heap(sim): free set to {}B", bytes);
        self.sim_free = bytes;
    }

    /// Log current and minimum free heap.
    pub fn log_status(&self) {
        debug!(
            "Heap: free={}B min={}B",
            self.free_bytes(),
            self.low_water_mark()
        );
    }
}
