//! ESP-IDF runtime symbol providers for third-party crates.
//!
//! The transport event channel locks through `critical-section`.  Host
//! builds get the `std` implementation from the dev-dependency; on the
//! device the lock is a process-wide mutex, re-entrant per thread.

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "espidf")]
static SECTION_LOCK: Mutex<()> = Mutex::new(());

#[cfg(target_os = "espidf")]
thread_local! {
    static NESTING: Cell<u8> = const { Cell::new(0) };
    static HELD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

/// `critical-section` 1.x acquire hook.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    NESTING.with(|nesting| {
        let depth = nesting.get();
        if depth == 0 {
            // A panic inside a section poisons the lock; the guarded data is `()`.
            let guard = SECTION_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            HELD.with(|held| *held.borrow_mut() = Some(guard));
        }
        let depth = depth.saturating_add(1);
        nesting.set(depth);
        depth
    })
}

/// `critical-section` 1.x release hook.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    NESTING.with(|nesting| {
        let depth = nesting.get();
        if depth == 0 {
            return;
        }
        nesting.set(depth - 1);
        if depth == 1 {
            HELD.with(|held| *held.borrow_mut() = None);
        }
    });
}
