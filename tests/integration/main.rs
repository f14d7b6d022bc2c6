//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware or network required.

mod feed_tests;
mod list_tests;
mod mock_platform;
mod notify_tests;
