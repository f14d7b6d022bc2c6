//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the monitor's orchestration: feed ingestion,
//! notification sequencing and the event list.  All interaction with the
//! network, speaker and panel happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
