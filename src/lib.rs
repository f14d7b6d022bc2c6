//! QuakeWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
mod esp_link_shims;
pub mod events;
pub mod feed;
pub mod list_store;
pub mod notify;
pub mod record;
