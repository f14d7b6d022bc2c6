//! Earthquake feed ingestion.
//!
//! ```text
//!  TransportEvent ──▶ ConnectionManager ──▶ frame ──▶ signer filter
//!                          │                              │
//!                 ResourceWatchdog                 PayloadDecoder
//!               (forced disconnect)                       │
//!                                                  Deduplicator ──▶ EventRecord
//! ```

pub mod codec;
pub mod connection;
pub mod dedup;
pub mod frame;
pub mod watchdog;

pub use codec::{HexJsonDecoder, HistoryPage, decode_history};
pub use connection::{ConnectionManager, ConnectionState, FrameOutcome};
pub use dedup::Deduplicator;
pub use watchdog::{MemoryPressure, ResourceWatchdog};
