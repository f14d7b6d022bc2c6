//! Multi-channel earthquake notifications.
//!
//! [`NotificationScheduler`] sequences records; [`playback`] holds the two
//! channel state machines it drives.

pub mod playback;
pub mod scheduler;

pub use playback::{AudioState, VisualState};
pub use scheduler::{NotificationScheduler, QUEUE_CAPACITY};
