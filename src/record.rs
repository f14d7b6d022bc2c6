//! Earthquake event records and the seismic intensity scale.
//!
//! An [`EventRecord`] is built exactly once per admitted feed message (or per
//! historical item) and never mutated afterwards.  Every text field is a
//! fixed-capacity `heapless::String`, so cloning a record into the
//! notification queue and the list store never touches the heap.
//!
//! ## Intensity table
//!
//! | Wire `maxScale` | Severity      | Colour (RGB565) | Beeps |
//! |-----------------|---------------|-----------------|-------|
//! | 10, 20          | 1, 2          | `0x0320` green  | 1     |
//! | 30, 40          | 3, 4          | `0x8420` yellow | 2     |
//! | 45, 50, 55      | 5-, 5+, 6-    | `0xC320` orange | 3     |
//! | 60, 70          | 6+, 7         | `0xB000` red    | 3     |
//! | anything else   | rejected      | `0x4208` grey   | 1     |

use heapless::String;
use log::debug;
use serde::Serialize;

use crate::error::DecodeError;

/// 16-bit panel colour.
pub type Rgb565 = u16;

/// Screen background, used for the dark half of every flash period.
pub const BACKGROUND: Rgb565 = 0x0000;

pub const TIMESTAMP_CAP: usize = 32;
/// Location names are Japanese UTF-8 (three bytes per character).
pub const LOCATION_CAP: usize = 96;
pub const EFFECT_CAP: usize = 16;

/// Secondary-effect code stored when the feed omits it or sends something new.
pub const UNKNOWN_EFFECT: &str = "unknown";

/// Tsunami assessment codes the feed is known to send.
const KNOWN_EFFECTS: [&str; 6] = ["None", "Unknown", "Checking", "NonEffective", "Watch", "Warning"];

// ───────────────────────────────────────────────────────────────
// Severity
// ───────────────────────────────────────────────────────────────

/// Maximum observed seismic intensity (JMA shindo scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Shindo1,
    Shindo2,
    Shindo3,
    Shindo4,
    Shindo5Lower,
    Shindo5Upper,
    Shindo6Lower,
    Shindo6Upper,
    Shindo7,
    /// Placeholder that keeps every lookup total.  Never admitted by the
    /// decoder.
    Unknown,
}

struct Profile {
    scale: i32,
    label: &'static str,
    colour: Rgb565,
    beeps: u8,
}

const COLOUR_WEAK: Rgb565 = 0x0320;
const COLOUR_MODERATE: Rgb565 = 0x8420;
const COLOUR_STRONG: Rgb565 = 0xC320;
const COLOUR_SEVERE: Rgb565 = 0xB000;
const COLOUR_UNKNOWN: Rgb565 = 0x4208;

/// Indexed by `Severity as usize`.
const PROFILES: [Profile; 10] = [
    Profile { scale: 10, label: "1", colour: COLOUR_WEAK, beeps: 1 },
    Profile { scale: 20, label: "2", colour: COLOUR_WEAK, beeps: 1 },
    Profile { scale: 30, label: "3", colour: COLOUR_MODERATE, beeps: 2 },
    Profile { scale: 40, label: "4", colour: COLOUR_MODERATE, beeps: 2 },
    Profile { scale: 45, label: "5-", colour: COLOUR_STRONG, beeps: 3 },
    Profile { scale: 50, label: "5+", colour: COLOUR_STRONG, beeps: 3 },
    Profile { scale: 55, label: "6-", colour: COLOUR_STRONG, beeps: 3 },
    Profile { scale: 60, label: "6+", colour: COLOUR_SEVERE, beeps: 3 },
    Profile { scale: 70, label: "7", colour: COLOUR_SEVERE, beeps: 3 },
    Profile { scale: -1, label: "?", colour: COLOUR_UNKNOWN, beeps: 1 },
];

const KNOWN: [Severity; 9] = [
    Severity::Shindo1,
    Severity::Shindo2,
    Severity::Shindo3,
    Severity::Shindo4,
    Severity::Shindo5Lower,
    Severity::Shindo5Upper,
    Severity::Shindo6Lower,
    Severity::Shindo6Upper,
    Severity::Shindo7,
];

impl Severity {
    /// Map a wire `maxScale` code.  Unlisted codes yield `None`.
    pub fn from_scale(code: i32) -> Option<Self> {
        KNOWN.into_iter().find(|s| s.profile().scale == code)
    }

    fn profile(self) -> &'static Profile {
        &PROFILES[self as usize]
    }

    /// Wire code, or `-1` for [`Severity::Unknown`].
    pub fn scale(self) -> i32 {
        self.profile().scale
    }

    /// Short display label ("5-", "6+", ...).
    pub fn label(self) -> &'static str {
        self.profile().label
    }

    /// Flash colour for this intensity.
    pub fn colour(self) -> Rgb565 {
        self.profile().colour
    }

    /// Number of notification beeps.
    pub fn beep_count(self) -> u8 {
        self.profile().beeps
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl core::fmt::Display for Severity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "shindo {}", self.label())
    }
}

// ───────────────────────────────────────────────────────────────
// EventRecord
// ───────────────────────────────────────────────────────────────

/// Borrowed, unvalidated event fields as they come off the wire.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent<'a> {
    pub timestamp: &'a str,
    pub location: &'a str,
    pub latitude: f32,
    pub longitude: f32,
    /// Kilometres.  The feed uses `-1` for "unknown".
    pub depth_km: i32,
    pub magnitude: f32,
    pub severity: Severity,
    pub secondary_effect: Option<&'a str>,
}

/// A validated earthquake report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    timestamp: String<TIMESTAMP_CAP>,
    location: String<LOCATION_CAP>,
    latitude: f32,
    longitude: f32,
    depth_km: u16,
    magnitude: f32,
    severity: Severity,
    secondary_effect: String<EFFECT_CAP>,
}

impl TryFrom<RawEvent<'_>> for EventRecord {
    type Error = DecodeError;

    fn try_from(raw: RawEvent<'_>) -> Result<Self, DecodeError> {
        if raw.location.trim().is_empty() {
            return Err(DecodeError::EmptyLocation);
        }
        if !raw.severity.is_known() {
            return Err(DecodeError::UnknownSeverity(raw.severity.scale()));
        }
        if !raw.magnitude.is_finite() || raw.magnitude < 0.0 {
            return Err(DecodeError::InvalidMagnitude);
        }

        let effect = match raw.secondary_effect {
            Some(code) if KNOWN_EFFECTS.contains(&code) => code,
            _ => UNKNOWN_EFFECT,
        };

        Ok(Self {
            timestamp: truncated("timestamp", raw.timestamp),
            location: truncated("location", raw.location.trim()),
            latitude: raw.latitude,
            longitude: raw.longitude,
            depth_km: raw.depth_km.clamp(0, i32::from(u16::MAX)) as u16,
            magnitude: raw.magnitude,
            severity: raw.severity,
            secondary_effect: truncated("secondary effect", effect),
        })
    }
}

impl EventRecord {
    /// ISO-8601 origin time as sent by the feed.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn latitude(&self) -> f32 {
        self.latitude
    }

    pub fn longitude(&self) -> f32 {
        self.longitude
    }

    pub fn depth_km(&self) -> u16 {
        self.depth_km
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Tsunami assessment code, `"unknown"` when not reported.
    pub fn secondary_effect(&self) -> &str {
        &self.secondary_effect
    }
}

/// Copy `s` into a fixed-capacity string, cutting on a char boundary.
fn truncated<const N: usize>(field: &str, s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            debug!("Record: {} cut to {} of {} bytes", field, out.len(), s.len());
            break;
        }
    }
    out
}
