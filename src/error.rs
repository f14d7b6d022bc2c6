//! Unified error types for the QuakeWatch firmware.
//!
//! Every failure in the monitor core resolves into a discard, a reconnect or
//! an eviction, so none of these ever reach the main loop as a hard error.
//! They exist so that each discard is logged and tested with a precise cause.
//! All variants are `Copy` so they can be carried in outcome enums and
//! application events without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An event payload could not be turned into a valid record.
    Decode(DecodeError),
    /// A feed frame could not be classified.
    Frame(FrameError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// The feed transport refused an operation.
    Transport(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Reasons a hex/JSON event payload is rejected at the decode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload string was empty.
    EmptyPayload,
    /// Hex text had an odd number of digits.
    OddLength,
    /// Hex text contained a non-hex character.
    InvalidHex,
    /// The decoded bytes were not UTF-8.
    NotUtf8,
    /// The decoded text was not the expected JSON document.
    Json,
    /// A required field was absent.
    MissingField(&'static str),
    /// The wire severity code is not on the intensity scale.
    UnknownSeverity(i32),
    /// The location name was empty.
    EmptyLocation,
    /// Magnitude was negative or not a number.
    InvalidMagnitude,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "empty payload"),
            Self::OddLength => write!(f, "odd-length hex"),
            Self::InvalidHex => write!(f, "invalid hex digit"),
            Self::NotUtf8 => write!(f, "payload is not UTF-8"),
            Self::Json => write!(f, "malformed JSON"),
            Self::MissingField(name) => write!(f, "missing field '{name}'"),
            Self::UnknownSeverity(code) => write!(f, "unknown severity code {code}"),
            Self::EmptyLocation => write!(f, "empty location name"),
            Self::InvalidMagnitude => write!(f, "invalid magnitude"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Frame errors
// ---------------------------------------------------------------------------

/// Reasons a raw feed frame is discarded before reaching the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame was not a JSON object.
    Malformed,
    /// An event frame carried no transaction identifier.
    MissingIdentifier,
    /// The transaction identifier exceeds the hash length.
    IdentifierTooLong,
    /// An event frame carried no message payload.
    EmptyMessage,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed frame"),
            Self::MissingIdentifier => write!(f, "missing identifier"),
            Self::IdentifierTooLong => write!(f, "identifier too long"),
            Self::EmptyMessage => write!(f, "empty message"),
        }
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from loading or validating [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The override document could not be parsed.
    Parse,
    /// A field is longer than its fixed capacity.
    TooLong(&'static str),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse failed"),
            Self::TooLong(field) => write!(f, "field '{field}' too long"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
