//! Event payload codec.
//!
//! Transaction messages carry a hex string.  Its first byte is the message
//! type (`00` = plain text) and the rest is a UTF-8 JSON report:
//!
//! ```text
//! {"earthquake":{"time":"2025-01-15T10:30:00+09:00",
//!                "hypocenter":{"name":"..","latitude":35.7,"longitude":139.7,
//!                              "depth":40,"magnitude":5.8},
//!                "maxScale":45,"domesticTsunami":"None"}}
//! ```
//!
//! [`HexJsonDecoder`] is the default [`PayloadDecoder`]; [`decode_history`]
//! applies the same decoder to a REST page of past transactions.

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::app::ports::PayloadDecoder;
use crate::error::DecodeError;
use crate::list_store::LIST_CAPACITY;
use crate::record::{EventRecord, RawEvent, Severity};

use super::frame::message_text;

/// Message type byte for plain-text transfer messages.
const PLAIN_MESSAGE: u8 = 0x00;

#[derive(Deserialize)]
struct Report {
    earthquake: Option<Quake>,
}

#[derive(Deserialize)]
struct Quake {
    time: Option<String>,
    hypocenter: Option<Hypocenter>,
    #[serde(rename = "maxScale")]
    max_scale: Option<i32>,
    #[serde(rename = "domesticTsunami")]
    domestic_tsunami: Option<String>,
}

#[derive(Deserialize)]
struct Hypocenter {
    #[serde(default)]
    name: String,
    #[serde(default)]
    latitude: f32,
    #[serde(default)]
    longitude: f32,
    #[serde(default = "unreported")]
    depth: f32,
    #[serde(default = "unreported")]
    magnitude: f32,
}

fn unreported() -> f32 {
    -1.0
}

/// Hex + JSON decoder for earthquake transfer messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexJsonDecoder;

impl PayloadDecoder for HexJsonDecoder {
    fn decode(&self, payload: &str) -> Result<EventRecord, DecodeError> {
        let hex_text = payload.trim();
        if hex_text.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }
        let bytes = hex::decode(hex_text).map_err(|e| match e {
            hex::FromHexError::OddLength => DecodeError::OddLength,
            _ => DecodeError::InvalidHex,
        })?;
        let body = match bytes.split_first() {
            Some((&PLAIN_MESSAGE, rest)) => rest,
            _ => bytes.as_slice(),
        };
        let text = core::str::from_utf8(body).map_err(|_| DecodeError::NotUtf8)?;
        decode_report(text)
    }
}

/// Decode the JSON report carried inside a message.
pub fn decode_report(json: &str) -> Result<EventRecord, DecodeError> {
    let report: Report = serde_json::from_str(json).map_err(|_| DecodeError::Json)?;
    let quake = report.earthquake.ok_or(DecodeError::MissingField("earthquake"))?;
    let time = quake.time.ok_or(DecodeError::MissingField("time"))?;
    let hypo = quake.hypocenter.ok_or(DecodeError::MissingField("hypocenter"))?;
    let code = quake.max_scale.ok_or(DecodeError::MissingField("maxScale"))?;
    let severity = Severity::from_scale(code).ok_or(DecodeError::UnknownSeverity(code))?;

    EventRecord::try_from(RawEvent {
        timestamp: &time,
        location: &hypo.name,
        latitude: hypo.latitude,
        longitude: hypo.longitude,
        depth_km: hypo.depth as i32,
        magnitude: hypo.magnitude,
        severity,
        secondary_effect: quake.domestic_tsunami.as_deref(),
    })
}

// ───────────────────────────────────────────────────────────────
// History page
// ───────────────────────────────────────────────────────────────

/// Records recovered from one REST page, newest first.
#[derive(Debug, Default)]
pub struct HistoryPage {
    pub records: heapless::Vec<EventRecord, LIST_CAPACITY>,
    /// Transactions from other signers or without a message.
    pub skipped: usize,
    /// Messages that failed to decode.
    pub failed: usize,
}

/// Decode a `transactions/confirmed` REST response.
///
/// Applies the optional signer filter, decodes each message with `decoder`,
/// and stops after `limit` records.  Items that fail to decode are counted
/// and skipped; only an unreadable page is an error.
pub fn decode_history(
    body: &str,
    signer: Option<&str>,
    limit: usize,
    decoder: &impl PayloadDecoder,
) -> Result<HistoryPage, DecodeError> {
    let doc: Value = serde_json::from_str(body).map_err(|_| DecodeError::Json)?;
    let items = doc
        .get("data")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingField("data"))?;

    let limit = limit.min(LIST_CAPACITY);
    let mut page = HistoryPage::default();

    for item in items {
        if page.records.len() >= limit {
            break;
        }
        let Some(tx) = item.get("transaction") else {
            page.skipped += 1;
            continue;
        };
        if let Some(expected) = signer {
            if tx.get("signerPublicKey").and_then(Value::as_str) != Some(expected) {
                page.skipped += 1;
                continue;
            }
        }
        let Some(message) = message_text(tx.get("message")) else {
            page.skipped += 1;
            continue;
        };
        match decoder.decode(message) {
            Ok(record) => {
                debug!("History: {} {}", record.timestamp(), record.location());
                // Bounded by `limit`, which never exceeds the capacity.
                let _ = page.records.push(record);
            }
            Err(e) => {
                warn!("History: skipping undecodable message: {}", e);
                page.failed += 1;
            }
        }
    }

    info!(
        "History: {} decoded, {} skipped, {} failed",
        page.records.len(),
        page.skipped,
        page.failed
    );
    Ok(page)
}
