//! Feed frame envelope.
//!
//! The node speaks JSON text frames.  Three shapes matter:
//!
//! ```text
//! handshake   {"uid":"<session>"}                     (no "data", no "topic")
//! subscribe   {"uid":"<session>","subscribe":"confirmedAdded/<address>"}
//! event       {"topic":"confirmedAdded/<address>",
//!              "data":{"transaction":{"signerPublicKey":"..","message":"<hex>"},
//!                      "meta":{"hash":"<64 hex>"}}}
//! ```
//!
//! Anything else with a `data` object but no transaction (subscription
//! acknowledgements, status) is classified as [`Frame::Other`] and ignored.

use heapless::String as FixedString;
use serde::Serialize;
use serde_json::Value;

use crate::error::FrameError;

use super::dedup::IDENTIFIER_CAP;

/// Capacity of the server-issued session identifier.
pub const SESSION_ID_CAP: usize = 64;

pub type SessionId = FixedString<SESSION_ID_CAP>;

/// A classified feed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The server greeting that carries our session identifier.
    Handshake(SessionId),
    /// A confirmed transaction on the subscribed channel.
    Event(EventFrame),
    /// Acknowledgements and anything else without an event payload.
    Other,
}

/// The parts of an event frame the monitor needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFrame {
    /// Transaction hash, used for deduplication.
    pub identifier: String,
    /// Public key of the signer, empty when absent.
    pub signer: String,
    /// Hex-encoded event payload.
    pub payload: String,
}

/// Classify one raw text frame.
pub fn parse_frame(raw: &str) -> Result<Frame, FrameError> {
    let doc: Value = serde_json::from_str(raw).map_err(|_| FrameError::Malformed)?;
    let obj = doc.as_object().ok_or(FrameError::Malformed)?;

    let Some(data) = obj.get("data").and_then(Value::as_object) else {
        let has_topic = obj.get("topic").and_then(Value::as_str).is_some();
        return match obj.get("uid").and_then(Value::as_str) {
            Some(uid) if !has_topic => {
                let session = SessionId::try_from(uid).map_err(|()| FrameError::Malformed)?;
                Ok(Frame::Handshake(session))
            }
            _ => Ok(Frame::Other),
        };
    };

    let Some(tx) = data.get("transaction").and_then(Value::as_object) else {
        return Ok(Frame::Other);
    };

    let identifier = data
        .get("meta")
        .and_then(|m| m.get("hash"))
        .and_then(Value::as_str)
        .filter(|h| !h.is_empty())
        .ok_or(FrameError::MissingIdentifier)?;
    if identifier.len() > IDENTIFIER_CAP {
        return Err(FrameError::IdentifierTooLong);
    }

    let payload = message_text(tx.get("message")).ok_or(FrameError::EmptyMessage)?;

    let signer = tx
        .get("signerPublicKey")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(Frame::Event(EventFrame {
        identifier: identifier.to_owned(),
        signer: signer.to_owned(),
        payload: payload.to_owned(),
    }))
}

/// Transaction messages arrive either as a bare hex string or as an
/// object with a `payload` field, depending on the node version.
pub fn message_text(message: Option<&Value>) -> Option<&str> {
    let text = match message? {
        Value::String(s) => s.as_str(),
        Value::Object(o) => o.get("payload").and_then(Value::as_str)?,
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    uid: &'a str,
    subscribe: &'a str,
}

/// Build the subscribe request for confirmed transactions to `address`.
pub fn subscribe_request(session: &str, address: &str) -> Option<String> {
    let channel = format!("confirmedAdded/{address}");
    serde_json::to_string(&SubscribeRequest {
        uid: session,
        subscribe: &channel,
    })
    .ok()
}
