//! Fuzz target: `HexJsonDecoder::decode` and `decode_report`
//!
//! Every accepted record must satisfy the record invariants: a known
//! severity, a non-empty location and a finite non-negative magnitude.
//!
//! cargo fuzz run fuzz_payload_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use quakewatch::app::ports::PayloadDecoder;
use quakewatch::feed::HexJsonDecoder;
use quakewatch::feed::codec::decode_report;
use quakewatch::record::EventRecord;

fn check(record: &EventRecord) {
    assert!(record.severity().is_known());
    assert!(!record.location().trim().is_empty());
    assert!(record.magnitude().is_finite() && record.magnitude() >= 0.0);
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(record) = HexJsonDecoder.decode(text) {
        check(&record);
    }
    if let Ok(record) = decode_report(text) {
        check(&record);
    }
    // The same bytes wrapped as a plain-text message.
    let wrapped = format!("00{}", hex::encode(data));
    if let Ok(record) = HexJsonDecoder.decode(&wrapped) {
        check(&record);
    }
});
