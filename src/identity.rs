//! Stable UID, content hash, and event-key derivation, per §4.3.

use sha2::{Digest, Sha256};

use crate::ics::model::ParsedEvent;
use crate::normalize::VOLATILE_PROPERTIES;

/// The first 16 bytes of SHA-256("DTSTART|SUMMARY|ORGANIZER|UID"),
/// rendered as lowercase hex (32 characters). Depends only on those four
/// original upstream values — never on property/parameter order or
/// volatile properties.
pub fn stable_uid(event: &ParsedEvent) -> String {
    let dtstart = event.get_value("DTSTART").unwrap_or("");
    let summary = event.get_value("SUMMARY").unwrap_or("");
    let organizer = event.get_value("ORGANIZER").unwrap_or("");
    let uid = event.original_uid.as_str();

    let input = format!("{dtstart}|{summary}|{organizer}|{uid}");
    let digest = Sha256::digest(input.as_bytes());
    hex_encode(&digest[..16])
}

/// SHA-256 over the non-volatile properties, each serialized as
/// `NAME:VALUE` (parameters excluded), sorted lexicographically, joined
/// with `\n`. Full 64-character hex digest.
pub fn content_hash(event: &ParsedEvent) -> String {
    let mut lines: Vec<String> = event
        .properties
        .iter()
        .filter(|p| !VOLATILE_PROPERTIES.contains(&p.name.as_str()))
        .map(|p| format!("{}:{}", p.name, p.value))
        .collect();
    lines.sort();

    let joined = lines.join("\n");
    let digest = Sha256::digest(joined.as_bytes());
    hex_encode(&digest)
}

/// The stable UID when the event has no RECURRENCE-ID, otherwise
/// `<stable-uid>#<recurrence-id-value>` using the verbatim upstream
/// value (the key is textual, not semantic — §4.3, §9 open question a).
pub fn event_key(stable_uid: &str, recurrence_id: Option<&str>) -> String {
    match recurrence_id {
        Some(rid) => format!("{stable_uid}#{rid}"),
        None => stable_uid.to_string(),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
