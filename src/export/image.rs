//! Data URI handling for record photos.
//!
//! Photos travel inside records as `data:<mime>;base64,<payload>` strings
//! and leave the system as raw bytes inside archives.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Split a data URI into its header (`data:image/png;base64`) and payload.
fn split(data_uri: &str) -> Option<(&str, &str)> {
    let (header, payload) = data_uri.split_once(',')?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return None;
    }
    Some((header, payload))
}

/// Decode the payload of a base64 data URI into raw bytes.
///
/// Returns `None` when the URI has no payload or the payload is not valid
/// base64; callers treat that as "no image".
#[must_use]
pub fn decode_data_uri(data_uri: &str) -> Option<Vec<u8>> {
    let (_, payload) = split(data_uri)?;
    if payload.is_empty() {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}

/// Size of the decoded payload without decoding it.
///
/// Returns `None` if the string is not a base64 data URI.
#[must_use]
pub fn decoded_len(data_uri: &str) -> Option<usize> {
    let (_, payload) = split(data_uri)?;
    let payload = payload.trim();
    if payload.len() % 4 != 0 {
        return None;
    }
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count().min(2);
    Some(payload.len() / 4 * 3 - padding)
}

/// MIME type declared in a data URI header.
#[must_use]
pub fn mime_type(data_uri: &str) -> Option<&str> {
    let (header, _) = split(data_uri)?;
    header
        .strip_prefix("data:")
        .and_then(|h| h.strip_suffix(";base64"))
        .filter(|m| !m.is_empty())
}

/// Encode raw bytes as a base64 data URI.
#[must_use]
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
