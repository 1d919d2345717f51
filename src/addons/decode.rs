//! Payload decoding: raw bytes to an untyped JSON document.

use super::error::ImportError;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use serde_json::Value;
use std::borrow::Cow;
use tracing::warn;

/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decodes `payload` as text and parses it as JSON.
///
/// `label` names the source in error messages.
pub fn decode(payload: &[u8], label: &str) -> Result<Value, ImportError> {
    let text = decode_text(payload, label)?;

    serde_json::from_str(&text)
        .map_err(|e| ImportError::Decode(format!("Invalid JSON from '{}': {}", label, e)))
}

/// UTF-8 first, then whatever encoding the detector settles on.
fn decode_text<'a>(payload: &'a [u8], label: &str) -> Result<Cow<'a, str>, ImportError> {
    let payload = payload.strip_prefix(UTF8_BOM).unwrap_or(payload);

    if let Ok(text) = std::str::from_utf8(payload) {
        return Ok(Cow::Borrowed(text));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(payload, true);
    let encoding: &'static Encoding = detector.guess(None, true);

    // The BOM is already gone; don't let a second sniff override the guess.
    let (decoded, had_errors) = encoding.decode_without_bom_handling(payload);
    if had_errors {
        return Err(ImportError::Decode(format!(
            "Could not decode JSON from '{}': not valid {} text",
            label,
            encoding.name()
        )));
    }

    warn!(
        "[ADDON-IMPORT] '{}' is not UTF-8, decoded as {}",
        label,
        encoding.name()
    );
    Ok(decoded)
}
