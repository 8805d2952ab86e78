//! Inline photo payloads.
//!
//! Photos travel inside the records themselves as `data:` URLs, the same
//! format the upload form produces. There is no separate file storage.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::models::FieldError;

/// Upload cap before encoding.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

const BASE64_MARKER: &str = ";base64,";

/// Encodes raw image bytes as a `data:<mime>;base64,...` URL.
pub fn encode_photo(mime: &str, bytes: &[u8]) -> Result<String, FieldError> {
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(FieldError::PhotoTooLarge);
    }
    Ok(format!("data:{mime}{BASE64_MARKER}{}", BASE64.encode(bytes)))
}

/// Recovers the mime type and raw bytes from a photo data URL.
#[must_use]
pub fn decode_photo(data_url: &str) -> Option<(String, Vec<u8>)> {
    let rest = data_url.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(BASE64_MARKER)?;
    let bytes = BASE64.decode(payload).ok()?;
    Some((mime.to_string(), bytes))
}

/// Decoded size implied by a stored photo string, without decoding.
///
/// Base64 inflates payloads by 4/3, so this is payload length scaled back
/// down. Used to reject oversized photos cheaply during validation.
#[must_use]
pub fn estimated_decoded_len(data_url: &str) -> usize {
    let payload_len = match data_url.split_once(BASE64_MARKER) {
        Some((_, payload)) => payload.len(),
        None => data_url.len(),
    };
    payload_len / 4 * 3
}
