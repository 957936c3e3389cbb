//! Base64 decoding for share links and subscription payloads.
//!
//! Subscriptions encode payloads inconsistently: standard or URL-safe
//! alphabets, with or without padding, sometimes with embedded line breaks.
//! [`decode_base64`] tries the variants in order.

use anyhow::{Result, bail};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};

/// Decode base64 content, trying multiple alphabet/padding variants.
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();

    if let Ok(decoded) = STANDARD.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&cleaned) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(&cleaned) {
        return Ok(decoded);
    }

    let padded = add_padding(&cleaned);
    if let Ok(decoded) = STANDARD.decode(&padded) {
        return Ok(decoded);
    }
    if let Ok(decoded) = URL_SAFE.decode(&padded) {
        return Ok(decoded);
    }

    bail!("Failed to decode base64 content")
}

/// Decode base64 content into a UTF-8 string.
pub fn decode_base64_str(content: &str) -> Result<String> {
    let decoded = decode_base64(content)?;
    String::from_utf8(decoded).map_err(|_| anyhow::anyhow!("Decoded content is not valid UTF-8"))
}

fn add_padding(s: &str) -> String {
    let mut result = s.to_string();
    while result.len() % 4 != 0 {
        result.push('=');
    }
    result
}
