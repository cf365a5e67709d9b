//! Password reveal helper.
//!
//! Stand-alone base64 decoder for the challenge flow: the value a
//! generated script prints is base64-encoded, and this turns it back
//! into the real password. It has no interaction with the generation
//! pipeline.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Decodes a base64 value into UTF-8 text.
///
/// Surrounding whitespace is ignored so values pasted from terminal
/// output decode cleanly.
pub fn reveal(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .context("value is not valid base64")?;
    let text = String::from_utf8(bytes).context("decoded value is not valid UTF-8")?;
    Ok(text)
}
