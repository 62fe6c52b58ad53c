//! Password-keyed character shift used by `.txt` backups.
//!
//! This is obfuscation, not encryption: it hides the content from a casual
//! look and nothing more. It is kept bit-compatible so that existing backup
//! files stay readable.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{EngineError, ResultEngine};

pub(crate) const DECODE_FAILURE: &str = "wrong password or corrupted file";

/// Single byte key: sum of the UTF-16 code units of `password`, mod 256.
pub fn password_key(password: &str) -> u32 {
    password
        .encode_utf16()
        .fold(0, |acc, unit| (acc + u32::from(unit)) % 256)
}

fn shift(index: usize, key: u32) -> u32 {
    // index % 10 < 10
    key + (index % 10) as u32
}

/// Base64-encodes the UTF-8 bytes of `document` and shifts every character by
/// `key + index % 10`.
pub fn obfuscate(document: &str, password: &str) -> String {
    let key = password_key(password);
    STANDARD
        .encode(document.as_bytes())
        .chars()
        .enumerate()
        .map(|(index, ch)| {
            // base64 output is ASCII, the shifted code point stays below 0x200.
            char::from_u32(ch as u32 + shift(index, key)).unwrap_or(ch)
        })
        .collect()
}

/// Reverses [`obfuscate`].
///
/// Only a trailing line break is ignored: shifted characters can land on
/// Unicode whitespace (U+0085, U+00A0) and must be kept. Payloads that are not
/// UTF-8 come from older writers that encoded Latin-1 bytes and are read back
/// byte per code point.
///
/// Any failure (wrong password, truncated or edited file) is reported as the
/// same [`EngineError::Decode`], the two causes cannot be told apart.
pub fn deobfuscate(opaque: &str, password: &str) -> ResultEngine<String> {
    let key = password_key(password);
    let failure = || EngineError::Decode(DECODE_FAILURE.to_string());

    let mut encoded = String::with_capacity(opaque.len());
    for (index, ch) in opaque.trim_end_matches(['\r', '\n']).chars().enumerate() {
        let original = (ch as u32)
            .checked_sub(shift(index, key))
            .and_then(char::from_u32)
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
            .ok_or_else(failure)?;
        encoded.push(original);
    }

    let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|_| failure())?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    })
}
