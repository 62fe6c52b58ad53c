//! PIN verifier.
//!
//! The verifier is a 32-bit rolling checksum (`hash * 31 + code_unit`, over
//! UTF-16 code units, wrapping at every step) rendered as the hexadecimal
//! absolute value. It must stay bit-compatible with verifiers stored by
//! earlier versions, so it is a weak, non-cryptographic transform: it only
//! keeps the PIN from sitting in plaintext on the device.

/// Accepted PIN length bounds, in digits.
pub const PIN_MIN_LEN: usize = 4;
pub const PIN_MAX_LEN: usize = 8;

/// Derives the stored verifier for `pin`.
#[must_use]
pub fn pin_verifier(pin: &str) -> String {
    let mut hash: i32 = 0;
    for unit in pin.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    format!("{:x}", hash.unsigned_abs())
}

/// Checks `pin` against a stored verifier.
#[must_use]
pub fn verify_pin(pin: &str, verifier: &str) -> bool {
    pin_verifier(pin) == verifier
}

/// Returns `true` if `pin` is made of 4 to 8 ASCII digits.
#[must_use]
pub fn is_valid_pin(pin: &str) -> bool {
    (PIN_MIN_LEN..=PIN_MAX_LEN).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}
