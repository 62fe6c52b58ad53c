//! Internal helpers for input normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::{DateTime, SubsecRound, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Trim an account name and collapse inner whitespace.
pub(crate) fn normalize_account_name(value: &str) -> ResultEngine<String> {
    let mut out = String::new();
    for token in value.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() {
        return Err(EngineError::InvalidAccount(
            "account name must not be empty".to_string(),
        ));
    }
    Ok(out)
}

/// Uniqueness key for account names: case and spacing are ignored, accents
/// are not, so "Cafe" and "Café" may coexist.
pub(crate) fn unique_name_key(value: &str) -> String {
    value
        .nfc()
        .collect::<String>()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lookup key for names: case, accents and spacing are ignored.
pub(crate) fn name_key(value: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in value.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_whitespace() {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
            continue;
        }
        prev_space = false;
        out.extend(ch.to_lowercase());
    }
    out.trim_end().to_string()
}

/// Current time at the precision timestamps are persisted with.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
