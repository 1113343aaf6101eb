//! Small helpers shared across engine modules.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Normalizes a directory name (category/vendor) for matching.
///
/// Applies NFKC, lowercases, trims, and collapses internal whitespace runs
/// so `" Office  Supplies "` and `"office supplies"` compare equal.
#[must_use]
pub fn normalize_name(value: &str) -> String {
    let folded: String = value.nfkc().collect::<String>().to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for ch in folded.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }
    out
}

/// Parses a date in `YYYY-MM-DD` or `YYYY/MM/DD` form.
///
/// # Errors
///
/// [`EngineError::InvalidDate`] for anything else.
pub fn parse_date(input: &str) -> ResultEngine<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
        .map_err(|_| EngineError::InvalidDate(trimmed.to_string()))
}
