//! Amount parsing and display.
//!
//! The backend serializes money as `f64` major units, so the engine keeps
//! that representation; parsing is strict about decimals so a typo never
//! silently becomes a different amount.

use crate::{EngineError, ResultEngine};

/// Parses a user-entered decimal amount.
///
/// Accepts `.` or `,` as decimal separator and an optional leading
/// `+`/`-`.
///
/// Validation rules:
/// - max 2 fractional digits (rejects `12.345`)
/// - rejects empty/invalid strings
///
/// # Examples
///
/// ```rust
/// use engine::parse_amount;
///
/// assert_eq!(parse_amount("10").unwrap(), 10.0);
/// assert_eq!(parse_amount("10,5").unwrap(), 10.5);
/// assert!(parse_amount("12.345").is_err());
/// ```
pub fn parse_amount(input: &str) -> ResultEngine<f64> {
    let empty = || EngineError::InvalidAmount("empty amount".to_string());
    let invalid = || EngineError::InvalidAmount(input.trim().to_string());
    let overflow = || EngineError::InvalidAmount("amount too large".to_string());

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(empty());
    }

    let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (-1.0, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (1.0, stripped)
    } else {
        (1.0, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(empty());
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let units_str = parts.next().ok_or_else(invalid)?;
    let frac_str = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let units: i64 = units_str.parse().map_err(|_| overflow())?;

    let cents: i64 = match frac_str {
        None | Some("") => 0,
        Some(frac) => {
            if !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            match frac.len() {
                1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                2 => frac.parse::<i64>().map_err(|_| invalid())?,
                _ => {
                    return Err(EngineError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
            }
        }
    };

    Ok(sign * (units as f64 + cents as f64 / 100.0))
}

/// Formats an amount with its currency symbol, e.g. `€12.34` / `-€12.34`.
///
/// Locale-aware grouping is the UI layer's concern; this is the plain form
/// used in logs, CLI tables and error messages.
pub fn format_amount(amount: f64, symbol: &str) -> String {
    if amount.is_sign_negative() {
        format!("-{symbol}{:.2}", -amount)
    } else {
        format!("{symbol}{amount:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(parse_amount("10").unwrap(), 10.0);
        assert_eq!(parse_amount("10.5").unwrap(), 10.5);
        assert_eq!(parse_amount("10,50").unwrap(), 10.5);
        assert_eq!(parse_amount("-0.01").unwrap(), -0.01);
        assert_eq!(parse_amount("+1.00").unwrap(), 1.0);
        assert_eq!(parse_amount("  2.30 ").unwrap(), 2.3);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!(parse_amount("12.345").is_err());
        assert!(parse_amount("0.001").is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("1.2.3").is_err());
        assert!(parse_amount("12a").is_err());
    }

    #[test]
    fn format_places_sign_before_symbol() {
        assert_eq!(format_amount(12.34, "€"), "€12.34");
        assert_eq!(format_amount(-12.34, "€"), "-€12.34");
        assert_eq!(format_amount(0.0, "$"), "$0.00");
        assert_eq!(format_amount(60.0, "$"), "$60.00");
    }
}
