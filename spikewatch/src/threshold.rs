//! Numeric interpretation of threshold strings.

use crate::error::{DashboardError, Result};
use crate::schema::ThresholdField;

/// Parse operator input as a number.
///
/// Whitespace is trimmed and a comma decimal separator is accepted
/// (`"0,5"` == `"0.5"`). Empty input and non-finite values yield `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Whether a threshold string counts as "configured": finite and nonzero.
pub fn is_configured(raw: &str) -> bool {
    parse_numeric(raw).is_some_and(|v| v != 0.0)
}

/// Validate a direct field edit and return the value to store.
///
/// Empty input clears the threshold. Anything else must be a finite,
/// non-negative number; the trimmed input is stored as typed.
pub fn validate(field: ThresholdField, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    match parse_numeric(trimmed) {
        Some(v) if v >= 0.0 => Ok(trimmed.to_string()),
        _ => Err(DashboardError::InvalidThreshold {
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(parse_numeric(" 0,5 "), Some(0.5));
        assert_eq!(parse_numeric("1.25"), Some(1.25));
    }

    #[test]
    fn test_empty_and_garbage_are_not_numbers() {
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("   "), None);
        assert_eq!(parse_numeric("abc"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric("NaN"), None);
    }

    #[test]
    fn test_zero_is_not_configured() {
        assert!(!is_configured("0"));
        assert!(!is_configured("0.0"));
        assert!(!is_configured("0,00"));
        assert!(!is_configured(""));
        assert!(is_configured("0.5"));
        assert!(is_configured("100000"));
    }

    #[test]
    fn test_validate_accepts_empty_and_non_negative() {
        assert_eq!(validate(ThresholdField::Delta, "  ").unwrap(), "");
        assert_eq!(validate(ThresholdField::Delta, " 1,5 ").unwrap(), "1,5");
        assert_eq!(validate(ThresholdField::Volume, "0").unwrap(), "0");
    }

    #[test]
    fn test_validate_rejects_negative_and_text() {
        assert!(matches!(
            validate(ThresholdField::Shadow, "-2"),
            Err(DashboardError::InvalidThreshold {
                field: ThresholdField::Shadow,
                ..
            })
        ));
        assert!(validate(ThresholdField::Volume, "lots").is_err());
    }
}
