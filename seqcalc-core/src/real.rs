//! Real-number parsing and display
//!
//! Values are plain `f64`. Display follows the shortest round-trip form with a
//! mandatory fractional part, so `5` renders as `5.0` and `1e16` stays in
//! exponent form.

use thiserror::Error;

/// Error type for real-number conversions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Not a finite number: {0}")]
    NotFinite(String),
}

/// Parse a finite real from text
/// Supports: "3", "-2.5", "1.5e10", "  7  "
pub fn parse_real(s: &str) -> Result<f64, RealError> {
    let trimmed = s.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| RealError::ParseError(trimmed.to_string()))?;
    require_finite(value)
}

/// Reject NaN and infinities
pub fn require_finite(value: f64) -> Result<f64, RealError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RealError::NotFinite(format!("{}", value)))
    }
}

/// Render a real for traces and results
pub fn format_real(value: f64) -> String {
    if value == 0.0 {
        // Keep "-0.0" out of traces
        return "0.0".to_string();
    }
    format!("{:?}", value)
}

/// Render a number the way a user would have typed it in an expression:
/// integral values drop the fractional part
pub fn format_literal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format_real(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_real_integral() {
        assert_eq!(format_real(5.0), "5.0");
        assert_eq!(format_real(29.0), "29.0");
        assert_eq!(format_real(-3.0), "-3.0");
    }

    #[test]
    fn test_format_real_fraction() {
        assert_eq!(format_real(0.1), "0.1");
        assert_eq!(format_real(2.5), "2.5");
    }

    #[test]
    fn test_format_real_negative_zero() {
        assert_eq!(format_real(-0.0), "0.0");
    }

    #[test]
    fn test_format_literal() {
        assert_eq!(format_literal(3.0), "3");
        assert_eq!(format_literal(0.5), "0.5");
    }

    #[test]
    fn test_parse_real() {
        assert_eq!(parse_real(" 1.5 ").unwrap(), 1.5);
        assert_eq!(parse_real("1e3").unwrap(), 1000.0);
        assert!(matches!(parse_real("abc"), Err(RealError::ParseError(_))));
    }

    #[test]
    fn test_parse_real_rejects_non_finite() {
        assert!(matches!(parse_real("inf"), Err(RealError::NotFinite(_))));
        assert!(matches!(parse_real("NaN"), Err(RealError::NotFinite(_))));
    }
}
