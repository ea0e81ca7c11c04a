//! Seqcalc Core - Fundamental types
//!
//! This crate provides the core types used throughout seqcalc:
//! - `CalcError`: Structured errors with machine-readable codes
//! - `parse_real` / `format_real`: Real-number conversion and display

mod error;
mod real;

pub use real::{parse_real, require_finite, format_real, format_literal, RealError};
pub use error::{CalcError, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{CalcError, format_real, parse_real};
    pub use crate::error::codes;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_construction() {
            let err = CalcError::div_zero();
            assert_eq!(err.code, codes::DIV_ZERO);
            assert!(err.is(codes::DIV_ZERO));
        }

        #[test]
        fn test_error_with_suggestion() {
            let err = CalcError::domain_error("n must be positive")
                .with_suggestion("Use n >= 1");
            assert_eq!(err.suggestion.as_deref(), Some("Use n >= 1"));
            assert_eq!(err.message, "Domain error: n must be positive");
        }

        #[test]
        fn test_error_display() {
            let err = CalcError::parse_error("unexpected token");
            let display = format!("{}", err);
            assert!(display.contains("PARSE_ERROR"));
            assert!(display.contains("suggestion"));
        }

        #[test]
        fn test_invalid_initial_condition_key() {
            let err = CalcError::invalid_initial_condition_key("x(0)");
            assert_eq!(err.code, codes::INVALID_INITIAL_CONDITION);
            assert!(err.message.contains("x(0)"));
        }

        #[test]
        fn test_from_real_error() {
            let err: CalcError = RealError::ParseError("1.2.3".to_string()).into();
            assert_eq!(err.code, codes::PARSE_ERROR);
            let err: CalcError = RealError::NotFinite("inf".to_string()).into();
            assert_eq!(err.code, codes::DOMAIN_ERROR);
        }

        #[test]
        fn test_error_serializes_without_empty_suggestion() {
            let err = CalcError::new(codes::INTERNAL, "boom");
            let json = serde_json::to_string(&err).unwrap();
            assert!(!json.contains("suggestion"));
        }
    }
}
