//! Structured errors for sequence calculations
//!
//! Errors are plain values with a machine-readable code, a human-readable
//! message and an optional hint. Callers decide whether an error aborts a
//! whole calculation or only becomes a diagnostic line in a trace.

use crate::RealError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const UNDEFINED_VAR: &str = "UNDEFINED_VAR";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const INVALID_INITIAL_CONDITION: &str = "INVALID_INITIAL_CONDITION";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Structured calculation error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl CalcError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// True if this error carries the given code
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Check expression syntax")
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
            .with_suggestion("Ensure divisor is not zero")
    }

    pub fn undefined_var(name: &str) -> Self {
        Self::new(codes::UNDEFINED_VAR, format!("Undefined variable: {}", name))
            .with_suggestion(format!("Bind '{}' or check spelling", name))
    }

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
            .with_suggestion("Supported: abs, sqrt, floor, ceil, exp, ln, log, sin, cos, tan")
    }

    pub fn arg_count(func: &str, expected: usize, got: usize) -> Self {
        Self::new(codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", func, expected, got))
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn invalid_initial_condition_key(key: &str) -> Self {
        Self::new(codes::INVALID_INITIAL_CONDITION,
            format!("Invalid initial condition key format: {}", key))
            .with_suggestion("Use keys of the form a(0), a(1), ...")
    }

    pub fn invalid_initial_condition_value(key: &str, value: &str) -> Self {
        Self::new(codes::INVALID_INITIAL_CONDITION,
            format!("Invalid initial condition value for {}: {}", key, value))
            .with_suggestion("Initial values must be finite real numbers")
    }

    pub fn duplicate_initial_condition(index: u64) -> Self {
        Self::new(codes::INVALID_INITIAL_CONDITION,
            format!("Duplicate initial condition for a({})", index))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_suggestion("This is a bug, please report it")
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for CalcError {}

impl From<RealError> for CalcError {
    fn from(err: RealError) -> Self {
        match err {
            RealError::ParseError(s) => Self::parse_error(format!("invalid number '{}'", s)),
            RealError::NotFinite(s) => Self::domain_error(format!("{} is not a finite number", s)),
        }
    }
}
