//! Helper functions shared by the solvers
//!
//! Input validation and the compiled recognition patterns.

use regex::Regex;
use seqcalc_core::{format_real, CalcError};
use std::sync::OnceLock;

static CONDITION_KEY: OnceLock<Regex> = OnceLock::new();
static RELATION_LHS: OnceLock<Regex> = OnceLock::new();
static BACKWARD_REF: OnceLock<Regex> = OnceLock::new();
static IDENTIFIER: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hard-coded pattern is valid"))
}

/// `a(<digits>)`, the key of an initial condition
pub fn condition_key_regex() -> &'static Regex {
    compiled(&CONDITION_KEY, r"^\s*a\(\s*(\d+)\s*\)\s*$")
}

/// Leading `a(n) =` of a recurrence relation
pub fn relation_lhs_regex() -> &'static Regex {
    compiled(&RELATION_LHS, r"^\s*a\(\s*n\s*\)\s*=")
}

/// `a(n-k)`, a reference k steps back
pub fn backward_ref_regex() -> &'static Regex {
    compiled(&BACKWARD_REF, r"a\(\s*n\s*-\s*(\d+)\s*\)")
}

fn identifier_regex() -> &'static Regex {
    compiled(&IDENTIFIER, r"^[A-Za-z_][A-Za-z0-9_]*$")
}

/// Require a finite real argument
pub fn require_finite(value: f64, func: &str, arg: &str) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::domain_error(format!(
            "{}() argument '{}' must be a finite number",
            func, arg
        )))
    }
}

/// Require a positive integer count parameter
pub fn require_count(n: u64, func: &str) -> Result<u64, CalcError> {
    if n == 0 {
        return Err(CalcError::domain_error(format!(
            "{}() requires positive integer term count",
            func
        )));
    }
    Ok(n)
}

/// Require a plain identifier usable as a bound variable
pub fn require_identifier<'a>(name: &'a str, func: &str) -> Result<&'a str, CalcError> {
    let name = name.trim();
    if identifier_regex().is_match(name) {
        Ok(name)
    } else {
        Err(CalcError::domain_error(format!(
            "{}() variable must be an identifier, got '{}'",
            func, name
        )))
    }
}

/// Reject results that overflowed
pub fn finite_result(value: f64, what: &str) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::domain_error(format!(
            "{} overflows ({})",
            what,
            format_real(value)
        )))
    }
}
