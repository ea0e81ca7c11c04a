//! Initial conditions of a recurrence
//!
//! Callers hand over a mapping such as `{"a(0)": 0, "a(1)": "1.5"}`. Keys are
//! term references, values are numbers or numeric text.

use crate::helpers::condition_key_regex;
use seqcalc_core::{format_real, parse_real, require_finite, CalcError};
use serde::{Deserialize, Serialize};

/// Raw value of an initial condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    Number(f64),
    Text(String),
}

impl InitialValue {
    fn describe(&self) -> String {
        match self {
            InitialValue::Number(n) => format_real(*n),
            InitialValue::Text(s) => s.clone(),
        }
    }

    fn to_real(&self) -> Option<f64> {
        match self {
            InitialValue::Number(n) => require_finite(*n).ok(),
            InitialValue::Text(s) => parse_real(s).ok(),
        }
    }
}

impl From<f64> for InitialValue {
    fn from(n: f64) -> Self {
        InitialValue::Number(n)
    }
}

impl From<i64> for InitialValue {
    fn from(n: i64) -> Self {
        InitialValue::Number(n as f64)
    }
}

impl From<&str> for InitialValue {
    fn from(s: &str) -> Self {
        InitialValue::Text(s.to_string())
    }
}

impl From<String> for InitialValue {
    fn from(s: String) -> Self {
        InitialValue::Text(s)
    }
}

/// A seed value for one term
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InitialCondition {
    pub index: u64,
    pub value: f64,
}

/// Parse the index out of a key like `a(3)`
pub fn parse_condition_key(key: &str) -> Result<u64, CalcError> {
    condition_key_regex()
        .captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| CalcError::invalid_initial_condition_key(key))
}

/// Parse every key/value pair, sorted by ascending index.
///
/// Any malformed key or non-numeric value fails the whole batch.
pub fn parse_initial_conditions<I, K, V>(raw: I) -> Result<Vec<InitialCondition>, CalcError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<InitialValue>,
{
    let mut conditions = Vec::new();
    for (key, value) in raw {
        let key = key.as_ref();
        let index = parse_condition_key(key)?;
        let value: InitialValue = value.into();
        let value = value
            .to_real()
            .ok_or_else(|| CalcError::invalid_initial_condition_value(key, &value.describe()))?;
        conditions.push(InitialCondition { index, value });
    }

    conditions.sort_by_key(|c| c.index);
    if let Some(pair) = conditions.windows(2).find(|w| w[0].index == w[1].index) {
        return Err(CalcError::duplicate_initial_condition(pair[0].index));
    }

    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqcalc_core::codes;
    use std::collections::HashMap;

    #[test]
    fn test_parse_condition_key() {
        assert_eq!(parse_condition_key("a(0)").unwrap(), 0);
        assert_eq!(parse_condition_key("a( 42 )").unwrap(), 42);
    }

    #[test]
    fn test_parse_condition_key_rejects_other_symbols() {
        let err = parse_condition_key("x(0)").unwrap_err();
        assert_eq!(err.code, codes::INVALID_INITIAL_CONDITION);
        assert!(parse_condition_key("a(n)").is_err());
        assert!(parse_condition_key("a0").is_err());
        assert!(parse_condition_key("a(99999999999999999999999)").is_err());
    }

    #[test]
    fn test_parse_initial_conditions_sorted() {
        let mut raw = HashMap::new();
        raw.insert("a(2)", InitialValue::from("4"));
        raw.insert("a(0)", InitialValue::from(1.0));
        raw.insert("a(1)", InitialValue::from(2_i64));
        let parsed = parse_initial_conditions(raw).unwrap();
        let indices: Vec<u64> = parsed.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(parsed[2].value, 4.0);
    }

    #[test]
    fn test_parse_initial_conditions_bad_value() {
        let raw = vec![("a(0)", "one")];
        let err = parse_initial_conditions(raw).unwrap_err();
        assert_eq!(err.code, codes::INVALID_INITIAL_CONDITION);
        assert!(err.message.contains("one"));
    }

    #[test]
    fn test_parse_initial_conditions_non_finite() {
        let raw = vec![("a(0)", f64::INFINITY)];
        assert!(parse_initial_conditions(raw).is_err());
    }

    #[test]
    fn test_parse_initial_conditions_duplicate_index() {
        let raw = vec![("a(0)", 1.0), ("a( 0 )", 2.0)];
        let err = parse_initial_conditions(raw).unwrap_err();
        assert!(err.message.contains("Duplicate"));
    }

    #[test]
    fn test_initial_value_deserializes_untagged() {
        let v: InitialValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(v, InitialValue::Number(1.5));
        let v: InitialValue = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(v, InitialValue::Text("2".to_string()));
    }
}
