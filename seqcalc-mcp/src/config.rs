//! Server configuration from the environment

use std::env;
use tracing::warn;

const DEFAULT_MAX_INDEX: u64 = 10_000;
const DEFAULT_MAX_TERMS: u64 = 10_000;

/// Limits applied before a request reaches the solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    /// Largest recurrence target index accepted
    pub max_index: u64,
    /// Largest number of terms for arithmetic, geometric and sigma requests
    pub max_terms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_index: DEFAULT_MAX_INDEX,
            max_terms: DEFAULT_MAX_TERMS,
        }
    }
}

impl ServerConfig {
    /// Read `SEQCALC_MAX_INDEX` and `SEQCALC_MAX_TERMS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        Self {
            max_index: read_limit(&lookup, "SEQCALC_MAX_INDEX", defaults.max_index),
            max_terms: read_limit(&lookup, "SEQCALC_MAX_TERMS", defaults.max_terms),
        }
    }
}

fn read_limit<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u64) -> u64 {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => {
                warn!(key, value = %raw, default, "ignoring invalid limit");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[("SEQCALC_MAX_INDEX", "50"), ("SEQCALC_MAX_TERMS", " 7 ")]));
        assert_eq!(config.max_index, 50);
        assert_eq!(config.max_terms, 7);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[("SEQCALC_MAX_INDEX", "lots"), ("SEQCALC_MAX_TERMS", "0")]));
        assert_eq!(config, ServerConfig::default());
    }
}
