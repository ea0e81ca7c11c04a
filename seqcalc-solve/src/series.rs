//! Sigma-notation sums over a bounded integer range

use crate::expr::{eval_expr, parse_expr, Bindings};
use crate::helpers::{finite_result, require_identifier};
use seqcalc_core::{format_real, CalcError};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SigmaSolution {
    pub sum_value: f64,
    pub steps: Vec<String>,
    /// One value per term, lower bound first
    pub graph_points: Vec<f64>,
}

impl SigmaSolution {
    pub fn step_trace(&self) -> String {
        self.steps.join("\n")
    }
}

/// Sum `expression` for `variable` from `lower` to `upper` inclusive.
///
/// Unlike recurrences, any parse or evaluation error fails the whole sum.
pub fn sigma(expression: &str, variable: &str, lower: i64, upper: i64) -> Result<SigmaSolution, CalcError> {
    let var = require_identifier(variable, "sigma")?;
    let expr = parse_expr(expression)?;
    debug!(expression = %expr, var, lower, upper, "expanding sum");

    let mut steps = vec![
        format!("Given sum: $\\sum_{{{}={}}}^{{{}}} ({})$", var, lower, upper, expr),
    ];

    if lower > upper {
        steps.push("The lower bound exceeds the upper bound, so the sum is empty.".to_string());
        steps.push("Empty sum = 0.0".to_string());
        return Ok(SigmaSolution { sum_value: 0.0, steps, graph_points: Vec::new() });
    }

    steps.push("Expand the sum by substituting values from lower bound to upper bound:".to_string());

    let mut bindings = Bindings::new();
    let mut graph_points = Vec::new();
    let mut total = 0.0;
    for i in lower..=upper {
        bindings.insert(var.to_string(), i as f64);
        let term = eval_expr(&expr, &bindings)?;
        steps.push(format!("For ${}={}$: ${}$", var, i, format_real(term)));
        graph_points.push(term);
        total += term;
    }
    let total = finite_result(total, "sum")?;

    let expanded: Vec<String> = graph_points.iter().map(|t| format_real(*t)).collect();
    steps.push("\nAdd the terms together:".to_string());
    steps.push(format!("{} = {}", expanded.join(" + "), format_real(total)));

    Ok(SigmaSolution { sum_value: total, steps, graph_points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use seqcalc_core::codes;

    #[test]
    fn test_sigma_squares() {
        let sol = sigma("k**2", "k", 1, 3).unwrap();
        assert_relative_eq!(sol.sum_value, 14.0);
        assert_eq!(sol.graph_points, vec![1.0, 4.0, 9.0]);
        assert_eq!(sol.steps.last().unwrap(), "1.0 + 4.0 + 9.0 = 14.0");
        assert!(sol.steps[0].contains("k^2"));
    }

    #[test]
    fn test_sigma_negative_bounds() {
        let sol = sigma("2*i + 1", "i", -2, 2).unwrap();
        assert_relative_eq!(sol.sum_value, 5.0);
        assert_eq!(sol.graph_points.len(), 5);
    }

    #[test]
    fn test_sigma_empty_range() {
        let sol = sigma("k", "k", 5, 1).unwrap();
        assert_eq!(sol.sum_value, 0.0);
        assert!(sol.graph_points.is_empty());
    }

    #[test]
    fn test_sigma_invalid_variable() {
        let err = sigma("k", "k k", 1, 3).unwrap_err();
        assert_eq!(err.code, codes::DOMAIN_ERROR);
    }

    #[test]
    fn test_sigma_unknown_symbol() {
        let err = sigma("k + m", "k", 1, 3).unwrap_err();
        assert_eq!(err.code, codes::UNDEFINED_VAR);
    }

    #[test]
    fn test_sigma_division_by_zero() {
        let err = sigma("1/k", "k", 0, 3).unwrap_err();
        assert_eq!(err.code, codes::DIV_ZERO);
    }

    #[test]
    fn test_sigma_parse_error() {
        let err = sigma("k +", "k", 0, 3).unwrap_err();
        assert_eq!(err.code, codes::PARSE_ERROR);
    }
}
