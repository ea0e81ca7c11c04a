//! Closed-form sequences
//!
//! arithmetic, geometric

use crate::helpers::{finite_result, require_count, require_finite};
use seqcalc_core::{format_real, CalcError};
use serde::Serialize;
use std::fmt;

/// Terms plotted for an infinite geometric series
const INFINITE_PREVIEW_TERMS: u64 = 10;

// ============ Arithmetic ============

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArithmeticSolution {
    pub nth_term_formula_latex: &'static str,
    pub nth_term_value: f64,
    pub sum_formula_latex: &'static str,
    pub sum_value: f64,
    pub steps: Vec<String>,
    pub graph_points: Vec<f64>,
}

impl ArithmeticSolution {
    pub fn step_trace(&self) -> String {
        self.steps.join("\n")
    }
}

/// nth term `a + (n-1)d` and partial sum `n/2 (2a + (n-1)d)`
pub fn arithmetic(first: f64, diff: f64, n: u64) -> Result<ArithmeticSolution, CalcError> {
    let a = require_finite(first, "arithmetic", "first")?;
    let d = require_finite(diff, "arithmetic", "diff")?;
    let n = require_count(n, "arithmetic")?;
    let nf = n as f64;
    let (a_s, d_s) = (format_real(a), format_real(d));

    let step_diff = (nf - 1.0) * d;
    let nth = finite_result(a + step_diff, "nth term")?;
    let inner = 2.0 * a + step_diff;
    let sum = finite_result(nf / 2.0 * inner, "sum")?;

    let steps = vec![
        format!("Given: First term (a) = {}, Common difference (d) = {}, Term number (n) = {}", a_s, d_s, n),
        "\n--- Nth Term Calculation ---".to_string(),
        "The nth term of an arithmetic sequence is: $a_n = a + (n-1)d$".to_string(),
        format!("Substitute the given values: $a_{{{}}} = {} + ({}-1){}$", n, a_s, n, d_s),
        format!("$a_{{{}}} = {} + ({}){}$", n, a_s, n - 1, d_s),
        format!("$a_{{{}}} = {} + {}$", n, a_s, format_real(step_diff)),
        format!("$a_{{{}}} = {}$", n, format_real(nth)),
        "\n--- Sum of N Terms Calculation ---".to_string(),
        "The sum of the first n terms of an arithmetic sequence is: $S_n = \\frac{n}{2}(2a + (n-1)d)$".to_string(),
        format!("Substitute the given values: $S_{{{}}} = \\frac{{{}}}{{2}}(2({}) + ({}-1){})$", n, n, a_s, n, d_s),
        format!("$S_{{{}}} = \\frac{{{}}}{{2}}({} + ({}){})$", n, n, format_real(2.0 * a), n - 1, d_s),
        format!("$S_{{{}}} = \\frac{{{}}}{{2}}({} + {})$", n, n, format_real(2.0 * a), format_real(step_diff)),
        format!("$S_{{{}}} = \\frac{{{}}}{{2}}({})$", n, n, format_real(inner)),
        format!("$S_{{{}}} = {}$", n, format_real(sum)),
    ];

    let graph_points = (0..n).map(|i| a + i as f64 * d).collect();

    Ok(ArithmeticSolution {
        nth_term_formula_latex: "a + d \\left(n - 1\\right)",
        nth_term_value: nth,
        sum_formula_latex: "\\frac{n \\left(2 a + d \\left(n - 1\\right)\\right)}{2}",
        sum_value: sum,
        steps,
        graph_points,
    })
}

// ============ Geometric ============

/// How many terms a geometric series runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Span {
    Finite(u64),
    Infinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NthTerm {
    Value(f64),
    NotApplicable,
}

impl fmt::Display for NthTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NthTerm::Value(v) => write!(f, "{}", format_real(*v)),
            NthTerm::NotApplicable => write!(f, "N/A (Infinite Series)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SeriesSum {
    Value(f64),
    Diverges,
}

impl fmt::Display for SeriesSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesSum::Value(v) => write!(f, "{}", format_real(*v)),
            SeriesSum::Diverges => write!(f, "Diverges"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometricSolution {
    pub nth_term_formula_latex: &'static str,
    pub nth_term_value: NthTerm,
    pub sum_formula_latex: &'static str,
    pub sum_value: SeriesSum,
    pub steps: Vec<String>,
    pub graph_points: Vec<f64>,
}

impl GeometricSolution {
    pub fn step_trace(&self) -> String {
        self.steps.join("\n")
    }
}

/// nth term `a r^(n-1)`, finite sum `a(1 - r^n)/(1 - r)`, infinite sum `a/(1 - r)`
pub fn geometric(first: f64, ratio: f64, span: Span) -> Result<GeometricSolution, CalcError> {
    let a = require_finite(first, "geometric", "first")?;
    let r = require_finite(ratio, "geometric", "ratio")?;
    let (a_s, r_s) = (format_real(a), format_real(r));

    let mut steps = vec![format!("Given: First term (a) = {}, Common ratio (r) = {}", a_s, r_s)];
    if let Span::Finite(n) = span {
        steps.push(format!("Term number (n) = {}", n));
    }

    steps.push("\n--- Nth Term Calculation ---".to_string());
    steps.push("The nth term of a geometric sequence is: $a_n = ar^{n-1}$".to_string());
    let nth_term_value = match span {
        Span::Finite(n) => {
            let n = require_count(n, "geometric")?;
            steps.push(format!("Substitute the given values: $a_{{{}}} = {} \\cdot {}^{{{}-1}}$", n, a_s, r_s, n));
            let nth = finite_result(a * r.powf((n - 1) as f64), "nth term")?;
            steps.push(format!("$a_{{{}}} = {}$", n, format_real(nth)));
            NthTerm::Value(nth)
        }
        Span::Infinite => {
            steps.push("The nth term is not evaluated for an infinite series.".to_string());
            NthTerm::NotApplicable
        }
    };

    steps.push("\n--- Sum Calculation ---".to_string());
    let (sum_formula_latex, sum_value) = match span {
        Span::Infinite if r.abs() < 1.0 => {
            steps.push("For an infinite geometric series with $|r| < 1$ the sum is: $S_\\infty = \\frac{a}{1-r}$".to_string());
            steps.push(format!("Substitute the given values: $S_\\infty = \\frac{{{}}}{{1-{}}}$", a_s, r_s));
            let sum = finite_result(a / (1.0 - r), "sum")?;
            steps.push(format!("$S_\\infty = {}$", format_real(sum)));
            ("\\frac{a}{1 - r}", SeriesSum::Value(sum))
        }
        Span::Infinite => {
            steps.push("The infinite geometric series diverges because $|r| \\ge 1$.".to_string());
            ("diverges", SeriesSum::Diverges)
        }
        Span::Finite(n) => {
            steps.push("The sum of the first n terms of a geometric sequence is: $S_n = \\frac{a(1-r^n)}{1-r}$".to_string());
            steps.push(format!(
                "Substitute the given values: $S_{{{}}} = \\frac{{{}(1-{}^{{{}}})}}{{1-{}}}$",
                n, a_s, r_s, n, r_s
            ));
            let sum = if r == 1.0 {
                let sum = finite_result(n as f64 * a, "sum")?;
                steps.push(format!("If r=1, $S_n = n \\cdot a = {} \\cdot {} = {}$", n, a_s, format_real(sum)));
                sum
            } else {
                let sum = finite_result(a * (1.0 - r.powf(n as f64)) / (1.0 - r), "sum")?;
                steps.push(format!("$S_{{{}}} = {}$", n, format_real(sum)));
                sum
            };
            ("\\frac{a \\left(1 - r^{n}\\right)}{1 - r}", SeriesSum::Value(sum))
        }
    };

    let plotted = match span {
        Span::Finite(n) => n,
        Span::Infinite => INFINITE_PREVIEW_TERMS,
    };
    let graph_points = (0..plotted)
        .map(|i| finite_result(a * r.powf(i as f64), "term"))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeometricSolution {
        nth_term_formula_latex: "a r^{n - 1}",
        nth_term_value,
        sum_formula_latex,
        sum_value,
        steps,
        graph_points,
    })
}
