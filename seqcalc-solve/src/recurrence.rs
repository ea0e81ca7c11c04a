//! Recurrence relations
//!
//! Evaluates relations such as `a(n) = a(n-1) + a(n-2)` term by term from a
//! set of initial conditions. Gaps in the known terms and evaluation failures
//! do not abort the call: they end the iteration and are reported through a
//! [`Sentinel`] together with the trace built so far.

use crate::conditions::{parse_initial_conditions, InitialValue};
use crate::expr::{eval_expr, parse_expr, Bindings, Expr, Op};
use crate::helpers::{backward_ref_regex, relation_lhs_regex};
use crate::store::TermStore;
use seqcalc_core::{format_real, CalcError};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

/// Name of the sequence inside relations and initial-condition keys
pub const SYMBOL: &str = "a";

/// Variable bound to the index being computed
pub const INDEX_VAR: &str = "n";

/// Why a solve ended without a value for the target index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Sentinel {
    /// A required earlier term was never supplied or computed
    InsufficientConditions,
    /// The relation could not be evaluated at some index
    EvaluationFailed(String),
    /// The target lies below the computed range and was not supplied
    NotCalculated,
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::InsufficientConditions => write!(f, "insufficient initial conditions"),
            Sentinel::EvaluationFailed(detail) => write!(f, "Error in relation evaluation: {}", detail),
            Sentinel::NotCalculated => write!(f, "not calculated or insufficient conditions"),
        }
    }
}

/// Final value of a solve
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Outcome {
    Value(f64),
    Diagnostic(Sentinel),
}

impl Outcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            Outcome::Value(v) => Some(*v),
            Outcome::Diagnostic(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(v) => write!(f, "{}", format_real(*v)),
            Outcome::Diagnostic(sentinel) => write!(f, "{}", sentinel),
        }
    }
}

/// Result of a recurrence solve
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub outcome: Outcome,
    pub steps: Vec<String>,
    /// Given and computed terms, in index order
    pub graph_points: Vec<f64>,
}

impl SolveResult {
    /// The final value as display text, a number or a sentinel message
    pub fn final_value(&self) -> String {
        self.outcome.to_string()
    }

    pub fn step_trace(&self) -> String {
        self.steps.join("\n")
    }
}

/// Strip the leading `a(n)` and `=` from a relation
pub fn normalize_relation(raw: &str) -> String {
    let trimmed = raw.trim();
    let rhs = match relation_lhs_regex().find(trimmed) {
        Some(lhs) => &trimmed[lhs.end()..],
        None => trimmed.strip_prefix('=').unwrap_or(trimmed),
    };
    rhs.trim().to_string()
}

/// Distinct offsets k of every `a(n-k)` in the template
pub fn extract_offsets(template: &str) -> BTreeSet<u32> {
    backward_ref_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .filter(|k| *k > 0)
        .collect()
}

/// Turn `a(n-k)` calls into `Prior` nodes; any other use of the sequence
/// symbol cannot be resolved from earlier terms
fn lower_references(expr: &Expr) -> Result<Expr, CalcError> {
    expr.try_map(&mut |node| match node {
        Expr::Call(name, args) if name == SYMBOL => match backward_offset(args) {
            Some(offset) => Ok(Some(Expr::Prior { symbol: SYMBOL.to_string(), offset })),
            None => Err(CalcError::domain_error(format!(
                "{} may only reference earlier terms such as {}(n-1), got {}",
                SYMBOL, SYMBOL, node
            ))),
        },
        _ => Ok(None),
    })
}

fn backward_offset(args: &[Expr]) -> Option<u32> {
    match args {
        [Expr::BinOp(left, Op::Sub, right)] => match (left.as_ref(), right.as_ref()) {
            (Expr::Var(var), Expr::Num(k)) if var == INDEX_VAR && k.fract() == 0.0 && *k >= 1.0 && *k <= u32::MAX as f64 => {
                Some(*k as u32)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Offsets of the `Prior` nodes left by `lower_references`
fn prior_offsets(expr: &Expr) -> BTreeSet<u32> {
    let mut offsets = BTreeSet::new();
    expr.walk(&mut |node| {
        if let Expr::Prior { offset, .. } = node {
            offsets.insert(*offset);
        }
    });
    offsets
}

/// Parsed right-hand side of a relation
#[derive(Debug, Clone)]
pub struct RecurrenceTemplate {
    text: String,
    expr: Result<Expr, CalcError>,
    offsets: BTreeSet<u32>,
}

/// Evaluation failure at one index
struct TermFailure {
    shown: String,
    error: CalcError,
}

impl RecurrenceTemplate {
    /// Normalize and parse a relation. Syntax problems are kept and only
    /// reported when a term is evaluated.
    pub fn parse(raw: &str) -> Self {
        let text = normalize_relation(raw);
        let expr = parse_expr(&text).and_then(|e| lower_references(&e));
        let offsets = match &expr {
            Ok(parsed) => prior_offsets(parsed),
            Err(e) => {
                debug!(template = %text, error = %e, "relation does not parse");
                extract_offsets(&text)
            }
        };
        Self { text, expr, offsets }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn offsets(&self) -> &BTreeSet<u32> {
        &self.offsets
    }

    /// Smallest offset whose term is not yet available for `index`
    fn missing_offset(&self, index: u64, store: &TermStore) -> Option<u32> {
        self.offsets.iter().copied().find(|&k| {
            index
                .checked_sub(u64::from(k))
                .map_or(true, |prev| !store.contains(prev))
        })
    }

    /// Substitute known terms and evaluate at `index`
    fn evaluate_at(&self, index: u64, store: &TermStore) -> Result<(String, f64), TermFailure> {
        let expr = self.expr.as_ref().map_err(|e| TermFailure {
            shown: self.text.clone(),
            error: e.clone(),
        })?;

        let substituted = expr
            .try_map(&mut |node| match node {
                Expr::Prior { offset, .. } => index
                    .checked_sub(u64::from(*offset))
                    .and_then(|prev| store.get(prev))
                    .map(|v| Some(Expr::Known(v)))
                    .ok_or_else(|| CalcError::undefined_var(&node.to_string())),
                _ => Ok(None),
            })
            .map_err(|error| TermFailure { shown: self.text.clone(), error })?;

        let shown = substituted.to_string();
        let mut bindings = Bindings::new();
        bindings.insert(INDEX_VAR.to_string(), index as f64);

        match eval_expr(&substituted, &bindings) {
            Ok(value) => Ok((shown, value)),
            Err(error) => Err(TermFailure { shown, error }),
        }
    }
}

/// Compute `a(target_index)` from a relation and its initial conditions.
///
/// Only malformed initial conditions fail the call. Missing prerequisites
/// and evaluation errors stop the iteration and come back as a
/// [`Sentinel`] outcome with the trace up to that point.
pub fn solve<I, K, V>(relation: &str, initial_conditions: I, target_index: u64) -> Result<SolveResult, CalcError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<InitialValue>,
{
    let conditions = parse_initial_conditions(initial_conditions)?;
    let template = RecurrenceTemplate::parse(relation);
    debug!(template = %template.text(), offsets = ?template.offsets(), target_index, "solving recurrence");

    let mut store = TermStore::new();
    let mut steps = Vec::new();

    for condition in &conditions {
        store.insert(condition.index, condition.value)?;
        steps.push(format!("Initial condition: ${}({}) = {}$", SYMBOL, condition.index, format_real(condition.value)));
    }

    // A given a(u64::MAX) leaves nothing to compute
    let start_index = store.max_index().map_or(Some(0), |i| i.checked_add(1));
    let mut sentinel = None;

    for index in start_index.into_iter().flat_map(|start| start..=target_index) {
        if let Some(offset) = template.missing_offset(index, &store) {
            warn!(index, offset, "missing prerequisite term, stopping");
            steps.push(format!(
                "Cannot calculate ${}({})$: Missing initial conditions for required previous terms.",
                SYMBOL, index
            ));
            sentinel = Some(Sentinel::InsufficientConditions);
            break;
        }

        match template.evaluate_at(index, &store) {
            Ok((shown, value)) => {
                debug!(index, value, "term computed");
                store.insert(index, value)?;
                steps.push(format!("${}({}) = {} = {}$", SYMBOL, index, shown, format_real(value)));
            }
            Err(TermFailure { shown, error }) => {
                warn!(index, error = %error, "relation evaluation failed, stopping");
                steps.push(format!(
                    "Error evaluating ${}({})$: {}. Expression: {}",
                    SYMBOL, index, error.message, shown
                ));
                sentinel = Some(Sentinel::EvaluationFailed(error.message));
                break;
            }
        }
    }

    let outcome = match store.get(target_index) {
        Some(value) => Outcome::Value(value),
        None => Outcome::Diagnostic(sentinel.unwrap_or(Sentinel::NotCalculated)),
    };

    debug!(terms = store.len(), "solve finished");
    let graph_points = store.iter().map(|(_, value)| value).collect();

    Ok(SolveResult { outcome, steps, graph_points })
}
