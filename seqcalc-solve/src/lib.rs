//! Seqcalc Solve
//!
//! Step-by-step solvers for arithmetic and geometric sequences, sigma sums and
//! recurrence relations. Every solver returns its final value together with a
//! human-readable derivation trace and the points for plotting.

mod helpers;
pub mod expr;
mod store;
mod conditions;
mod recurrence;
mod generators;
mod series;

pub use expr::{evaluate, Bindings, Expr};
pub use store::{StoreError, TermStore};
pub use conditions::{parse_condition_key, parse_initial_conditions, InitialCondition, InitialValue};
pub use recurrence::{
    extract_offsets, normalize_relation, solve, Outcome, RecurrenceTemplate, Sentinel, SolveResult,
    INDEX_VAR, SYMBOL,
};
pub use generators::{arithmetic, geometric, ArithmeticSolution, GeometricSolution, NthTerm, SeriesSum, Span};
pub use series::{sigma, SigmaSolution};
