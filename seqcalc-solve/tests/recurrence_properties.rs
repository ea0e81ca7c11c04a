use seqcalc_solve::{solve, Outcome, Sentinel};
use std::collections::HashMap;

fn fibonacci_seed() -> HashMap<String, f64> {
    let mut seed = HashMap::new();
    seed.insert("a(0)".to_string(), 0.0);
    seed.insert("a(1)".to_string(), 1.0);
    seed
}

#[test]
fn test_fibonacci_to_five() {
    let result = solve("a(n) = a(n-1) + a(n-2)", fibonacci_seed(), 5).unwrap();
    assert_eq!(result.final_value(), "5.0");
    assert_eq!(result.graph_points, vec![0.0, 1.0, 1.0, 2.0, 3.0, 5.0]);
}

#[test]
fn test_affine_recurrence() {
    let result = solve("a(n) = 2*a(n-1) + 3", vec![("a(0)", 1.0)], 3).unwrap();
    assert_eq!(result.final_value(), "29.0");
    assert_eq!(result.graph_points, vec![1.0, 5.0, 13.0, 29.0]);
}

#[test]
fn test_extending_target_keeps_earlier_terms() {
    for k in 1..12 {
        let shorter = solve("a(n) = a(n-1) + a(n-2)", fibonacci_seed(), k).unwrap();
        let longer = solve("a(n) = a(n-1) + a(n-2)", fibonacci_seed(), k + 1).unwrap();
        assert_eq!(&longer.graph_points[..shorter.graph_points.len()], &shorter.graph_points[..]);
        assert_eq!(longer.graph_points.len(), shorter.graph_points.len() + 1);
    }
}

#[test]
fn test_repeated_solves_are_identical() {
    let first = solve("a(n) = 3*a(n-1) - a(n-2) + n", fibonacci_seed(), 9).unwrap();
    let second = solve("a(n) = 3*a(n-1) - a(n-2) + n", fibonacci_seed(), 9).unwrap();
    assert_eq!(first.final_value(), second.final_value());
    assert_eq!(first.graph_points, second.graph_points);
    assert_eq!(first.steps, second.steps);
}

#[test]
fn test_insufficient_conditions_names_index() {
    let result = solve("a(n) = a(n-1) + a(n-2)", vec![("a(0)", 0.0)], 2).unwrap();
    assert_eq!(result.final_value(), "insufficient initial conditions");
    assert!(result
        .steps
        .iter()
        .any(|s| s.starts_with("Cannot calculate $a(1)$")));
}

#[test]
fn test_target_already_known() {
    let result = solve("a(n) = a(n-1) + a(n-2)", fibonacci_seed(), 0).unwrap();
    assert_eq!(result.outcome, Outcome::Value(0.0));
    assert_eq!(result.steps.len(), 2);
}

#[test]
fn test_bad_key_fails_before_computation() {
    let err = solve("a(n) = a(n-1)", vec![("x(0)", "1")], 4).unwrap_err();
    assert_eq!(err.code, "INVALID_INITIAL_CONDITION");
}

#[test]
fn test_string_values_accepted() {
    let result = solve("a(n) = a(n-1)/2", vec![("a(0)", "8")], 3).unwrap();
    assert_eq!(result.final_value(), "1.0");
}

#[test]
fn test_solves_run_in_parallel() {
    let handles: Vec<_> = (0..4)
        .map(|k| std::thread::spawn(move || solve("a(n) = a(n-1) + 1", vec![("a(0)", 0.0)], 10 + k).unwrap()))
        .collect();
    for (k, handle) in handles.into_iter().enumerate() {
        let result = handle.join().unwrap();
        assert_eq!(result.outcome, Outcome::Value((10 + k) as f64));
    }
}

#[test]
fn test_evaluation_failure_keeps_partial_trace() {
    let result = solve("a(n) = sqrt(a(n-1) - 2)", vec![("a(0)", 6.0)], 4).unwrap();
    // 6 -> 2 -> 0 -> sqrt(-2) fails
    assert_eq!(result.graph_points, vec![6.0, 2.0, 0.0]);
    assert!(matches!(result.outcome, Outcome::Diagnostic(Sentinel::EvaluationFailed(_))));
}
