//! Tool implementations: argument extraction, limits, JSON rendering

use crate::config::ServerConfig;
use crate::McpError;
use seqcalc_core::{format_real, parse_real, CalcError};
use seqcalc_solve::{
    arithmetic, geometric, sigma, solve, ArithmeticSolution, GeometricSolution, InitialValue, SigmaSolution,
    SolveResult, Span,
};
use serde_json::{json, Value as JsonValue};
use tracing::debug;

/// Tool descriptors for `tools/list`
pub fn tool_descriptors() -> JsonValue {
    json!([
        {
            "name": "arithmetic",
            "description": "Nth term and partial sum of an arithmetic sequence, with a step-by-step derivation.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "first": { "type": "number", "description": "First term a" },
                    "diff": { "type": "number", "description": "Common difference d" },
                    "n": { "type": "integer", "description": "Term number (>= 1)" }
                },
                "required": ["first", "diff", "n"]
            }
        },
        {
            "name": "geometric",
            "description": "Nth term and sum of a geometric sequence, finite or infinite.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "first": { "type": "number", "description": "First term a" },
                    "ratio": { "type": "number", "description": "Common ratio r" },
                    "n": { "type": "integer", "description": "Term number (>= 1), ignored when infinite" },
                    "infinite": { "type": "boolean", "description": "Sum the infinite series", "default": false }
                },
                "required": ["first", "ratio"]
            }
        },
        {
            "name": "sigma",
            "description": "Expand and evaluate a sigma-notation sum over an integer range.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "expression": { "type": "string", "description": "Summand, e.g. k**2" },
                    "variable": { "type": "string", "description": "Summation variable, e.g. k" },
                    "lower": { "type": "integer", "description": "Lower bound (inclusive)" },
                    "upper": { "type": "integer", "description": "Upper bound (inclusive)" }
                },
                "required": ["expression", "variable", "lower", "upper"]
            }
        },
        {
            "name": "recurrence",
            "description": "Evaluate a recurrence relation term by term from initial conditions.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "relation": { "type": "string", "description": "e.g. a(n) = a(n-1) + a(n-2)" },
                    "initial_conditions": {
                        "type": "object",
                        "description": "e.g. {\"a(0)\": 0, \"a(1)\": 1}",
                        "additionalProperties": { "type": ["number", "string"] }
                    },
                    "n": { "type": "integer", "description": "Target index" }
                },
                "required": ["relation", "initial_conditions", "n"]
            }
        }
    ])
}

fn invalid_params(message: impl Into<String>) -> McpError {
    McpError {
        code: -32602,
        message: message.into(),
        data: None,
    }
}

fn number_arg(args: &JsonValue, name: &str) -> Result<f64, McpError> {
    match args.get(name) {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid_params(format!("Argument '{}' is not a finite number", name))),
        Some(JsonValue::String(s)) => {
            parse_real(s).map_err(|e| invalid_params(format!("Argument '{}': {}", name, e)))
        }
        Some(_) => Err(invalid_params(format!("Argument '{}' must be a number", name))),
        None => Err(invalid_params(format!("Missing {} argument", name))),
    }
}

fn integer_arg(args: &JsonValue, name: &str) -> Result<i64, McpError> {
    let parsed = match args.get(name) {
        Some(JsonValue::Number(n)) => n.as_i64(),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
        None => return Err(invalid_params(format!("Missing {} argument", name))),
    };
    parsed.ok_or_else(|| invalid_params(format!("Argument '{}' must be an integer", name)))
}

fn index_arg(args: &JsonValue, name: &str) -> Result<u64, McpError> {
    let value = integer_arg(args, name)?;
    u64::try_from(value).map_err(|_| invalid_params(format!("Argument '{}' must be non-negative", name)))
}

fn text_arg<'a>(args: &'a JsonValue, name: &str) -> Result<&'a str, McpError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid_params(format!("Missing {} argument", name)))
}

fn within_limit(value: u64, limit: u64, what: &str) -> Result<(), CalcError> {
    if value > limit {
        return Err(CalcError::domain_error(format!("{} is limited to {}, got {}", what, limit, value))
            .with_suggestion("Raise the server limit or ask for fewer terms"));
    }
    Ok(())
}

/// Successful solver output or a calculation error, rendered for the client
fn render(result: Result<JsonValue, CalcError>) -> JsonValue {
    match result {
        Ok(value) => value,
        Err(e) => json!({
            "content": [{ "type": "text", "text": format!("Error: {}", e) }],
            "error": { "code": e.code, "message": e.message },
            "isError": true
        }),
    }
}

fn text_content(trace: &str, summary: String) -> JsonValue {
    json!([{ "type": "text", "text": format!("{}\n\n{}", trace, summary) }])
}

fn arithmetic_json(sol: &ArithmeticSolution) -> JsonValue {
    let trace = sol.step_trace();
    json!({
        "content": text_content(&trace, format!("a_n = {}, S_n = {}", format_real(sol.nth_term_value), format_real(sol.sum_value))),
        "type": "arithmetic",
        "nth_term_formula_latex": sol.nth_term_formula_latex,
        "nth_term_value": format_real(sol.nth_term_value),
        "sum_formula_latex": sol.sum_formula_latex,
        "sum_value": format_real(sol.sum_value),
        "step_by_step_solution": trace,
        "graph_points": sol.graph_points,
        "isError": false
    })
}

fn geometric_json(sol: &GeometricSolution) -> JsonValue {
    let trace = sol.step_trace();
    json!({
        "content": text_content(&trace, format!("a_n = {}, S = {}", sol.nth_term_value, sol.sum_value)),
        "type": "geometric",
        "nth_term_formula_latex": sol.nth_term_formula_latex,
        "nth_term_value": sol.nth_term_value.to_string(),
        "sum_formula_latex": sol.sum_formula_latex,
        "sum_value": sol.sum_value.to_string(),
        "step_by_step_solution": trace,
        "graph_points": sol.graph_points,
        "isError": false
    })
}

fn sigma_json(sol: &SigmaSolution) -> JsonValue {
    let trace = sol.step_trace();
    json!({
        "content": text_content(&trace, format!("Sum = {}", format_real(sol.sum_value))),
        "type": "sigma",
        "sum_value": format_real(sol.sum_value),
        "step_by_step_solution": trace,
        "graph_points": sol.graph_points,
        "isError": false
    })
}

fn recurrence_json(result: &SolveResult) -> JsonValue {
    let trace = result.step_trace();
    let final_value = result.final_value();
    json!({
        "content": text_content(&trace, format!("Result: {}", final_value)),
        "type": "recurrence",
        "nth_term_value": final_value,
        "outcome": result.outcome,
        "step_by_step_solution": trace,
        "graph_points": result.graph_points,
        "isError": false
    })
}

pub fn tool_arithmetic(config: &ServerConfig, args: &JsonValue) -> Result<JsonValue, McpError> {
    let first = number_arg(args, "first")?;
    let diff = number_arg(args, "diff")?;
    let n = index_arg(args, "n")?;

    Ok(render(
        within_limit(n, config.max_terms, "n")
            .and_then(|_| arithmetic(first, diff, n))
            .map(|sol| arithmetic_json(&sol)),
    ))
}

pub fn tool_geometric(config: &ServerConfig, args: &JsonValue) -> Result<JsonValue, McpError> {
    let first = number_arg(args, "first")?;
    let ratio = number_arg(args, "ratio")?;
    let infinite = args.get("infinite").and_then(|v| v.as_bool()).unwrap_or(false);
    let span = if infinite {
        Span::Infinite
    } else {
        Span::Finite(index_arg(args, "n")?)
    };

    let limit = match span {
        Span::Finite(n) => within_limit(n, config.max_terms, "n"),
        Span::Infinite => Ok(()),
    };
    Ok(render(
        limit
            .and_then(|_| geometric(first, ratio, span))
            .map(|sol| geometric_json(&sol)),
    ))
}

pub fn tool_sigma(config: &ServerConfig, args: &JsonValue) -> Result<JsonValue, McpError> {
    let expression = text_arg(args, "expression")?;
    let variable = text_arg(args, "variable")?;
    let lower = integer_arg(args, "lower")?;
    let upper = integer_arg(args, "upper")?;

    let terms = if upper >= lower {
        (upper as i128 - lower as i128 + 1) as u128
    } else {
        0
    };
    let terms = u64::try_from(terms).unwrap_or(u64::MAX);

    Ok(render(
        within_limit(terms, config.max_terms, "number of terms")
            .and_then(|_| sigma(expression, variable, lower, upper))
            .map(|sol| sigma_json(&sol)),
    ))
}

pub fn tool_recurrence(config: &ServerConfig, args: &JsonValue) -> Result<JsonValue, McpError> {
    let relation = text_arg(args, "relation")?;
    let n = index_arg(args, "n")?;
    let raw = args
        .get("initial_conditions")
        .and_then(|v| v.as_object())
        .ok_or_else(|| invalid_params("Missing initial_conditions argument"))?;

    let mut conditions = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let value = match value {
            JsonValue::Number(num) => num
                .as_f64()
                .map(InitialValue::Number)
                .ok_or_else(|| invalid_params(format!("Initial condition {} is not a finite number", key)))?,
            JsonValue::String(s) => InitialValue::Text(s.clone()),
            other => InitialValue::Text(other.to_string()),
        };
        conditions.push((key.as_str(), value));
    }
    debug!(relation, n, conditions = conditions.len(), "recurrence request");

    Ok(render(
        within_limit(n, config.max_index, "n")
            .and_then(|_| solve(relation, conditions, n))
            .map(|result| recurrence_json(&result)),
    ))
}
