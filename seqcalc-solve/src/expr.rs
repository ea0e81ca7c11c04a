//! Mini-expression parser and evaluator
//!
//! Parses arithmetic expressions into an AST, evaluates them in `f64` against
//! variable bindings, and renders them back to infix text for traces.
//! Recurrence templates reuse the same AST: backward references such as
//! `a(n-2)` are lowered to `Expr::Prior` nodes and later replaced by
//! `Expr::Known` leaves holding the resolved term values.

use seqcalc_core::{format_literal, format_real, CalcError};
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// Variable name → value
pub type Bindings = HashMap<String, f64>;

/// Token types for the expression parser
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Comma,
    LParen,
    RParen,
}

/// AST node for expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal written in the source text
    Num(f64),
    /// Value substituted for a term reference
    Known(f64),
    Var(String),
    /// Reference to the term `offset` steps before the current index
    Prior { symbol: String, offset: u32 },
    BinOp(Box<Expr>, Op, Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Add | Op::Sub => 1,
            Op::Mul | Op::Div => 2,
            Op::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Op::Add => " + ",
            Op::Sub => " - ",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Pow => "^",
        }
    }
}

const NEG_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

/// Supported single-argument functions
const FUNCTIONS: [&str; 10] = ["abs", "sqrt", "floor", "ceil", "exp", "ln", "log", "sin", "cos", "tan"];

/// Tokenize expression string
fn tokenize(input: &str) -> Result<Vec<Token>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                pos += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '*' => {
                // "**" is accepted as power
                if chars.get(pos + 1) == Some(&'*') {
                    tokens.push(Token::Caret);
                    pos += 2;
                } else {
                    tokens.push(Token::Star);
                    pos += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                pos += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                pos += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '0'..='9' | '.' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                // Exponent only when digits follow, so "2e" stays 2 times e
                if matches!(chars.get(pos), Some('e') | Some('E')) {
                    let mut look = pos + 1;
                    if matches!(chars.get(look), Some('+') | Some('-')) {
                        look += 1;
                    }
                    if chars.get(look).map_or(false, |c| c.is_ascii_digit()) {
                        pos = look;
                        while pos < chars.len() && chars[pos].is_ascii_digit() {
                            pos += 1;
                        }
                    }
                }
                let num_str: String = chars[start..pos].iter().collect();
                match num_str.parse::<f64>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => return Err(CalcError::parse_error(format!("Invalid number: {}", num_str))),
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            }
            _ => {
                return Err(CalcError::parse_error(format!("Unexpected character: {}", ch)));
            }
        }
    }

    Ok(tokens)
}

/// Parse tokens into AST
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), CalcError> {
        if self.peek() == Some(&token) {
            self.advance();
            Ok(())
        } else {
            Err(CalcError::parse_error(format!("Expected {}", what)))
        }
    }

    // expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, CalcError> {
        let mut left = self.parse_term()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // term = unary (('*' | '/') unary)*
    fn parse_term(&mut self) -> Result<Expr, CalcError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::BinOp(Box::new(left), op, Box::new(right));
        }

        Ok(left)
    }

    // unary = ('-' | '+') unary | power
    fn parse_unary(&mut self) -> Result<Expr, CalcError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_unary()?;
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // power = primary ('^' unary)?  (right associative, -x^2 == -(x^2))
    fn parse_power(&mut self) -> Result<Expr, CalcError> {
        let base = self.parse_primary()?;

        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::BinOp(Box::new(base), Op::Pow, Box::new(exponent)));
        }

        Ok(base)
    }

    // primary = number | ident | ident '(' args ')' | '(' expr ')'
    fn parse_primary(&mut self) -> Result<Expr, CalcError> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.advance();
                Ok(Expr::Num(n))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if !matches!(self.peek(), Some(Token::LParen)) {
                    return Ok(Expr::Var(name));
                }
                self.advance(); // consume '('
                let mut args = vec![self.parse_expr()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.advance();
                    args.push(self.parse_expr()?);
                }
                self.expect(Token::RParen, "')' after function arguments")?;
                Ok(Expr::Call(name, args))
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RParen, "closing ')'")?;
                Ok(expr)
            }
            Some(token) => {
                Err(CalcError::parse_error(format!("Unexpected token: {:?}", token)))
            }
            None => {
                Err(CalcError::parse_error("Unexpected end of expression"))
            }
        }
    }
}

/// Parse an expression string into an AST
pub fn parse_expr(input: &str) -> Result<Expr, CalcError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CalcError::parse_error("Empty expression"));
    }
    trace!(tokens = tokens.len(), "parsing expression");
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;

    // Check that all tokens were consumed
    if parser.pos < parser.tokens.len() {
        return Err(CalcError::parse_error("Unexpected tokens at end of expression"));
    }

    Ok(expr)
}

fn checked(value: f64, what: &str) -> Result<f64, CalcError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::domain_error(format!("{} is not a finite number", what)))
    }
}

fn apply_function(name: &str, x: f64) -> Result<f64, CalcError> {
    let value = match name {
        "abs" => x.abs(),
        "sqrt" => {
            if x < 0.0 {
                return Err(CalcError::domain_error(format!("sqrt of negative number {}", format_real(x))));
            }
            x.sqrt()
        }
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        "exp" => x.exp(),
        "ln" | "log" => {
            if x <= 0.0 {
                return Err(CalcError::domain_error(format!("{} of non-positive number {}", name, format_real(x))));
            }
            x.ln()
        }
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        _ => return Err(CalcError::undefined_func(name)),
    };
    checked(value, &format!("{}({})", name, format_real(x)))
}

/// Evaluate an expression with the given variable bindings
pub fn eval_expr(expr: &Expr, bindings: &Bindings) -> Result<f64, CalcError> {
    match expr {
        Expr::Num(n) | Expr::Known(n) => Ok(*n),
        Expr::Var(name) => {
            if let Some(value) = bindings.get(name) {
                return Ok(*value);
            }
            match name.as_str() {
                "pi" => Ok(std::f64::consts::PI),
                "e" => Ok(std::f64::consts::E),
                _ => Err(CalcError::undefined_var(name)),
            }
        }
        Expr::Prior { .. } => {
            Err(CalcError::undefined_var(&expr.to_string()))
        }
        Expr::BinOp(left, op, right) => {
            let l = eval_expr(left, bindings)?;
            let r = eval_expr(right, bindings)?;
            let value = match op {
                Op::Add => l + r,
                Op::Sub => l - r,
                Op::Mul => l * r,
                Op::Div => {
                    if r == 0.0 {
                        return Err(CalcError::div_zero());
                    }
                    l / r
                }
                Op::Pow => l.powf(r),
            };
            checked(value, &format!("{}{}{}", format_real(l), op.symbol().trim(), format_real(r)))
        }
        Expr::Neg(inner) => Ok(-eval_expr(inner, bindings)?),
        Expr::Call(name, args) => {
            if !FUNCTIONS.contains(&name.as_str()) {
                return Err(CalcError::undefined_func(name));
            }
            if args.len() != 1 {
                return Err(CalcError::arg_count(name, 1, args.len()));
            }
            let x = eval_expr(&args[0], bindings)?;
            apply_function(name, x)
        }
    }
}

/// Parse and evaluate in one step
pub fn evaluate(input: &str, bindings: &Bindings) -> Result<f64, CalcError> {
    let expr = parse_expr(input)?;
    eval_expr(&expr, bindings)
}

impl Expr {
    /// Rebuild the tree, letting `f` replace any node (pre-order).
    /// When `f` returns `Ok(None)` the node is kept and its children visited.
    pub fn try_map<E, F>(&self, f: &mut F) -> Result<Expr, E>
    where
        F: FnMut(&Expr) -> Result<Option<Expr>, E>,
    {
        if let Some(replacement) = f(self)? {
            return Ok(replacement);
        }
        Ok(match self {
            Expr::Num(_) | Expr::Known(_) | Expr::Var(_) | Expr::Prior { .. } => self.clone(),
            Expr::BinOp(left, op, right) => {
                Expr::BinOp(Box::new(left.try_map(f)?), *op, Box::new(right.try_map(f)?))
            }
            Expr::Neg(inner) => Expr::Neg(Box::new(inner.try_map(f)?)),
            Expr::Call(name, args) => {
                let args = args.iter().map(|a| a.try_map(f)).collect::<Result<Vec<_>, E>>()?;
                Expr::Call(name.clone(), args)
            }
        })
    }

    /// Visit every node (pre-order)
    pub fn walk<F: FnMut(&Expr)>(&self, f: &mut F) {
        f(self);
        match self {
            Expr::BinOp(left, _, right) => {
                left.walk(f);
                right.walk(f);
            }
            Expr::Neg(inner) => inner.walk(f),
            Expr::Call(_, args) => args.iter().for_each(|a| a.walk(f)),
            _ => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::BinOp(_, op, _) => op.precedence(),
            Expr::Neg(_) => NEG_PRECEDENCE,
            Expr::Num(n) | Expr::Known(n) if *n < 0.0 => NEG_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, wrap: bool) -> fmt::Result {
        if wrap {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", format_literal(*n)),
            Expr::Known(n) => write!(f, "{}", format_real(*n)),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Prior { symbol, offset } => write!(f, "{}(n-{})", symbol, offset),
            Expr::BinOp(left, op, right) => {
                let prec = op.precedence();
                let wrap_left = match op {
                    Op::Pow => left.precedence() <= prec,
                    _ => left.precedence() < prec,
                };
                let wrap_right = match op {
                    Op::Pow => right.precedence() < prec,
                    Op::Sub | Op::Div => right.precedence() <= prec,
                    _ => right.precedence() < prec,
                };
                left.fmt_child(f, wrap_left)?;
                write!(f, "{}", op.symbol())?;
                right.fmt_child(f, wrap_right)
            }
            Expr::Neg(inner) => {
                write!(f, "-")?;
                inner.fmt_child(f, inner.precedence() < NEG_PRECEDENCE)
            }
            Expr::Call(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use seqcalc_core::codes;

    fn bind(pairs: &[(&str, f64)]) -> Bindings {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize("a + b").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0], Token::Ident(_)));
        assert!(matches!(tokens[1], Token::Plus));
        assert!(matches!(tokens[2], Token::Ident(_)));
    }

    #[test]
    fn test_tokenize_double_star_is_power() {
        let tokens = tokenize("k**2").unwrap();
        assert_eq!(tokens, vec![Token::Ident("k".into()), Token::Caret, Token::Number(2.0)]);
    }

    #[test]
    fn test_tokenize_exponent_literal() {
        let tokens = tokenize("1.5e3").unwrap();
        assert_eq!(tokens, vec![Token::Number(1500.0)]);
        // no digits after e: the constant e
        let tokens = tokenize("2e").unwrap();
        assert_eq!(tokens, vec![Token::Number(2.0), Token::Ident("e".into())]);
    }

    #[test]
    fn test_parse_simple() {
        let expr = parse_expr("a + b").unwrap();
        assert!(matches!(expr, Expr::BinOp(_, Op::Add, _)));
    }

    #[test]
    fn test_parse_call_with_backward_reference() {
        let expr = parse_expr("a(n-1)").unwrap();
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "a");
                assert!(matches!(args[0], Expr::BinOp(_, Op::Sub, _)));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("(1 + 2").is_err());
        assert!(parse_expr("1 2").is_err());
        assert!(parse_expr("3 $ 4").is_err());
    }

    #[test]
    fn test_eval_arithmetic() {
        let empty = Bindings::new();
        assert_relative_eq!(evaluate("2*3 + 4", &empty).unwrap(), 10.0);
        assert_relative_eq!(evaluate("2*(3 + 4)", &empty).unwrap(), 14.0);
        assert_relative_eq!(evaluate("10 - 4 - 3", &empty).unwrap(), 3.0);
        assert_relative_eq!(evaluate("2^3^2", &empty).unwrap(), 512.0);
        assert_relative_eq!(evaluate("-2^2", &empty).unwrap(), -4.0);
        assert_relative_eq!(evaluate("2^-1", &empty).unwrap(), 0.5);
    }

    #[test]
    fn test_eval_with_bindings() {
        let ctx = bind(&[("k", 3.0)]);
        assert_relative_eq!(evaluate("k**2 + 1", &ctx).unwrap(), 10.0);
    }

    #[test]
    fn test_eval_constants_and_functions() {
        let empty = Bindings::new();
        assert_relative_eq!(evaluate("cos(pi)", &empty).unwrap(), -1.0);
        assert_relative_eq!(evaluate("ln(e)", &empty).unwrap(), 1.0);
        assert_relative_eq!(evaluate("sqrt(16) + abs(-2)", &empty).unwrap(), 6.0);
        assert_relative_eq!(evaluate("floor(2.7) + ceil(2.2)", &empty).unwrap(), 5.0);
    }

    #[test]
    fn test_bindings_shadow_constants() {
        let ctx = bind(&[("e", 10.0)]);
        assert_relative_eq!(evaluate("e + 1", &ctx).unwrap(), 11.0);
    }

    #[test]
    fn test_eval_errors() {
        let empty = Bindings::new();
        assert_eq!(evaluate("1/0", &empty).unwrap_err().code, codes::DIV_ZERO);
        assert_eq!(evaluate("x + 1", &empty).unwrap_err().code, codes::UNDEFINED_VAR);
        assert_eq!(evaluate("foo(1)", &empty).unwrap_err().code, codes::UNDEFINED_FUNC);
        assert_eq!(evaluate("sqrt(-1)", &empty).unwrap_err().code, codes::DOMAIN_ERROR);
        assert_eq!(evaluate("sqrt(1, 2)", &empty).unwrap_err().code, codes::ARG_COUNT);
        assert_eq!(evaluate("10^400", &empty).unwrap_err().code, codes::DOMAIN_ERROR);
    }

    #[test]
    fn test_display_round_trip_shape() {
        let expr = parse_expr("2*a(n-1) + 3").unwrap();
        assert_eq!(expr.to_string(), "2*a(n - 1) + 3");
        let expr = parse_expr("(1 + 2)*3").unwrap();
        assert_eq!(expr.to_string(), "(1 + 2)*3");
        let expr = parse_expr("1 - (2 - 3)").unwrap();
        assert_eq!(expr.to_string(), "1 - (2 - 3)");
        let expr = parse_expr("(-2)^2").unwrap();
        assert_eq!(expr.to_string(), "(-2)^2");
    }

    #[test]
    fn test_display_known_values() {
        let expr = Expr::BinOp(Box::new(Expr::Known(1.0)), Op::Add, Box::new(Expr::Known(0.0)));
        assert_eq!(expr.to_string(), "1.0 + 0.0");
        let expr = Expr::BinOp(Box::new(Expr::Known(-3.0)), Op::Pow, Box::new(Expr::Num(2.0)));
        assert_eq!(expr.to_string(), "(-3.0)^2");
    }

    #[test]
    fn test_try_map_replaces_nodes() {
        let expr = parse_expr("x + x*2").unwrap();
        let replaced: Result<Expr, ()> = expr.try_map(&mut |node| match node {
            Expr::Var(_) => Ok(Some(Expr::Known(4.0))),
            _ => Ok(None),
        });
        let replaced = replaced.unwrap();
        assert_relative_eq!(eval_expr(&replaced, &Bindings::new()).unwrap(), 12.0);
    }

    #[test]
    fn test_walk_counts_nodes() {
        let expr = parse_expr("sqrt(x) + 1").unwrap();
        let mut count = 0;
        expr.walk(&mut |_| count += 1);
        assert_eq!(count, 4);
    }
}
