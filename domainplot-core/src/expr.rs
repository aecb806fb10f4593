//! Postfix (reverse-Polish) expressions over one complex variable.
//!
//! An expression is a whitespace-separated list of tokens: complex literals,
//! the variable `z`, the binary operators `+ - * / ^` (with `×` and `÷` as
//! aliases), and the unary functions `conj inv exp ln sin cos abs arg re im`.
//! A run of operator symbols with no whitespace between them (`++`) is read
//! as that many separate operators.
//!
//! Literal grammar: an optional `-`, then either digits with an optional
//! decimal point and fraction (`3`, `3.`, `3.25`), optionally followed by
//! `i` or `j`, or a bare `i`/`j` with an implied coefficient of 1. A leading
//! `+`, a leading `.`, exponents, and two-part literals such as `1+2i` are
//! not literals.

use std::fmt;
use std::str::FromStr;

use crate::arith;
use crate::complex::Complex;
use crate::error::CoreError;

/// The symbol bound to the input value.
pub const VARIABLE: &str = "z";

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' | '×' => Some(Self::Mul),
            '/' | '÷' => Some(Self::Div),
            '^' => Some(Self::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
        }
    }

    /// `lhs OP rhs`.
    #[inline]
    pub fn apply(self, lhs: Complex, rhs: Complex) -> crate::Result<Complex> {
        Ok(match self {
            Self::Add => arith::add(lhs, rhs),
            Self::Sub => arith::sub(lhs, rhs),
            Self::Mul => arith::mul(lhs, rhs),
            Self::Div => arith::div(lhs, rhs)?,
            Self::Pow => arith::pow(lhs, rhs),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Conj,
    Inv,
    Exp,
    Ln,
    Sin,
    Cos,
    Abs,
    Arg,
    Re,
    Im,
}

impl UnaryOp {
    pub const ALL: [Self; 10] = [
        Self::Conj,
        Self::Inv,
        Self::Exp,
        Self::Ln,
        Self::Sin,
        Self::Cos,
        Self::Abs,
        Self::Arg,
        Self::Re,
        Self::Im,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Conj => "conj",
            Self::Inv => "inv",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Abs => "abs",
            Self::Arg => "arg",
            Self::Re => "re",
            Self::Im => "im",
        }
    }

    #[inline]
    pub fn apply(self, z: Complex) -> crate::Result<Complex> {
        Ok(match self {
            Self::Conj => arith::conj(z),
            Self::Inv => arith::inv(z)?,
            Self::Exp => arith::exp(z),
            Self::Ln => arith::ln(z),
            Self::Sin => arith::sin(z),
            Self::Cos => arith::cos(z),
            Self::Abs => arith::modulus(z),
            Self::Arg => arith::argument(z),
            Self::Re => arith::real_part(z),
            Self::Im => arith::imag_part(z),
        })
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// One classified lexical unit of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    Literal(Complex),
    Variable,
    Binary(BinaryOp),
    Unary(UnaryOp),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(c) => write!(f, "{c}"),
            Self::Variable => f.write_str(VARIABLE),
            Self::Binary(op) => write!(f, "{}", op.symbol()),
            Self::Unary(op) => f.write_str(op.name()),
        }
    }
}

/// Parse a complex literal, or `None` if `s` does not follow the literal
/// grammar.
pub fn parse_literal(s: &str) -> Option<Complex> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (coefficient, imaginary) = match body.strip_suffix(|c: char| c == 'i' || c == 'j') {
        Some(rest) => (rest, true),
        None => (body, false),
    };

    let magnitude = if coefficient.is_empty() {
        if !imaginary {
            return None;
        }
        1.0
    } else {
        if !is_decimal(coefficient) {
            return None;
        }
        coefficient.parse::<f64>().ok()?
    };

    let value = if negative { -magnitude } else { magnitude };
    Some(if imaginary {
        Complex::new(0.0, value)
    } else {
        Complex::from_real(value)
    })
}

/// `digit+ ('.' digit*)?`
fn is_decimal(s: &str) -> bool {
    let (whole, fraction) = match s.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (s, ""),
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

/// Classify a single lexeme.
pub fn classify(lexeme: &str) -> crate::Result<Token> {
    if let Some(value) = parse_literal(lexeme) {
        return Ok(Token::Literal(value));
    }
    if lexeme == VARIABLE {
        return Ok(Token::Variable);
    }
    let mut chars = lexeme.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(op) = BinaryOp::from_symbol(c) {
            return Ok(Token::Binary(op));
        }
    }
    if let Some(op) = UnaryOp::from_name(lexeme) {
        return Ok(Token::Unary(op));
    }
    Err(CoreError::InvalidToken(lexeme.to_string()))
}

fn is_operator_symbol(c: char) -> bool {
    BinaryOp::from_symbol(c).is_some()
}

/// Split on whitespace, then split runs of operator symbols into single
/// operators.
fn lexemes(source: &str) -> impl Iterator<Item = &str> + '_ {
    source.split_whitespace().flat_map(|word| {
        let split = word.chars().nth(1).is_some() && word.chars().all(is_operator_symbol);
        let mut rest = word;
        std::iter::from_fn(move || {
            let first = rest.chars().next()?;
            let end = if split { first.len_utf8() } else { rest.len() };
            let (head, tail) = rest.split_at(end);
            rest = tail;
            Some(head)
        })
    })
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[inline]
fn pop(stack: &mut Vec<Complex>, token: &Token) -> crate::Result<Complex> {
    stack.pop().ok_or_else(|| CoreError::MalformedExpression {
        reason: format!("`{token}` is missing an operand"),
    })
}

/// Apply one token to the evaluation stack.
#[inline]
fn step(token: &Token, z: Complex, stack: &mut Vec<Complex>) -> crate::Result<()> {
    match *token {
        Token::Literal(value) => stack.push(value),
        Token::Variable => stack.push(z),
        Token::Binary(op) => {
            let rhs = pop(stack, token)?;
            let lhs = pop(stack, token)?;
            stack.push(op.apply(lhs, rhs)?);
        }
        Token::Unary(op) => {
            let arg = pop(stack, token)?;
            stack.push(op.apply(arg)?);
        }
    }
    Ok(())
}

fn finish(stack: &[Complex]) -> crate::Result<Complex> {
    match stack {
        [result] => Ok(*result),
        rest => Err(stack_size_error(rest.len())),
    }
}

fn stack_size_error(len: usize) -> CoreError {
    let reason = if len == 0 {
        "expression produces no value".to_string()
    } else {
        format!("{len} values left on the stack, expected 1")
    };
    CoreError::MalformedExpression { reason }
}

/// Evaluate `source` at `z` in a single left-to-right pass.
///
/// Errors are reported in token order: a division by zero early in the
/// expression wins over an unknown token later on.
pub fn evaluate(source: &str, z: Complex) -> crate::Result<Complex> {
    let mut stack = Vec::new();
    for lexeme in lexemes(source) {
        step(&classify(lexeme)?, z, &mut stack)?;
    }
    finish(&stack)
}

/// A tokenized, structurally valid postfix expression.
///
/// Parsing checks every token and the stack discipline once, so evaluating
/// per pixel only dispatches on pre-classified tokens. Only value-dependent
/// failures (division by zero) remain possible at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    tokens: Vec<Token>,
    max_depth: usize,
}

impl Expression {
    pub fn parse(source: &str) -> crate::Result<Self> {
        let mut tokens = Vec::new();
        let mut depth = 0usize;
        let mut max_depth = 0usize;

        for lexeme in lexemes(source) {
            let token = classify(lexeme)?;
            let arity = match token {
                Token::Literal(_) | Token::Variable => 0,
                Token::Unary(_) => 1,
                Token::Binary(_) => 2,
            };
            if depth < arity {
                return Err(CoreError::MalformedExpression {
                    reason: format!("`{token}` is missing an operand"),
                });
            }
            depth = depth - arity + 1;
            max_depth = max_depth.max(depth);
            tokens.push(token);
        }

        if depth != 1 {
            return Err(stack_size_error(depth));
        }

        Ok(Self {
            source: source.trim().to_string(),
            tokens,
            max_depth,
        })
    }

    /// The source text, trimmed.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Deepest the evaluation stack gets.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// A scratch stack sized for this expression, for [`eval_with`](Self::eval_with).
    pub fn scratch(&self) -> Vec<Complex> {
        Vec::with_capacity(self.max_depth)
    }

    pub fn eval(&self, z: Complex) -> crate::Result<Complex> {
        let mut stack = self.scratch();
        self.eval_with(z, &mut stack)
    }

    /// Evaluate reusing `stack`, which is cleared first. Lets a render loop
    /// evaluate many points without allocating per pixel.
    #[inline]
    pub fn eval_with(&self, z: Complex, stack: &mut Vec<Complex>) -> crate::Result<Complex> {
        stack.clear();
        for token in &self.tokens {
            step(token, z, stack)?;
        }
        finish(stack)
    }
}

impl Default for Expression {
    /// The identity function `z`.
    fn default() -> Self {
        Self {
            source: VARIABLE.to_string(),
            tokens: vec![Token::Variable],
            max_depth: 1,
        }
    }
}

impl FromStr for Expression {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn approx(a: Complex, b: Complex) -> bool {
        (a.re - b.re).abs() < EPSILON && (a.im - b.im).abs() < EPSILON
    }

    fn eval(src: &str, z: Complex) -> crate::Result<Complex> {
        Expression::parse(src)?.eval(z)
    }

    #[test]
    fn literals() {
        assert_eq!(parse_literal("3"), Some(Complex::from_real(3.0)));
        assert_eq!(parse_literal("-2.5"), Some(Complex::from_real(-2.5)));
        assert_eq!(parse_literal("4."), Some(Complex::from_real(4.0)));
        assert_eq!(parse_literal("2i"), Some(Complex::new(0.0, 2.0)));
        assert_eq!(parse_literal("-0.5j"), Some(Complex::new(0.0, -0.5)));
        assert_eq!(parse_literal("i"), Some(Complex::I));
        assert_eq!(parse_literal("-j"), Some(Complex::new(0.0, -1.0)));
    }

    #[test]
    fn non_literals() {
        for s in ["", "-", "+3", ".5", "1e5", "1+2i", "ij", "1.2.3", "i2", "abc", "--1"] {
            assert_eq!(parse_literal(s), None, "{s:?} should not be a literal");
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify("z").unwrap(), Token::Variable);
        assert_eq!(classify("-").unwrap(), Token::Binary(BinaryOp::Sub));
        assert_eq!(classify("÷").unwrap(), Token::Binary(BinaryOp::Div));
        assert_eq!(classify("im").unwrap(), Token::Unary(UnaryOp::Im));
        assert_eq!(classify("i").unwrap(), Token::Literal(Complex::I));
        assert_eq!(
            classify("foo"),
            Err(CoreError::InvalidToken("foo".into()))
        );
    }

    #[test]
    fn every_unary_name_round_trips() {
        for op in UnaryOp::ALL {
            assert_eq!(UnaryOp::from_name(op.name()), Some(op));
        }
    }

    #[test]
    fn identity() {
        let z = Complex::new(-1.0, 1.0);
        assert_eq!(eval("z", z).unwrap(), z);
    }

    #[test]
    fn squaring() {
        let r = eval("z z *", Complex::new(2.0, 3.0)).unwrap();
        assert!(approx(r, Complex::new(-5.0, 12.0)));
    }

    #[test]
    fn operand_order_matches_infix() {
        let zero = Complex::ZERO;
        assert_eq!(eval("5 3 -", zero).unwrap(), Complex::from_real(2.0));
        assert_eq!(eval("6 3 /", zero).unwrap(), Complex::from_real(2.0));
        assert!(approx(eval("2 3 ^", zero).unwrap(), Complex::from_real(8.0)));
    }

    #[test]
    fn unary_functions() {
        let z = Complex::new(3.0, 4.0);
        assert_eq!(eval("z abs", z).unwrap(), Complex::from_real(5.0));
        assert_eq!(eval("z re", z).unwrap(), Complex::from_real(3.0));
        assert_eq!(eval("z im", z).unwrap(), Complex::from_real(4.0));
        assert_eq!(eval("z conj", z).unwrap(), Complex::new(3.0, -4.0));
        assert!(approx(eval("z inv z *", z).unwrap(), Complex::ONE));
        assert!(approx(eval("z exp ln", Complex::new(0.5, 0.5)).unwrap(), Complex::new(0.5, 0.5)));
    }

    #[test]
    fn imaginary_literals_in_expressions() {
        // z + 2i, and i * i = -1
        let r = eval("z 2i +", Complex::ONE).unwrap();
        assert_eq!(r, Complex::new(1.0, 2.0));
        assert!(approx(eval("i i *", Complex::ZERO).unwrap(), Complex::from_real(-1.0)));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(eval("1 0 /", Complex::ZERO), Err(CoreError::DivisionByZero));
        assert_eq!(evaluate("1 0 /", Complex::ZERO), Err(CoreError::DivisionByZero));
        assert_eq!(eval("z inv", Complex::ZERO), Err(CoreError::DivisionByZero));
    }

    #[test]
    fn trailing_operator_underflows() {
        assert!(matches!(
            Expression::parse("z z + ++"),
            Err(CoreError::MalformedExpression { .. })
        ));
        assert!(matches!(
            evaluate("z z + ++", Complex::ONE),
            Err(CoreError::MalformedExpression { .. })
        ));
    }

    #[test]
    fn unknown_token_is_named() {
        assert_eq!(
            Expression::parse("z foo"),
            Err(CoreError::InvalidToken("foo".into()))
        );
        assert_eq!(
            evaluate("z foo", Complex::ONE),
            Err(CoreError::InvalidToken("foo".into()))
        );
    }

    #[test]
    fn wrong_final_stack_size() {
        for src in ["", "   ", "1 2", "z z z +"] {
            assert!(
                matches!(
                    Expression::parse(src),
                    Err(CoreError::MalformedExpression { .. })
                ),
                "{src:?}"
            );
        }
        assert!(matches!(Expression::parse("sin"), Err(CoreError::MalformedExpression { .. })));
    }

    #[test]
    fn streaming_evaluation_reports_first_error() {
        assert_eq!(
            evaluate("1 0 / foo", Complex::ZERO),
            Err(CoreError::DivisionByZero)
        );
        // Parsing validates the whole expression before any arithmetic.
        assert_eq!(
            Expression::parse("1 0 / foo"),
            Err(CoreError::InvalidToken("foo".into()))
        );
    }

    #[test]
    fn operator_runs_split() {
        let e = Expression::parse("1 2 3 ++").unwrap();
        assert_eq!(e.tokens().len(), 5);
        assert_eq!(e.eval(Complex::ZERO).unwrap(), Complex::from_real(6.0));
    }

    #[test]
    fn scratch_stack_is_reused() {
        let e = Expression::parse("z 1 + z 1 - *").unwrap();
        assert_eq!(e.max_depth(), 3);
        let mut stack = e.scratch();
        let a = e.eval_with(Complex::from_real(2.0), &mut stack).unwrap();
        let b = e.eval_with(Complex::from_real(3.0), &mut stack).unwrap();
        assert_eq!(a, Complex::from_real(3.0));
        assert_eq!(b, Complex::from_real(8.0));
    }

    #[test]
    fn from_str_and_display() {
        let e: Expression = "  z sin ".parse().unwrap();
        assert_eq!(e.to_string(), "z sin");
        assert_eq!(e.source(), "z sin");
    }
}
