use crate::error::SolverError;
use crate::result::{CheckOutcome, CheckResult};

/// Parse the stdout of a `(check-sat)` / `(get-value ...)` exchange.
///
/// Expected output format:
/// - First meaningful line: `sat`, `unsat`, `unknown` or `timeout`
/// - If `sat` and values were requested: one `((term value) ...)` block
///
/// `expected_values` is the number of terms passed to `get-value`; a
/// satisfiable answer without a matching value block is a parse error.
pub fn parse_check_response(
    stdout: &str,
    stderr: &str,
    expected_values: usize,
) -> Result<CheckOutcome, SolverError> {
    let stdout = stdout.trim();

    if stdout.is_empty() {
        if stderr.contains("timeout") {
            return Ok(CheckOutcome::bare(CheckResult::Unknown));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {stderr}"
        )));
    }

    let first_line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    match first_line {
        "unsat" => Ok(CheckOutcome::bare(CheckResult::Unsatisfiable)),
        "unknown" | "timeout" => Ok(CheckOutcome::bare(CheckResult::Unknown)),
        "sat" => {
            if expected_values == 0 {
                return Ok(CheckOutcome::bare(CheckResult::Satisfiable));
            }
            let rest = stdout
                .split_once("sat")
                .map(|(_, rest)| rest)
                .unwrap_or("");
            let values = parse_get_value(rest)?;
            if values.len() != expected_values {
                return Err(SolverError::ParseError(format!(
                    "Expected {expected_values} values, solver returned {}",
                    values.len()
                )));
            }
            Ok(CheckOutcome::new(CheckResult::Satisfiable, values))
        }
        line if line.starts_with("(error") => Err(SolverError::ProcessError(line.to_string())),
        _ => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {first_line}"
        ))),
    }
}

/// Parse a `get-value` answer: `((t1 v1) (t2 v2) ...)`, returning the
/// value texts in order.
pub fn parse_get_value(input: &str) -> Result<Vec<String>, SolverError> {
    let input = input.trim();
    let outer = SExpr::parse(input)?;
    let SExpr::List(pairs) = outer else {
        return Err(SolverError::ParseError(format!(
            "Expected a value list, got: {input}"
        )));
    };

    pairs
        .into_iter()
        .map(|pair| match pair {
            SExpr::List(mut items) if items.len() == 2 => Ok(items.remove(1).to_string()),
            other => Err(SolverError::ParseError(format!(
                "Malformed value entry: {other}"
            ))),
        })
        .collect()
}

/// Minimal S-expression used to read solver answers.
#[derive(Debug, Clone, PartialEq)]
enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    fn parse(input: &str) -> Result<SExpr, SolverError> {
        let tokens = tokenize(input);
        let mut pos = 0;
        let expr = Self::parse_tokens(&tokens, &mut pos)?;
        if pos != tokens.len() {
            return Err(SolverError::ParseError(format!(
                "Trailing input after S-expression: {input}"
            )));
        }
        Ok(expr)
    }

    fn parse_tokens(tokens: &[String], pos: &mut usize) -> Result<SExpr, SolverError> {
        let token = tokens
            .get(*pos)
            .ok_or_else(|| SolverError::ParseError("Unexpected end of input".to_string()))?;
        *pos += 1;
        match token.as_str() {
            "(" => {
                let mut items = Vec::new();
                loop {
                    match tokens.get(*pos).map(String::as_str) {
                        Some(")") => {
                            *pos += 1;
                            return Ok(SExpr::List(items));
                        }
                        Some(_) => items.push(Self::parse_tokens(tokens, pos)?),
                        None => {
                            return Err(SolverError::ParseError(
                                "Unbalanced parentheses".to_string(),
                            ));
                        }
                    }
                }
            }
            ")" => Err(SolverError::ParseError("Unexpected ')'".to_string())),
            atom => Ok(SExpr::Atom(atom.to_string())),
        }
    }
}

impl std::fmt::Display for SExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::Atom(a) => write!(f, "{a}"),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
