//! Native Z3 API backend using the z3 crate.
//!
//! `Z3NativeSolver` translates formulas straight into Z3 ASTs instead of
//! piping SMT-LIB2 text to a subprocess, and maps `push`/`pop` onto the
//! solver's own incremental scopes.
//!
//! Requires the system Z3 library (`libz3-dev` / `brew install z3`).

use std::collections::HashMap;

use num::BigInt;
use smtgas_smtlib::{Command, Formula, Operator, Script, Sort};
use z3::ast::{Bool, Int};
use z3::{SatResult, Solver};

use crate::backend::SolverBackend;
use crate::error::SolverError;
use crate::result::{CheckOutcome, CheckResult};

/// Z3 value wrapper over the two supported sorts.
#[derive(Clone, Debug)]
enum Z3Value {
    Bool(Bool),
    Int(Int),
}

/// One assertion scope.
#[derive(Debug, Default)]
struct Frame {
    /// Text mirror of what was declared and asserted, for `serialize`.
    commands: Vec<Command>,
    /// Assertions that could not be handed to Z3. A scope holding any
    /// answers every check with `CheckResult::Error`.
    rejected: usize,
}

pub struct Z3NativeSolver {
    solver: Solver,
    symbols: HashMap<String, Z3Value>,
    frames: Vec<Frame>,
}

impl Z3NativeSolver {
    pub fn new() -> Self {
        Self {
            solver: Solver::new(),
            symbols: HashMap::new(),
            frames: vec![Frame::default()],
        }
    }

    fn rejected(&self) -> usize {
        self.frames.iter().map(|f| f.rejected).sum()
    }

    fn reject(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.rejected += 1;
        }
    }

    fn declare(&mut self, name: &str, sort: Sort) -> Z3Value {
        if let Some(value) = self.symbols.get(name) {
            return value.clone();
        }
        let value = match sort {
            Sort::Bool => Z3Value::Bool(Bool::new_const(name)),
            Sort::Int => Z3Value::Int(Int::new_const(name)),
        };
        self.symbols.insert(name.to_string(), value.clone());
        if let Some(frame) = self.frames.last_mut() {
            frame.commands.push(Command::DeclareConst(name.to_string(), sort));
        }
        value
    }

    fn translate(&mut self, formula: &Formula) -> Result<Z3Value, SolverError> {
        match formula {
            Formula::Declared { name, sort } => Ok(self.declare(name, *sort)),
            Formula::Leaf { name, sort } => translate_leaf(&self.symbols, name, *sort),
            Formula::Apply { op, args, .. } => {
                let args = args
                    .iter()
                    .map(|a| self.translate(a))
                    .collect::<Result<Vec<_>, _>>()?;
                translate_apply(*op, args)
            }
        }
    }
}

impl Default for Z3NativeSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn translate_leaf(
    symbols: &HashMap<String, Z3Value>,
    name: &str,
    sort: Sort,
) -> Result<Z3Value, SolverError> {
    match (name, sort) {
        ("true", Sort::Bool) => Ok(Z3Value::Bool(Bool::from_bool(true))),
        ("false", Sort::Bool) => Ok(Z3Value::Bool(Bool::from_bool(false))),
        (_, Sort::Int) if name.starts_with("(- ") => {
            let digits = name.trim_start_matches("(- ").trim_end_matches(')');
            Ok(Z3Value::Int(numeral(digits)?.unary_minus()))
        }
        (_, Sort::Int) if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) => {
            Ok(Z3Value::Int(numeral(name)?))
        }
        _ => symbols
            .get(name)
            .cloned()
            .ok_or_else(|| SolverError::ParseError(format!("Undefined symbol: {name}"))),
    }
}

/// Arbitrary-precision non-negative numeral.
fn numeral(digits: &str) -> Result<Int, SolverError> {
    let value: BigInt = digits
        .parse()
        .map_err(|_| SolverError::ParseError(format!("Malformed numeral: {digits}")))?;
    Ok(Int::from_big_int(&value))
}

fn translate_apply(op: Operator, args: Vec<Z3Value>) -> Result<Z3Value, SolverError> {
    use Z3Value::{Bool as B, Int as I};

    let mismatch = || SolverError::Unsupported(format!("ill-sorted arguments to `{op}`"));
    let value = match (op, args.as_slice()) {
        (Operator::Not, [B(a)]) => B(a.not()),
        (Operator::And, [B(a), B(b)]) => B(Bool::and(&[a, b])),
        (Operator::Or, [B(a), B(b)]) => B(Bool::or(&[a, b])),
        (Operator::Eq, [B(a), B(b)]) => B(a.eq(b)),
        (Operator::Eq, [I(a), I(b)]) => B(a.eq(b)),
        (Operator::Lt, [I(a), I(b)]) => B(a.lt(b)),
        (Operator::Le, [I(a), I(b)]) => B(a.le(b)),
        (Operator::Gt, [I(a), I(b)]) => B(a.gt(b)),
        (Operator::Ge, [I(a), I(b)]) => B(a.ge(b)),
        (Operator::Add, [I(a), I(b)]) => I(Int::add(&[a, b])),
        (Operator::Sub, [I(a), I(b)]) => I(Int::sub(&[a, b])),
        (Operator::Mul, [I(a), I(b)]) => I(Int::mul(&[a, b])),
        (Operator::Div, [I(a), I(b)]) => I(a.div(b)),
        (Operator::Ite, [B(c), I(t), I(e)]) => I(c.ite(t, e)),
        (Operator::Ite, [B(c), B(t), B(e)]) => B(c.ite(t, e)),
        _ => return Err(mismatch()),
    };
    Ok(value)
}

impl SolverBackend for Z3NativeSolver {
    fn declare_int(&mut self, name: &str) -> Formula {
        self.declare(name, Sort::Int);
        Formula::leaf(name, Sort::Int)
    }

    fn declare_bool(&mut self, name: &str) -> Formula {
        self.declare(name, Sort::Bool);
        Formula::leaf(name, Sort::Bool)
    }

    fn assert(&mut self, term: &Formula) {
        match self.translate(term) {
            Ok(Z3Value::Bool(b)) => {
                self.solver.assert(&b);
                if let Some(frame) = self.frames.last_mut() {
                    frame.commands.push(Command::Assert(term.clone()));
                }
            }
            Ok(Z3Value::Int(_)) => {
                tracing::warn!(%term, "Rejecting non-Bool assertion");
                self.reject();
            }
            Err(e) => {
                tracing::warn!(error = %e, %term, "Could not translate assertion");
                self.reject();
            }
        }
    }

    fn check(&mut self, to_evaluate: &[Formula]) -> CheckOutcome {
        let rejected = self.rejected();
        if rejected > 0 {
            tracing::warn!(rejected, "Assertions missing from the solver, not checking");
            return CheckOutcome::error();
        }
        let start = std::time::Instant::now();
        let result = match self.solver.check() {
            SatResult::Sat => CheckResult::Satisfiable,
            SatResult::Unsat => CheckResult::Unsatisfiable,
            SatResult::Unknown => CheckResult::Unknown,
        };
        tracing::debug!(%result, elapsed = ?start.elapsed(), "Z3 native check");

        if result != CheckResult::Satisfiable || to_evaluate.is_empty() {
            return CheckOutcome::bare(result);
        }
        let Some(model) = self.solver.get_model() else {
            return CheckOutcome::bare(result);
        };

        let mut values = Vec::with_capacity(to_evaluate.len());
        for term in to_evaluate {
            let value = match self.translate(term) {
                Ok(Z3Value::Bool(b)) => model.eval(&b, true).map(|v: Bool| v.to_string()),
                Ok(Z3Value::Int(i)) => model.eval(&i, true).map(|v: Int| v.to_string()),
                Err(e) => {
                    tracing::warn!(error = %e, %term, "Could not evaluate term");
                    return CheckOutcome::error();
                }
            };
            match value {
                Some(v) => values.push(v),
                None => return CheckOutcome::error(),
            }
        }
        CheckOutcome::new(result, values)
    }

    fn push(&mut self) {
        self.solver.push();
        self.frames.push(Frame::default());
    }

    fn pop(&mut self) -> Result<(), SolverError> {
        if self.frames.len() == 1 {
            return Err(SolverError::Unsupported(
                "pop without matching push".to_string(),
            ));
        }
        self.solver.pop(1);
        if let Some(frame) = self.frames.pop() {
            for cmd in frame.commands {
                if let Command::DeclareConst(name, _) = cmd {
                    self.symbols.remove(&name);
                }
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.solver.reset();
        self.symbols.clear();
        self.frames = vec![Frame::default()];
    }

    fn serialize(&self) -> String {
        Script::with_commands(
            self.frames
                .iter()
                .flat_map(|f| f.commands.iter().cloned())
                .collect(),
        )
        .to_string()
    }
}
