//! Text-protocol backend.
//!
//! Keeps declarations and assertions as SMT-LIB2 commands, scoped by
//! `push`/`pop`, and answers `check` by sending the accumulated script,
//! `(check-sat)` and an optional `(get-value ...)` to a [`QueryRunner`].

use std::collections::HashSet;

use smtgas_smtlib::{Command, Formula, Script, Sort};

use crate::backend::SolverBackend;
use crate::error::SolverError;
use crate::parser::parse_check_response;
use crate::result::CheckOutcome;
use crate::solver::{CliSolver, QueryRunner};

#[derive(Debug, Clone, Default)]
struct Frame {
    declarations: Vec<(String, Sort)>,
    assertions: Vec<Formula>,
}

pub struct SmtLib2Interface {
    frames: Vec<Frame>,
    declared: HashSet<String>,
    runner: Option<Box<dyn QueryRunner>>,
}

impl SmtLib2Interface {
    /// A backend that records but cannot answer queries; `check` returns
    /// `CheckResult::Error` until a runner is attached.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            declared: HashSet::new(),
            runner: None,
        }
    }

    pub fn with_runner(runner: impl QueryRunner + 'static) -> Self {
        Self {
            runner: Some(Box::new(runner)),
            ..Self::new()
        }
    }

    /// Backend driving an auto-detected Z3 subprocess.
    pub fn with_default_solver() -> Result<Self, SolverError> {
        Ok(Self::with_runner(CliSolver::with_default_config()?))
    }

    pub fn set_runner(&mut self, runner: impl QueryRunner + 'static) {
        self.runner = Some(Box::new(runner));
    }

    /// Number of open scopes above the base frame.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Formula> {
        self.frames.iter().flat_map(|f| f.assertions.iter())
    }

    fn declare(&mut self, name: &str, sort: Sort) {
        if self.declared.insert(name.to_string()) {
            tracing::trace!(name, %sort, "Declaring constant");
            self.top_mut().declarations.push((name.to_string(), sort));
        }
    }

    fn top_mut(&mut self) -> &mut Frame {
        // The base frame is never popped.
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Script with every live declaration followed by every live assertion.
    pub fn script(&self) -> Script {
        let mut script = Script::new();
        script.extend(self.frames.iter().flat_map(|f| {
            f.declarations
                .iter()
                .map(|(name, sort)| Command::DeclareConst(name.clone(), *sort))
        }));
        script.extend(
            self.assertions()
                .map(|assertion| Command::Assert(assertion.clone())),
        );
        script
    }

    fn query_text(&self, to_evaluate: &[Formula]) -> String {
        let mut script = Script::new();
        if !to_evaluate.is_empty() {
            script.push(Command::SetOption(
                "produce-models".to_string(),
                "true".to_string(),
            ));
        }
        script.extend(self.script().into_commands());

        // Terms to evaluate may mention variables no assertion introduced.
        let extra: Vec<(String, Sort)> = to_evaluate
            .iter()
            .flat_map(Formula::free_variables)
            .filter(|(name, _)| !self.declared.contains(name))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        script.extend(
            extra
                .into_iter()
                .map(|(name, sort)| Command::DeclareConst(name, sort)),
        );

        script.push(Command::CheckSat);
        if !to_evaluate.is_empty() {
            script.push(Command::GetValue(to_evaluate.to_vec()));
        }
        let mut text = script.to_string();
        text.push('\n');
        text
    }
}

impl Default for SmtLib2Interface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SmtLib2Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtLib2Interface")
            .field("frames", &self.frames)
            .field("has_runner", &self.runner.is_some())
            .finish()
    }
}

impl SolverBackend for SmtLib2Interface {
    fn declare_int(&mut self, name: &str) -> Formula {
        self.declare(name, Sort::Int);
        Formula::leaf(name, Sort::Int)
    }

    fn declare_bool(&mut self, name: &str) -> Formula {
        self.declare(name, Sort::Bool);
        Formula::leaf(name, Sort::Bool)
    }

    fn assert(&mut self, term: &Formula) {
        for (name, sort) in term.free_variables() {
            self.declare(&name, sort);
        }
        self.top_mut().assertions.push(term.clone());
    }

    fn check(&mut self, to_evaluate: &[Formula]) -> CheckOutcome {
        let query = self.query_text(to_evaluate);
        let Some(runner) = self.runner.as_mut() else {
            tracing::warn!("No query runner attached to the SMT-LIB2 backend");
            return CheckOutcome::error();
        };

        tracing::debug!(bytes = query.len(), values = to_evaluate.len(), "Running solver query");
        let response = runner
            .query(&query)
            .and_then(|stdout| parse_check_response(&stdout, "", to_evaluate.len()));

        match response {
            Ok(outcome) => {
                tracing::debug!(result = %outcome.result, "Solver answered");
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, "Solver query failed");
                CheckOutcome::error()
            }
        }
    }

    fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    fn pop(&mut self) -> Result<(), SolverError> {
        if self.frames.len() == 1 {
            return Err(SolverError::Unsupported(
                "pop without matching push".to_string(),
            ));
        }
        if let Some(frame) = self.frames.pop() {
            for (name, _) in frame.declarations {
                self.declared.remove(&name);
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.frames = vec![Frame::default()];
        self.declared.clear();
    }

    fn serialize(&self) -> String {
        self.script().to_string()
    }
}
