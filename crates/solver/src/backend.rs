//! Capability contract of a pluggable solver backend.
//!
//! The function encoder only needs to declare free variables, accumulate
//! assertions in nested scopes, ask for satisfiability (optionally with
//! model values) and dump what it accumulated. Both the text-protocol
//! backend ([`SmtLib2Interface`](crate::smtlib2::SmtLib2Interface)) and the
//! native Z3 backend (feature `z3-native`) implement this trait.

use smtgas_smtlib::Formula;

use crate::error::SolverError;
use crate::result::CheckOutcome;

pub trait SolverBackend {
    /// Declare a fresh integer constant and return the term naming it.
    fn declare_int(&mut self, name: &str) -> Formula;

    /// Declare a fresh boolean constant and return the term naming it.
    fn declare_bool(&mut self, name: &str) -> Formula;

    /// Accumulate a constraint in the current scope. Free variables carried
    /// by the formula are declared on the fly.
    fn assert(&mut self, term: &Formula);

    /// Check satisfiability and, if a model exists, evaluate `to_evaluate`
    /// in it. Query failures come back as `CheckResult::Error`.
    fn check(&mut self, to_evaluate: &[Formula]) -> CheckOutcome;

    /// Open a nested assertion scope.
    fn push(&mut self);

    /// Drop the innermost scope. Fails when no scope is open.
    fn pop(&mut self) -> Result<(), SolverError>;

    /// Drop every declaration, assertion and scope.
    fn reset(&mut self);

    /// Accumulated declarations and assertions in SMT-LIB2 syntax.
    fn serialize(&self) -> String;
}
