use std::fmt;

/// Outcome of a satisfiability query.
///
/// `Error` means the query itself failed (process crash, unparsable
/// output) and must never be read as "property holds".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    Satisfiable,
    Unsatisfiable,
    /// The solver gave up (timeout, resource limit, incomplete theory).
    Unknown,
    Error,
}

impl CheckResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, CheckResult::Satisfiable)
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, CheckResult::Unsatisfiable)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CheckResult::Unknown)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CheckResult::Error)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Satisfiable => write!(f, "sat"),
            CheckResult::Unsatisfiable => write!(f, "unsat"),
            CheckResult::Unknown => write!(f, "unknown"),
            CheckResult::Error => write!(f, "error"),
        }
    }
}

/// A [`CheckResult`] together with the model values of the terms the
/// caller asked to evaluate. `values` is empty unless the result is
/// `Satisfiable` and the backend produced a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub result: CheckResult,
    pub values: Vec<String>,
}

impl CheckOutcome {
    pub fn new(result: CheckResult, values: Vec<String>) -> Self {
        Self { result, values }
    }

    /// An outcome without model values.
    pub fn bare(result: CheckResult) -> Self {
        Self::new(result, Vec::new())
    }

    pub fn error() -> Self {
        Self::bare(CheckResult::Error)
    }
}
