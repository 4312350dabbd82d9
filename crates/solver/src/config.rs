//! Where the subprocess solver lives and how it is invoked.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SolverError;

/// Solvers that read SMT-LIB2 from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    Z3,
    Cvc5,
}

impl SolverKind {
    pub fn binary_name(self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
        }
    }

    /// Command line for one query; `timeout_ms == 0` means no limit.
    fn command_line(self, timeout_ms: u64) -> Vec<String> {
        let (base, timeout): (&[&str], String) = match self {
            SolverKind::Z3 => (&["-in", "-smt2"], format!("-t:{timeout_ms}")),
            SolverKind::Cvc5 => (
                &["--lang", "smt2", "--produce-models", "--incremental"],
                format!("--tlimit={timeout_ms}"),
            ),
        };
        let mut args: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        if timeout_ms > 0 {
            args.push(timeout);
        }
        args
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolverKind::Z3 => "Z3",
            SolverKind::Cvc5 => "CVC5",
        })
    }
}

/// Solver binary plus the per-query time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub kind: SolverKind,
    pub solver_path: PathBuf,
    /// Milliseconds, 0 for none.
    pub timeout_ms: u64,
}

impl SolverConfig {
    pub fn new(kind: SolverKind, solver_path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            solver_path: solver_path.into(),
            timeout_ms: 0,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// First `kind` binary on `PATH`.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        let path = std::env::var_os("PATH").unwrap_or_default();
        Self::find_in(kind, std::env::split_paths(&path))
    }

    /// Z3 on `PATH`.
    pub fn auto_detect() -> Result<Self, SolverError> {
        Self::auto_detect_for(SolverKind::Z3)
    }

    fn find_in(
        kind: SolverKind,
        dirs: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Self, SolverError> {
        dirs.into_iter()
            .map(|dir| dir.join(kind.binary_name()))
            .find(|candidate| candidate.is_file())
            .map(|found| {
                tracing::debug!(solver = %kind, path = %found.display(), "Found solver");
                Self::new(kind, found)
            })
            .ok_or_else(|| SolverError::NotFound(kind, PathBuf::from(kind.binary_name())))
    }

    pub fn build_args(&self) -> Vec<String> {
        self.kind.command_line(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        if Path::new(&self.solver_path).is_file() {
            Ok(())
        } else {
            Err(SolverError::NotFound(self.kind, self.solver_path.clone()))
        }
    }
}
