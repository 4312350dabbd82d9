use std::io::Write;
use std::process::{Command, Stdio};

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;

/// Something that can answer an SMT-LIB2 query with the solver's raw
/// stdout.
///
/// Implemented by [`CliSolver`] and by any
/// `FnMut(&str) -> Result<String, SolverError>` closure, so tests and
/// embedding compilers can plug in their own transport.
pub trait QueryRunner {
    fn query(&mut self, smtlib: &str) -> Result<String, SolverError>;
}

impl<F> QueryRunner for F
where
    F: FnMut(&str) -> Result<String, SolverError>,
{
    fn query(&mut self, smtlib: &str) -> Result<String, SolverError> {
        self(smtlib)
    }
}

/// Subprocess solver: spawns the configured binary and pipes SMT-LIB2
/// text through stdin.
#[derive(Debug, Clone)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Auto-detected Z3 with default settings.
    pub fn with_default_config() -> Result<Self, SolverError> {
        Self::with_default_config_for(SolverKind::Z3)
    }

    pub fn with_default_config_for(kind: SolverKind) -> Result<Self, SolverError> {
        let config = SolverConfig::auto_detect_for(kind)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the solver on `smtlib` and return its stdout.
    ///
    /// A `timeout` report on stderr is surfaced as stdout `unknown` so the
    /// response parser classifies it as `CheckResult::Unknown`.
    pub fn run(&self, smtlib: &str) -> Result<String, SolverError> {
        self.config.validate()?;
        let kind = self.config.kind;
        let args = self.config.build_args();

        tracing::debug!(solver = %kind, ?args, bytes = smtlib.len(), "Spawning solver");

        let mut child = Command::new(&self.config.solver_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverError::ProcessError(format!("Failed to start {kind}: {e}")))?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                SolverError::ProcessError(format!("Failed to open {kind} stdin"))
            })?;
            stdin.write_all(smtlib.as_bytes()).map_err(|e| {
                SolverError::ProcessError(format!("Failed to write to {kind} stdin: {e}"))
            })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| SolverError::ProcessError(format!("Failed to wait for {kind}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);

        if stdout.trim().is_empty() && stderr.contains("timeout") {
            return Ok("unknown".to_string());
        }
        if stdout.trim().is_empty() && !output.status.success() {
            return Err(SolverError::ProcessError(format!(
                "{kind} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

impl QueryRunner for CliSolver {
    fn query(&mut self, smtlib: &str) -> Result<String, SolverError> {
        self.run(smtlib)
    }
}
