//! Diagnostic sink for conditions that do not abort encoding.
//!
//! Warnings are recorded against the source location of the node that
//! triggered them and mirrored to `tracing`, so a caller without a
//! subscriber still gets the structured list and a caller with one sees
//! them as they happen. Rendering is left to the embedding compiler.

use std::fmt;

use crate::ast::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, location: &SourceLocation, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%location, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            location: location.clone(),
            message,
        });
    }

    pub fn error(&mut self, location: &SourceLocation, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%location, "{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            location: location.clone(),
            message,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Move every diagnostic of `other` into `self`, keeping order.
    pub fn append(&mut self, other: &mut ErrorReporter) {
        self.diagnostics.append(&mut other.diagnostics);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
