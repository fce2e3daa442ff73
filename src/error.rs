//! Diagnostics collection.
//!
//! Transformers and analyses never panic or return `Result` for reportable
//! problems — they push a [`Diagnostic`] into the [`ErrorReport`] attached to
//! the owning [`crate::translation_unit::TranslationUnit`] and continue.

use crate::ast::position::Position;
use thiserror::Error;

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// The taxonomy of diagnostics this core can produce. Parse errors are
/// surfaced by the parser collaborator and recorded here with the same
/// shape so the driver has a single sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiagnosticKind {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("semantic error: {0}")]
    SemanticError(String),

    #[error("component error: {0}")]
    ComponentError(String),

    #[error("instantiation error: {0}")]
    InstantiationError(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("deprecated syntax: {0}")]
    DeprecatedSyntax(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub position: Option<Position>,
}

impl Diagnostic {
    #[must_use]
    pub fn error(kind: DiagnosticKind, position: Option<Position>) -> Self {
        Diagnostic { kind, severity: Severity::Error, position }
    }

    #[must_use]
    pub fn warning(kind: DiagnosticKind, position: Option<Position>) -> Self {
        Diagnostic { kind, severity: Severity::Warning, position }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{pos}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Accumulates diagnostics for a single compilation session.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReport {
    #[must_use]
    pub fn new() -> Self {
        ErrorReport::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            tracing::debug!(%diagnostic, "semantic error recorded");
        }
        self.diagnostics.push(diagnostic);
    }

    pub fn error(&mut self, kind: DiagnosticKind, position: Option<Position>) {
        self.push(Diagnostic::error(kind, position));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, position: Option<Position>) {
        self.push(Diagnostic::warning(kind, position));
    }

    #[must_use]
    pub fn num_errors(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    #[must_use]
    pub fn num_warnings(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}
