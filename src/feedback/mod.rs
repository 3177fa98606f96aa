//! Structured Feedback Module
//!
//! Machine-readable diagnostic output for editors and tooling.

use serde::Serialize;

use crate::utils::{Diagnostic, DiagnosticKind};

/// Source position of a report, 1-based
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// A diagnostic rendered for machine consumption
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    /// Diagnostic category
    pub kind: DiagnosticKind,
    /// Human-readable message
    pub message: String,
    /// Position, absent when the producing check had none
    pub location: Option<Location>,
}

impl From<&Diagnostic> for DiagnosticReport {
    fn from(diagnostic: &Diagnostic) -> Self {
        let location = diagnostic.has_position().then(|| Location {
            line: diagnostic.line,
            column: diagnostic.column,
        });
        Self {
            kind: diagnostic.kind,
            message: diagnostic.message.clone(),
            location,
        }
    }
}

impl DiagnosticReport {
    /// Serialize to a JSON object string.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.message.clone())
    }
}
