//! Error handling for the Rovar front end

use serde::Serialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A production's required token pattern was absent
    SyntaxError,
    /// An identifier did not resolve to a visible declaration
    UndeclaredVariable,
    /// Operand or assignment types disagree
    TypeError,
    /// A name was declared twice in the same scope
    DuplicateDeclaration,
    /// Unclassified problem
    Unknown,
}

/// A structured report of a syntax or semantic problem.
///
/// `line` and `column` are 1-based. `0,0` means the producing check had no
/// position context. The first diagnostic is terminal for the compile.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
        }
    }

    /// A syntax error positioned at the offending token.
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(DiagnosticKind::SyntaxError, message, line, column)
    }

    /// A semantic error. Tree nodes carry no positions, so these use the
    /// `0,0` sentinel.
    pub fn semantic(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, 0, 0)
    }

    pub fn has_position(&self) -> bool {
        self.line != 0 || self.column != 0
    }

    /// Render for human consumption, with the position prefix when one is
    /// known.
    pub fn render(&self) -> String {
        if self.has_position() {
            format!("line {}, column {}: {}", self.line, self.column, self.message)
        } else {
            self.message.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_position() {
        let diagnostic = Diagnostic::syntax("expected ';'", 3, 14);
        assert_eq!(diagnostic.render(), "line 3, column 14: expected ';'");
    }

    #[test]
    fn semantic_uses_position_sentinel() {
        let diagnostic = Diagnostic::semantic(
            DiagnosticKind::UndeclaredVariable,
            "Variable 'foo' undeclared",
        );
        assert!(!diagnostic.has_position());
        assert_eq!(diagnostic.render(), "Variable 'foo' undeclared");
    }
}
