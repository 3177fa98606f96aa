//! Utility module

mod error;

pub use error::{Diagnostic, DiagnosticKind, Result};
