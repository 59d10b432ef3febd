use std::fmt;

use crate::ErrorCode;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
    /// Internal consistency failure; the runtime stops after reporting it.
    SystemError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::SystemError => write!(f, "system error"),
        }
    }
}

/// A structured message for the error channel.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported, not silently dropped"]
pub struct Diagnostic {
    /// Code for searchability.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Main message.
    pub message: String,
    /// Additional lines printed after the message.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity, message: String) -> Self {
        Diagnostic {
            code,
            severity,
            message,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new_with_severity(code, Severity::Error, message.into())
    }

    /// Create a warning diagnostic.
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new_with_severity(code, Severity::Warning, message.into())
    }

    /// Create a system error diagnostic for an internal consistency failure.
    pub fn system_error(subsystem: &'static str, number: u16, message: impl Into<String>) -> Self {
        Self::new_with_severity(
            ErrorCode::System { subsystem, number },
            Severity::SystemError,
            message.into(),
        )
    }

    /// Add a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Check if this is an error (including system errors).
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::SystemError)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "[{}] {}", self.code, self.message)?,
            Severity::Warning => write!(f, "[{}] WARNING: {}", self.code, self.message)?,
            Severity::SystemError => {
                writeln!(f, "*** SYSTEM ERROR ***")?;
                write!(f, "[{}] {}", self.code, self.message)?;
            }
        }
        for note in &self.notes {
            write!(f, "\n  {note}")?;
        }
        Ok(())
    }
}
