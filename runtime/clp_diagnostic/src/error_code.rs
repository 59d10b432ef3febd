use std::fmt;

/// Diagnostic codes.
///
/// Rendered as `<SUBSYSTEM><number>` (e.g. `ARGACCES4`), the tag users
/// search for when a message appears on the error channel.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Argument access (ARGACCES)
    /// Request for an argument position the call does not have
    NonexistentArgument,
    /// Wrong number of arguments
    ArgCount,
    /// Argument of the wrong type
    ArgType,

    // Evaluation (EVALUATN)
    /// Variable referenced without a binding
    UnboundVariable,
    /// Evaluation nested deeper than the configured limit
    DepthExceeded,
    /// Function called with a body shape that does not match its return tag
    ReturnShapeMismatch,

    // Printing utilities (PRNTUTIL)
    /// Division or modulus by zero in an arithmetic primitive
    DivideByZero,

    // Routers (ROUTER)
    /// Output requested on a logical name no router recognizes
    UnknownLogicalName,

    /// Internal consistency failure reported by a runtime subsystem.
    System { subsystem: &'static str, number: u16 },
    /// Code owned by an extension layer (constructs, object system, ...).
    Custom { subsystem: &'static str, number: u16 },
}

impl ErrorCode {
    /// Subsystem tag, e.g. `"ARGACCES"`.
    pub fn subsystem(&self) -> &'static str {
        match self {
            ErrorCode::NonexistentArgument | ErrorCode::ArgCount | ErrorCode::ArgType => "ARGACCES",
            ErrorCode::UnboundVariable
            | ErrorCode::DepthExceeded
            | ErrorCode::ReturnShapeMismatch => "EVALUATN",
            ErrorCode::DivideByZero => "PRNTUTIL",
            ErrorCode::UnknownLogicalName => "ROUTER",
            ErrorCode::System { subsystem, .. } | ErrorCode::Custom { subsystem, .. } => *subsystem,
        }
    }

    /// Number within the subsystem.
    pub fn number(&self) -> u16 {
        match self {
            ErrorCode::UnboundVariable | ErrorCode::UnknownLogicalName => 1,
            ErrorCode::DepthExceeded => 2,
            ErrorCode::NonexistentArgument | ErrorCode::ReturnShapeMismatch => 3,
            ErrorCode::ArgCount => 4,
            ErrorCode::ArgType => 5,
            ErrorCode::DivideByZero => 7,
            ErrorCode::System { number, .. } | ErrorCode::Custom { number, .. } => *number,
        }
    }

    /// Whether this code reports an internal failure rather than a user error.
    pub fn is_system(&self) -> bool {
        matches!(self, ErrorCode::System { .. })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.subsystem(), self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::ArgCount.to_string(), "ARGACCES4");
        assert_eq!(ErrorCode::ArgType.to_string(), "ARGACCES5");
        assert_eq!(ErrorCode::UnboundVariable.to_string(), "EVALUATN1");
        assert_eq!(ErrorCode::UnknownLogicalName.to_string(), "ROUTER1");
    }

    #[test]
    fn test_system_codes() {
        let code = ErrorCode::System {
            subsystem: "SYMBOL",
            number: 3,
        };
        assert_eq!(code.to_string(), "SYMBOL3");
        assert!(code.is_system());
        assert!(!ErrorCode::ArgType.is_system());
    }
}
