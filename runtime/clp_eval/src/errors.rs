//! Error types and user-level diagnostic factories.
//!
//! Evaluation reports user errors through diagnostics plus the
//! `eval_error`/`halt` flags; the `Result` types here cover the
//! non-evaluation entry points (definition, construction, data slots).

use clp_diagnostic::{Diagnostic, ErrorCode};
use clp_ir::{DataValue, TypeCode};

use crate::args::ArgRelation;

/// An evaluation that raised `eval_error`.
///
/// Carries the placeholder result the failing node produced (for example
/// `FALSE` for an unbound variable).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EvalFailure {
    pub placeholder: DataValue,
}

impl EvalFailure {
    pub const fn new(placeholder: DataValue) -> Self {
        EvalFailure { placeholder }
    }
}

/// Result of evaluating an expression.
pub type EvalResult = Result<DataValue, EvalFailure>;

/// Malformed argument restriction string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RestrictionError {
    #[error("restriction string {0:?} is missing its argument counts")]
    MissingCounts(String),
    #[error("invalid argument count {found:?} in restriction string {text:?}")]
    InvalidCount { text: String, found: char },
    #[error("minimum argument count exceeds maximum in restriction string {0:?}")]
    MinExceedsMax(String),
    #[error("unknown type character {found:?} in restriction string {text:?}")]
    UnknownType { text: String, found: char },
}

/// Failure registering or removing a function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
    #[error("unknown return type tag {0:?}")]
    UnknownReturnTag(char),
    #[error("return type tag {tag:?} does not match the {shape} body of function {name}")]
    TagShapeMismatch {
        name: String,
        tag: char,
        shape: &'static str,
    },
    #[error(transparent)]
    Restriction(#[from] RestrictionError),
    #[error("function {0} is not defined")]
    NotFound(String),
    #[error("function {name} is in use by {uses} installed expression(s)")]
    InUse { name: String, uses: u32 },
}

/// Failure constructing a call expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("missing function declaration for {0}")]
    UnknownFunction(String),
    #[error("function {function} expected {relation} {expected} argument(s), got {actual}")]
    ArgCount {
        function: String,
        relation: ArgRelation,
        expected: usize,
        actual: usize,
    },
    #[error("function {function} expected argument #{position} to be of type {expected}")]
    ArgType {
        function: String,
        position: usize,
        expected: String,
    },
}

/// Failure of [`crate::Environment::call_function`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("evaluation of {function} raised an error")]
    Eval {
        function: String,
        failure: EvalFailure,
    },
}

/// Failure allocating an environment data slot.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataSlotError {
    #[error("environment data position {position} is out of range (maximum {max})")]
    OutOfRange { position: usize, max: usize },
    #[error("environment data position {0} is already allocated")]
    Occupied(usize),
}

/// Failure registering a periodic function.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CleanupError {
    #[error("periodic function {0} is already registered")]
    Duplicate(String),
}

// User-level diagnostics

#[cold]
pub(crate) fn nonexistent_argument(function: &str, position: usize) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::NonexistentArgument,
        format!("Function {function} received a request for argument {position} which is non-existent"),
    )
}

#[cold]
pub(crate) fn wrong_arg_count(function: &str, relation: ArgRelation, expected: usize) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::ArgCount,
        format!("Function {function} expected {relation} {expected} argument(s)"),
    )
}

#[cold]
pub(crate) fn wrong_arg_range(function: &str, min: usize, max: usize) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::ArgCount,
        format!(
            "Function {function} expected at least {min} and no more than {max} argument(s)"
        ),
    )
}

#[cold]
pub(crate) fn wrong_arg_type(function: &str, position: usize, expected: &str) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::ArgType,
        format!("Function {function} expected argument #{position} to be of type {expected}"),
    )
}

#[cold]
pub(crate) fn unbound_variable(name: &str, code: TypeCode) -> Diagnostic {
    let prefix = match code {
        TypeCode::MF_VARIABLE => "$?",
        TypeCode::GBL_VARIABLE => "?*",
        TypeCode::MF_GBL_VARIABLE => "$?*",
        _ => "?",
    };
    let suffix = if matches!(code, TypeCode::GBL_VARIABLE | TypeCode::MF_GBL_VARIABLE) {
        "*"
    } else {
        ""
    };
    Diagnostic::error(
        ErrorCode::UnboundVariable,
        format!("Variable {prefix}{name}{suffix} is unbound"),
    )
}

#[cold]
pub(crate) fn depth_exceeded(function: &str, max: usize) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::DepthExceeded,
        format!("Evaluation of {function} exceeded the maximum nesting depth of {max}"),
    )
}

#[cold]
pub(crate) fn return_shape_mismatch(function: &str, expected: &str, got: TypeCode) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::ReturnShapeMismatch,
        format!(
            "Function {function} returned a {} where its declaration promises {expected}",
            got.describe()
        ),
    )
}

#[cold]
pub(crate) fn unknown_logical_name(logical: &str) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::UnknownLogicalName,
        format!("Logical name {logical} was not recognized by any routers"),
    )
}
