//! Internal consistency failures.
//!
//! These indicate a contract violation by native code or by the runtime
//! itself, never bad user input. The environment reports them as a
//! SYSTEM ERROR and applies its fatal policy.

use std::fmt;

use clp_memory::MemoryError;

/// Kind of interned value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AtomKind {
    Symbol,
    Integer,
    Float,
    Bitmap,
    ExternalAddress,
}

impl AtomKind {
    /// Subsystem tag used in system error codes for this kind.
    pub const fn subsystem(self) -> &'static str {
        match self {
            AtomKind::Symbol => "SYMBOL",
            AtomKind::Integer => "INTEGER",
            AtomKind::Float => "FLOAT",
            AtomKind::Bitmap => "BITMAP",
            AtomKind::ExternalAddress => "EXTADDR",
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomKind::Symbol => "symbol",
            AtomKind::Integer => "integer",
            AtomKind::Float => "float",
            AtomKind::Bitmap => "bitmap",
            AtomKind::ExternalAddress => "external address",
        };
        f.write_str(name)
    }
}

/// Internal consistency error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    /// A reference count was decremented while already zero.
    #[error("{kind} reference count decremented below zero")]
    CountUnderflow { kind: AtomKind },

    /// A handle refers to a reclaimed entry.
    #[error("{kind} handle {index} refers to a reclaimed value")]
    DeadHandle { kind: AtomKind, index: u32 },

    /// Every `u32` slot of a table is in use.
    #[error("{kind} table has no handles left")]
    HandleSpaceExhausted { kind: AtomKind },

    /// A list segment's busy count was decremented while already zero.
    #[error("list segment busy count decremented below zero")]
    ListBusyUnderflow,

    #[error("list segment {0} has been reclaimed")]
    DeadList(u32),

    #[error("list range {begin}..{end} is outside segment {list}")]
    ListRangeOutOfBounds { list: u32, begin: u32, end: u32 },

    #[error("expression node {0} has been returned to the pool")]
    DeadExpression(u32),

    /// A node's value slot does not fit its type code.
    #[error("expression node {0} is malformed for its type")]
    MalformedExpression(u32),

    #[error("function {0} use count decremented below zero")]
    FunctionUseUnderflow(String),

    #[error("function handle {0} is not registered")]
    DeadFunction(u32),

    /// `install_primitive` on an occupied slot.
    #[error("primitive type {0} is already installed")]
    PrimitiveCollision(u16),

    /// Dispatch reached a type code with no installed primitive.
    #[error("unregistered primitive type {0} encountered during evaluation")]
    UnregisteredPrimitive(u16),

    #[error("external address type table exhausted (maximum {0})")]
    AddressTypesExhausted(usize),

    #[error("external address type {0} is not installed")]
    UnknownAddressType(u16),

    #[error("expression hash entry for node {0} is missing")]
    MissingHashedExpression(u32),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl InternalError {
    /// Subsystem tag of the SYSTEM ERROR code (`[SYMBOL3]` etc.).
    pub fn subsystem(&self) -> &'static str {
        match self {
            InternalError::CountUnderflow { kind }
            | InternalError::DeadHandle { kind, .. }
            | InternalError::HandleSpaceExhausted { kind } => kind.subsystem(),
            InternalError::ListBusyUnderflow
            | InternalError::DeadList(_)
            | InternalError::ListRangeOutOfBounds { .. } => "MULTIFLD",
            InternalError::DeadExpression(_)
            | InternalError::MissingHashedExpression(_)
            | InternalError::MalformedExpression(_) => "EXPRNOPS",
            InternalError::FunctionUseUnderflow(_) | InternalError::DeadFunction(_) => "EXTNFUNC",
            InternalError::PrimitiveCollision(_)
            | InternalError::UnregisteredPrimitive(_)
            | InternalError::AddressTypesExhausted(_)
            | InternalError::UnknownAddressType(_) => "EVALUATN",
            InternalError::Memory(_) => "MEMORY",
        }
    }

    /// Number of the SYSTEM ERROR code within its subsystem.
    pub fn number(&self) -> u16 {
        match self {
            InternalError::CountUnderflow { .. } => 3,
            InternalError::DeadHandle { .. } => 4,
            InternalError::HandleSpaceExhausted { .. } => 5,
            InternalError::ListBusyUnderflow => 1,
            InternalError::DeadList(_) => 2,
            InternalError::ListRangeOutOfBounds { .. } => 3,
            InternalError::DeadExpression(_) => 1,
            InternalError::MissingHashedExpression(_) => 2,
            InternalError::MalformedExpression(_) => 3,
            InternalError::FunctionUseUnderflow(_) => 1,
            InternalError::DeadFunction(_) => 2,
            InternalError::PrimitiveCollision(_) => 5,
            InternalError::UnregisteredPrimitive(_) => 3,
            InternalError::AddressTypesExhausted(_) => 6,
            InternalError::UnknownAddressType(_) => 7,
            InternalError::Memory(_) => 1,
        }
    }
}
