//! Numeric type codes for tagged values and expression nodes.
//!
//! The low range is fixed: sorted dispatch tables and saved images index
//! by these numbers, so they never move.

use std::fmt;

/// Number of slots in the primitive dispatch table.
pub const MAXIMUM_PRIMITIVES: usize = 150;

/// Type code of a tagged value or expression node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TypeCode(u16);

impl TypeCode {
    // Primitive scalar kinds (fixed numbering).
    pub const FLOAT: TypeCode = TypeCode(0);
    pub const INTEGER: TypeCode = TypeCode(1);
    pub const SYMBOL: TypeCode = TypeCode(2);
    pub const STRING: TypeCode = TypeCode(3);
    pub const LIST: TypeCode = TypeCode(4);
    pub const EXTERNAL_ADDRESS: TypeCode = TypeCode(5);
    pub const FACT_ADDRESS: TypeCode = TypeCode(6);
    pub const INSTANCE_ADDRESS: TypeCode = TypeCode(7);
    pub const INSTANCE_NAME: TypeCode = TypeCode(8);

    // Call nodes.
    pub const FCALL: TypeCode = TypeCode(10);
    pub const GCALL: TypeCode = TypeCode(11);
    pub const PCALL: TypeCode = TypeCode(12);

    // Variable references.
    pub const GBL_VARIABLE: TypeCode = TypeCode(13);
    pub const MF_GBL_VARIABLE: TypeCode = TypeCode(14);
    pub const SF_VARIABLE: TypeCode = TypeCode(15);
    pub const MF_VARIABLE: TypeCode = TypeCode(16);

    /// Interned bitmap (pattern-network payloads; never a user value).
    pub const BITMAP: TypeCode = TypeCode(17);

    /// First code available to extension primitives registered at runtime.
    pub const FIRST_EXTENSION: TypeCode = TypeCode(40);

    /// Result of a function that returns nothing.
    pub const VOID: TypeCode = TypeCode(175);

    // Widened expectations accepted by argument checks; never stored in a value.
    pub const INTEGER_OR_FLOAT: TypeCode = TypeCode(180);
    pub const SYMBOL_OR_STRING: TypeCode = TypeCode(181);
    pub const INSTANCE_OR_INSTANCE_NAME: TypeCode = TypeCode(182);

    /// Create a type code from its raw number.
    #[inline]
    pub const fn new(raw: u16) -> Self {
        TypeCode(raw)
    }

    /// Get the raw number.
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Index into the primitive dispatch table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this code fits in the primitive dispatch table.
    #[inline]
    pub const fn in_primitive_range(self) -> bool {
        (self.0 as usize) < MAXIMUM_PRIMITIVES
    }

    /// Symbol, string, and instance name share the symbol table.
    #[inline]
    pub const fn is_lexeme(self) -> bool {
        matches!(self.0, 2 | 3 | 8)
    }

    #[inline]
    pub const fn is_number(self) -> bool {
        matches!(self.0, 0 | 1)
    }

    /// Scalar kinds copied straight into a result without computation.
    #[inline]
    pub const fn is_self_evaluating(self) -> bool {
        matches!(self.0, 0 | 1 | 2 | 3 | 5 | 6 | 7 | 8)
    }

    #[inline]
    pub const fn is_call(self) -> bool {
        matches!(self.0, 10..=12)
    }

    #[inline]
    pub const fn is_variable(self) -> bool {
        matches!(self.0, 13..=16)
    }

    /// Human-readable name used in type diagnostics.
    pub fn describe(self) -> &'static str {
        match self.0 {
            0 => "float",
            1 => "integer",
            2 => "symbol",
            3 => "string",
            4 => "multifield",
            5 => "external address",
            6 => "fact address",
            7 => "instance address",
            8 => "instance name",
            10 => "function call",
            11 => "generic function call",
            12 => "deffunction call",
            13 | 15 => "variable",
            14 | 16 => "multifield variable",
            17 => "bitmap",
            175 => "void",
            180 => "integer or float",
            181 => "symbol or string",
            182 => "instance address, instance name, or symbol",
            _ => "extension type",
        }
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeCode({}:{})", self.0, self.describe())
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
