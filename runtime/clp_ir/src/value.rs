//! Tagged values.

use crate::atoms::AtomRef;
use crate::ids::{BitmapId, ExternalAddressId, FloatId, IntegerId, ListId, SymbolId};
use crate::type_code::TypeCode;

/// A slice of a list segment. `end` is exclusive.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ListRange {
    pub list: ListId,
    pub begin: u32,
    pub end: u32,
}

impl ListRange {
    #[inline]
    pub const fn new(list: ListId, begin: u32, end: u32) -> Self {
        ListRange { list, begin, end }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.begin
    }
}

/// Value half of a tagged value.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Payload {
    Void,
    Float(FloatId),
    Integer(IntegerId),
    /// Symbols, strings and instance names share the symbol table.
    Symbol(SymbolId),
    List(ListRange),
    ExternalAddress(ExternalAddressId),
    Bitmap(BitmapId),
    /// Host-defined handle (fact and instance addresses, extension kinds).
    Opaque(u32),
}

impl Payload {
    /// The interned handle this payload holds, if any.
    pub fn atom(self) -> Option<AtomRef> {
        match self {
            Payload::Float(id) => Some(AtomRef::Float(id)),
            Payload::Integer(id) => Some(AtomRef::Integer(id)),
            Payload::Symbol(id) => Some(AtomRef::Symbol(id)),
            Payload::ExternalAddress(id) => Some(AtomRef::ExternalAddress(id)),
            Payload::Bitmap(id) => Some(AtomRef::Bitmap(id)),
            Payload::Void | Payload::List(_) | Payload::Opaque(_) => None,
        }
    }
}

/// A `(type, payload)` pair.
///
/// Copying a `DataValue` does not claim its handles; see value
/// install/deinstall in the evaluator crate.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DataValue {
    pub code: TypeCode,
    pub payload: Payload,
}

impl DataValue {
    #[inline]
    pub const fn new(code: TypeCode, payload: Payload) -> Self {
        DataValue { code, payload }
    }

    pub const VOID: DataValue = DataValue::new(TypeCode::VOID, Payload::Void);

    #[inline]
    pub const fn integer(id: IntegerId) -> Self {
        DataValue::new(TypeCode::INTEGER, Payload::Integer(id))
    }

    #[inline]
    pub const fn float(id: FloatId) -> Self {
        DataValue::new(TypeCode::FLOAT, Payload::Float(id))
    }

    #[inline]
    pub const fn symbol(id: SymbolId) -> Self {
        DataValue::new(TypeCode::SYMBOL, Payload::Symbol(id))
    }

    #[inline]
    pub const fn string(id: SymbolId) -> Self {
        DataValue::new(TypeCode::STRING, Payload::Symbol(id))
    }

    #[inline]
    pub const fn instance_name(id: SymbolId) -> Self {
        DataValue::new(TypeCode::INSTANCE_NAME, Payload::Symbol(id))
    }

    #[inline]
    pub const fn list(range: ListRange) -> Self {
        DataValue::new(TypeCode::LIST, Payload::List(range))
    }

    #[inline]
    pub const fn external_address(id: ExternalAddressId) -> Self {
        DataValue::new(TypeCode::EXTERNAL_ADDRESS, Payload::ExternalAddress(id))
    }

    #[inline]
    pub const fn bitmap(id: BitmapId) -> Self {
        DataValue::new(TypeCode::BITMAP, Payload::Bitmap(id))
    }

    #[inline]
    pub const fn is_void(&self) -> bool {
        matches!(self.payload, Payload::Void)
    }

    pub fn as_integer(&self) -> Option<IntegerId> {
        match self.payload {
            Payload::Integer(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<FloatId> {
        match self.payload {
            Payload::Float(id) => Some(id),
            _ => None,
        }
    }

    /// Symbol-table handle of a symbol, string, or instance name.
    pub fn as_lexeme(&self) -> Option<SymbolId> {
        match self.payload {
            Payload::Symbol(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<ListRange> {
        match self.payload {
            Payload::List(range) => Some(range),
            _ => None,
        }
    }

    pub fn as_external_address(&self) -> Option<ExternalAddressId> {
        match self.payload {
            Payload::ExternalAddress(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub fn atom(&self) -> Option<AtomRef> {
        self.payload.atom()
    }
}

impl Default for DataValue {
    fn default() -> Self {
        Self::VOID
    }
}
