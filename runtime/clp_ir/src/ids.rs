//! Typed handles into the runtime's stores.
//!
//! All handles are `u32` indices. Equality of two handles of the same kind
//! is equality of the underlying payload, because the stores deduplicate.

/// Define `u32` index handle types.
///
/// Each generated type has:
/// - `new()`, `index()`, `raw()` accessors
/// - `Debug` implementation showing `TypeName(n)`
macro_rules! define_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => { $(
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    )* };
}

define_id!(
    /// Interned symbol, string, or instance name.
    SymbolId,
    /// Interned 64-bit integer.
    IntegerId,
    /// Interned double.
    FloatId,
    /// Interned bitmap.
    BitmapId,
    /// Interned external address (address plus address type).
    ExternalAddressId,
    /// List segment.
    ListId,
    /// Expression node.
    ExprId,
    /// Registered function descriptor.
    FunctionId,
);
