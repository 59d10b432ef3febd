//! Value representation for the clp runtime.
//!
//! - [`TypeCode`]: fixed numeric type codes for values and expression nodes
//! - [`AtomStore`]: interned, reference-counted symbols, numbers, bitmaps
//!   and external addresses
//! - [`ListStore`]: list segments with busy counts
//! - [`ExprArena`]: expression trees as flat arena nodes
//! - [`InternalError`]: internal consistency failures
//!
//! Every store records a creation depth so values created inside a nested
//! call can be reclaimed once that call returns, unless the result was
//! pulled up to the caller's depth first.

pub mod atoms;
mod errors;
pub mod expr;
mod ids;
pub mod lists;
mod type_code;
mod value;

pub use atoms::{AtomRef, AtomStore, ExternalAddress, SweepCounts, TableSizes};
pub use errors::{AtomKind, InternalError};
pub use expr::{ExprArena, ExprNode, ExprValue};
pub use ids::{BitmapId, ExprId, ExternalAddressId, FloatId, FunctionId, IntegerId, ListId, SymbolId};
pub use lists::ListStore;
pub use type_code::{TypeCode, MAXIMUM_PRIMITIVES};
pub use value::{DataValue, ListRange, Payload};
