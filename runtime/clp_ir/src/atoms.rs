//! Interned value store.
//!
//! Symbols (and strings and instance names), integers, floats, bitmaps and
//! external addresses are deduplicated per kind: interning equal payloads
//! twice yields the same handle. Each entry carries a reference count, an
//! ephemeral flag and a creation depth. Entries at count zero wait on their
//! table's ephemeral list until a cleanup pass reclaims them:
//!
//! ```text
//! intern ──► count 0, ephemeral ──increment──► count > 0
//!                 │                                 │
//!   sweep deeper than threshold          decrement to 0 (back on list)
//!                 ▼
//!            reclaimed
//! ```

mod payload;
mod table;

use clp_memory::MemoryManager;

pub use payload::{AtomId, AtomPayload, BitmapBytes, ExternalAddress, SymbolText};
pub use table::{AtomEntry, AtomTable};

use crate::errors::{AtomKind, InternalError};
use crate::ids::{BitmapId, ExternalAddressId, FloatId, IntegerId, SymbolId};

/// Bucket counts per table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSizes {
    pub symbols: usize,
    pub integers: usize,
    pub floats: usize,
    pub bitmaps: usize,
    pub external_addresses: usize,
}

impl Default for TableSizes {
    fn default() -> Self {
        TableSizes {
            symbols: 63559,
            integers: 8191,
            floats: 8191,
            bitmaps: 8191,
            external_addresses: 8191,
        }
    }
}

/// Handle to an interned value of any kind.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AtomRef {
    Symbol(SymbolId),
    Integer(IntegerId),
    Float(FloatId),
    Bitmap(BitmapId),
    ExternalAddress(ExternalAddressId),
}

impl AtomRef {
    pub fn kind(self) -> AtomKind {
        match self {
            AtomRef::Symbol(_) => AtomKind::Symbol,
            AtomRef::Integer(_) => AtomKind::Integer,
            AtomRef::Float(_) => AtomKind::Float,
            AtomRef::Bitmap(_) => AtomKind::Bitmap,
            AtomRef::ExternalAddress(_) => AtomKind::ExternalAddress,
        }
    }
}

/// Reclaim counts from one sweep.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct SweepCounts {
    pub symbols: usize,
    pub integers: usize,
    pub floats: usize,
    pub bitmaps: usize,
    pub external_addresses: usize,
}

impl SweepCounts {
    pub fn total(&self) -> usize {
        self.symbols + self.integers + self.floats + self.bitmaps + self.external_addresses
    }
}

/// All five atom tables.
pub struct AtomStore {
    symbols: AtomTable<SymbolText>,
    integers: AtomTable<i64>,
    floats: AtomTable<f64>,
    bitmaps: AtomTable<BitmapBytes>,
    addresses: AtomTable<ExternalAddress>,
}

impl AtomStore {
    pub fn new(sizes: &TableSizes) -> Self {
        AtomStore {
            symbols: AtomTable::new(sizes.symbols),
            integers: AtomTable::new(sizes.integers),
            floats: AtomTable::new(sizes.floats),
            bitmaps: AtomTable::new(sizes.bitmaps),
            addresses: AtomTable::new(sizes.external_addresses),
        }
    }

    pub fn store_symbol(
        &mut self,
        text: &str,
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<SymbolId, InternalError> {
        self.symbols.intern(text, depth, memory)
    }

    pub fn store_integer(
        &mut self,
        value: i64,
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<IntegerId, InternalError> {
        self.integers.intern(&value, depth, memory)
    }

    pub fn store_float(
        &mut self,
        value: f64,
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<FloatId, InternalError> {
        self.floats.intern(&value, depth, memory)
    }

    pub fn store_bitmap(
        &mut self,
        bytes: &[u8],
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<BitmapId, InternalError> {
        self.bitmaps.intern(bytes, depth, memory)
    }

    pub fn store_external_address(
        &mut self,
        address: ExternalAddress,
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<ExternalAddressId, InternalError> {
        self.addresses.intern(&address, depth, memory)
    }

    pub fn lookup_symbol(&self, text: &str) -> Option<SymbolId> {
        self.symbols.lookup(text)
    }

    pub fn lookup_integer(&self, value: i64) -> Option<IntegerId> {
        self.integers.lookup(&value)
    }

    pub fn lookup_float(&self, value: f64) -> Option<FloatId> {
        self.floats.lookup(&value)
    }

    pub fn lookup_bitmap(&self, bytes: &[u8]) -> Option<BitmapId> {
        self.bitmaps.lookup(bytes)
    }

    pub fn lookup_external_address(&self, address: ExternalAddress) -> Option<ExternalAddressId> {
        self.addresses.lookup(&address)
    }

    pub fn symbol_text(&self, id: SymbolId) -> Result<&str, InternalError> {
        self.symbols.payload(id).map(SymbolText::as_str)
    }

    pub fn integer_value(&self, id: IntegerId) -> Result<i64, InternalError> {
        self.integers.payload(id).copied()
    }

    pub fn float_value(&self, id: FloatId) -> Result<f64, InternalError> {
        self.floats.payload(id).copied()
    }

    pub fn bitmap_bytes(&self, id: BitmapId) -> Result<&[u8], InternalError> {
        self.bitmaps.payload(id).map(BitmapBytes::as_bytes)
    }

    pub fn external_address(&self, id: ExternalAddressId) -> Result<ExternalAddress, InternalError> {
        self.addresses.payload(id).copied()
    }

    pub fn symbols(&self) -> &AtomTable<SymbolText> {
        &self.symbols
    }

    pub fn integers(&self) -> &AtomTable<i64> {
        &self.integers
    }

    pub fn floats(&self) -> &AtomTable<f64> {
        &self.floats
    }

    pub fn bitmaps(&self) -> &AtomTable<BitmapBytes> {
        &self.bitmaps
    }

    pub fn external_addresses(&self) -> &AtomTable<ExternalAddress> {
        &self.addresses
    }

    pub fn increment(&mut self, atom: AtomRef) -> Result<(), InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.increment(id),
            AtomRef::Integer(id) => self.integers.increment(id),
            AtomRef::Float(id) => self.floats.increment(id),
            AtomRef::Bitmap(id) => self.bitmaps.increment(id),
            AtomRef::ExternalAddress(id) => self.addresses.increment(id),
        }
    }

    pub fn decrement(&mut self, atom: AtomRef) -> Result<(), InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.decrement(id),
            AtomRef::Integer(id) => self.integers.decrement(id),
            AtomRef::Float(id) => self.floats.decrement(id),
            AtomRef::Bitmap(id) => self.bitmaps.decrement(id),
            AtomRef::ExternalAddress(id) => self.addresses.decrement(id),
        }
    }

    pub fn count(&self, atom: AtomRef) -> Result<u32, InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.count(id),
            AtomRef::Integer(id) => self.integers.count(id),
            AtomRef::Float(id) => self.floats.count(id),
            AtomRef::Bitmap(id) => self.bitmaps.count(id),
            AtomRef::ExternalAddress(id) => self.addresses.count(id),
        }
    }

    pub fn depth(&self, atom: AtomRef) -> Result<u32, InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.depth(id),
            AtomRef::Integer(id) => self.integers.depth(id),
            AtomRef::Float(id) => self.floats.depth(id),
            AtomRef::Bitmap(id) => self.bitmaps.depth(id),
            AtomRef::ExternalAddress(id) => self.addresses.depth(id),
        }
    }

    pub fn is_ephemeral(&self, atom: AtomRef) -> Result<bool, InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.is_ephemeral(id),
            AtomRef::Integer(id) => self.integers.is_ephemeral(id),
            AtomRef::Float(id) => self.floats.is_ephemeral(id),
            AtomRef::Bitmap(id) => self.bitmaps.is_ephemeral(id),
            AtomRef::ExternalAddress(id) => self.addresses.is_ephemeral(id),
        }
    }

    /// Lower the recorded depth of `atom` to `depth` if it is deeper.
    pub fn lower_depth(&mut self, atom: AtomRef, depth: u32) -> Result<(), InternalError> {
        match atom {
            AtomRef::Symbol(id) => self.symbols.lower_depth(id, depth),
            AtomRef::Integer(id) => self.integers.lower_depth(id, depth),
            AtomRef::Float(id) => self.floats.lower_depth(id, depth),
            AtomRef::Bitmap(id) => self.bitmaps.lower_depth(id, depth),
            AtomRef::ExternalAddress(id) => self.addresses.lower_depth(id, depth),
        }
    }

    /// Sweep every table's ephemeral list. `on_discard` sees each reclaimed
    /// external address so its address type can release the host object.
    pub fn remove_ephemeral(
        &mut self,
        threshold: Option<u32>,
        memory: &mut MemoryManager,
        on_discard: impl FnMut(&ExternalAddress),
    ) -> SweepCounts {
        SweepCounts {
            symbols: self.symbols.remove_ephemeral(threshold, memory, |_| {}),
            integers: self.integers.remove_ephemeral(threshold, memory, |_| {}),
            floats: self.floats.remove_ephemeral(threshold, memory, |_| {}),
            bitmaps: self.bitmaps.remove_ephemeral(threshold, memory, |_| {}),
            external_addresses: self.addresses.remove_ephemeral(threshold, memory, on_discard),
        }
    }

    /// Entries awaiting a sweep across all tables.
    pub fn ephemeral_len(&self) -> usize {
        self.symbols.ephemeral_len()
            + self.integers.ephemeral_len()
            + self.floats.ephemeral_len()
            + self.bitmaps.ephemeral_len()
            + self.addresses.ephemeral_len()
    }

    /// Payload bytes awaiting a sweep across all tables.
    pub fn ephemeral_size(&self) -> usize {
        self.symbols.ephemeral_size()
            + self.integers.ephemeral_size()
            + self.floats.ephemeral_size()
            + self.bitmaps.ephemeral_size()
            + self.addresses.ephemeral_size()
    }

    /// Drop every entry in every table.
    pub fn clear(&mut self, memory: &mut MemoryManager) {
        self.symbols.clear(memory);
        self.integers.clear(memory);
        self.floats.clear(memory);
        self.bitmaps.clear(memory);
        self.addresses.clear(memory);
    }
}

impl Default for AtomStore {
    fn default() -> Self {
        Self::new(&TableSizes::default())
    }
}

#[cfg(test)]
mod tests;
