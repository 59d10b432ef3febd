//! Per-kind payloads stored in the atom tables, and their bucket hashes.

use std::mem;

use clp_memory::{MemoryError, MemoryManager};

use crate::errors::AtomKind;
use crate::ids::{BitmapId, ExternalAddressId, FloatId, IntegerId, SymbolId};

/// A handle type addressing one atom table.
pub trait AtomId: Copy {
    fn from_slot(slot: u32) -> Self;
    fn slot(self) -> u32;
}

macro_rules! impl_atom_id {
    ($($id:ty),*) => { $(
        impl AtomId for $id {
            #[inline]
            fn from_slot(slot: u32) -> Self {
                <$id>::new(slot)
            }

            #[inline]
            fn slot(self) -> u32 {
                self.raw()
            }
        }
    )* };
}

impl_atom_id!(SymbolId, IntegerId, FloatId, BitmapId, ExternalAddressId);

/// Canonical payload of one interned kind.
pub trait AtomPayload: Sized {
    /// Borrowed form used for lookup.
    type Key: ?Sized;
    type Id: AtomId;
    const KIND: AtomKind;

    /// Bucket for `key` in a table of `size` buckets.
    fn bucket(key: &Self::Key, size: usize) -> usize;

    /// Bit-identical comparison against a lookup key.
    fn matches(&self, key: &Self::Key) -> bool;

    /// Copy the key into a stored payload.
    fn create(key: &Self::Key, memory: &mut MemoryManager) -> Result<Self, MemoryError>;

    /// Bytes charged to the ephemeral size while unclaimed.
    fn byte_size(&self) -> usize;

    /// Give owned storage back to the allocator.
    fn reclaim(self, _memory: &mut MemoryManager) {}
}

/// Polynomial byte hash shared by symbols and floats.
#[inline]
fn hash_bytes(bytes: &[u8], size: usize) -> usize {
    let mut tally: usize = 0;
    for &byte in bytes {
        tally = tally.wrapping_mul(127).wrapping_add(usize::from(byte));
    }
    tally % size
}

/// Interned symbol/string text. Stored in a block from the memory pool.
#[derive(Debug)]
pub struct SymbolText(String);

impl SymbolText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AtomPayload for SymbolText {
    type Key = str;
    type Id = SymbolId;
    const KIND: AtomKind = AtomKind::Symbol;

    fn bucket(key: &str, size: usize) -> usize {
        hash_bytes(key.as_bytes(), size)
    }

    fn matches(&self, key: &str) -> bool {
        self.0 == key
    }

    fn create(key: &str, memory: &mut MemoryManager) -> Result<Self, MemoryError> {
        memory.string_from(key).map(SymbolText)
    }

    fn byte_size(&self) -> usize {
        self.0.len() + 1
    }

    fn reclaim(self, memory: &mut MemoryManager) {
        memory.rtn_string(self.0);
    }
}

impl AtomPayload for i64 {
    type Key = i64;
    type Id = IntegerId;
    const KIND: AtomKind = AtomKind::Integer;

    fn bucket(key: &i64, size: usize) -> usize {
        (key.unsigned_abs() % size as u64) as usize
    }

    fn matches(&self, key: &i64) -> bool {
        self == key
    }

    fn create(key: &i64, _memory: &mut MemoryManager) -> Result<Self, MemoryError> {
        Ok(*key)
    }

    fn byte_size(&self) -> usize {
        mem::size_of::<i64>()
    }
}

impl AtomPayload for f64 {
    type Key = f64;
    type Id = FloatId;
    const KIND: AtomKind = AtomKind::Float;

    fn bucket(key: &f64, size: usize) -> usize {
        hash_bytes(&key.to_ne_bytes(), size)
    }

    // Bitwise: 0.0 and -0.0 are distinct, and a NaN matches itself.
    fn matches(&self, key: &f64) -> bool {
        self.to_bits() == key.to_bits()
    }

    fn create(key: &f64, _memory: &mut MemoryManager) -> Result<Self, MemoryError> {
        Ok(*key)
    }

    fn byte_size(&self) -> usize {
        mem::size_of::<f64>()
    }
}

/// Interned bitmap bytes. Stored in a block from the memory pool.
#[derive(Debug)]
pub struct BitmapBytes(Vec<u8>);

impl BitmapBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AtomPayload for BitmapBytes {
    type Key = [u8];
    type Id = BitmapId;
    const KIND: AtomKind = AtomKind::Bitmap;

    fn bucket(key: &[u8], size: usize) -> usize {
        const WORD: usize = mem::size_of::<usize>();
        let mut chunks = key.chunks_exact(WORD);
        let mut tally: usize = 0;
        for chunk in chunks.by_ref() {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            tally = tally.wrapping_add(usize::from_ne_bytes(word));
        }
        for &byte in chunks.remainder() {
            tally = tally.wrapping_add(usize::from(byte));
        }
        tally % size
    }

    fn matches(&self, key: &[u8]) -> bool {
        self.0 == key
    }

    fn create(key: &[u8], memory: &mut MemoryManager) -> Result<Self, MemoryError> {
        memory.copy_bytes(key).map(BitmapBytes)
    }

    fn byte_size(&self) -> usize {
        self.0.len()
    }

    fn reclaim(self, memory: &mut MemoryManager) {
        memory.rtn(self.0);
    }
}

/// An opaque host address tagged with its registered address type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ExternalAddress {
    pub address: usize,
    pub type_index: u16,
}

impl AtomPayload for ExternalAddress {
    type Key = ExternalAddress;
    type Id = ExternalAddressId;
    const KIND: AtomKind = AtomKind::ExternalAddress;

    fn bucket(key: &ExternalAddress, size: usize) -> usize {
        (key.address / 256) % size
    }

    fn matches(&self, key: &ExternalAddress) -> bool {
        self == key
    }

    fn create(key: &ExternalAddress, _memory: &mut MemoryManager) -> Result<Self, MemoryError> {
        Ok(*key)
    }

    fn byte_size(&self) -> usize {
        mem::size_of::<ExternalAddress>()
    }
}
