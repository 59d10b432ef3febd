//! Chained hash table with reference counts and an ephemeral list.

use std::mem;

use clp_memory::MemoryManager;
use tracing::trace;

use super::payload::{AtomId, AtomPayload};
use crate::errors::InternalError;

/// One interned value and its bookkeeping.
#[derive(Debug)]
pub struct AtomEntry<P> {
    pub payload: P,
    /// Next entry in the same bucket.
    next: Option<u32>,
    bucket: usize,
    pub count: u32,
    pub ephemeral: bool,
    /// Evaluation depth at which the value was created (or last pulled up to).
    pub depth: u32,
}

/// Interned values of one kind.
///
/// Entries are addressed by slot index. Bucket heads and the `next` links
/// form the hash chains; reclaimed slots are recycled through `free`.
pub struct AtomTable<P: AtomPayload> {
    buckets: Vec<Option<u32>>,
    slots: Vec<Option<AtomEntry<P>>>,
    free: Vec<u32>,
    /// Slots currently at count zero and not yet swept.
    ephemeral: Vec<u32>,
    ephemeral_size: usize,
    live: usize,
}

impl<P: AtomPayload> AtomTable<P> {
    /// Create a table with `size` buckets (at least one).
    pub fn new(size: usize) -> Self {
        AtomTable {
            buckets: vec![None; size.max(1)],
            slots: Vec::new(),
            free: Vec::new(),
            ephemeral: Vec::new(),
            ephemeral_size: 0,
            live: 0,
        }
    }

    /// Number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Bucket a key hashes to.
    #[inline]
    pub fn bucket_for(&self, key: &P::Key) -> usize {
        P::bucket(key, self.buckets.len())
    }

    /// Bucket an existing handle lives in.
    pub fn bucket_of(&self, id: P::Id) -> Result<usize, InternalError> {
        Ok(self.entry(id)?.bucket)
    }

    /// Find an existing entry without interning.
    pub fn lookup(&self, key: &P::Key) -> Option<P::Id> {
        let mut cursor = self.buckets[self.bucket_for(key)];
        while let Some(slot) = cursor {
            let entry = self.slots.get(slot as usize)?.as_ref()?;
            if entry.payload.matches(key) {
                return Some(P::Id::from_slot(slot));
            }
            cursor = entry.next;
        }
        None
    }

    /// Return the entry for `key`, creating it at `depth` if absent.
    ///
    /// A new entry starts at count zero on the ephemeral list. Finding an
    /// existing entry does not change its count.
    pub fn intern(
        &mut self,
        key: &P::Key,
        depth: u32,
        memory: &mut MemoryManager,
    ) -> Result<P::Id, InternalError> {
        if let Some(id) = self.lookup(key) {
            return Ok(id);
        }
        let reused = self.free.last().copied();
        let slot = match reused {
            Some(slot) => slot,
            None => u32::try_from(self.slots.len())
                .map_err(|_| InternalError::HandleSpaceExhausted { kind: P::KIND })?,
        };
        let payload = P::create(key, memory)?;
        let bucket = self.bucket_for(key);
        let entry = AtomEntry {
            ephemeral: true,
            next: self.buckets[bucket],
            bucket,
            count: 0,
            depth,
            payload,
        };
        self.ephemeral_size += entry.payload.byte_size();
        if reused.is_some() {
            self.free.pop();
            self.slots[slot as usize] = Some(entry);
        } else {
            self.slots.push(Some(entry));
        }
        self.buckets[bucket] = Some(slot);
        self.ephemeral.push(slot);
        self.live += 1;
        Ok(P::Id::from_slot(slot))
    }

    pub fn entry(&self, id: P::Id) -> Result<&AtomEntry<P>, InternalError> {
        self.slots
            .get(id.slot() as usize)
            .and_then(Option::as_ref)
            .ok_or(InternalError::DeadHandle {
                kind: P::KIND,
                index: id.slot(),
            })
    }

    fn entry_mut(&mut self, id: P::Id) -> Result<&mut AtomEntry<P>, InternalError> {
        self.slots
            .get_mut(id.slot() as usize)
            .and_then(Option::as_mut)
            .ok_or(InternalError::DeadHandle {
                kind: P::KIND,
                index: id.slot(),
            })
    }

    pub fn payload(&self, id: P::Id) -> Result<&P, InternalError> {
        self.entry(id).map(|entry| &entry.payload)
    }

    pub fn count(&self, id: P::Id) -> Result<u32, InternalError> {
        self.entry(id).map(|entry| entry.count)
    }

    pub fn depth(&self, id: P::Id) -> Result<u32, InternalError> {
        self.entry(id).map(|entry| entry.depth)
    }

    pub fn is_ephemeral(&self, id: P::Id) -> Result<bool, InternalError> {
        self.entry(id).map(|entry| entry.ephemeral)
    }

    /// Claim one reference.
    pub fn increment(&mut self, id: P::Id) -> Result<(), InternalError> {
        let entry = self.entry_mut(id)?;
        entry.count = entry.count.saturating_add(1);
        Ok(())
    }

    /// Release one reference. Reaching zero puts the entry back on the
    /// ephemeral list; decrementing a zero count is an error.
    pub fn decrement(&mut self, id: P::Id) -> Result<(), InternalError> {
        let entry = self.entry_mut(id)?;
        if entry.count == 0 {
            return Err(InternalError::CountUnderflow { kind: P::KIND });
        }
        entry.count -= 1;
        if entry.count == 0 && !entry.ephemeral {
            entry.ephemeral = true;
            let size = entry.payload.byte_size();
            self.ephemeral_size += size;
            self.ephemeral.push(id.slot());
        }
        Ok(())
    }

    /// Pull the entry up to `depth` if it was created deeper.
    pub fn lower_depth(&mut self, id: P::Id, depth: u32) -> Result<(), InternalError> {
        let entry = self.entry_mut(id)?;
        if entry.depth > depth {
            entry.depth = depth;
        }
        Ok(())
    }

    /// Sweep the ephemeral list.
    ///
    /// - count zero and deeper than `threshold` (or any depth when
    ///   `threshold` is `None`): unlinked and reclaimed, after `on_reclaim`
    ///   has seen the payload
    /// - count positive: claimed, dropped from the list
    /// - otherwise kept for a later pass
    ///
    /// Returns the number of reclaimed entries.
    pub fn remove_ephemeral(
        &mut self,
        threshold: Option<u32>,
        memory: &mut MemoryManager,
        mut on_reclaim: impl FnMut(&P),
    ) -> usize {
        let pending = mem::take(&mut self.ephemeral);
        let mut kept = Vec::with_capacity(pending.len());
        let mut reclaimed = 0usize;
        for slot in pending {
            let Some(entry) = self.slots.get_mut(slot as usize).and_then(Option::as_mut) else {
                continue;
            };
            if entry.count > 0 {
                entry.ephemeral = false;
                self.ephemeral_size = self.ephemeral_size.saturating_sub(entry.payload.byte_size());
            } else if threshold.map_or(true, |limit| entry.depth > limit) {
                if let Some(entry) = self.unlink(slot) {
                    self.ephemeral_size =
                        self.ephemeral_size.saturating_sub(entry.payload.byte_size());
                    on_reclaim(&entry.payload);
                    entry.payload.reclaim(memory);
                    reclaimed += 1;
                }
            } else {
                kept.push(slot);
            }
        }
        self.ephemeral = kept;
        if reclaimed > 0 {
            trace!(kind = %P::KIND, reclaimed, live = self.live, "removed ephemeral atoms");
        }
        reclaimed
    }

    fn unlink(&mut self, slot: u32) -> Option<AtomEntry<P>> {
        let bucket = self.slots.get(slot as usize)?.as_ref()?.bucket;
        let target_next = self.slots[slot as usize].as_ref()?.next;
        if self.buckets[bucket] == Some(slot) {
            self.buckets[bucket] = target_next;
        } else {
            let mut cursor = self.buckets[bucket];
            while let Some(current) = cursor {
                let entry = self.slots[current as usize].as_mut()?;
                if entry.next == Some(slot) {
                    entry.next = target_next;
                    break;
                }
                cursor = entry.next;
            }
        }
        let entry = self.slots[slot as usize].take()?;
        self.free.push(slot);
        self.live -= 1;
        Some(entry)
    }

    /// Live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Entries awaiting a sweep.
    #[inline]
    pub fn ephemeral_len(&self) -> usize {
        self.ephemeral.len()
    }

    /// Payload bytes held by entries awaiting a sweep.
    #[inline]
    pub fn ephemeral_size(&self) -> usize {
        self.ephemeral_size
    }

    /// Iterate live handles with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (P::Id, &AtomEntry<P>)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            Some((P::Id::from_slot(u32::try_from(slot).ok()?), entry.as_ref()?))
        })
    }

    /// Drop every entry, giving payload storage back to the allocator.
    pub fn clear(&mut self, memory: &mut MemoryManager) {
        for entry in self.slots.drain(..).flatten() {
            entry.payload.reclaim(memory);
        }
        self.buckets.iter_mut().for_each(|head| *head = None);
        self.free.clear();
        self.ephemeral.clear();
        self.ephemeral_size = 0;
        self.live = 0;
    }
}
