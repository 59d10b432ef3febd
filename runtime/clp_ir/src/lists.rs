//! List segments.
//!
//! Lists are not interned: every constructor call makes a fresh segment.
//! A segment's `busy` count tracks how many installed values reference it
//! as a whole; element handles are claimed separately when the list is
//! installed. Unclaimed segments deeper than the current evaluation depth
//! are reclaimed by [`ListStore::flush`].

use tracing::trace;

use crate::errors::InternalError;
use crate::ids::ListId;
use crate::value::{DataValue, ListRange};

#[derive(Debug)]
struct ListSegment {
    cells: Vec<DataValue>,
    busy: u32,
    depth: u32,
}

/// All live list segments.
#[derive(Default)]
pub struct ListStore {
    segments: Vec<Option<ListSegment>>,
    free: Vec<u32>,
    live: usize,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a segment of `len` void cells created at `depth`.
    pub fn create_list(&mut self, len: usize, depth: u32) -> ListId {
        self.from_values(vec![DataValue::VOID; len], depth)
    }

    /// Allocate a segment holding `cells`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "list handles and cell offsets are u32; memory runs out first"
    )]
    pub fn from_values(&mut self, cells: Vec<DataValue>, depth: u32) -> ListId {
        let segment = ListSegment {
            cells,
            busy: 0,
            depth,
        };
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                self.segments[index as usize] = Some(segment);
                ListId::new(index)
            }
            None => {
                self.segments.push(Some(segment));
                ListId::new((self.segments.len() - 1) as u32)
            }
        }
    }

    fn segment(&self, id: ListId) -> Result<&ListSegment, InternalError> {
        self.segments
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(InternalError::DeadList(id.raw()))
    }

    fn segment_mut(&mut self, id: ListId) -> Result<&mut ListSegment, InternalError> {
        self.segments
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(InternalError::DeadList(id.raw()))
    }

    /// Range covering the whole segment.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "list handles and cell offsets are u32; memory runs out first"
    )]
    pub fn full_range(&self, id: ListId) -> Result<ListRange, InternalError> {
        let len = self.segment(id)?.cells.len() as u32;
        Ok(ListRange::new(id, 0, len))
    }

    /// Segment length.
    pub fn len(&self, id: ListId) -> Result<usize, InternalError> {
        Ok(self.segment(id)?.cells.len())
    }

    pub fn set_cell(&mut self, id: ListId, index: usize, value: DataValue) -> Result<(), InternalError> {
        let segment = self.segment_mut(id)?;
        let len = u32::try_from(segment.cells.len()).unwrap_or(u32::MAX);
        match segment.cells.get_mut(index) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(InternalError::ListRangeOutOfBounds {
                list: id.raw(),
                begin: u32::try_from(index).unwrap_or(u32::MAX),
                end: len,
            }),
        }
    }

    /// Cells covered by `range`.
    pub fn cells(&self, range: ListRange) -> Result<&[DataValue], InternalError> {
        let segment = self.segment(range.list)?;
        segment
            .cells
            .get(range.begin as usize..range.end as usize)
            .ok_or(InternalError::ListRangeOutOfBounds {
                list: range.list.raw(),
                begin: range.begin,
                end: range.end,
            })
    }

    /// Copy a range into a fresh segment at `depth`.
    pub fn subsequence(&mut self, range: ListRange, depth: u32) -> Result<ListId, InternalError> {
        let cells = self.cells(range)?.to_vec();
        Ok(self.from_values(cells, depth))
    }

    /// Copy a range into a fresh segment and return a value covering it.
    pub fn duplicate(&mut self, range: ListRange, depth: u32) -> Result<DataValue, InternalError> {
        let id = self.subsequence(range, depth)?;
        let len = range.end.saturating_sub(range.begin);
        Ok(DataValue::list(ListRange::new(id, 0, len)))
    }

    pub fn busy(&self, id: ListId) -> Result<u32, InternalError> {
        Ok(self.segment(id)?.busy)
    }

    pub fn depth(&self, id: ListId) -> Result<u32, InternalError> {
        Ok(self.segment(id)?.depth)
    }

    pub fn increment_busy(&mut self, id: ListId) -> Result<(), InternalError> {
        let segment = self.segment_mut(id)?;
        segment.busy = segment.busy.saturating_add(1);
        Ok(())
    }

    pub fn decrement_busy(&mut self, id: ListId) -> Result<(), InternalError> {
        let segment = self.segment_mut(id)?;
        if segment.busy == 0 {
            return Err(InternalError::ListBusyUnderflow);
        }
        segment.busy -= 1;
        Ok(())
    }

    /// Pull the segment up to `depth` if it was created deeper.
    pub fn lower_depth(&mut self, id: ListId, depth: u32) -> Result<(), InternalError> {
        let segment = self.segment_mut(id)?;
        if segment.depth > depth {
            segment.depth = depth;
        }
        Ok(())
    }

    /// Element-wise equality. Nested lists compare by contents.
    pub fn values_equal(&self, a: &DataValue, b: &DataValue) -> Result<bool, InternalError> {
        match (a.as_list(), b.as_list()) {
            (Some(left), Some(right)) => {
                let left = self.cells(left)?;
                let right = self.cells(right)?;
                if left.len() != right.len() {
                    return Ok(false);
                }
                for (x, y) in left.iter().zip(right) {
                    if !self.values_equal(x, y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(a == b),
        }
    }

    /// Reclaim segments with no busy references created deeper than
    /// `threshold` (any depth when `None`). Returns the number reclaimed.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "list handles and cell offsets are u32; memory runs out first"
    )]
    pub fn flush(&mut self, threshold: Option<u32>) -> usize {
        let mut reclaimed = 0usize;
        for (index, slot) in self.segments.iter_mut().enumerate() {
            let reclaim = slot.as_ref().is_some_and(|segment| {
                segment.busy == 0 && threshold.map_or(true, |limit| segment.depth > limit)
            });
            if reclaim {
                *slot = None;
                self.free.push(index as u32);
                reclaimed += 1;
            }
        }
        self.live -= reclaimed;
        if reclaimed > 0 {
            trace!(reclaimed, live = self.live, "flushed list segments");
        }
        reclaimed
    }

    /// Whether a segment is still live.
    pub fn contains(&self, id: ListId) -> bool {
        self.segment(id).is_ok()
    }

    /// Live segments.
    pub fn live(&self) -> usize {
        self.live
    }
}
