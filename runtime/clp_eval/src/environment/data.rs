//! Numbered data slots for extension subsystems.

use std::any::Any;

use super::Environment;
use crate::errors::DataSlotError;

/// Number of data slot positions per environment.
pub const MAXIMUM_ENVIRONMENT_POSITIONS: usize = 100;

/// Runs when the environment is dropped, receiving the slot's data.
pub type Teardown = Box<dyn FnOnce(&mut Environment, Box<dyn Any + Send>) + Send>;

struct DataSlot {
    data: Box<dyn Any + Send>,
    teardown: Option<Teardown>,
}

#[derive(Default)]
pub(super) struct DataSlots {
    slots: Vec<Option<DataSlot>>,
    /// Positions in allocation order.
    order: Vec<usize>,
}

impl DataSlots {
    /// Remove every slot, most recently allocated first.
    pub(super) fn take_in_teardown_order(
        &mut self,
    ) -> Vec<(Box<dyn Any + Send>, Option<Teardown>)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .rev()
            .filter_map(|position| self.slots.get_mut(position)?.take())
            .map(|slot| (slot.data, slot.teardown))
            .collect()
    }
}

impl Environment {
    /// Store `data` at `position`, running `teardown` when the environment
    /// is dropped. Teardowns run in reverse allocation order.
    pub fn allocate_data<T: Any + Send>(
        &mut self,
        position: usize,
        data: T,
        teardown: Option<Teardown>,
    ) -> Result<(), DataSlotError> {
        if position >= MAXIMUM_ENVIRONMENT_POSITIONS {
            return Err(DataSlotError::OutOfRange {
                position,
                max: MAXIMUM_ENVIRONMENT_POSITIONS,
            });
        }
        let slots = &mut self.data.slots;
        if slots.len() <= position {
            slots.resize_with(position + 1, || None);
        }
        if slots[position].is_some() {
            return Err(DataSlotError::Occupied(position));
        }
        slots[position] = Some(DataSlot {
            data: Box::new(data),
            teardown,
        });
        self.data.order.push(position);
        tracing::debug!(position, "allocated environment data");
        Ok(())
    }

    /// Data at `position`, if allocated with type `T`.
    pub fn get_data<T: Any>(&self, position: usize) -> Option<&T> {
        self.data
            .slots
            .get(position)?
            .as_ref()?
            .data
            .downcast_ref::<T>()
    }

    pub fn get_data_mut<T: Any>(&mut self, position: usize) -> Option<&mut T> {
        self.data
            .slots
            .get_mut(position)?
            .as_mut()?
            .data
            .downcast_mut::<T>()
    }
}
