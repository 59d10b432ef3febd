//! Periodic cleanup.
//!
//! Unclaimed atoms and idle list segments created deeper than the current
//! depth are reclaimed here. Hosts and extension layers may register
//! periodic functions that run first, highest priority first.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use crate::errors::CleanupError;
use crate::Environment;

pub type PeriodicAction = Arc<dyn Fn(&mut Environment) + Send + Sync>;

pub struct PeriodicFunction {
    pub name: String,
    pub priority: i32,
    action: PeriodicAction,
}

impl fmt::Debug for PeriodicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicFunction")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct CleanupState {
    /// Sorted by descending priority.
    functions: Vec<PeriodicFunction>,
    running: bool,
}

impl Environment {
    /// Register an action to run at the start of every cleanup pass.
    pub fn add_periodic_function(
        &mut self,
        name: &str,
        priority: i32,
        action: impl Fn(&mut Environment) + Send + Sync + 'static,
    ) -> Result<(), CleanupError> {
        let functions = &mut self.cleanup.functions;
        if functions.iter().any(|f| f.name == name) {
            return Err(CleanupError::Duplicate(name.to_string()));
        }
        let at = functions
            .iter()
            .position(|f| f.priority < priority)
            .unwrap_or(functions.len());
        functions.insert(
            at,
            PeriodicFunction {
                name: name.to_string(),
                priority,
                action: Arc::new(action),
            },
        );
        Ok(())
    }

    /// Unregister a periodic function. Returns whether it was registered.
    pub fn remove_periodic_function(&mut self, name: &str) -> bool {
        let before = self.cleanup.functions.len();
        self.cleanup.functions.retain(|f| f.name != name);
        self.cleanup.functions.len() != before
    }

    /// Run periodic functions, then reclaim garbage created deeper than
    /// the current depth. Returns the number of atoms and segments reclaimed.
    ///
    /// With `use_heuristics` the sweep is skipped until the ephemeral count
    /// or payload size crosses the configured threshold.
    pub fn periodic_cleanup(&mut self, use_heuristics: bool) -> usize {
        if self.cleanup.running {
            return 0;
        }
        self.cleanup.running = true;
        let actions: SmallVec<[PeriodicAction; 4]> = self
            .cleanup
            .functions
            .iter()
            .map(|f| Arc::clone(&f.action))
            .collect();
        for action in actions {
            action(self);
        }
        self.cleanup.running = false;

        if use_heuristics
            && self.atoms.ephemeral_len() < self.config.max_ephemeral_count
            && self.atoms.ephemeral_size() < self.config.max_ephemeral_size
        {
            return 0;
        }
        let depth = self.eval.depth;
        self.sweep(Some(depth))
    }

    /// Reclaim every unclaimed atom and idle segment regardless of depth.
    ///
    /// Only safe at top level, where no caller holds unclaimed results.
    pub fn full_cleanup(&mut self) -> usize {
        self.sweep(None)
    }

    fn sweep(&mut self, threshold: Option<u32>) -> usize {
        let lists = self.lists.flush(threshold);
        let address_types = &self.address_types;
        let atoms = self
            .atoms
            .remove_ephemeral(threshold, &mut self.memory, |address| {
                if let Some(discard) = address_types.discard_hook(address.type_index) {
                    discard(address.address);
                }
            });
        debug!(
            ?threshold,
            lists,
            symbols = atoms.symbols,
            integers = atoms.integers,
            floats = atoms.floats,
            "cleanup pass"
        );
        lists + atoms.total()
    }
}

#[cfg(test)]
mod tests;
