//! Environment configuration.

use clp_ir::TableSizes;
use clp_memory::MemoryConfig;

/// What happens after an internal consistency failure has been reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FatalPolicy {
    /// Panic with the SYSTEM ERROR text; a host may confine it with
    /// `catch_unwind`.
    #[default]
    Panic,
    /// Terminate the process through the router exit path.
    Exit(i32),
}

/// Tunables for one environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    /// Bucket counts for the atom tables.
    pub table_sizes: TableSizes,
    /// Capacity of the external address type table.
    pub max_external_address_types: usize,
    /// Heuristic cleanup runs once this many atoms await a sweep...
    pub max_ephemeral_count: usize,
    /// ...or once their payloads hold this many bytes.
    pub max_ephemeral_size: usize,
    /// Deepest call nesting allowed; `None` grows the stack as needed.
    pub max_eval_depth: Option<usize>,
    /// Whether symbol/string argument checks also accept instance names.
    pub object_system: bool,
    pub fatal_policy: FatalPolicy,
    pub memory: MemoryConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            table_sizes: TableSizes::default(),
            max_external_address_types: 10,
            max_ephemeral_count: 1000,
            max_ephemeral_size: 10240,
            max_eval_depth: None,
            object_system: true,
            fatal_policy: FatalPolicy::Panic,
            memory: MemoryConfig::default(),
        }
    }
}
