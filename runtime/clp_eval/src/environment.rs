//! Interpreter environment.
//!
//! An [`Environment`] owns every piece of mutable runtime state: the
//! memory pool, atom tables, list segments, expression arena, function
//! registry, primitive and external address tables, evaluator state and
//! variable bindings. Independent environments share nothing, so a host
//! may run several side by side (one thread each).
//!
//! Extension subsystems keep their state in numbered data slots with an
//! optional teardown closure; see [`Environment::allocate_data`].

mod builder;
mod data;

use clp_diagnostic::{Diagnostic, SharedRouter};
use clp_ir::{AtomRef, AtomStore, DataValue, ExprArena, InternalError, ListStore, SymbolId};
use clp_memory::MemoryManager;
use tracing::{error, warn};

pub use builder::EnvironmentBuilder;
pub use data::{Teardown, MAXIMUM_ENVIRONMENT_POSITIONS};

use crate::cleanup::CleanupState;
use crate::config::{EnvConfig, FatalPolicy};
use crate::evaluator::EvalState;
use crate::ext_address::AddressTypeTable;
use crate::functions::FunctionRegistry;
use crate::hashed::HashedExpressions;
use crate::primitives::PrimitiveTable;
use crate::variables::Bindings;
use data::DataSlots;

/// Symbols pinned for the lifetime of the environment.
#[derive(Copy, Clone, Debug)]
pub(crate) struct WellKnown {
    pub true_symbol: SymbolId,
    pub false_symbol: SymbolId,
    pub nil: SymbolId,
    pub empty_string: SymbolId,
}

/// One interpreter instance.
pub struct Environment {
    pub(crate) memory: MemoryManager,
    pub(crate) atoms: AtomStore,
    pub(crate) lists: ListStore,
    pub(crate) exprs: ExprArena,
    pub(crate) functions: FunctionRegistry,
    pub(crate) primitives: PrimitiveTable,
    pub(crate) address_types: AddressTypeTable,
    pub(crate) eval: EvalState,
    pub(crate) cleanup: CleanupState,
    pub(crate) hashed: HashedExpressions,
    pub(crate) bindings: Bindings,
    pub(crate) router: SharedRouter,
    pub(crate) config: EnvConfig,
    pub(crate) well_known: WellKnown,
    data: DataSlots,
}

impl Environment {
    /// Create an environment with default configuration writing to the console.
    pub fn new() -> Self {
        EnvironmentBuilder::new().build()
    }

    /// Start configuring an environment.
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub(crate) fn from_parts(config: EnvConfig, router: SharedRouter) -> Self {
        let mut memory = MemoryManager::new(config.memory.clone());
        let mut atoms = AtomStore::new(&config.table_sizes);
        let well_known = match pin_well_known(&mut atoms, &mut memory) {
            Ok(well_known) => well_known,
            Err(err) => report_fatal(&router, config.fatal_policy, &err),
        };
        Environment {
            memory,
            atoms,
            lists: ListStore::new(),
            exprs: ExprArena::new(),
            functions: FunctionRegistry::default(),
            primitives: PrimitiveTable::new(),
            address_types: AddressTypeTable::new(config.max_external_address_types),
            eval: EvalState::default(),
            cleanup: CleanupState::default(),
            hashed: HashedExpressions::default(),
            bindings: Bindings::new(),
            router,
            config,
            well_known,
            data: DataSlots::default(),
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn router(&self) -> &SharedRouter {
        &self.router
    }

    pub fn atoms(&self) -> &AtomStore {
        &self.atoms
    }

    pub fn lists(&self) -> &ListStore {
        &self.lists
    }

    pub fn exprs(&self) -> &ExprArena {
        &self.exprs
    }

    /// Mutable arena access for the parser layer.
    pub fn exprs_mut(&mut self) -> &mut ExprArena {
        &mut self.exprs
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryManager {
        &mut self.memory
    }

    // Error flags

    /// Whether an evaluation error has been raised since the last reset.
    #[inline]
    pub fn eval_error(&self) -> bool {
        self.eval.eval_error
    }

    /// Whether execution has been asked to stop.
    #[inline]
    pub fn halt(&self) -> bool {
        self.eval.halt
    }

    /// Set the evaluation error flag. Setting it also sets `halt`.
    pub fn set_eval_error(&mut self, value: bool) {
        self.eval.eval_error = value;
        if value {
            self.eval.halt = true;
        }
    }

    /// Set `halt` without raising an evaluation error.
    pub fn set_halt(&mut self, value: bool) {
        self.eval.halt = value;
    }

    /// Clear both flags before a new top-level command.
    pub fn reset_flags(&mut self) {
        self.eval.eval_error = false;
        self.eval.halt = false;
    }

    // Diagnostics

    /// Write a diagnostic to the error channel.
    pub fn report(&self, diagnostic: &Diagnostic) {
        warn!(code = %diagnostic.code, "{}", diagnostic.message);
        self.router.emit(diagnostic);
    }

    /// Report a user error and raise `eval_error`.
    pub fn report_error(&mut self, diagnostic: &Diagnostic) {
        self.report(diagnostic);
        self.set_eval_error(true);
    }

    /// Report an internal consistency failure and stop.
    #[cold]
    pub fn system_error(&self, err: &InternalError) -> ! {
        report_fatal(&self.router, self.config.fatal_policy, err)
    }

    // Well-known values

    pub fn true_symbol(&self) -> SymbolId {
        self.well_known.true_symbol
    }

    pub fn false_symbol(&self) -> SymbolId {
        self.well_known.false_symbol
    }

    pub fn nil_symbol(&self) -> SymbolId {
        self.well_known.nil
    }

    pub fn empty_string(&self) -> SymbolId {
        self.well_known.empty_string
    }

    /// `TRUE` or `FALSE`.
    pub fn boolean(&self, value: bool) -> DataValue {
        if value {
            DataValue::symbol(self.well_known.true_symbol)
        } else {
            DataValue::symbol(self.well_known.false_symbol)
        }
    }

    /// Whether `value` is anything but the symbol `FALSE`.
    pub fn is_true(&self, value: &DataValue) -> bool {
        *value != DataValue::symbol(self.well_known.false_symbol)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let slots = self.data.take_in_teardown_order();
        for (data, teardown) in slots {
            if let Some(teardown) = teardown {
                teardown(self, data);
            }
        }
        self.atoms.clear(&mut self.memory);
    }
}

/// Unwrap a store result that borrows from the environment mutably.
macro_rules! or_fatal {
    ($env:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => $env.system_error(&err),
        }
    };
}
pub(crate) use or_fatal;

/// Unwrap a store result, turning internal errors into the fatal path.
pub(crate) trait OrFatal<T> {
    fn or_fatal(self, env: &Environment) -> T;
}

impl<T> OrFatal<T> for Result<T, InternalError> {
    #[inline]
    fn or_fatal(self, env: &Environment) -> T {
        match self {
            Ok(value) => value,
            Err(err) => env.system_error(&err),
        }
    }
}

fn pin_well_known(
    atoms: &mut AtomStore,
    memory: &mut MemoryManager,
) -> Result<WellKnown, InternalError> {
    let mut pinned = |text: &str| -> Result<SymbolId, InternalError> {
        let id = atoms.store_symbol(text, 0, memory)?;
        atoms.increment(AtomRef::Symbol(id))?;
        Ok(id)
    };
    Ok(WellKnown {
        true_symbol: pinned("TRUE")?,
        false_symbol: pinned("FALSE")?,
        nil: pinned("nil")?,
        empty_string: pinned("")?,
    })
}

#[cold]
fn report_fatal(router: &SharedRouter, policy: FatalPolicy, err: &InternalError) -> ! {
    let diagnostic = Diagnostic::system_error(err.subsystem(), err.number(), err.to_string());
    error!(code = %diagnostic.code, "{err}");
    router.emit(&diagnostic);
    match policy {
        FatalPolicy::Panic => panic!("{diagnostic}"),
        FatalPolicy::Exit(code) => router.exit(code),
    }
}
