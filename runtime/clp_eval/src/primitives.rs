//! Primitive type dispatch table.
//!
//! One slot per type code below [`MAXIMUM_PRIMITIVES`]. The evaluator sends
//! every node that is not a literal, an FCALL, or a variable reference to
//! the descriptor installed at its code; procedural and generic calls
//! (PCALL/GCALL) are installed here by the layers that own them.

use std::fmt;
use std::sync::Arc;

use clp_ir::{DataValue, ExprId, InternalError, TypeCode, MAXIMUM_PRIMITIVES};
use tracing::debug;

use crate::environment::OrFatal;
use crate::Environment;

/// Evaluates a node of the primitive's type inside a call frame for it.
pub type EvaluateHook = Arc<dyn Fn(&mut Environment, ExprId) -> DataValue + Send + Sync>;

/// Prints a value of the primitive's type.
pub type PrintHook = Arc<dyn Fn(&Environment, &DataValue) -> String + Send + Sync>;

/// Dispatch entry for one type code.
#[derive(Clone)]
pub struct PrimitiveDescriptor {
    pub name: String,
    pub evaluate: Option<EvaluateHook>,
    pub print: Option<PrintHook>,
    /// Nodes evaluate to themselves without calling `evaluate`.
    pub lazy: bool,
}

impl PrimitiveDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        PrimitiveDescriptor {
            name: name.into(),
            evaluate: None,
            print: None,
            lazy: false,
        }
    }

    #[must_use]
    pub fn evaluator(
        mut self,
        hook: impl Fn(&mut Environment, ExprId) -> DataValue + Send + Sync + 'static,
    ) -> Self {
        self.evaluate = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn printer(
        mut self,
        hook: impl Fn(&Environment, &DataValue) -> String + Send + Sync + 'static,
    ) -> Self {
        self.print = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

impl fmt::Debug for PrimitiveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveDescriptor")
            .field("name", &self.name)
            .field("evaluate", &self.evaluate.is_some())
            .field("print", &self.print.is_some())
            .field("lazy", &self.lazy)
            .finish()
    }
}

pub struct PrimitiveTable {
    slots: Vec<Option<PrimitiveDescriptor>>,
}

impl PrimitiveTable {
    pub fn new() -> Self {
        PrimitiveTable {
            slots: vec![None; MAXIMUM_PRIMITIVES],
        }
    }

    /// The descriptor installed at `code`.
    pub fn get(&self, code: TypeCode) -> Result<&PrimitiveDescriptor, InternalError> {
        self.slots
            .get(code.index())
            .and_then(Option::as_ref)
            .ok_or(InternalError::UnregisteredPrimitive(code.raw()))
    }

    fn install(&mut self, code: TypeCode, descriptor: PrimitiveDescriptor) -> Result<(), InternalError> {
        match self.slots.get_mut(code.index()) {
            Some(slot @ None) => {
                *slot = Some(descriptor);
                Ok(())
            }
            Some(Some(_)) => Err(InternalError::PrimitiveCollision(code.raw())),
            None => Err(InternalError::UnregisteredPrimitive(code.raw())),
        }
    }

    pub fn is_installed(&self, code: TypeCode) -> bool {
        self.get(code).is_ok()
    }
}

impl Default for PrimitiveTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// Install the dispatch entry for `code`.
    ///
    /// Installing over an occupied slot, or at a code outside the table, is
    /// a fatal internal error.
    pub fn install_primitive(&mut self, code: TypeCode, descriptor: PrimitiveDescriptor) {
        let name = descriptor.name.clone();
        self.primitives.install(code, descriptor).or_fatal(self);
        debug!(code = code.raw(), primitive = %name, "installed primitive");
    }

    pub fn primitive(&self, code: TypeCode) -> Option<&PrimitiveDescriptor> {
        self.primitives.get(code).ok()
    }
}
