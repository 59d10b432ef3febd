//! Function registry.
//!
//! Descriptors are immutable once registered (redefinition replaces the
//! entry under the same handle). Installed expressions count as uses, and
//! a function in use cannot be removed.

mod native;
mod restrictions;

use std::fmt;
use std::sync::Arc;

use clp_ir::{AtomKind, AtomRef, ExprId, FunctionId, InternalError, SymbolId};
use rustc_hash::FxHashMap;
use tracing::debug;

pub use native::{Native, NativeFn, ReturnTag};
pub use restrictions::{Restriction, TypeSet};

use crate::environment::{or_fatal, OrFatal};
use crate::errors::DefineError;
use crate::Environment;

/// Specialized parser for a function's call syntax, owned by the parser layer.
pub type ParserHook = Arc<dyn Fn(&mut Environment, ExprId) -> Option<ExprId> + Send + Sync>;

/// A registered native function.
pub struct FunctionDescriptor {
    pub name: SymbolId,
    name_text: String,
    pub return_tag: ReturnTag,
    pub native: NativeFn,
    pub restriction: Option<Restriction>,
    restriction_text: Option<String>,
    pub parser: Option<ParserHook>,
    uses: u32,
}

impl FunctionDescriptor {
    pub fn name(&self) -> &str {
        &self.name_text
    }

    /// The restriction string as registered.
    pub fn restriction_text(&self) -> Option<&str> {
        self.restriction_text.as_deref()
    }

    /// Installed expressions referencing this function.
    pub fn uses(&self) -> u32 {
        self.uses
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name_text)
            .field("return_tag", &self.return_tag)
            .field("native", &self.native)
            .field("restriction", &self.restriction_text)
            .field("uses", &self.uses)
            .finish_non_exhaustive()
    }
}

/// Descriptors by handle and by name.
///
/// Handles are never reused, so a stale [`FunctionId`] is detected rather
/// than silently aliasing a newer function.
#[derive(Default)]
pub struct FunctionRegistry {
    descriptors: Vec<Option<FunctionDescriptor>>,
    by_name: FxHashMap<SymbolId, FunctionId>,
}

impl FunctionRegistry {
    pub fn get(&self, id: FunctionId) -> Result<&FunctionDescriptor, InternalError> {
        self.descriptors
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(InternalError::DeadFunction(id.raw()))
    }

    fn get_mut(&mut self, id: FunctionId) -> Result<&mut FunctionDescriptor, InternalError> {
        self.descriptors
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(InternalError::DeadFunction(id.raw()))
    }

    pub fn find(&self, name: SymbolId) -> Option<FunctionId> {
        self.by_name.get(&name).copied()
    }

    pub(crate) fn increment_use(&mut self, id: FunctionId) -> Result<(), InternalError> {
        let descriptor = self.get_mut(id)?;
        descriptor.uses = descriptor.uses.saturating_add(1);
        Ok(())
    }

    pub(crate) fn decrement_use(&mut self, id: FunctionId) -> Result<(), InternalError> {
        let descriptor = self.get_mut(id)?;
        if descriptor.uses == 0 {
            return Err(InternalError::FunctionUseUnderflow(descriptor.name_text.clone()));
        }
        descriptor.uses -= 1;
        Ok(())
    }

    /// Registered functions.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FunctionId, &FunctionDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .filter_map(|(i, d)| Some((FunctionId::new(u32::try_from(i).ok()?), d.as_ref()?)))
    }
}

impl Environment {
    /// Register `native` under `name` with the tag its shape implies.
    pub fn define_function(
        &mut self,
        name: &str,
        native: NativeFn,
        restrictions: Option<&str>,
    ) -> Result<FunctionId, DefineError> {
        let tag = native.default_tag();
        self.register_function(name, tag, native, restrictions)
    }

    /// Register `native` under `name` with an explicit return type tag.
    ///
    /// The tag must be producible by the shape: `i`/`l`/`c` need an integer
    /// body, `f`/`d` a float body, `m`/`n`/`k`/`j`/`x`/`u` a generic body.
    pub fn define_function_with_tag(
        &mut self,
        name: &str,
        tag: char,
        native: NativeFn,
        restrictions: Option<&str>,
    ) -> Result<FunctionId, DefineError> {
        let tag = ReturnTag::from_char(tag)?;
        native.check_tag(name, tag)?;
        self.register_function(name, tag, native, restrictions)
    }

    fn register_function(
        &mut self,
        name: &str,
        return_tag: ReturnTag,
        native: NativeFn,
        restrictions: Option<&str>,
    ) -> Result<FunctionId, DefineError> {
        let restriction = restrictions.map(Restriction::parse).transpose()?;
        let symbol = self.intern_symbol(name);

        if let Some(id) = self.functions.find(symbol) {
            let descriptor = or_fatal!(self, self.functions.get_mut(id));
            descriptor.return_tag = return_tag;
            descriptor.native = native;
            descriptor.restriction = restriction;
            descriptor.restriction_text = restrictions.map(str::to_string);
            debug!(function = name, "redefined function");
            return Ok(id);
        }

        self.atoms.increment(AtomRef::Symbol(symbol)).or_fatal(self);
        // Each function owns a distinct interned name, so the symbol table
        // exhausts its handles first.
        let id = u32::try_from(self.functions.descriptors.len())
            .map(FunctionId::new)
            .map_err(|_| InternalError::HandleSpaceExhausted { kind: AtomKind::Symbol })
            .or_fatal(self);
        self.functions.descriptors.push(Some(FunctionDescriptor {
            name: symbol,
            name_text: name.to_string(),
            return_tag,
            native,
            restriction,
            restriction_text: restrictions.map(str::to_string),
            parser: None,
            uses: 0,
        }));
        self.functions.by_name.insert(symbol, id);
        debug!(function = name, tag = %return_tag.as_char(), "defined function");
        Ok(id)
    }

    /// Remove a function. Refused while installed expressions use it.
    pub fn undefine_function(&mut self, name: &str) -> Result<(), DefineError> {
        let id = self
            .find_function(name)
            .ok_or_else(|| DefineError::NotFound(name.to_string()))?;
        let descriptor = self.functions.get(id).or_fatal(self);
        if descriptor.uses > 0 {
            return Err(DefineError::InUse {
                name: name.to_string(),
                uses: descriptor.uses,
            });
        }
        let symbol = descriptor.name;
        self.functions.descriptors[id.index()] = None;
        self.functions.by_name.remove(&symbol);
        self.atoms.decrement(AtomRef::Symbol(symbol)).or_fatal(self);
        debug!(function = name, "undefined function");
        Ok(())
    }

    /// Attach a specialized parser to a registered function.
    pub fn set_function_parser(&mut self, name: &str, parser: ParserHook) -> Result<(), DefineError> {
        let id = self
            .find_function(name)
            .ok_or_else(|| DefineError::NotFound(name.to_string()))?;
        or_fatal!(self, self.functions.get_mut(id)).parser = Some(parser);
        Ok(())
    }

    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.functions.find(self.atoms.lookup_symbol(name)?)
    }

    pub fn function(&self, id: FunctionId) -> Option<&FunctionDescriptor> {
        self.functions.get(id).ok()
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }
}

#[cfg(test)]
mod tests;
