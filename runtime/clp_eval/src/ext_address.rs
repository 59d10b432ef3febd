//! External address types.
//!
//! Hosts register the kinds of foreign pointer they hand to the runtime.
//! The table is bounded by `EnvConfig::max_external_address_types`; an
//! address's type index selects its print and discard hooks.

use std::fmt;
use std::sync::Arc;

use clp_ir::{DataValue, ExternalAddress, InternalError};
use tracing::debug;

use crate::environment::OrFatal;
use crate::Environment;

/// Prints an address of this type.
pub type AddressPrintHook = Arc<dyn Fn(&Environment, ExternalAddress) -> String + Send + Sync>;

/// Creates an address of this type from the current call's arguments.
pub type NewInstanceHook = Arc<dyn Fn(&mut Environment) -> DataValue + Send + Sync>;

/// Called with the raw address when its last reference is reclaimed.
pub type DiscardHook = Arc<dyn Fn(usize) + Send + Sync>;

#[derive(Clone)]
pub struct ExternalAddressType {
    pub name: String,
    pub print_short: Option<AddressPrintHook>,
    pub print_long: Option<AddressPrintHook>,
    pub new_instance: Option<NewInstanceHook>,
    pub discard: Option<DiscardHook>,
}

impl ExternalAddressType {
    pub fn new(name: impl Into<String>) -> Self {
        ExternalAddressType {
            name: name.into(),
            print_short: None,
            print_long: None,
            new_instance: None,
            discard: None,
        }
    }

    #[must_use]
    pub fn on_discard(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.discard = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn printers(
        mut self,
        short: impl Fn(&Environment, ExternalAddress) -> String + Send + Sync + 'static,
        long: impl Fn(&Environment, ExternalAddress) -> String + Send + Sync + 'static,
    ) -> Self {
        self.print_short = Some(Arc::new(short));
        self.print_long = Some(Arc::new(long));
        self
    }

    #[must_use]
    pub fn constructor(
        mut self,
        hook: impl Fn(&mut Environment) -> DataValue + Send + Sync + 'static,
    ) -> Self {
        self.new_instance = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ExternalAddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalAddressType")
            .field("name", &self.name)
            .field("discard", &self.discard.is_some())
            .finish_non_exhaustive()
    }
}

/// Bounded list of installed address types.
pub struct AddressTypeTable {
    types: Vec<ExternalAddressType>,
    capacity: usize,
}

impl AddressTypeTable {
    pub fn new(capacity: usize) -> Self {
        AddressTypeTable {
            types: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn get(&self, index: u16) -> Result<&ExternalAddressType, InternalError> {
        self.types
            .get(usize::from(index))
            .ok_or(InternalError::UnknownAddressType(index))
    }

    fn push(&mut self, kind: ExternalAddressType) -> Result<u16, InternalError> {
        if self.types.len() >= self.capacity {
            return Err(InternalError::AddressTypesExhausted(self.capacity));
        }
        let index = u16::try_from(self.types.len())
            .map_err(|_| InternalError::AddressTypesExhausted(self.capacity))?;
        self.types.push(kind);
        Ok(index)
    }

    /// Discard hook for addresses of type `index`, if any.
    pub(crate) fn discard_hook(&self, index: u16) -> Option<DiscardHook> {
        self.types.get(usize::from(index))?.discard.clone()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Environment {
    /// Install an address type, returning its type index.
    ///
    /// Exceeding the configured capacity is a fatal internal error.
    pub fn install_ext_address_type(&mut self, kind: ExternalAddressType) -> u16 {
        let name = kind.name.clone();
        let index = self.address_types.push(kind).or_fatal(self);
        debug!(index, address_type = %name, "installed external address type");
        index
    }

    pub fn ext_address_type(&self, index: u16) -> Option<&ExternalAddressType> {
        self.address_types.get(index).ok()
    }

    /// Create an address of type `index` through its constructor hook.
    ///
    /// Types without a constructor yield `None`.
    pub fn new_external_address(&mut self, index: u16) -> Option<DataValue> {
        let hook = self.address_types.get(index).or_fatal(self).new_instance.clone()?;
        Some(hook(self))
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn types_get_sequential_indices() {
        let mut env = Environment::new();
        assert_eq!(env.install_ext_address_type(ExternalAddressType::new("C")), 0);
        assert_eq!(env.install_ext_address_type(ExternalAddressType::new("file")), 1);
        assert_eq!(env.ext_address_type(1).map(|t| t.name.as_str()), Some("file"));
    }

    #[test]
    #[should_panic(expected = "[EVALUATN6]")]
    fn exceeding_capacity_is_fatal() {
        let mut config = crate::EnvConfig::default();
        config.max_external_address_types = 1;
        let mut env = Environment::builder()
            .config(config)
            .router(clp_diagnostic::silent_router())
            .build();
        env.install_ext_address_type(ExternalAddressType::new("a"));
        env.install_ext_address_type(ExternalAddressType::new("b"));
    }

    #[test]
    #[should_panic(expected = "[EVALUATN7]")]
    fn addresses_of_unknown_types_are_fatal() {
        let mut env = Environment::builder()
            .router(clp_diagnostic::silent_router())
            .build();
        let _ = env.create_external_address(0x1000, 3);
    }

    #[test]
    fn constructor_hook_builds_addresses() {
        let mut env = Environment::new();
        let index = env.install_ext_address_type(
            ExternalAddressType::new("buffer")
                .constructor(|env| env.create_external_address(0xbeef, 0)),
        );
        let value = env.new_external_address(index).expect("constructor");
        let address = env.external_address_of(&value).expect("address");
        assert_eq!(address.address, 0xbeef);
        let plain = env.install_ext_address_type(ExternalAddressType::new("plain"));
        assert_eq!(env.new_external_address(plain), None);
    }

    #[test]
    fn discard_runs_when_reclaimed() {
        static DISCARDED: AtomicUsize = AtomicUsize::new(0);
        let mut env = Environment::new();
        let index = env.install_ext_address_type(
            ExternalAddressType::new("handle").on_discard(|address| {
                DISCARDED.store(address, Ordering::SeqCst);
            }),
        );
        env.with_nested_depth(|env| {
            let _ = env.create_external_address(0x42, index);
        });
        env.full_cleanup();
        assert_eq!(DISCARDED.load(Ordering::SeqCst), 0x42);
    }
}
