//! Creating and reading tagged values.
//!
//! New atoms are interned at the current evaluation depth, unclaimed, so
//! a later cleanup pass reclaims them unless they are installed or pulled
//! up to a shallower depth first.

use clp_ir::{DataValue, ExternalAddress, ListRange, Payload, SymbolId, TypeCode};

use crate::environment::OrFatal;
use crate::Environment;

impl Environment {
    pub(crate) fn intern_symbol(&mut self, text: &str) -> SymbolId {
        let depth = self.eval.depth;
        self.atoms
            .store_symbol(text, depth, &mut self.memory)
            .or_fatal(self)
    }

    pub fn create_symbol(&mut self, text: &str) -> DataValue {
        DataValue::symbol(self.intern_symbol(text))
    }

    pub fn create_string(&mut self, text: &str) -> DataValue {
        DataValue::string(self.intern_symbol(text))
    }

    pub fn create_instance_name(&mut self, text: &str) -> DataValue {
        DataValue::instance_name(self.intern_symbol(text))
    }

    pub fn create_integer(&mut self, value: i64) -> DataValue {
        let depth = self.eval.depth;
        let id = self
            .atoms
            .store_integer(value, depth, &mut self.memory)
            .or_fatal(self);
        DataValue::integer(id)
    }

    pub fn create_float(&mut self, value: f64) -> DataValue {
        let depth = self.eval.depth;
        let id = self
            .atoms
            .store_float(value, depth, &mut self.memory)
            .or_fatal(self);
        DataValue::float(id)
    }

    pub fn create_bitmap(&mut self, bytes: &[u8]) -> DataValue {
        let depth = self.eval.depth;
        let id = self
            .atoms
            .store_bitmap(bytes, depth, &mut self.memory)
            .or_fatal(self);
        DataValue::bitmap(id)
    }

    /// Intern an address of an installed address type.
    pub fn create_external_address(&mut self, address: usize, type_index: u16) -> DataValue {
        if let Err(err) = self.address_types.get(type_index) {
            self.system_error(&err);
        }
        let depth = self.eval.depth;
        let id = self
            .atoms
            .store_external_address(
                ExternalAddress {
                    address,
                    type_index,
                },
                depth,
                &mut self.memory,
            )
            .or_fatal(self);
        DataValue::external_address(id)
    }

    /// A fresh list segment holding `cells`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "cell offsets are u32; memory runs out before a list holds u32::MAX cells"
    )]
    pub fn create_list(&mut self, cells: Vec<DataValue>) -> DataValue {
        let len = cells.len() as u32;
        let id = self.lists.from_values(cells, self.eval.depth);
        DataValue::list(ListRange::new(id, 0, len))
    }

    /// A fresh segment copied from part of an existing list.
    pub fn create_subsequence(&mut self, range: ListRange) -> DataValue {
        let depth = self.eval.depth;
        self.lists.duplicate(range, depth).or_fatal(self)
    }

    /// An opaque host handle tagged with `code` (fact addresses, extension kinds).
    pub fn create_opaque(&self, code: TypeCode, raw: u32) -> DataValue {
        DataValue::new(code, Payload::Opaque(raw))
    }

    pub fn integer_of(&self, value: &DataValue) -> Option<i64> {
        value
            .as_integer()
            .map(|id| self.atoms.integer_value(id).or_fatal(self))
    }

    pub fn float_of(&self, value: &DataValue) -> Option<f64> {
        value
            .as_float()
            .map(|id| self.atoms.float_value(id).or_fatal(self))
    }

    /// Integer or float value widened to `f64`.
    pub fn number_of(&self, value: &DataValue) -> Option<f64> {
        match value.payload {
            Payload::Integer(_) => self.integer_of(value).map(|n| n as f64),
            Payload::Float(_) => self.float_of(value),
            _ => None,
        }
    }

    /// Text of a symbol, string, or instance name.
    pub fn lexeme_of(&self, value: &DataValue) -> Option<&str> {
        value
            .as_lexeme()
            .map(|id| self.atoms.symbol_text(id).or_fatal(self))
    }

    pub fn symbol_text(&self, id: SymbolId) -> &str {
        self.atoms.symbol_text(id).or_fatal(self)
    }

    pub fn external_address_of(&self, value: &DataValue) -> Option<ExternalAddress> {
        value
            .as_external_address()
            .map(|id| self.atoms.external_address(id).or_fatal(self))
    }

    /// Cells of a list value.
    pub fn list_cells(&self, value: &DataValue) -> Option<&[DataValue]> {
        value
            .as_list()
            .map(|range| self.lists.cells(range).or_fatal(self))
    }

    /// Equality that compares lists by contents.
    pub fn values_equal(&self, a: &DataValue, b: &DataValue) -> bool {
        self.lists.values_equal(a, b).or_fatal(self)
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn created_values_read_back() {
        let mut env = Environment::new();
        let n = env.create_integer(-12);
        let x = env.create_float(2.5);
        let s = env.create_string("text");
        assert_eq!(env.integer_of(&n), Some(-12));
        assert_eq!(env.float_of(&x), Some(2.5));
        assert_eq!(env.number_of(&n), Some(-12.0));
        assert_eq!(env.lexeme_of(&s), Some("text"));
        assert_eq!(s.code, TypeCode::STRING);
        assert_eq!(env.integer_of(&x), None);
    }

    #[test]
    fn symbols_and_strings_share_handles() {
        let mut env = Environment::new();
        let symbol = env.create_symbol("abc");
        let string = env.create_string("abc");
        assert_eq!(symbol.as_lexeme(), string.as_lexeme());
        assert_ne!(symbol, string);
    }

    #[test]
    fn lists_compare_by_contents() {
        let mut env = Environment::new();
        let one = env.create_integer(1);
        let a = env.create_list(vec![one]);
        let b = env.create_list(vec![one]);
        assert_ne!(a, b);
        assert!(env.values_equal(&a, &b));
        assert_eq!(env.list_cells(&a).expect("list"), &[one]);
    }

    #[test]
    fn subsequence_copies() {
        let mut env = Environment::new();
        let cells: Vec<_> = (1..=4).map(|n| env.create_integer(n)).collect();
        let list = env.create_list(cells.clone());
        let range = list.as_list().expect("list");
        let middle = env.create_subsequence(ListRange::new(range.list, 1, 3));
        assert_eq!(env.list_cells(&middle).expect("list"), &cells[1..3]);
    }

    #[test]
    fn booleans() {
        let env = Environment::new();
        assert!(env.is_true(&env.boolean(true)));
        assert!(!env.is_true(&env.boolean(false)));
        assert_eq!(env.symbol_text(env.nil_symbol()), "nil");
        assert_eq!(env.symbol_text(env.empty_string()), "");
    }
}
