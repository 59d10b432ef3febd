//! Claiming values and pinning expression trees.
//!
//! Installing a value claims its atom (count + 1) or, for a list, marks the
//! segment busy and installs every cell in range. Installing an expression
//! tree installs every constant leaf, counts a use of every function it
//! calls, and claims the names of the variables it references. Each install
//! must be balanced by exactly one deinstall.

use clp_ir::{AtomRef, DataValue, ExprId, ExprValue, InternalError, Payload};
use smallvec::SmallVec;

use crate::environment::OrFatal;
use crate::Environment;

/// Leaf actions collected from a tree walk.
enum Pin {
    Value(DataValue),
    Function(clp_ir::FunctionId),
    Name(clp_ir::SymbolId),
}

impl Environment {
    /// Claim `value` so cleanup passes leave it alone.
    pub fn value_install(&mut self, value: &DataValue) {
        match value.payload {
            Payload::List(range) => {
                self.lists.increment_busy(range.list).or_fatal(self);
                let cells: SmallVec<[DataValue; 8]> =
                    SmallVec::from_slice(self.lists.cells(range).or_fatal(self));
                for cell in &cells {
                    self.value_install(cell);
                }
            }
            _ => {
                if let Some(atom) = value.atom() {
                    self.atoms.increment(atom).or_fatal(self);
                }
            }
        }
    }

    /// Release a claim taken by [`Environment::value_install`].
    pub fn value_deinstall(&mut self, value: &DataValue) {
        match value.payload {
            Payload::List(range) => {
                let cells: SmallVec<[DataValue; 8]> =
                    SmallVec::from_slice(self.lists.cells(range).or_fatal(self));
                for cell in &cells {
                    self.value_deinstall(cell);
                }
                self.lists.decrement_busy(range.list).or_fatal(self);
            }
            _ => {
                if let Some(atom) = value.atom() {
                    self.atoms.decrement(atom).or_fatal(self);
                }
            }
        }
    }

    /// Pin every value a chain of trees references.
    pub fn increment_expression(&mut self, first: Option<ExprId>) {
        for pin in self.collect_pins(first) {
            match pin {
                Pin::Value(value) => self.value_install(&value),
                Pin::Function(id) => self.functions.increment_use(id).or_fatal(self),
                Pin::Name(symbol) => self.atoms.increment(AtomRef::Symbol(symbol)).or_fatal(self),
            }
        }
    }

    /// Release the pins taken by [`Environment::increment_expression`].
    pub fn decrement_expression(&mut self, first: Option<ExprId>) {
        for pin in self.collect_pins(first) {
            match pin {
                Pin::Value(value) => self.value_deinstall(&value),
                Pin::Function(id) => self.functions.decrement_use(id).or_fatal(self),
                Pin::Name(symbol) => self.atoms.decrement(AtomRef::Symbol(symbol)).or_fatal(self),
            }
        }
    }

    /// Free a chain's nodes back to the arena pool.
    ///
    /// Pinned values are not released; decrement the chain first if it was
    /// incremented.
    pub fn return_expression(&mut self, first: Option<ExprId>) {
        self.exprs.return_expression(first).or_fatal(self);
    }

    fn collect_pins(&self, first: Option<ExprId>) -> Vec<Pin> {
        let mut pins = Vec::new();
        let walked = self.exprs.try_walk(first, |_, node| {
            match node.value {
                ExprValue::Constant(payload) => {
                    pins.push(Pin::Value(DataValue::new(node.code, payload)));
                }
                ExprValue::Function(id) => pins.push(Pin::Function(id)),
                ExprValue::Variable(symbol) => pins.push(Pin::Name(symbol)),
                ExprValue::Extension(_) => {}
            }
            Ok::<(), InternalError>(())
        });
        walked.or_fatal(self);
        pins
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "Tests use expect for brevity")]

    use clp_ir::{ListRange, TypeCode};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::NativeFn;
    use crate::Native;

    fn count(env: &Environment, value: &DataValue) -> u32 {
        env.atoms()
            .count(value.atom().expect("atom"))
            .expect("live atom")
    }

    #[test]
    fn install_claims_atoms() {
        let mut env = Environment::new();
        let n = env.create_integer(5);
        env.value_install(&n);
        env.value_install(&n);
        assert_eq!(count(&env, &n), 2);
        env.value_deinstall(&n);
        assert_eq!(count(&env, &n), 1);
    }

    #[test]
    fn install_marks_lists_busy() {
        let mut env = Environment::new();
        let a = env.create_symbol("a");
        let b = env.create_float(1.5);
        let list = env.create_list(vec![a, b]);
        let range = list.as_list().expect("list");

        env.value_install(&list);
        assert_eq!(env.lists().busy(range.list).expect("segment"), 1);
        assert_eq!(count(&env, &a), 1);
        assert_eq!(count(&env, &b), 1);

        env.value_deinstall(&list);
        assert_eq!(env.lists().busy(range.list).expect("segment"), 0);
        assert_eq!(count(&env, &a), 0);
    }

    #[test]
    fn install_only_covers_range() {
        let mut env = Environment::new();
        let cells: Vec<_> = (0..3).map(|n| env.create_integer(n)).collect();
        let list = env.create_list(cells.clone());
        let range = list.as_list().expect("list");
        let tail = DataValue::list(ListRange::new(range.list, 1, 3));

        env.value_install(&tail);
        assert_eq!(count(&env, &cells[0]), 0);
        assert_eq!(count(&env, &cells[1]), 1);
        env.value_deinstall(&tail);
    }

    #[test]
    fn expression_pins_constants_functions_and_names() {
        let mut env = Environment::new();
        let id = env
            .define_function("noop", NativeFn::Void(Native::plain(|| ())), None)
            .expect("define");
        let arg = env.constant_string("hello");
        let var = env.variable("x");
        let call = env.build_call("noop", vec![arg, var]).expect("build");

        env.increment_expression(Some(call));
        let hello = env.atoms().lookup_symbol("hello").expect("interned");
        let x = env.atoms().lookup_symbol("x").expect("interned");
        assert_eq!(env.function(id).expect("defined").uses(), 1);
        assert_eq!(env.atoms().count(AtomRef::Symbol(hello)).expect("live"), 1);
        assert_eq!(env.atoms().count(AtomRef::Symbol(x)).expect("live"), 1);

        env.decrement_expression(Some(call));
        assert_eq!(env.function(id).expect("defined").uses(), 0);
        assert_eq!(env.atoms().count(AtomRef::Symbol(hello)).expect("live"), 0);
        env.return_expression(Some(call));
        assert_eq!(env.exprs().live(), 0);
    }

    #[test]
    #[should_panic(expected = "[INTEGER3]")]
    fn deinstall_below_zero_is_fatal() {
        let mut env = Environment::builder()
            .router(clp_diagnostic::silent_router())
            .build();
        let n = env.create_integer(9);
        assert_eq!(n.code, TypeCode::INTEGER);
        env.value_deinstall(&n);
    }
}
