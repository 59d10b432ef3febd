//! Argument access for native function bodies.
//!
//! Every routine works against the innermost call frame, i.e. the call
//! whose native body is running. Failures report a diagnostic naming the
//! function, raise `eval_error`, and return `None`.

use std::fmt;

use clp_ir::{DataValue, ExprId, TypeCode};
use smallvec::SmallVec;

use crate::environment::OrFatal;
use crate::errors::{nonexistent_argument, wrong_arg_count, wrong_arg_range, wrong_arg_type};
use crate::Environment;

/// How an argument count is compared against the expected count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArgRelation {
    Exactly,
    AtLeast,
    NoMoreThan,
}

impl ArgRelation {
    pub fn holds(self, actual: usize, expected: usize) -> bool {
        match self {
            ArgRelation::Exactly => actual == expected,
            ArgRelation::AtLeast => actual >= expected,
            ArgRelation::NoMoreThan => actual <= expected,
        }
    }
}

impl fmt::Display for ArgRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArgRelation::Exactly => "exactly",
            ArgRelation::AtLeast => "at least",
            ArgRelation::NoMoreThan => "no more than",
        })
    }
}

impl Environment {
    /// Name of the function whose body is running, for diagnostics.
    pub fn current_function_name(&self) -> String {
        let Some(frame) = self.current_frame() else {
            return "unknown".to_string();
        };
        if let Some(descriptor) = frame.function.and_then(|id| self.functions.get(id).ok()) {
            return descriptor.name().to_string();
        }
        self.exprs
            .get(frame.expr)
            .ok()
            .and_then(|node| self.primitives.get(node.code).ok())
            .map_or_else(|| "unknown".to_string(), |p| p.name.clone())
    }

    fn current_args(&self) -> Option<ExprId> {
        let expr = self.current_expression()?;
        self.exprs.get(expr).or_fatal(self).args
    }

    /// Number of arguments of the current call.
    pub fn get_arg_count(&self) -> usize {
        self.exprs.count_args(self.current_args())
    }

    /// Unevaluated node of the `position`-th (1-based) argument.
    pub fn arg_expression(&self, position: usize) -> Option<ExprId> {
        self.exprs.nth_sibling(self.current_args(), position)
    }

    /// Evaluate the `position`-th (1-based) argument of the current call.
    ///
    /// Returns `None` without evaluating anything once `halt` is set.
    pub fn get_arg_at(&mut self, position: usize) -> Option<DataValue> {
        if self.eval.halt {
            return None;
        }
        let Some(arg) = self.arg_expression(position) else {
            let name = self.current_function_name();
            self.report_error(&nonexistent_argument(&name, position));
            return None;
        };
        self.eval_expression(arg).ok()
    }

    /// Evaluate every argument in order, stopping at the first error.
    pub fn get_all_args(&mut self) -> Option<SmallVec<[DataValue; 4]>> {
        let count = self.get_arg_count();
        let mut values = SmallVec::with_capacity(count);
        for position in 1..=count {
            values.push(self.get_arg_at(position)?);
        }
        Some(values)
    }

    /// Check the argument count. Returns the actual count when it holds.
    pub fn check_arg_count(&mut self, relation: ArgRelation, expected: usize) -> Option<usize> {
        let actual = self.get_arg_count();
        if relation.holds(actual, expected) {
            return Some(actual);
        }
        let name = self.current_function_name();
        self.report_error(&wrong_arg_count(&name, relation, expected));
        None
    }

    /// Check that the argument count lies in `min..=max`.
    pub fn check_arg_range(&mut self, min: usize, max: usize) -> Option<usize> {
        let actual = self.get_arg_count();
        if (min..=max).contains(&actual) {
            return Some(actual);
        }
        let name = self.current_function_name();
        self.report_error(&wrong_arg_range(&name, min, max));
        None
    }

    /// Evaluate an argument and check it against `expected`.
    ///
    /// The union codes (`INTEGER_OR_FLOAT`, `SYMBOL_OR_STRING`,
    /// `INSTANCE_OR_INSTANCE_NAME`) accept any of their members. An integer
    /// where a float is expected (or the reverse) is converted, floats
    /// truncating toward zero.
    pub fn check_arg_type(&mut self, position: usize, expected: TypeCode) -> Option<DataValue> {
        let value = self.get_arg_at(position)?;
        if let Some(value) = self.widen_arg(value, expected) {
            return Some(value);
        }
        let name = self.current_function_name();
        self.report_error(&wrong_arg_type(&name, position, expected.describe()));
        None
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "integer and float arguments convert with `as` semantics"
    )]
    fn widen_arg(&mut self, value: DataValue, expected: TypeCode) -> Option<DataValue> {
        let code = value.code;
        if code == expected {
            return Some(value);
        }
        let accepted = match expected {
            TypeCode::INTEGER_OR_FLOAT => code.is_number(),
            TypeCode::SYMBOL_OR_STRING => {
                matches!(code, TypeCode::SYMBOL | TypeCode::STRING)
                    || (self.config.object_system && code == TypeCode::INSTANCE_NAME)
            }
            TypeCode::INSTANCE_OR_INSTANCE_NAME => matches!(
                code,
                TypeCode::INSTANCE_ADDRESS | TypeCode::INSTANCE_NAME | TypeCode::SYMBOL
            ),
            TypeCode::FLOAT if code == TypeCode::INTEGER => {
                let n = self.integer_of(&value)?;
                return Some(self.create_float(n as f64));
            }
            TypeCode::INTEGER if code == TypeCode::FLOAT => {
                let x = self.float_of(&value)?;
                return Some(self.create_integer(x as i64));
            }
            _ => false,
        };
        accepted.then_some(value)
    }

    /// Numeric argument with a fast path for literal nodes.
    ///
    /// `arg` is evaluated only when it is not already an integer or float
    /// constant. With `convert_to_float` an integer result becomes a float.
    #[expect(
        clippy::cast_precision_loss,
        reason = "integer to float conversion is the requested behavior"
    )]
    pub fn get_numeric_arg(
        &mut self,
        arg: ExprId,
        position: usize,
        convert_to_float: bool,
    ) -> Option<DataValue> {
        let node = *self.exprs.get(arg).or_fatal(self);
        let value = match node.constant() {
            Some(value) if value.code.is_number() => value,
            _ => self.eval_expression(arg).ok()?,
        };
        if !value.code.is_number() {
            let name = self.current_function_name();
            self.report_error(&wrong_arg_type(
                &name,
                position,
                TypeCode::INTEGER_OR_FLOAT.describe(),
            ));
            return None;
        }
        if convert_to_float && value.code == TypeCode::INTEGER {
            let n = self.integer_of(&value)?;
            return Some(self.create_float(n as f64));
        }
        Some(value)
    }

    /// The `position`-th argument as an integer, converting floats.
    pub fn get_integer_arg(&mut self, position: usize) -> Option<i64> {
        let value = self.check_arg_type(position, TypeCode::INTEGER)?;
        self.integer_of(&value)
    }

    /// The `position`-th argument as a float, converting integers.
    pub fn get_float_arg(&mut self, position: usize) -> Option<f64> {
        let value = self.check_arg_type(position, TypeCode::FLOAT)?;
        self.float_of(&value)
    }

    /// The `position`-th argument as a number of either kind.
    pub fn get_number_arg(&mut self, position: usize) -> Option<DataValue> {
        let arg = match self.arg_expression(position) {
            Some(arg) if !self.eval.halt => arg,
            Some(_) => return None,
            None => {
                let name = self.current_function_name();
                self.report_error(&nonexistent_argument(&name, position));
                return None;
            }
        };
        self.get_numeric_arg(arg, position, false)
    }
}
