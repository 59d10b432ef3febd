//! Expression construction.
//!
//! The parser layer builds trees through these helpers. Calls are checked
//! against the function's restriction when they are built, so the
//! evaluator never meets a call to an unknown function.

use clp_ir::{DataValue, ExprId, ExprNode, ExprValue, TypeCode};
use tracing::trace;

use crate::args::ArgRelation;
use crate::environment::OrFatal;
use crate::errors::{BuildError, CallError, EvalFailure};
use crate::functions::Restriction;
use crate::Environment;

impl Environment {
    /// Constant node for an existing value.
    pub fn constant(&mut self, value: DataValue) -> ExprId {
        self.exprs.generate_constant(value)
    }

    pub fn constant_integer(&mut self, value: i64) -> ExprId {
        let value = self.create_integer(value);
        self.constant(value)
    }

    pub fn constant_float(&mut self, value: f64) -> ExprId {
        let value = self.create_float(value);
        self.constant(value)
    }

    pub fn constant_symbol(&mut self, text: &str) -> ExprId {
        let value = self.create_symbol(text);
        self.constant(value)
    }

    pub fn constant_string(&mut self, text: &str) -> ExprId {
        let value = self.create_string(text);
        self.constant(value)
    }

    /// Reference to local variable `?name`.
    pub fn variable(&mut self, name: &str) -> ExprId {
        self.variable_with_code(name, TypeCode::SF_VARIABLE)
    }

    /// Reference to global variable `?*name*`.
    pub fn global_variable(&mut self, name: &str) -> ExprId {
        self.variable_with_code(name, TypeCode::GBL_VARIABLE)
    }

    /// Variable reference of a specific variable kind.
    pub fn variable_with_code(&mut self, name: &str, code: TypeCode) -> ExprId {
        let symbol = self.intern_symbol(name);
        self.exprs
            .alloc(ExprNode::leaf(code, ExprValue::Variable(symbol)))
    }

    /// Call of the function registered as `name` with `args` as arguments.
    ///
    /// On error the argument trees are freed.
    pub fn build_call(&mut self, name: &str, args: Vec<ExprId>) -> Result<ExprId, BuildError> {
        let checked = self.check_call(name, &args);
        let id = match checked {
            Ok(id) => id,
            Err(err) => {
                for arg in args {
                    self.exprs.return_tree(arg).or_fatal(self);
                }
                return Err(err);
            }
        };
        let call = self
            .exprs
            .call_node(TypeCode::FCALL, ExprValue::Function(id), &args)
            .or_fatal(self);
        trace!(function = name, args = args.len(), "built call");
        Ok(call)
    }

    fn check_call(&self, name: &str, args: &[ExprId]) -> Result<clp_ir::FunctionId, BuildError> {
        let id = self
            .find_function(name)
            .ok_or_else(|| BuildError::UnknownFunction(name.to_string()))?;
        let descriptor = self.functions.get(id).or_fatal(self);
        if let Some(restriction) = &descriptor.restriction {
            check_arity(name, restriction, args.len())?;
            for (index, &arg) in args.iter().enumerate() {
                let position = index + 1;
                let node = self.exprs.get(arg).or_fatal(self);
                let Some(value) = node.constant() else {
                    continue;
                };
                let accepted = restriction.types_for(position);
                if !accepted.accepts(value.code) {
                    return Err(BuildError::ArgType {
                        function: name.to_string(),
                        position,
                        expected: accepted.describe(),
                    });
                }
            }
        }
        Ok(id)
    }

    /// Node of an installed primitive type, with arguments.
    pub fn build_primitive_call(&mut self, code: TypeCode, value: u32, args: &[ExprId]) -> ExprId {
        self.exprs
            .call_node(code, ExprValue::Extension(value), args)
            .or_fatal(self)
    }

    /// Call `name` with already evaluated arguments.
    ///
    /// Builds a temporary tree, runs it one depth level down, and releases
    /// the tree. The result is pulled up to the current depth.
    pub fn call_function(&mut self, name: &str, args: &[DataValue]) -> Result<DataValue, CallError> {
        let nodes: Vec<ExprId> = args.iter().map(|value| self.constant(*value)).collect();
        let call = self.build_call(name, nodes)?;
        self.increment_expression(Some(call));
        let result = self.with_nested_depth(|env| env.eval_expression(call));
        let value = match result {
            Ok(value) | Err(EvalFailure { placeholder: value }) => value,
        };
        self.propagate_return_value(&value);
        self.decrement_expression(Some(call));
        self.return_expression(Some(call));
        result.map_err(|failure| CallError::Eval {
            function: name.to_string(),
            failure,
        })
    }
}

fn check_arity(name: &str, restriction: &Restriction, actual: usize) -> Result<(), BuildError> {
    let violated = match (restriction.min, restriction.max) {
        (Some(min), Some(max)) if min == max && actual != min => Some((ArgRelation::Exactly, min)),
        (Some(min), _) if actual < min => Some((ArgRelation::AtLeast, min)),
        (_, Some(max)) if actual > max => Some((ArgRelation::NoMoreThan, max)),
        _ => None,
    };
    match violated {
        Some((relation, expected)) => Err(BuildError::ArgCount {
            function: name.to_string(),
            relation,
            expected,
            actual,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests;
