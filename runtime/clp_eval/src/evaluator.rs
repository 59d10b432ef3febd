//! Tree-walking evaluation.
//!
//! `eval_expression` dispatches on the node's type code:
//! - literal kinds are copied into the result
//! - FCALL nodes run their native body one depth level down, inside a
//!   call frame, and the native result is marshaled by its return tag
//! - variable references go through the active bindings
//! - every other code goes through the primitive dispatch table
//!
//! Each successful result is pulled up to the caller's depth
//! ([`Environment::propagate_return_value`]) so cleanup at that depth does
//! not reclaim it.

mod command;
mod frame;

use clp_ir::{
    DataValue, ExprId, ExprNode, ExprValue, FunctionId, InternalError, Payload, TypeCode,
};
use smallvec::SmallVec;

pub use frame::{CallFrame, NestedDepth, ScopedCall};

use crate::environment::OrFatal;
use crate::errors::{
    depth_exceeded, return_shape_mismatch, unbound_variable, EvalFailure, EvalResult,
};
use crate::functions::{NativeFn, ReturnTag};
use crate::stack::ensure_sufficient_stack;
use crate::Environment;

/// Evaluator bookkeeping owned by the environment.
#[derive(Debug, Default)]
pub struct EvalState {
    /// Current nesting depth. Top level is 0.
    pub(crate) depth: u32,
    pub(crate) eval_error: bool,
    pub(crate) halt: bool,
    pub(crate) frames: Vec<CallFrame>,
    /// Result of the last top-level command, claimed until the next one.
    pub(crate) last_result: Option<DataValue>,
}

impl Environment {
    /// Evaluate `expr` at the current depth.
    ///
    /// Returns `Err` when evaluation raised `eval_error`; the failure
    /// carries the placeholder result the failing node produced.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn eval_expression(&mut self, expr: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: ExprId) -> EvalResult {
        // ExprNode is Copy; copying releases the arena borrow.
        let node = *self.exprs.get(expr).or_fatal(self);
        let result = match node.code {
            TypeCode::FCALL => self.eval_function_call(expr, &node)?,
            code if code.is_variable() => self.eval_variable(expr, &node)?,
            code if is_literal_code(code) => self.literal(expr, &node),
            _ => self.eval_primitive(expr, &node)?,
        };
        self.propagate_return_value(&result);
        Ok(result)
    }

    /// Copy a constant node into a tagged value.
    fn literal(&self, expr: ExprId, node: &ExprNode) -> DataValue {
        match node.value {
            ExprValue::Constant(payload) => DataValue::new(node.code, payload),
            ExprValue::Extension(raw) => DataValue::new(node.code, Payload::Opaque(raw)),
            ExprValue::Function(_) | ExprValue::Variable(_) => {
                self.system_error(&InternalError::MalformedExpression(expr.raw()))
            }
        }
    }

    fn eval_function_call(&mut self, expr: ExprId, node: &ExprNode) -> EvalResult {
        let ExprValue::Function(id) = node.value else {
            self.system_error(&InternalError::MalformedExpression(expr.raw()));
        };
        let descriptor = self.functions.get(id).or_fatal(self);
        let native = descriptor.native.clone();
        let tag = descriptor.return_tag;

        if let Some(max) = self.config.max_eval_depth {
            if self.eval.frames.len() >= max {
                let name = descriptor.name().to_string();
                self.report_error(&depth_exceeded(&name, max));
                return Err(EvalFailure::new(self.boolean(false)));
            }
        }

        let result = {
            let mut call = self.enter_call(expr, Some(id));
            call.invoke_native(id, &native, tag)
        };
        if self.eval.eval_error {
            return Err(EvalFailure::new(result));
        }
        Ok(result)
    }

    /// Run a native body and marshal its result. Values are created at
    /// the callee's depth.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "narrow return tags truncate through their declared width"
    )]
    fn invoke_native(&mut self, id: FunctionId, native: &NativeFn, tag: ReturnTag) -> DataValue {
        match native {
            NativeFn::Void(body) => {
                body.call(self);
                DataValue::VOID
            }
            NativeFn::Boolean(body) => {
                let value = body.call(self);
                self.boolean(value)
            }
            NativeFn::Integer(body) => {
                let value = body.call(self);
                match tag {
                    ReturnTag::Integer32 => self.create_integer(i64::from(value as i32)),
                    ReturnTag::Character => {
                        let c = char::from(value as u8);
                        self.create_symbol(c.encode_utf8(&mut [0; 4]))
                    }
                    _ => self.create_integer(value),
                }
            }
            NativeFn::Float(body) => {
                let value = body.call(self);
                match tag {
                    ReturnTag::Float32 => self.create_float(f64::from(value as f32)),
                    _ => self.create_float(value),
                }
            }
            NativeFn::Symbol(body) => DataValue::symbol(body.call(self)),
            NativeFn::String(body) => DataValue::string(body.call(self)),
            NativeFn::InstanceName(body) => DataValue::instance_name(body.call(self)),
            NativeFn::ExternalAddress(body) => DataValue::external_address(body.call(self)),
            NativeFn::Generic(body) => {
                let value = body.call(self);
                if !tag.admits(value.code) && !self.eval.eval_error {
                    let name = self.functions.get(id).or_fatal(self).name().to_string();
                    self.report_error(&return_shape_mismatch(&name, tag.describe(), value.code));
                }
                value
            }
        }
    }

    fn eval_variable(&mut self, expr: ExprId, node: &ExprNode) -> EvalResult {
        let ExprValue::Variable(name) = node.value else {
            self.system_error(&InternalError::MalformedExpression(expr.raw()));
        };
        let global = matches!(node.code, TypeCode::GBL_VARIABLE | TypeCode::MF_GBL_VARIABLE);
        if let Some(value) = self.bindings.lookup(name, global) {
            return Ok(value);
        }
        let text = self.symbol_text(name).to_string();
        self.report_error(&unbound_variable(&text, node.code));
        Err(EvalFailure::new(self.boolean(false)))
    }

    fn eval_primitive(&mut self, expr: ExprId, node: &ExprNode) -> EvalResult {
        let descriptor = self.primitives.get(node.code).or_fatal(self);
        let hook = match &descriptor.evaluate {
            Some(hook) if !descriptor.lazy => hook.clone(),
            _ => return Ok(self.literal(expr, node)),
        };
        let result = {
            let mut call = self.enter_call(expr, None);
            hook(&mut call, expr)
        };
        if self.eval.eval_error {
            return Err(EvalFailure::new(result));
        }
        Ok(result)
    }

    /// Pull `value` up to the current depth.
    ///
    /// Atoms and list segments created deeper than the current depth get
    /// their depth lowered, and list cells are lowered recursively.
    pub fn propagate_return_value(&mut self, value: &DataValue) {
        let depth = self.eval.depth;
        self.lower_value_depth(value, depth);
    }

    fn lower_value_depth(&mut self, value: &DataValue, depth: u32) {
        match value.payload {
            Payload::List(range) => {
                self.lists.lower_depth(range.list, depth).or_fatal(self);
                let cells: SmallVec<[DataValue; 8]> =
                    SmallVec::from_slice(self.lists.cells(range).or_fatal(self));
                for cell in &cells {
                    self.lower_value_depth(cell, depth);
                }
            }
            _ => {
                if let Some(atom) = value.atom() {
                    self.atoms.lower_depth(atom, depth).or_fatal(self);
                }
            }
        }
    }
}

/// Codes whose constant nodes evaluate to themselves.
fn is_literal_code(code: TypeCode) -> bool {
    code.is_self_evaluating()
        || matches!(code, TypeCode::LIST | TypeCode::VOID | TypeCode::BITMAP)
}
