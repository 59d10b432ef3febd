//! Top-level command execution.

use clp_ir::{DataValue, ExprId};
use tracing::debug;

use crate::errors::{EvalFailure, EvalResult};
use crate::Environment;

impl Environment {
    /// Run `expr` as a top-level command.
    ///
    /// Clears the error flags, pins the tree while it runs one depth level
    /// down, then unpins it and gives periodic cleanup a chance to run.
    ///
    /// At top level the result stays claimed (at the depth it was produced
    /// at) until the next top-level command starts, which releases it so a
    /// later cleanup pass can reclaim it. Nested commands pull their result
    /// up to the caller's depth instead.
    pub fn run_command(&mut self, expr: ExprId) -> EvalResult {
        let top_level = self.call_depth() == 0 && self.eval.depth == 0;
        if top_level {
            self.release_last_result();
        }
        self.reset_flags();
        self.increment_expression(Some(expr));
        let result = self.with_nested_depth(|env| env.eval_expression(expr));
        let (Ok(value) | Err(EvalFailure { placeholder: value })) = result;
        if top_level {
            self.value_install(&value);
            self.eval.last_result = Some(value);
        } else {
            self.propagate_return_value(&value);
        }
        self.decrement_expression(Some(expr));
        let reclaimed = self.periodic_cleanup(true);
        debug!(error = result.is_err(), reclaimed, "command finished");
        result
    }

    /// Result of the last top-level command, while it is still claimed.
    pub fn last_result(&self) -> Option<DataValue> {
        self.eval.last_result
    }

    /// Drop the claim on the last top-level result.
    fn release_last_result(&mut self) {
        if let Some(previous) = self.eval.last_result.take() {
            self.value_deinstall(&previous);
        }
    }
}
