//! RAII guards for call frames and evaluation depth.
//!
//! A [`ScopedCall`] records the call being evaluated (so the argument
//! access layer can find it) and runs the callee one depth level down.
//! Dropping the guard restores both, including on early return and during
//! unwinding.
//!
//! ```text
//! let mut call = env.enter_call(expr, Some(function));
//! let result = native.call(&mut call);
//! drop(call); // frame popped, depth restored
//! ```

use std::ops::{Deref, DerefMut};

use clp_ir::{ExprId, FunctionId};

use crate::Environment;

/// A call currently being evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// The call node whose arguments are being accessed.
    pub expr: ExprId,
    /// Function descriptor for FCALL nodes; `None` for primitive hooks.
    pub function: Option<FunctionId>,
    /// Depth of the caller, restored when the frame is popped.
    pub caller_depth: u32,
}

/// Guard that pops a call frame on drop.
///
/// Derefs to the environment so the callee can use it directly.
pub struct ScopedCall<'env> {
    env: &'env mut Environment,
}

impl Drop for ScopedCall<'_> {
    fn drop(&mut self) {
        if let Some(frame) = self.env.eval.frames.pop() {
            self.env.eval.depth = frame.caller_depth;
        }
    }
}

impl Deref for ScopedCall<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for ScopedCall<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

/// Guard that restores the evaluation depth on drop.
pub struct NestedDepth<'env> {
    env: &'env mut Environment,
    saved: u32,
}

impl Drop for NestedDepth<'_> {
    fn drop(&mut self) {
        self.env.eval.depth = self.saved;
    }
}

impl Deref for NestedDepth<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for NestedDepth<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Environment {
    /// Push a frame for `expr` and descend one depth level.
    pub fn enter_call(&mut self, expr: ExprId, function: Option<FunctionId>) -> ScopedCall<'_> {
        let caller_depth = self.eval.depth;
        self.eval.frames.push(CallFrame {
            expr,
            function,
            caller_depth,
        });
        self.eval.depth = caller_depth.saturating_add(1);
        ScopedCall { env: self }
    }

    /// Descend one depth level until the guard drops.
    ///
    /// Constructs that evaluate a body repeatedly (loops, procedure bodies)
    /// use this so values created inside can be reclaimed between steps.
    pub fn nested(&mut self) -> NestedDepth<'_> {
        let saved = self.eval.depth;
        self.eval.depth = saved.saturating_add(1);
        NestedDepth { env: self, saved }
    }

    /// Run `f` one depth level down.
    pub fn with_nested_depth<T>(&mut self, f: impl FnOnce(&mut Environment) -> T) -> T {
        let mut nested = self.nested();
        f(&mut nested)
    }

    /// Run `f` inside a call frame for `expr`.
    pub fn with_call_frame<T>(
        &mut self,
        expr: ExprId,
        function: Option<FunctionId>,
        f: impl FnOnce(&mut Environment) -> T,
    ) -> T {
        let mut call = self.enter_call(expr, function);
        f(&mut call)
    }

    /// Current evaluation depth.
    #[inline]
    pub fn eval_depth(&self) -> u32 {
        self.eval.depth
    }

    /// The call node currently being evaluated, if any.
    #[inline]
    pub fn current_expression(&self) -> Option<ExprId> {
        self.eval.frames.last().map(|frame| frame.expr)
    }

    /// The innermost call frame.
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.eval.frames.last()
    }

    /// Number of active call frames.
    pub fn call_depth(&self) -> usize {
        self.eval.frames.len()
    }
}
