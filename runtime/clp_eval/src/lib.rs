//! clp eval - environment, function registry and evaluator.
//!
//! An [`Environment`] owns one interpreter instance: its atom tables, list
//! segments, expression arena, registered functions and primitive types.
//! Native functions are registered as a [`NativeFn`] shape and read their
//! arguments through the argument access layer (`get_arg_at`,
//! `check_arg_type`, ...) while their call is on the frame stack.
//!
//! # Architecture
//!
//! - `functions`: registry of native functions and restriction strings
//! - `evaluator`: dispatch on node type code, call frames, depth tracking
//! - `args`: argument access for native bodies
//! - `install`: claiming values and pinning expression trees
//! - `cleanup`: periodic reclamation of unclaimed atoms and lists
//! - `primitives` / `ext_address`: runtime-registered type tables
//!
//! User errors are diagnostics on the `werror` channel plus the
//! `eval_error`/`halt` flags. Internal consistency failures are fatal; see
//! [`FatalPolicy`].

mod args;
mod build;
mod cleanup;
mod config;
mod environment;
pub mod errors;
mod evaluator;
mod ext_address;
mod functions;
mod hashed;
mod install;
mod logging;
mod primitives;
mod print;
mod stack;
mod values;
mod variables;

pub use args::ArgRelation;
pub use cleanup::{CleanupState, PeriodicAction, PeriodicFunction};
pub use config::{EnvConfig, FatalPolicy};
pub use environment::{Environment, EnvironmentBuilder, Teardown, MAXIMUM_ENVIRONMENT_POSITIONS};
pub use errors::{
    BuildError, CallError, CleanupError, DataSlotError, DefineError, EvalFailure, EvalResult,
    RestrictionError,
};
pub use evaluator::{CallFrame, EvalState, NestedDepth, ScopedCall};
pub use ext_address::{
    AddressPrintHook, AddressTypeTable, DiscardHook, ExternalAddressType, NewInstanceHook,
};
pub use functions::{
    FunctionDescriptor, FunctionRegistry, Native, NativeFn, ParserHook, Restriction, ReturnTag,
    TypeSet,
};
pub use hashed::HashedExpressions;
pub use logging::init_tracing;
pub use primitives::{EvaluateHook, PrimitiveDescriptor, PrimitiveTable, PrintHook};
pub use stack::ensure_sufficient_stack;
pub use variables::{Bindings, ScopedBindings};

pub use clp_diagnostic::{
    buffer_router, console_router, silent_router, Diagnostic, ErrorCode, RouterImpl, Severity,
    SharedRouter,
};
pub use clp_ir::{
    AtomRef, DataValue, ExprId, ExprNode, ExprValue, ExternalAddress, FunctionId, ListRange,
    Payload, SymbolId, TypeCode,
};
