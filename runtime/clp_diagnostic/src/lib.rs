//! Diagnostics for the clp runtime.
//!
//! User-level problems (bad arity, wrong argument type, unbound variable)
//! become a [`Diagnostic`] tagged with an [`ErrorCode`] such as
//! `[ARGACCES4]` and are written to the `werror` logical channel of a
//! [`RouterImpl`]. Internal consistency failures use the same channel with
//! [`Severity::SystemError`] before the runtime stops.
//!
//! The runtime never touches files or sockets; everything it prints goes
//! through a router addressed by logical name.

mod diagnostic;
mod error_code;
pub mod router;

pub use diagnostic::{Diagnostic, Severity};
pub use error_code::ErrorCode;
pub use router::{
    buffer_router, console_router, silent_router, BufferRouter, ConsoleRouter, RouterError,
    RouterImpl, SharedRouter, STDOUT, WDISPLAY, WERROR, WTRACE, WWARNING,
};
