//! Logical I/O channels.
//!
//! Output is addressed by logical name rather than file handle:
//! - Console: `werror`/`wwarning` to stderr, everything else to stdout
//! - Buffer: per-channel capture for embedding hosts and tests
//! - Silent: recognizes the standard names and discards output
//!
//! Uses enum dispatch instead of trait objects, like the rest of the
//! runtime's hot-path handlers.

use std::io::Write as _;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{Diagnostic, Severity};

/// Standard output.
pub const STDOUT: &str = "stdout";
/// Error messages.
pub const WERROR: &str = "werror";
/// Warning messages.
pub const WWARNING: &str = "wwarning";
/// Informational display output.
pub const WDISPLAY: &str = "wdisplay";
/// Trace output.
pub const WTRACE: &str = "wtrace";

/// Alias CLIPS-style scripts use for standard output.
const T_ALIAS: &str = "t";

const STANDARD_NAMES: [&str; 6] = [STDOUT, WERROR, WWARNING, WDISPLAY, WTRACE, T_ALIAS];

/// Error writing to a logical channel.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("Logical name {0} was not recognized by any routers")]
    UnknownLogicalName(String),
}

fn is_standard(logical: &str) -> bool {
    STANDARD_NAMES.contains(&logical)
}

/// Writes to the process's stdout/stderr.
#[derive(Default)]
pub struct ConsoleRouter;

impl ConsoleRouter {
    fn write(&self, logical: &str, text: &str) -> Result<(), RouterError> {
        match logical {
            WERROR | WWARNING => {
                let _ = std::io::stderr().write_all(text.as_bytes());
            }
            _ if is_standard(logical) => {
                let _ = std::io::stdout().write_all(text.as_bytes());
            }
            _ => return Err(RouterError::UnknownLogicalName(logical.to_string())),
        }
        Ok(())
    }
}

/// Captures output per logical channel.
///
/// Also keeps every emitted [`Diagnostic`] so callers can inspect them
/// structurally instead of parsing text.
pub struct BufferRouter {
    channels: Mutex<FxHashMap<String, String>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl BufferRouter {
    /// Create a buffer router recognizing the standard logical names.
    pub fn new() -> Self {
        let channels = STANDARD_NAMES
            .iter()
            .map(|name| ((*name).to_string(), String::new()))
            .collect();
        BufferRouter {
            channels: Mutex::new(channels),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Recognize an additional logical name.
    pub fn add_channel(&self, logical: &str) {
        self.channels
            .lock()
            .entry(logical.to_string())
            .or_default();
    }

    fn write(&self, logical: &str, text: &str) -> Result<(), RouterError> {
        let mut channels = self.channels.lock();
        let key = if logical == T_ALIAS { STDOUT } else { logical };
        match channels.get_mut(key) {
            Some(buf) => {
                buf.push_str(text);
                Ok(())
            }
            None => Err(RouterError::UnknownLogicalName(logical.to_string())),
        }
    }

    fn recognizes(&self, logical: &str) -> bool {
        self.channels.lock().contains_key(logical)
    }

    /// Captured output for a channel.
    pub fn output(&self, logical: &str) -> String {
        let key = if logical == T_ALIAS { STDOUT } else { logical };
        self.channels.lock().get(key).cloned().unwrap_or_default()
    }

    /// Diagnostics emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Clear captured output and diagnostics.
    pub fn clear(&self) {
        for buf in self.channels.lock().values_mut() {
            buf.clear();
        }
        self.diagnostics.lock().clear();
    }
}

impl Default for BufferRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Router implementation using enum dispatch.
pub enum RouterImpl {
    /// Writes to stdout/stderr (default).
    Console(ConsoleRouter),
    /// Captures per channel.
    Buffer(BufferRouter),
    /// Discards output on the standard names.
    Silent,
}

impl RouterImpl {
    /// Write text to a logical channel.
    pub fn write(&self, logical: &str, text: &str) -> Result<(), RouterError> {
        match self {
            Self::Console(r) => r.write(logical, text),
            Self::Buffer(r) => r.write(logical, text),
            Self::Silent if is_standard(logical) => Ok(()),
            Self::Silent => Err(RouterError::UnknownLogicalName(logical.to_string())),
        }
    }

    /// Whether some router accepts this logical name.
    pub fn recognizes(&self, logical: &str) -> bool {
        match self {
            Self::Console(_) | Self::Silent => is_standard(logical),
            Self::Buffer(r) => r.recognizes(logical),
        }
    }

    /// Write a diagnostic to `werror` (or `wwarning` for warnings).
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let logical = match diagnostic.severity {
            Severity::Warning => WWARNING,
            Severity::Error | Severity::SystemError => WERROR,
        };
        // The standard channels are always recognized.
        let _ = self.write(logical, &format!("{diagnostic}\n"));
        if let Self::Buffer(r) = self {
            r.diagnostics.lock().push(diagnostic.clone());
        }
    }

    /// Captured output for a channel (empty for non-capturing routers).
    pub fn output(&self, logical: &str) -> String {
        match self {
            Self::Buffer(r) => r.output(logical),
            Self::Console(_) | Self::Silent => String::new(),
        }
    }

    /// Diagnostics captured so far (empty for non-capturing routers).
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Buffer(r) => r.diagnostics(),
            Self::Console(_) | Self::Silent => Vec::new(),
        }
    }

    /// Clear captured output.
    pub fn clear(&self) {
        if let Self::Buffer(r) = self {
            r.clear();
        }
    }

    /// Terminate the process through the router exit path.
    pub fn exit(&self, code: i32) -> ! {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        std::process::exit(code)
    }
}

/// Router shared between an environment and its host.
pub type SharedRouter = Arc<RouterImpl>;

/// Create the default console router.
pub fn console_router() -> SharedRouter {
    Arc::new(RouterImpl::Console(ConsoleRouter))
}

/// Create a capturing router.
pub fn buffer_router() -> SharedRouter {
    Arc::new(RouterImpl::Buffer(BufferRouter::new()))
}

/// Create a router that discards output.
pub fn silent_router() -> SharedRouter {
    Arc::new(RouterImpl::Silent)
}

#[cfg(test)]
mod tests;
