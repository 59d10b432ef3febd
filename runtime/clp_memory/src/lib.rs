//! Block memory for the clp runtime.
//!
//! Every variable-length payload the runtime owns (symbol text, bitmap
//! bytes) is requested from a [`MemoryManager`]. Returned blocks are kept
//! on per-size free lists and handed out again for requests of the same
//! size; requests at or above the table size go straight to the system
//! allocator.
//!
//! ```text
//! let mut memory = MemoryManager::new(MemoryConfig::default());
//! let text = memory.string_from("hello")?;
//! memory.rtn_string(text); // cached on the 5-byte free list
//! ```

mod pool;

pub use pool::{MemoryConfig, MemoryError, MemoryManager, OutOfMemoryHandler};
