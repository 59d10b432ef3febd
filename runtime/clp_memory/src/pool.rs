//! Size-class free-list allocator.

use std::fmt;

use tracing::{debug, warn};

/// Default number of size classes kept on free lists.
const DEFAULT_TABLE_SIZE: usize = 500;

/// Error returned when a block request cannot be satisfied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The system allocator refused the request and the out-of-memory
    /// handler (if any) declined to retry.
    #[error("out of memory: unable to allocate {size} bytes")]
    OutOfMemory { size: usize },
}

/// Allocator configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Blocks whose size is below this many bytes are cached on free lists.
    pub table_size: usize,
    /// When set, returned blocks go back to the system instead of a free list.
    pub conserve_memory: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            table_size: DEFAULT_TABLE_SIZE,
            conserve_memory: false,
        }
    }
}

/// Called with the failed request size; returning `true` retries the request.
pub type OutOfMemoryHandler = Box<dyn FnMut(usize) -> bool + Send>;

/// Size-class block allocator.
///
/// A block is a `Vec<u8>` whose capacity is its size class. `get` hands out
/// an empty block with at least the requested capacity; `rtn` takes it back.
pub struct MemoryManager {
    free_lists: Vec<Vec<Vec<u8>>>,
    config: MemoryConfig,
    /// Bytes currently handed out.
    used: usize,
    /// Blocks currently handed out.
    requests: usize,
    /// Bytes parked on free lists.
    cached: usize,
    out_of_memory: Option<OutOfMemoryHandler>,
}

impl MemoryManager {
    /// Create an allocator with empty free lists.
    pub fn new(config: MemoryConfig) -> Self {
        let free_lists = (0..config.table_size).map(|_| Vec::new()).collect();
        MemoryManager {
            free_lists,
            config,
            used: 0,
            requests: 0,
            cached: 0,
            out_of_memory: None,
        }
    }

    /// Request an empty block able to hold `size` bytes.
    pub fn get(&mut self, size: usize) -> Result<Vec<u8>, MemoryError> {
        let block = match self.take_cached(size) {
            Some(block) => block,
            None => self.allocate(size)?,
        };
        self.used = self.used.saturating_add(block.capacity());
        self.requests = self.requests.saturating_add(1);
        Ok(block)
    }

    /// Request a block of `size` zero bytes.
    pub fn get_zeroed(&mut self, size: usize) -> Result<Vec<u8>, MemoryError> {
        let mut block = self.get(size)?;
        block.resize(size, 0);
        Ok(block)
    }

    /// Copy `bytes` into a freshly requested block.
    pub fn copy_bytes(&mut self, bytes: &[u8]) -> Result<Vec<u8>, MemoryError> {
        let mut block = self.get(bytes.len())?;
        block.extend_from_slice(bytes);
        Ok(block)
    }

    /// Copy `text` into a block and view it as a `String`.
    pub fn string_from(&mut self, text: &str) -> Result<String, MemoryError> {
        let block = self.copy_bytes(text.as_bytes())?;
        Ok(String::from_utf8(block)
            .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()))
    }

    /// Return a block. Small blocks are cached for reuse.
    pub fn rtn(&mut self, mut block: Vec<u8>) {
        let size = block.capacity();
        self.used = self.used.saturating_sub(size);
        self.requests = self.requests.saturating_sub(1);
        if self.config.conserve_memory || size >= self.free_lists.len() {
            return;
        }
        block.clear();
        self.free_lists[size].push(block);
        self.cached = self.cached.saturating_add(size);
    }

    /// Return a string obtained from [`MemoryManager::string_from`].
    pub fn rtn_string(&mut self, text: String) {
        self.rtn(text.into_bytes());
    }

    /// Hand cached blocks back to the system until at least `amount` bytes
    /// are released. Returns the number of bytes released.
    pub fn release(&mut self, amount: usize) -> usize {
        let mut freed = 0usize;
        'classes: for list in self.free_lists.iter_mut().rev() {
            while let Some(block) = list.pop() {
                freed = freed.saturating_add(block.capacity());
                if freed >= amount {
                    break 'classes;
                }
            }
        }
        self.cached = self.cached.saturating_sub(freed);
        debug!(requested = amount, freed, "released cached memory");
        freed
    }

    /// Toggle memory conservation, returning the previous setting.
    pub fn set_conserve_memory(&mut self, conserve: bool) -> bool {
        let previous = self.config.conserve_memory;
        self.config.conserve_memory = conserve;
        if conserve {
            let cached = self.cached;
            self.release(cached);
        }
        previous
    }

    /// Install the handler consulted when the system allocator fails.
    pub fn set_out_of_memory_handler(&mut self, handler: OutOfMemoryHandler) {
        self.out_of_memory = Some(handler);
    }

    /// Bytes currently handed out.
    pub fn mem_used(&self) -> usize {
        self.used
    }

    /// Blocks currently handed out.
    pub fn mem_requests(&self) -> usize {
        self.requests
    }

    /// Bytes parked on free lists.
    pub fn cached_bytes(&self) -> usize {
        self.cached
    }

    /// Size classes kept on free lists.
    pub fn table_size(&self) -> usize {
        self.free_lists.len()
    }

    fn take_cached(&mut self, size: usize) -> Option<Vec<u8>> {
        let block = self.free_lists.get_mut(size)?.pop()?;
        self.cached = self.cached.saturating_sub(block.capacity());
        Some(block)
    }

    fn allocate(&mut self, size: usize) -> Result<Vec<u8>, MemoryError> {
        loop {
            let mut block = Vec::new();
            if block.try_reserve_exact(size).is_ok() {
                return Ok(block);
            }
            if self.cached > 0 {
                let cached = self.cached;
                self.release(cached);
                continue;
            }
            warn!(size, "allocation failed");
            let retry = match self.out_of_memory.as_mut() {
                Some(handler) => handler(size),
                None => false,
            };
            if !retry {
                return Err(MemoryError::OutOfMemory { size });
            }
        }
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryManager")
            .field("used", &self.used)
            .field("requests", &self.requests)
            .field("cached", &self.cached)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
