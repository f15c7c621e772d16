//! Profiled-item registry: code identity to aggregate statistics
//!
//! One [`ProfiledItem`] exists per distinct function/callable ever
//! observed. The registry maps opaque code identities to pool handles, so
//! the call stacks and the registry alias the same record rather than
//! copying it. Records live until an explicit `clear_stats`.

use fnv::FnvHashMap;

use crate::event::{CodeDescriptor, CodeId};
use crate::pool::{Handle, PoolExhausted, RecordPool};

/// Sentinel display name for items with no usable metadata
pub const SENTINEL_NAME: &str = "N/A";

/// Aggregate statistics for one distinct function/callable
///
/// Times are kept in clock ticks. `tsubtotal` is signed: the
/// recursion-aware attribution in the call stack transiently subtracts
/// from it to cancel out reentrant self-calls (see `profiler::on_leave`).
#[derive(Debug, Default)]
pub struct ProfiledItem {
    /// Name-derivation metadata captured at first resolution
    pub descriptor: CodeDescriptor,
    /// Times this item was entered
    pub call_count: u64,
    /// Inclusive wall time, outermost invocations only
    pub ttotal: u64,
    /// Time to subtract from `ttotal` to obtain exclusive (self) time
    pub tsubtotal: i64,
}

impl ProfiledItem {
    /// Reinitialize a recycled pool slot for a new identity
    fn reset(&mut self, descriptor: CodeDescriptor) {
        self.descriptor = descriptor;
        self.call_count = 0;
        self.ttotal = 0;
        self.tsubtotal = 0;
    }

    /// Exclusive (self) ticks, clamped so recursion bookkeeping can never
    /// surface a negative total
    pub fn exclusive_ticks(&self) -> u64 {
        let diff = self.ttotal as i64 - self.tsubtotal;
        if diff < 0 {
            0
        } else {
            diff as u64
        }
    }

    /// Human-readable display name derived from the stored descriptor
    ///
    /// Never fails: malformed or missing metadata falls back to
    /// [`SENTINEL_NAME`].
    pub fn display_name(&self) -> String {
        derive_name(&self.descriptor)
    }
}

/// Reduce a source path to its basename, accepting both separators
fn basename(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Derive the display name for a descriptor
///
/// Naming rules:
/// - source function: `file.symbol:line`, path reduced to its basename
/// - built-in free function: `<module.symbol>`, or `<symbol>` without a module
/// - built-in bound method: `<built-in method symbol>`
/// - anything without a symbol: `"N/A"`
pub fn derive_name(descriptor: &CodeDescriptor) -> String {
    match descriptor {
        CodeDescriptor::Source { file, symbol, line } => {
            if symbol.is_empty() {
                SENTINEL_NAME.to_string()
            } else {
                format!("{}.{}:{}", basename(file), symbol, line)
            }
        }
        CodeDescriptor::BuiltinFunction { module, symbol } => {
            if symbol.is_empty() {
                SENTINEL_NAME.to_string()
            } else {
                match module.as_deref() {
                    Some(m) if !m.is_empty() => format!("<{}.{}>", m, symbol),
                    _ => format!("<{}>", symbol),
                }
            }
        }
        CodeDescriptor::BuiltinMethod { symbol } => {
            if symbol.is_empty() {
                SENTINEL_NAME.to_string()
            } else {
                format!("<built-in method {}>", symbol)
            }
        }
        CodeDescriptor::Unknown => SENTINEL_NAME.to_string(),
    }
}

/// Map from opaque code identity to pooled [`ProfiledItem`] records
#[derive(Debug)]
pub struct ItemRegistry {
    pool: RecordPool<ProfiledItem>,
    index: FnvHashMap<CodeId, Handle<ProfiledItem>>,
}

impl ItemRegistry {
    /// Create a registry backed by a pool of `capacity` item slots
    pub fn new(capacity: usize) -> Self {
        ItemRegistry {
            pool: RecordPool::new(capacity),
            index: FnvHashMap::default(),
        }
    }

    /// Look up or create the item for `code`
    ///
    /// First resolution allocates from the pool and stores a copy of the
    /// descriptor; later resolutions are a single map lookup and never
    /// touch the descriptor. On pool exhaustion the caller must skip
    /// attribution for the offending call.
    pub fn resolve(
        &mut self,
        code: CodeId,
        descriptor: &CodeDescriptor,
    ) -> Result<Handle<ProfiledItem>, PoolExhausted> {
        if let Some(&handle) = self.index.get(&code) {
            return Ok(handle);
        }
        let handle = self.pool.acquire()?;
        self.pool.get_mut(handle).reset(descriptor.clone());
        self.index.insert(code, handle);
        Ok(handle)
    }

    /// Borrow an item by handle
    pub fn get(&self, handle: Handle<ProfiledItem>) -> &ProfiledItem {
        self.pool.get(handle)
    }

    /// Mutably borrow an item by handle
    pub fn get_mut(&mut self, handle: Handle<ProfiledItem>) -> &mut ProfiledItem {
        self.pool.get_mut(handle)
    }

    /// Number of distinct items ever resolved
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no item has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Visit every registered item in registry (non-deterministic) order
    pub fn for_each(&self, mut f: impl FnMut(&ProfiledItem)) {
        for &handle in self.index.values() {
            f(self.pool.get(handle));
        }
    }
}
