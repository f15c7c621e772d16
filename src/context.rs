//! Per-execution-context state: call stacks and the context registry
//!
//! Each host execution context owns exactly one call stack, mutated only
//! by its own event stream. Contexts are created lazily at the first
//! event seen for an unknown identity and are reclaimed only at full
//! registry teardown; a dead context leaves a stale but harmless entry.

use fnv::FnvHashMap;

use crate::event::ContextId;
use crate::pool::{Handle, PoolExhausted, RecordPool};
use crate::registry::ProfiledItem;

/// One active (unreturned) invocation on a context's call stack
#[derive(Debug, Clone, Copy)]
pub struct CallFrame {
    /// Item entered by this invocation
    pub item: Handle<ProfiledItem>,
    /// Tick count at entry
    pub t0: u64,
}

/// Strictly LIFO stack of active invocation frames
///
/// Pre-sized so ordinary call depths never allocate; grows when the
/// profiled program goes deeper, never truncates.
#[derive(Debug, Default)]
pub struct CallStack {
    frames: Vec<CallFrame>,
}

impl CallStack {
    /// Clear the stack and make sure `capacity` frames fit without growth
    pub fn reset(&mut self, capacity: usize) {
        self.frames.clear();
        if self.frames.capacity() < capacity {
            self.frames.reserve(capacity - self.frames.capacity());
        }
    }

    /// Push a frame for an entered call
    pub fn push(&mut self, item: Handle<ProfiledItem>, t0: u64) {
        self.frames.push(CallFrame { item, t0 });
    }

    /// Pop the frame of the returning call, if any
    pub fn pop(&mut self) -> Option<CallFrame> {
        self.frames.pop()
    }

    /// Item of the current top-of-stack frame (the caller, after a pop)
    pub fn top_item(&self) -> Option<Handle<ProfiledItem>> {
        self.frames.last().map(|frame| frame.item)
    }

    /// True when `item` has an active frame anywhere on the stack
    pub fn contains(&self, item: Handle<ProfiledItem>) -> bool {
        self.frames.iter().any(|frame| frame.item == item)
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when no call is active
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// State owned by one host execution context
#[derive(Debug, Default)]
pub struct Context {
    /// Active invocations on this context
    pub stack: CallStack,
    /// Most recently entered item, for "where is this context now" lines
    pub last_item: Option<Handle<ProfiledItem>>,
}

impl Context {
    /// Reinitialize a recycled pool slot for a new context identity
    fn reset(&mut self, stack_capacity: usize) {
        self.stack.reset(stack_capacity);
        self.last_item = None;
    }
}

/// Map from opaque execution-context identity to pooled [`Context`] records
#[derive(Debug)]
pub struct ContextRegistry {
    pool: RecordPool<Context>,
    index: FnvHashMap<ContextId, Handle<Context>>,
    stack_capacity: usize,
}

impl ContextRegistry {
    /// Create a registry backed by a pool of `capacity` context slots;
    /// new call stacks are pre-sized to `stack_capacity` frames
    pub fn new(capacity: usize, stack_capacity: usize) -> Self {
        ContextRegistry {
            pool: RecordPool::new(capacity),
            index: FnvHashMap::default(),
            stack_capacity,
        }
    }

    /// Look up or create the context for `id`
    ///
    /// Returns the handle and whether this call created the context, so
    /// the caller can install the host hook exactly once per context.
    pub fn resolve(&mut self, id: ContextId) -> Result<(Handle<Context>, bool), PoolExhausted> {
        if let Some(&handle) = self.index.get(&id) {
            return Ok((handle, false));
        }
        let handle = self.pool.acquire()?;
        self.pool.get_mut(handle).reset(self.stack_capacity);
        self.index.insert(id, handle);
        Ok((handle, true))
    }

    /// Look up an existing context without creating one
    ///
    /// Leave events use this: a leave for a never-seen context indicates
    /// an enter/leave mismatch and must not allocate state.
    pub fn lookup(&self, id: ContextId) -> Option<Handle<Context>> {
        self.index.get(&id).copied()
    }

    /// Borrow a context by handle
    pub fn get(&self, handle: Handle<Context>) -> &Context {
        self.pool.get(handle)
    }

    /// Mutably borrow a context by handle
    pub fn get_mut(&mut self, handle: Handle<Context>) -> &mut Context {
        self.pool.get_mut(handle)
    }

    /// Number of contexts ever seen
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no context has been seen yet
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Visit every known context with its identity
    pub fn for_each(&self, mut f: impl FnMut(ContextId, &Context)) {
        for (&id, &handle) in &self.index {
            f(id, self.pool.get(handle));
        }
    }
}
