//! Fixed-capacity record pool for hot-path allocations
//!
//! The enter/leave path runs once per function call of the profiled
//! program, so even an occasional heap allocation there would distort the
//! very timings being collected. Profiled-item and context records are
//! therefore carved out of pre-allocated pools and addressed by typed
//! handles.
//!
//! Unlike a growable object pool, capacity here is fixed: when the pool
//! is exhausted `acquire` fails explicitly and the caller must degrade
//! (skip attribution for that call), never panic. Released slots are not
//! zeroed; the next acquirer reinitializes the fields it relies on.

use std::marker::PhantomData;

use thiserror::Error;

/// Returned by [`RecordPool::acquire`] when every slot is live
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("record pool exhausted ({capacity} slots in use)")]
pub struct PoolExhausted {
    /// Fixed capacity of the pool that ran out
    pub capacity: usize,
}

/// Typed index of a live slot in a [`RecordPool<T>`]
///
/// Handles are plain indices: copying one does not extend any lifetime,
/// and a handle is only meaningful against the pool that issued it.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32) -> Self {
        Handle {
            index,
            _marker: PhantomData,
        }
    }

    /// Raw slot index, mainly useful for diagnostics
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

// Manual impls: derived ones would bound on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Handle<T> {}
impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for Handle<T> {}
impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Fixed-capacity slot recycler
///
/// All slots are allocated up front; `acquire`/`release` are O(1) free-list
/// operations that never touch the general-purpose allocator.
#[derive(Debug)]
pub struct RecordPool<T> {
    slots: Vec<T>,
    live: Vec<bool>,
    free: Vec<u32>,
}

impl<T: Default> RecordPool<T> {
    /// Pre-allocate a pool with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, T::default);
        // reversed so the first acquire hands out slot 0
        let free: Vec<u32> = (0..capacity as u32).rev().collect();
        RecordPool {
            slots,
            live: vec![false; capacity],
            free,
        }
    }

    /// Take a slot from the free set
    ///
    /// The returned slot keeps whatever the previous occupant left in it;
    /// the caller must reinitialize the fields it relies on.
    pub fn acquire(&mut self) -> Result<Handle<T>, PoolExhausted> {
        match self.free.pop() {
            Some(index) => {
                self.live[index as usize] = true;
                Ok(Handle::new(index))
            }
            None => Err(PoolExhausted {
                capacity: self.slots.len(),
            }),
        }
    }

    /// Return a slot to the free set without zeroing it
    ///
    /// Releasing a handle that is not live is rejected so a double release
    /// cannot hand the same slot to two owners.
    pub fn release(&mut self, handle: Handle<T>) {
        let index = handle.index();
        debug_assert!(self.live[index], "release of a non-live pool slot");
        if self.live[index] {
            self.live[index] = false;
            self.free.push(handle.index);
        }
    }

    /// Borrow the record behind a live handle
    pub fn get(&self, handle: Handle<T>) -> &T {
        &self.slots[handle.index()]
    }

    /// Mutably borrow the record behind a live handle
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        &mut self.slots[handle.index()]
    }

    /// Fixed capacity of the pool
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slots currently available for acquisition
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Slots currently live
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
