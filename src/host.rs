//! Capability interface the host runtime provides to the profiler
//!
//! The profiler never assumes how execution contexts are created,
//! enumerated, or recycled. At `start` it asks the host to enumerate the
//! contexts that already exist and installs its event hook on each; any
//! context first seen afterwards is hooked at its first observed event.

use crate::event::ContextId;

/// Host-side facility for enumerating contexts and managing event hooks
///
/// Implementations must be cheap and non-blocking: `install_hook` runs on
/// the event hot path when a previously unseen context delivers its first
/// event.
pub trait HostRuntime: Send + Sync {
    /// Visit every execution context currently known to the host
    fn for_each_context(&self, f: &mut dyn FnMut(ContextId));

    /// Arrange for `ctx` to deliver call/return notifications
    fn install_hook(&self, ctx: ContextId);

    /// Stop `ctx` from delivering notifications
    fn remove_hook(&self, ctx: ContextId);
}

/// Host adapter for embeddings that wire event delivery themselves
///
/// Knows about no contexts and treats hook management as a no-op; events
/// pushed straight into `Profiler::dispatch` still create contexts lazily.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl HostRuntime for NullHost {
    fn for_each_context(&self, _f: &mut dyn FnMut(ContextId)) {}

    fn install_hook(&self, _ctx: ContextId) {}

    fn remove_hook(&self, _ctx: ContextId) {}
}
