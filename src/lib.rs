//! Trazar - Deterministic in-process call profiler
//!
//! This library observes every function enter/leave event of a running
//! program, attributes wall-clock time to the function responsible, and
//! produces per-function aggregate statistics (call count, inclusive
//! time, exclusive time, average time) that can be sorted, formatted,
//! and exported on demand.
//!
//! The host runtime delivers events through [`Profiler::dispatch`] and
//! provides context enumeration/hooking through the [`HostRuntime`]
//! capability trait; everything else (per-context call stacks, the pooled
//! registries, the snapshot pipeline) lives in this crate.

pub mod clock;
pub mod context;
pub mod error;
pub mod event;
pub mod format;
pub mod host;
pub mod json_output;
pub mod pool;
pub mod profiler;
pub mod registry;
pub mod snapshot;

pub use clock::{ManualClock, MonotonicClock, TickSource};
pub use error::ProfilerError;
pub use event::{CodeDescriptor, CodeId, ContextId, ProfileEvent};
pub use format::{FormatConfig, Report};
pub use host::{HostRuntime, NullHost};
pub use profiler::{Profiler, ProfilerConfig};
pub use snapshot::{Limit, SortKey, SortOrder, StatRow};
