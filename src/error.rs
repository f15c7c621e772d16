//! Errors surfaced by the profiler lifecycle and reporting surface
//!
//! Lifecycle misuse is always recoverable: the caller gets an explicit
//! error and the profiler state is unchanged. Nothing on the event hot
//! path produces a `ProfilerError`; failures there are swallowed with a
//! diagnostic so the host program is never disturbed.

use thiserror::Error;

/// Errors for profiler lifecycle and reporting operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfilerError {
    #[error("profiler is already started")]
    AlreadyRunning,

    #[error("profiler is not started yet")]
    NotRunning,

    #[error("profiler is running; stop it before clearing stats")]
    StillRunning,

    #[error("profiler does not have any statistics; not started?")]
    NoStats,

    #[error("row limit must be positive")]
    InvalidLimit,
}

pub type Result<T> = std::result::Result<T, ProfilerError>;
