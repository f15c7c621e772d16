//! Event and identity types crossing the host boundary
//!
//! The host runtime delivers one [`ProfileEvent`] per call-site transition,
//! tagged with the [`ContextId`] of the execution context it happened on.
//! Code identities are opaque: the profiler only requires that a given
//! function keeps the same [`CodeId`] for the lifetime of the run.

/// Opaque identity of one host execution context (e.g. a thread)
///
/// The profiler makes no assumption about how identities are produced.
/// Hosts that recycle context identities will see the recycled context
/// conflated with its predecessor; this is a documented limitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

/// Opaque identity of one distinct function/callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeId(pub u64);

/// Metadata used to derive a display name for a profiled item
///
/// Stored once per distinct code identity on first resolution; events for
/// already-known identities never copy it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CodeDescriptor {
    /// Ordinary source-level function: rendered as `file.symbol:line`
    /// with the file path reduced to its basename.
    Source {
        file: String,
        symbol: String,
        line: u32,
    },
    /// Host built-in free function (no receiver): rendered as
    /// `<module.symbol>`, or `<symbol>` when no module is known.
    BuiltinFunction {
        module: Option<String>,
        symbol: String,
    },
    /// Host built-in bound method: rendered as `<built-in method symbol>`.
    BuiltinMethod { symbol: String },
    /// No usable metadata; rendered as the sentinel name.
    #[default]
    Unknown,
}

/// One call-site transition delivered by the host hook
///
/// `CCall`/`CReturn`/`CExceptionReturn` describe foreign (built-in) calls
/// and are translated into stack operations only when built-in profiling
/// was enabled at start time.
#[derive(Debug, Clone, Copy)]
pub enum ProfileEvent<'a> {
    /// Entering a source-level function
    Call {
        code: CodeId,
        descriptor: &'a CodeDescriptor,
    },
    /// Leaving a source-level function, normally or with an exception
    Return,
    /// Entering a host built-in callable
    CCall {
        code: CodeId,
        descriptor: &'a CodeDescriptor,
    },
    /// Leaving a host built-in callable normally
    CReturn,
    /// Leaving a host built-in callable with an exception
    CExceptionReturn,
}
