//! The profiler service object: lifecycle, event intake, reporting
//!
//! `Profiler` owns every piece of mutable profiling state behind one
//! coarse lock, matching the host scheduling model: contexts interleave
//! but only one executes at a time, so the hot path needs mutual
//! exclusion against registry mutation and reporting, nothing finer.
//!
//! Lifecycle: `Uninitialized -> Initialized -> Running -> Initialized`,
//! with `clear_stats` tearing everything back down to uninitialized.
//! Misuse (start while running, stop while stopped, clear while running,
//! report with no stats) is an explicit recoverable error. Nothing on the
//! event hot path returns an error to the host: hot-path failures are
//! logged and the offending call simply goes unprofiled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};

use crate::clock::{MonotonicClock, TickSource};
use crate::context::ContextRegistry;
use crate::error::{ProfilerError, Result};
use crate::event::{CodeDescriptor, CodeId, ContextId, ProfileEvent};
use crate::format::{render_report, FormatConfig, Report, ReportSummary};
use crate::host::HostRuntime;
use crate::registry::{ItemRegistry, SENTINEL_NAME};
use crate::snapshot::{build_rows, sort_rows, Limit, SortKey, SortOrder, StatRow};

/// Tunables for pools, stacks, and report layout
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Slots in the profiled-item pool (distinct functions observable)
    pub item_pool_capacity: usize,
    /// Slots in the context pool (execution contexts observable)
    pub context_pool_capacity: usize,
    /// Frames pre-sized per call stack; stacks grow past this, never
    /// truncate
    pub stack_capacity: usize,
    /// Report column layout
    pub format: FormatConfig,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        ProfilerConfig {
            item_pool_capacity: 4096,
            context_pool_capacity: 64,
            stack_capacity: 100,
            format: FormatConfig::default(),
        }
    }
}

/// Registries torn down together at `clear_stats`
#[derive(Debug)]
struct Registries {
    items: ItemRegistry,
    contexts: ContextRegistry,
}

impl Registries {
    fn new(config: &ProfilerConfig) -> Self {
        Registries {
            items: ItemRegistry::new(config.item_pool_capacity),
            contexts: ContextRegistry::new(config.context_pool_capacity, config.stack_capacity),
        }
    }
}

#[derive(Debug)]
struct ProfilerState {
    registries: Option<Registries>,
    running: bool,
    have_stats: bool,
    builtins: bool,
    started_at: Option<DateTime<Local>>,
}

/// In-process deterministic call profiler
///
/// Shared with the host adapter (typically via `Arc`); all methods take
/// `&self`.
pub struct Profiler {
    state: Mutex<ProfilerState>,
    /// Ticks spent inside `dispatch`; advisory, read only for the report
    /// summary
    overhead_ticks: AtomicU64,
    clock: Box<dyn TickSource>,
    host: Box<dyn HostRuntime>,
    config: ProfilerConfig,
}

impl Profiler {
    /// Create a profiler with the default monotonic clock and config
    pub fn new(host: impl HostRuntime + 'static) -> Self {
        Self::with_clock(host, MonotonicClock::new(), ProfilerConfig::default())
    }

    /// Create a profiler with a custom configuration
    pub fn with_config(host: impl HostRuntime + 'static, config: ProfilerConfig) -> Self {
        Self::with_clock(host, MonotonicClock::new(), config)
    }

    /// Create a profiler with an injected tick source
    ///
    /// Tests drive this with a manual clock to make attribution exact.
    pub fn with_clock(
        host: impl HostRuntime + 'static,
        clock: impl TickSource + 'static,
        config: ProfilerConfig,
    ) -> Self {
        Profiler {
            state: Mutex::new(ProfilerState {
                registries: None,
                running: false,
                have_stats: false,
                builtins: false,
                started_at: None,
            }),
            overhead_ticks: AtomicU64::new(0),
            clock: Box::new(clock),
            host: Box::new(host),
            config,
        }
    }

    // A poisoned lock means a panic mid-update; the registries only ever
    // hold monotone counters, so recovering the inner state is safe and
    // keeps the host program alive.
    fn state(&self) -> MutexGuard<'_, ProfilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin profiling
    ///
    /// Lazily (re)initializes the registries and pools, hooks every
    /// execution context the host currently knows, and arranges that
    /// later contexts are hooked at their first observed event. With
    /// `builtins` set, foreign-call events are profiled too.
    pub fn start(&self, builtins: bool) -> Result<()> {
        let mut state = self.state();
        if state.running {
            return Err(ProfilerError::AlreadyRunning);
        }
        if state.registries.is_none() {
            state.registries = Some(Registries::new(&self.config));
            self.overhead_ticks.store(0, Ordering::Relaxed);
        }
        state.builtins = builtins;

        let mut known = Vec::new();
        self.host.for_each_context(&mut |ctx| known.push(ctx));
        if let Some(reg) = state.registries.as_mut() {
            for ctx in known {
                self.host.install_hook(ctx);
                if let Err(err) = reg.contexts.resolve(ctx) {
                    tracing::warn!(context = ctx.0, %err, "context pool exhausted at start");
                }
            }
        }

        state.running = true;
        state.have_stats = true;
        state.started_at = Some(Local::now());
        Ok(())
    }

    /// Stop profiling
    ///
    /// Removes the hook from every context the host knows; events already
    /// attributed stay in the registries for reporting. Does not clear
    /// stats.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state();
        if !state.running {
            return Err(ProfilerError::NotRunning);
        }
        let mut known = Vec::new();
        self.host.for_each_context(&mut |ctx| known.push(ctx));
        for ctx in known {
            self.host.remove_hook(ctx);
        }
        state.running = false;
        Ok(())
    }

    /// Tear down registries, pools, and counters
    ///
    /// Only legal while stopped; returns the profiler to the
    /// uninitialized state with no leakage into the next run.
    pub fn clear_stats(&self) -> Result<()> {
        let mut state = self.state();
        if state.running {
            return Err(ProfilerError::StillRunning);
        }
        state.registries = None;
        state.have_stats = false;
        state.builtins = false;
        state.started_at = None;
        self.overhead_ticks.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// True while events are being attributed
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// One call-site transition from the host hook
    ///
    /// This is the hot path: bounded work under the coarse lock, no
    /// allocation once pools and stacks are warm, and no failure ever
    /// propagates to the host. Its own cost is measured and added to the
    /// overhead counter. Events arriving while stopped are ignored.
    pub fn dispatch(&self, ctx: ContextId, event: ProfileEvent<'_>) {
        let t0 = self.clock.tick_count();
        {
            let mut state = self.state();
            if state.running {
                let builtins = state.builtins;
                if let Some(reg) = state.registries.as_mut() {
                    match event {
                        ProfileEvent::Call { code, descriptor } => {
                            enter(reg, ctx, code, descriptor, &*self.clock, &*self.host);
                        }
                        ProfileEvent::Return => {
                            leave(reg, ctx, &*self.clock);
                        }
                        ProfileEvent::CCall { code, descriptor } if builtins => {
                            enter(reg, ctx, code, descriptor, &*self.clock, &*self.host);
                        }
                        ProfileEvent::CReturn | ProfileEvent::CExceptionReturn if builtins => {
                            leave(reg, ctx, &*self.clock);
                        }
                        _ => {}
                    }
                }
            }
        }
        let spent = self.clock.tick_count().saturating_sub(t0);
        self.overhead_ticks.fetch_add(spent, Ordering::Relaxed);
    }

    /// Sorted snapshot of every item with nonzero inclusive time
    ///
    /// Programmatic equivalent of [`Profiler::report`] without limits or
    /// formatting.
    pub fn snapshot(&self, key: SortKey, order: SortOrder) -> Result<Vec<StatRow>> {
        let state = self.state();
        let reg = stats_registries(&state)?;
        let mut rows = build_rows(&reg.items, self.clock.tick_factor());
        sort_rows(&mut rows, key, order);
        Ok(rows)
    }

    /// Push-style enumeration in registry (non-deterministic) order
    ///
    /// Invokes `f(name, call_count, ttot_secs, tsub_secs)` once per item
    /// with nonzero inclusive time; intended for consumers that sort and
    /// present the data themselves.
    pub fn for_each_stat(&self, mut f: impl FnMut(&str, u64, f64, f64)) -> Result<()> {
        let state = self.state();
        let reg = stats_registries(&state)?;
        let factor = self.clock.tick_factor();
        reg.items.for_each(|item| {
            if item.ttotal == 0 {
                return;
            }
            f(
                &item.display_name(),
                item.call_count,
                item.ttotal as f64 * factor,
                item.exclusive_ticks() as f64 * factor,
            );
        });
        Ok(())
    }

    /// Build the full fixed-width report
    ///
    /// Rows are sorted by `key`/`order` and bounded by `limit`; the
    /// report also carries one line per known context and a trailing
    /// summary with the overhead percentage.
    pub fn report(&self, key: SortKey, order: SortOrder, limit: Limit) -> Result<Report> {
        if limit == Limit::Count(0) {
            return Err(ProfilerError::InvalidLimit);
        }
        let state = self.state();
        let reg = stats_registries(&state)?;
        let factor = self.clock.tick_factor();

        let mut rows = build_rows(&reg.items, factor);
        // total attributed application time: the sum of exclusive times,
        // computed fresh for every report
        let app_secs: f64 = rows.iter().map(|row| row.tsub).sum();
        sort_rows(&mut rows, key, order);
        if let Limit::Count(n) = limit {
            rows.truncate(n);
        }

        let mut contexts: Vec<(u64, String)> = Vec::with_capacity(reg.contexts.len());
        reg.contexts.for_each(|id, context| {
            let name = context
                .last_item
                .map(|handle| reg.items.get(handle).display_name())
                .unwrap_or_else(|| SENTINEL_NAME.to_string());
            contexts.push((id.0, name));
        });
        contexts.sort_by_key(|(id, _)| *id);
        let context_lines = contexts
            .into_iter()
            .map(|(id, name)| format!("Thread {}: {}", id, name))
            .collect();

        let summary = ReportSummary {
            functions: reg.items.len(),
            contexts: reg.contexts.len(),
            started_at: state
                .started_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            overhead_secs: self.overhead_ticks.load(Ordering::Relaxed) as f64 * factor,
            app_secs,
        };
        Ok(render_report(rows, context_lines, &summary, &self.config.format))
    }
}

fn stats_registries(state: &ProfilerState) -> Result<&Registries> {
    if !state.have_stats {
        return Err(ProfilerError::NoStats);
    }
    state.registries.as_ref().ok_or(ProfilerError::NoStats)
}

/// Enter transition: resolve context and item, push a frame, bump the
/// call count
fn enter(
    reg: &mut Registries,
    ctx: ContextId,
    code: CodeId,
    descriptor: &CodeDescriptor,
    clock: &dyn TickSource,
    host: &dyn HostRuntime,
) {
    let (ctx_handle, created) = match reg.contexts.resolve(ctx) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(context = ctx.0, %err, "skipping attribution");
            return;
        }
    };
    if created {
        // context first seen mid-run: hook it so its future events flow
        host.install_hook(ctx);
    }
    let item = match reg.items.resolve(code, descriptor) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::warn!(code = code.0, %err, "skipping attribution");
            return;
        }
    };
    let t0 = clock.tick_count();
    let context = reg.contexts.get_mut(ctx_handle);
    context.stack.push(item, t0);
    context.last_item = Some(item);
    reg.items.get_mut(item).call_count += 1;
}

/// Leave transition: pop the frame and attribute elapsed time
///
/// Recursion-aware accounting: the elapsed span of a reentrant
/// (non-outermost) occurrence is subtracted from the item's own subtotal
/// instead of added to its inclusive total, so recursion never inflates
/// inclusive time past true wall-clock duration; the enclosing caller's
/// subtotal always absorbs the callee span so caller self-time stays
/// correct.
fn leave(reg: &mut Registries, ctx: ContextId, clock: &dyn TickSource) {
    let Some(ctx_handle) = reg.contexts.lookup(ctx) else {
        tracing::debug!(context = ctx.0, "leave event for unknown context, dropping");
        return;
    };
    let now = clock.tick_count();
    let context = reg.contexts.get_mut(ctx_handle);
    let Some(frame) = context.stack.pop() else {
        tracing::debug!(context = ctx.0, "leave event with empty call stack, dropping");
        return;
    };
    let elapsed = now.saturating_sub(frame.t0);
    let cp = frame.item;
    let caller = context.stack.top_item();
    let reentrant = context.stack.contains(cp);

    let item = reg.items.get_mut(cp);
    if reentrant {
        item.tsubtotal -= elapsed as i64;
    } else {
        item.ttotal += elapsed;
    }
    if let Some(pp) = caller {
        reg.items.get_mut(pp).tsubtotal += elapsed as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::host::NullHost;

    fn source(symbol: &str) -> CodeDescriptor {
        CodeDescriptor::Source {
            file: "app.rs".to_string(),
            symbol: symbol.to_string(),
            line: 1,
        }
    }

    fn profiler_with_clock() -> (Profiler, ManualClock) {
        let clock = ManualClock::new();
        let profiler = Profiler::with_clock(NullHost, clock.clone(), ProfilerConfig::default());
        (profiler, clock)
    }

    fn call(profiler: &Profiler, ctx: u64, code: u64, descriptor: &CodeDescriptor) {
        profiler.dispatch(
            ContextId(ctx),
            ProfileEvent::Call {
                code: CodeId(code),
                descriptor,
            },
        );
    }

    fn ret(profiler: &Profiler, ctx: u64) {
        profiler.dispatch(ContextId(ctx), ProfileEvent::Return);
    }

    fn rows_by_name(profiler: &Profiler) -> Vec<StatRow> {
        profiler
            .snapshot(SortKey::Name, SortOrder::Ascending)
            .unwrap()
    }

    #[test]
    fn test_lifecycle_errors() {
        let (profiler, _clock) = profiler_with_clock();
        assert_eq!(profiler.stop(), Err(ProfilerError::NotRunning));
        assert!(matches!(
            profiler.report(SortKey::TotalTime, SortOrder::Descending, Limit::All),
            Err(ProfilerError::NoStats)
        ));

        profiler.start(false).unwrap();
        assert_eq!(profiler.start(false), Err(ProfilerError::AlreadyRunning));
        assert_eq!(profiler.clear_stats(), Err(ProfilerError::StillRunning));

        profiler.stop().unwrap();
        profiler.clear_stats().unwrap();
        assert!(!profiler.is_running());
    }

    #[test]
    fn test_three_calls_accumulate_total_and_average() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let f = source("f");

        for millis in [10, 20, 15] {
            call(&profiler, 1, 1, &f);
            clock.advance_millis(millis);
            ret(&profiler, 1);
        }
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].call_count, 3);
        assert!((rows[0].ttot - 0.045).abs() < 1e-9);
        assert!((rows[0].tavg - 0.015).abs() < 1e-9);
        assert!((rows[0].tsub - 0.045).abs() < 1e-9);
    }

    #[test]
    fn test_caller_self_time_excludes_callee() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let outer = source("outer");
        let inner = source("inner");

        call(&profiler, 1, 1, &outer);
        clock.advance_millis(5);
        call(&profiler, 1, 2, &inner);
        clock.advance_millis(30);
        ret(&profiler, 1); // inner
        clock.advance_millis(5);
        ret(&profiler, 1); // outer
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        let inner_row = rows.iter().find(|r| r.name.contains("inner")).unwrap();
        let outer_row = rows.iter().find(|r| r.name.contains("outer")).unwrap();

        assert!((outer_row.ttot - 0.040).abs() < 1e-9);
        assert!((outer_row.tsub - 0.010).abs() < 1e-9);
        assert!((inner_row.ttot - 0.030).abs() < 1e-9);
        assert!((inner_row.tsub - 0.030).abs() < 1e-9);
    }

    #[test]
    fn test_direct_recursion_counts_outer_span_once() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let f = source("fib");

        // f calls f calls f, innermost returns first
        call(&profiler, 1, 1, &f);
        clock.advance_millis(10);
        call(&profiler, 1, 1, &f);
        clock.advance_millis(10);
        call(&profiler, 1, 1, &f);
        clock.advance_millis(10);
        ret(&profiler, 1);
        clock.advance_millis(5);
        ret(&profiler, 1);
        clock.advance_millis(5);
        ret(&profiler, 1);
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].call_count, 3);
        // wall span of the outermost invocation: 40ms, not 75ms
        assert!((rows[0].ttot - 0.040).abs() < 1e-9);
        assert!(rows[0].tsub >= 0.0);
    }

    #[test]
    fn test_mutual_recursion_has_no_negative_exclusive_time() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let a = source("a");
        let b = source("b");

        call(&profiler, 1, 1, &a);
        clock.advance_millis(4);
        call(&profiler, 1, 2, &b);
        clock.advance_millis(4);
        call(&profiler, 1, 1, &a);
        clock.advance_millis(4);
        ret(&profiler, 1); // inner a
        clock.advance_millis(2);
        ret(&profiler, 1); // b
        clock.advance_millis(2);
        ret(&profiler, 1); // outer a
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.tsub >= 0.0, "negative exclusive time for {}", row.name);
            assert!(row.ttot >= row.tsub);
        }
    }

    #[test]
    fn test_call_count_tracks_enters_not_attribution() {
        let config = ProfilerConfig {
            item_pool_capacity: 8,
            ..ProfilerConfig::default()
        };
        let clock = ManualClock::new();
        let profiler = Profiler::with_clock(NullHost, clock.clone(), config);
        profiler.start(false).unwrap();
        let f = source("f");

        call(&profiler, 1, 1, &f);
        call(&profiler, 1, 1, &f); // recursive reentry
        clock.advance_millis(1);
        ret(&profiler, 1);
        ret(&profiler, 1);
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows[0].call_count, 2);
    }

    #[test]
    fn test_leave_with_empty_stack_is_dropped() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let f = source("f");

        ret(&profiler, 1); // unknown context, dropped
        call(&profiler, 1, 1, &f);
        clock.advance_millis(2);
        ret(&profiler, 1);
        ret(&profiler, 1); // empty stack on a known context, dropped
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].call_count, 1);
        assert!((rows[0].ttot - 0.002).abs() < 1e-9);
    }

    #[test]
    fn test_builtin_events_honor_start_flag() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let builtin = CodeDescriptor::BuiltinFunction {
            module: Some("os".to_string()),
            symbol: "read".to_string(),
        };

        profiler.dispatch(
            ContextId(1),
            ProfileEvent::CCall {
                code: CodeId(9),
                descriptor: &builtin,
            },
        );
        clock.advance_millis(3);
        profiler.dispatch(ContextId(1), ProfileEvent::CReturn);
        profiler.stop().unwrap();

        // builtins disabled: nothing recorded
        assert!(rows_by_name(&profiler).is_empty());
        profiler.clear_stats().unwrap();

        profiler.start(true).unwrap();
        profiler.dispatch(
            ContextId(1),
            ProfileEvent::CCall {
                code: CodeId(9),
                descriptor: &builtin,
            },
        );
        clock.advance_millis(3);
        profiler.dispatch(ContextId(1), ProfileEvent::CExceptionReturn);
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "<os.read>");
    }

    #[test]
    fn test_item_pool_exhaustion_degrades_gracefully() {
        let config = ProfilerConfig {
            item_pool_capacity: 2,
            ..ProfilerConfig::default()
        };
        let clock = ManualClock::new();
        let profiler = Profiler::with_clock(NullHost, clock.clone(), config);
        profiler.start(false).unwrap();

        for code in 1..=3u64 {
            call(&profiler, 1, code, &source(&format!("f{code}")));
            clock.advance_millis(1);
            ret(&profiler, 1);
        }
        // known functions keep profiling
        call(&profiler, 1, 1, &source("f1"));
        clock.advance_millis(1);
        ret(&profiler, 1);
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 2);
        let f1 = rows.iter().find(|r| r.name.contains("f1")).unwrap();
        assert_eq!(f1.call_count, 2);
    }

    #[test]
    fn test_clear_stats_then_fresh_cycle() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        call(&profiler, 1, 1, &source("old"));
        clock.advance_millis(1);
        ret(&profiler, 1);
        profiler.stop().unwrap();
        profiler.clear_stats().unwrap();

        assert_eq!(
            profiler.for_each_stat(|_, _, _, _| {}),
            Err(ProfilerError::NoStats)
        );

        profiler.start(false).unwrap();
        call(&profiler, 1, 2, &source("fresh"));
        clock.advance_millis(2);
        ret(&profiler, 1);
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].name.contains("fresh"));
    }

    #[test]
    fn test_events_ignored_while_stopped() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        profiler.stop().unwrap();

        call(&profiler, 1, 1, &source("f"));
        clock.advance_millis(1);
        ret(&profiler, 1);

        assert!(rows_by_name(&profiler).is_empty());
    }

    #[test]
    fn test_interleaved_contexts_stay_independent() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        let f = source("f");
        let g = source("g");

        call(&profiler, 1, 1, &f);
        clock.advance_millis(2);
        call(&profiler, 2, 2, &g);
        clock.advance_millis(3);
        ret(&profiler, 2); // g: 3ms
        clock.advance_millis(1);
        ret(&profiler, 1); // f: 6ms
        profiler.stop().unwrap();

        let rows = rows_by_name(&profiler);
        let f_row = rows.iter().find(|r| r.name.contains("f")).unwrap();
        let g_row = rows.iter().find(|r| r.name.contains("g")).unwrap();
        assert!((f_row.ttot - 0.006).abs() < 1e-9);
        assert!((g_row.ttot - 0.003).abs() < 1e-9);
        // sibling context time is not subtracted from f's self time
        assert!((f_row.tsub - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_report_limit_and_validation() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        for code in 1..=5u64 {
            call(&profiler, 1, code, &source(&format!("f{code}")));
            clock.advance_millis(code);
            ret(&profiler, 1);
        }
        profiler.stop().unwrap();

        let err = profiler.report(SortKey::TotalTime, SortOrder::Descending, Limit::Count(0));
        assert!(matches!(err, Err(ProfilerError::InvalidLimit)));

        let report = profiler
            .report(SortKey::TotalTime, SortOrder::Descending, Limit::Count(2))
            .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows[0].ttot >= report.rows[1].ttot);

        let all = profiler
            .report(SortKey::TotalTime, SortOrder::Descending, Limit::All)
            .unwrap();
        assert_eq!(all.rows.len(), 5);
    }

    #[test]
    fn test_report_carries_context_lines_and_summary() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        call(&profiler, 7, 1, &source("worker"));
        clock.advance_millis(2);
        ret(&profiler, 7);
        profiler.stop().unwrap();

        let report = profiler
            .report(SortKey::TotalTime, SortOrder::Descending, Limit::All)
            .unwrap();
        let text = report.to_string();
        assert!(text.contains("Thread 7: app.rs.worker:1"));
        assert!(text.contains("1 functions profiled in 1 threads since"));
    }

    #[test]
    fn test_for_each_stat_matches_snapshot() {
        let (profiler, clock) = profiler_with_clock();
        profiler.start(false).unwrap();
        call(&profiler, 1, 1, &source("f"));
        clock.advance_millis(4);
        ret(&profiler, 1);
        profiler.stop().unwrap();

        let mut pushed = Vec::new();
        profiler
            .for_each_stat(|name, count, ttot, tsub| {
                pushed.push((name.to_string(), count, ttot, tsub));
            })
            .unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].1, 1);
        assert!((pushed[0].2 - 0.004).abs() < 1e-9);
    }
}
