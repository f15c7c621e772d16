//! Transient stat snapshots: build, sort, enumerate
//!
//! A snapshot walks the profiled-item registry once and materializes one
//! [`StatRow`] per item with nonzero inclusive time. Rows are sorted
//! descending by the chosen metric with a stable sort, so ties keep build
//! order; ascending order is the exact reverse of the descending sequence
//! rather than an independent re-sort. Both properties are part of the
//! public contract and are tested.

use serde::Serialize;

use crate::registry::ItemRegistry;

/// Metric a snapshot is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Display name, lexicographic
    Name,
    /// Times entered
    CallCount,
    /// Inclusive wall time
    TotalTime,
    /// Exclusive (self) wall time
    ExclusiveTime,
    /// Inclusive time per call
    AverageTime,
}

/// Direction of the sorted snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Row bound for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Every row
    All,
    /// At most this many rows; zero is rejected as `InvalidLimit`
    Count(usize),
}

/// One profiled item, flattened for reporting
///
/// Ephemeral: built for a single report or export and discarded after the
/// caller consumes it. Times are seconds.
#[derive(Debug, Clone, Serialize)]
pub struct StatRow {
    /// Derived display name
    pub name: String,
    /// Times entered
    pub call_count: u64,
    /// Inclusive seconds
    pub ttot: f64,
    /// Exclusive (self) seconds
    pub tsub: f64,
    /// Inclusive seconds per call
    pub tavg: f64,
}

/// Build unsorted rows from the registry, skipping never-entered items
pub fn build_rows(items: &ItemRegistry, tick_factor: f64) -> Vec<StatRow> {
    let mut rows = Vec::with_capacity(items.len());
    items.for_each(|item| {
        if item.ttotal == 0 {
            return;
        }
        let ttot = item.ttotal as f64 * tick_factor;
        let tsub = item.exclusive_ticks() as f64 * tick_factor;
        rows.push(StatRow {
            name: item.display_name(),
            call_count: item.call_count,
            ttot,
            tsub,
            // call_count >= 1 whenever ttotal > 0
            tavg: ttot / item.call_count as f64,
        });
    });
    rows
}

fn compare_descending(a: &StatRow, b: &StatRow, key: SortKey) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match key {
        SortKey::Name => b.name.cmp(&a.name),
        SortKey::CallCount => b.call_count.cmp(&a.call_count),
        SortKey::TotalTime => b.ttot.partial_cmp(&a.ttot).unwrap_or(Ordering::Equal),
        SortKey::ExclusiveTime => b.tsub.partial_cmp(&a.tsub).unwrap_or(Ordering::Equal),
        SortKey::AverageTime => b.tavg.partial_cmp(&a.tavg).unwrap_or(Ordering::Equal),
    }
}

/// Order rows by `key`
///
/// Descending is produced by a stable sort, so equal keys keep their build
/// order. Ascending reverses the descending sequence, which makes the two
/// directions exact mirrors of each other for the same data.
pub fn sort_rows(rows: &mut [StatRow], key: SortKey, order: SortOrder) {
    rows.sort_by(|a, b| compare_descending(a, b, key));
    if order == SortOrder::Ascending {
        rows.reverse();
    }
}
