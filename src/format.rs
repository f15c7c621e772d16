//! Fixed-width report rendering
//!
//! Formatting is kept apart from the snapshot model so the width and
//! ellipsis rules are testable on their own. The contract: the name
//! column is padded to a configured width and truncated with a trailing
//! ellipsis when it does not fit; numeric columns are right-aligned with
//! six decimal places for seconds.

use std::fmt;

use crate::snapshot::StatRow;

/// Dots used when a name is truncated
const ELLIPSIS: &str = "...";

/// Column layout for rendered reports
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Width of the name column
    pub name_width: usize,
    /// Width of the call-count column
    pub count_width: usize,
    /// Width of each time column
    pub time_width: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            name_width: 40,
            count_width: 8,
            time_width: 10,
        }
    }
}

impl FormatConfig {
    /// Total width of one rendered row (columns plus separators)
    fn line_width(&self) -> usize {
        self.name_width + 2 + self.count_width + 3 * (2 + self.time_width)
    }
}

/// Pad `name` to `width`, truncating with an ellipsis when it overflows
pub fn clip_name(name: &str, width: usize) -> String {
    let len = name.chars().count();
    if len <= width {
        let mut out = String::with_capacity(width);
        out.push_str(name);
        out.extend(std::iter::repeat(' ').take(width - len));
        return out;
    }
    if width <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(width).collect();
    }
    let keep = width - ELLIPSIS.len();
    let mut out: String = name.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Render one stat row as a fixed-width line
pub fn render_row(row: &StatRow, config: &FormatConfig) -> String {
    format!(
        "{}  {:>cw$}  {:>tw$.6}  {:>tw$.6}  {:>tw$.6}",
        clip_name(&row.name, config.name_width),
        row.call_count,
        row.ttot,
        row.tsub,
        row.tavg,
        cw = config.count_width,
        tw = config.time_width,
    )
}

/// Render the column header line
pub fn render_header(config: &FormatConfig) -> String {
    format!(
        "{}  {:>cw$}  {:>tw$}  {:>tw$}  {:>tw$}",
        clip_name("name", config.name_width),
        "ncall",
        "ttot",
        "tsub",
        "tavg",
        cw = config.count_width,
        tw = config.time_width,
    )
}

/// Render the separator line between report sections
pub fn render_footer(config: &FormatConfig) -> String {
    "-".repeat(config.line_width())
}

/// Trailing totals for the report summary line
#[derive(Debug, Clone)]
pub struct ReportSummary {
    /// Distinct profiled items
    pub functions: usize,
    /// Known execution contexts
    pub contexts: usize,
    /// Wall-clock time of the last `start`
    pub started_at: String,
    /// Accumulated profiler overhead, seconds
    pub overhead_secs: f64,
    /// Total attributed application time, seconds
    pub app_secs: f64,
}

impl ReportSummary {
    /// Overhead as a percentage of attributed application time
    ///
    /// The divisor is floored at one tick so an empty profile cannot
    /// divide by zero.
    pub fn overhead_percent(&self) -> f64 {
        self.overhead_secs / self.app_secs.max(1e-9) * 100.0
    }
}

/// Render the trailing summary line
pub fn render_summary(summary: &ReportSummary) -> String {
    format!(
        "{} functions profiled in {} threads since {}; overhead {:.6}/{:.6} ({:.6}%)",
        summary.functions,
        summary.contexts,
        summary.started_at,
        summary.overhead_secs,
        summary.app_secs,
        summary.overhead_percent(),
    )
}

/// A fully rendered report plus the rows it was built from
///
/// `rows` are post-sort and post-limit, so programmatic consumers see
/// exactly what the rendered lines show.
#[derive(Debug)]
pub struct Report {
    /// Sorted, limited snapshot rows
    pub rows: Vec<StatRow>,
    lines: Vec<String>,
}

impl Report {
    /// Rendered lines in presentation order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Assemble the full report: header, rows, footer, one line per context,
/// a second footer, and the summary line
pub fn render_report(
    rows: Vec<StatRow>,
    context_lines: Vec<String>,
    summary: &ReportSummary,
    config: &FormatConfig,
) -> Report {
    let mut lines = Vec::with_capacity(rows.len() + context_lines.len() + 4);
    lines.push(render_header(config));
    for row in &rows {
        lines.push(render_row(row, config));
    }
    lines.push(render_footer(config));
    lines.extend(context_lines);
    lines.push(render_footer(config));
    lines.push(render_summary(summary));
    Report { rows, lines }
}
