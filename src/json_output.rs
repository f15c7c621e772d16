//! JSON output format for stat snapshots
//!
//! Serializes the same rows the fixed-width report is built from, for
//! consumers that post-process profiles instead of reading them.

use std::io::Write;

use serde::Serialize;

use crate::snapshot::StatRow;

/// Top-level JSON document for one exported snapshot
#[derive(Debug, Serialize)]
pub struct JsonStats<'a> {
    /// Distinct profiled items in the snapshot
    pub functions: usize,
    /// Snapshot rows, in the order they were handed over
    pub stats: &'a [StatRow],
}

/// Serialize `rows` as a pretty-printed JSON document
pub fn stats_to_string(rows: &[StatRow]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonStats {
        functions: rows.len(),
        stats: rows,
    })
}

/// Write `rows` as JSON to `writer`
pub fn write_stats<W: Write>(writer: W, rows: &[StatRow]) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(
        writer,
        &JsonStats {
            functions: rows.len(),
            stats: rows,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<StatRow> {
        vec![
            StatRow {
                name: "app.rs.run:10".to_string(),
                call_count: 3,
                ttot: 0.045,
                tsub: 0.030,
                tavg: 0.015,
            },
            StatRow {
                name: "<math.sqrt>".to_string(),
                call_count: 100,
                ttot: 0.001,
                tsub: 0.001,
                tavg: 0.00001,
            },
        ]
    }

    #[test]
    fn test_json_round_trips_fields() {
        let json = stats_to_string(&rows()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["functions"], 2);
        assert_eq!(value["stats"][0]["name"], "app.rs.run:10");
        assert_eq!(value["stats"][0]["call_count"], 3);
        assert_eq!(value["stats"][1]["name"], "<math.sqrt>");
    }

    #[test]
    fn test_write_stats_to_buffer() {
        let mut buffer = Vec::new();
        write_stats(&mut buffer, &rows()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("\"call_count\": 100"));
    }

    #[test]
    fn test_empty_snapshot_serializes() {
        let json = stats_to_string(&[]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["functions"], 0);
        assert!(value["stats"].as_array().unwrap().is_empty());
    }
}
