//! Stats operation shared between CLI and MCP.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::record_set::RecordSet;

/// Completion statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResult {
    pub total_files: usize,
    pub completed_tests: usize,
    pub completed_docs: usize,
    /// Both tests and docs complete.
    pub fully_completed: usize,
    /// Percentage of files with tests, one decimal.
    pub test_progress: f64,
    /// Percentage of files with docs, one decimal.
    pub doc_progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<DateTime<Utc>>,
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = part as f64 / total as f64;
    (ratio * 1000.0).round() / 10.0
}

/// Compute statistics for `set`.
#[must_use]
pub fn get_stats(set: &RecordSet) -> StatsResult {
    StatsResult {
        total_files: set.total_files,
        completed_tests: set.completed_tests,
        completed_docs: set.completed_docs,
        fully_completed: set.files.iter().filter(|f| f.is_complete()).count(),
        test_progress: percent(set.completed_tests, set.total_files),
        doc_progress: percent(set.completed_docs, set.total_files),
        last_scan: set.last_scan,
    }
}
