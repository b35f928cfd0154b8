//! Reconciling fresh scan results with the previously stored record set.
//!
//! User-owned state (notes, overrides, timestamps) survives every re-scan;
//! detection state always comes from the fresh scan. Records that the scan
//! no longer finds are kept untouched and reported as missing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::record::FileRecord;
use crate::models::record_set::RecordSet;

/// What one merge pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Ids seen for the first time.
    pub added: Vec<String>,
    /// Ids that existed before and were refreshed.
    pub updated: Vec<String>,
    /// Ids stored before but absent from this scan, retained unchanged.
    pub missing: Vec<String>,
}

/// Carry user-owned state from `prior` onto `fresh` and recompute completion.
fn carry_over(mut fresh: FileRecord, prior: &FileRecord) -> FileRecord {
    fresh.notes.clone_from(&prior.notes);
    fresh.last_updated = prior.last_updated;
    fresh.created_at = prior.created_at;
    fresh.manual_test_override = prior.manual_test_override;
    fresh.manual_doc_override = prior.manual_doc_override;
    fresh.normalize_overrides();
    fresh.refresh_completion();
    fresh
}

/// Merge `fresh` records against `prior` state.
///
/// Output order: fresh records in scan order, then retained records in their
/// stored order. Counters are recomputed; `last_scan` is set to `scanned_at`.
#[must_use]
pub fn merge(
    fresh: Vec<FileRecord>,
    prior: &RecordSet,
    scanned_at: DateTime<Utc>,
) -> (RecordSet, MergeOutcome) {
    let by_id: HashMap<&str, &FileRecord> =
        prior.files.iter().map(|f| (f.id.as_str(), f)).collect();
    let mut outcome = MergeOutcome::default();
    let mut fresh_ids: HashSet<String> = HashSet::with_capacity(fresh.len());
    let mut files = Vec::with_capacity(fresh.len().max(prior.files.len()));

    for record in fresh {
        fresh_ids.insert(record.id.clone());
        match by_id.get(record.id.as_str()) {
            Some(existing) => {
                outcome.updated.push(record.id.clone());
                files.push(carry_over(record, existing));
            }
            None => {
                outcome.added.push(record.id.clone());
                let mut record = record;
                record.manual_test_override = None;
                record.manual_doc_override = None;
                record.refresh_completion();
                files.push(record);
            }
        }
    }

    for stale in prior.files.iter().filter(|f| !fresh_ids.contains(&f.id)) {
        outcome.missing.push(stale.id.clone());
        files.push(stale.clone());
    }

    tracing::debug!(
        added = outcome.added.len(),
        updated = outcome.updated.len(),
        missing = outcome.missing.len(),
        "merge pass complete"
    );

    (RecordSet::new(files, Some(scanned_at)), outcome)
}
