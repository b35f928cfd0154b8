//! Export, import and clear.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::models::migrate;
use crate::models::record::FileRecord;
use crate::models::record_set::RecordSet;
use crate::tracker::Tracker;

/// Version tag of the export document, shared with the browser front end.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Portable export of every record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub export_date: DateTime<Utc>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scan: Option<DateTime<Utc>>,
    pub files: &'a [FileRecord],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutput {
    pub imported: usize,
    /// Records that were stored before the import replaced them.
    pub replaced: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearOutput {
    pub cleared: usize,
}

#[must_use]
pub fn export_records(set: &RecordSet, now: DateTime<Utc>) -> ExportDocument<'_> {
    ExportDocument {
        export_date: now,
        version: EXPORT_FORMAT_VERSION,
        last_scan: set.last_scan,
        files: &set.files,
    }
}

/// Replace every record with the contents of `text`.
///
/// Accepts the store envelope, an export document or a bare record array.
/// Unparseable input is rejected and nothing is replaced.
pub fn import_records(tracker: &mut Tracker, text: &str) -> Result<ImportOutput> {
    let parsed = migrate::parse_document(text, Utc::now()).map_err(|e| match e {
        TrackerError::MalformedPriorState { detail } => TrackerError::InvalidImport { detail },
        other => other,
    })?;

    let replaced = tracker.records().total_files;
    let imported = parsed.set.files.len();
    tracker.replace_all(parsed.set)?;
    tracing::info!(imported, replaced, "records imported");

    Ok(ImportOutput {
        imported,
        replaced,
        migrated_from: parsed.migrated_from,
        warnings: parsed.warnings,
    })
}

/// Remove every record.
pub fn clear_records(tracker: &mut Tracker) -> Result<ClearOutput> {
    let cleared = tracker.records().total_files;
    tracker.clear()?;
    tracing::info!(cleared, "records cleared");
    Ok(ClearOutput { cleared })
}
