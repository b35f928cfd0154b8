//! Loading stored documents of any known shape into the current schema.
//!
//! Three shapes exist in the wild:
//! - the current envelope (`version: 2`),
//! - the unversioned server envelope and the browser export document
//!   (`{ exportDate, version: "1.0", files }`),
//! - a bare record array (browser local storage).
//!
//! Anything that is not the current envelope goes through [`upgrade_v1`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TrackerError};
use crate::models::record::{normalize_path, record_id, split_path, FileRecord};
use crate::models::record_set::{RecordSet, SCHEMA_VERSION};

/// A parsed document plus anything worth telling the user about it.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub set: RecordSet,
    /// Version the document was migrated from, if any.
    pub migrated_from: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyDocument {
    Envelope(LegacyEnvelope),
    Records(Vec<LegacyRecord>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyEnvelope {
    #[serde(default)]
    last_scan: Option<String>,
    #[serde(default)]
    export_date: Option<String>,
    files: Vec<LegacyRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LegacyRecord {
    relative_path: String,
    name: Option<String>,
    test_completed: Option<bool>,
    doc_completed: Option<bool>,
    auto_detected_test: Option<bool>,
    auto_detected_doc: Option<bool>,
    test_file: Option<String>,
    doc_file: Option<String>,
    manual_test_override: Option<bool>,
    manual_doc_override: Option<bool>,
    notes: Option<String>,
    created_at: Option<String>,
    last_updated: Option<String>,
}

/// Parse a stored document, migrating older shapes.
///
/// Returns `MalformedPriorState` when the text is not JSON or matches no
/// known shape.
pub fn parse_document(text: &str, now: DateTime<Utc>) -> Result<Parsed> {
    let value: Value = serde_json::from_str(text).map_err(malformed)?;

    let is_current = value
        .get("version")
        .and_then(Value::as_u64)
        .is_some_and(|v| v == u64::from(SCHEMA_VERSION));
    if is_current {
        let set: RecordSet = serde_json::from_value(value).map_err(malformed)?;
        let mut settler = Settler::default();
        let files = set.files.into_iter().filter_map(|r| settler.settle(r)).collect();
        return Ok(Parsed {
            set: RecordSet::new(files, set.last_scan),
            migrated_from: None,
            warnings: settler.finish(),
        });
    }

    let from = match value.get("version") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "1".to_string(),
    };
    let doc: LegacyDocument = serde_json::from_value(value).map_err(malformed)?;
    let mut parsed = upgrade_v1(doc, now);
    tracing::info!(
        from = %from,
        records = parsed.set.files.len(),
        "migrated stored records to schema v{SCHEMA_VERSION}"
    );
    parsed.migrated_from = Some(from);
    Ok(parsed)
}

fn malformed(e: serde_json::Error) -> TrackerError {
    TrackerError::MalformedPriorState {
        detail: e.to_string(),
    }
}

fn parse_ts(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Restores the record invariants on records read from disk.
///
/// Paths are normalized and ids recomputed from them, directory and name are
/// rederived, duplicates are dropped, and a completion value that disagrees
/// with detection but has no override becomes an override so the user's
/// status survives.
#[derive(Default)]
struct Settler {
    seen: HashSet<String>,
    warnings: Vec<String>,
}

impl Settler {
    fn settle(&mut self, mut record: FileRecord) -> Option<FileRecord> {
        let relative_path = normalize_path(&record.relative_path);
        if relative_path.is_empty() {
            self.warnings
                .push("dropped a stored record without a relative path".to_string());
            return None;
        }
        let id = record_id(&relative_path);
        if !self.seen.insert(id.clone()) {
            self.warnings
                .push(format!("dropped duplicate stored record for {relative_path}"));
            return None;
        }

        let (directory, derived_name) = split_path(&relative_path);
        if record.name.is_empty() {
            record.name = derived_name;
        }
        record.id = id;
        record.relative_path = relative_path;
        record.directory = directory;
        record.test_file = record.test_file.map(|p| normalize_path(&p));
        record.doc_file = record.doc_file.map(|p| normalize_path(&p));

        if record.manual_test_override.is_none() && record.test_completed != record.auto_detected_test {
            record.manual_test_override = Some(record.test_completed);
        }
        if record.manual_doc_override.is_none() && record.doc_completed != record.auto_detected_doc {
            record.manual_doc_override = Some(record.doc_completed);
        }
        record.normalize_overrides();
        record.refresh_completion();
        Some(record)
    }

    fn finish(self) -> Vec<String> {
        for w in &self.warnings {
            tracing::warn!("{w}");
        }
        self.warnings
    }
}

/// Upgrade an unversioned document.
///
/// Missing detection flags are inferred from the companion paths; the rest
/// goes through [`Settler`].
fn upgrade_v1(doc: LegacyDocument, now: DateTime<Utc>) -> Parsed {
    let (records, last_scan) = match doc {
        LegacyDocument::Envelope(env) => {
            let last = parse_ts(env.last_scan.as_deref()).or(parse_ts(env.export_date.as_deref()));
            (env.files, last)
        }
        LegacyDocument::Records(records) => (records, None),
    };

    let mut settler = Settler::default();
    let mut files = Vec::with_capacity(records.len());

    for legacy in records {
        let auto_test = legacy.auto_detected_test.unwrap_or(legacy.test_file.is_some());
        let auto_doc = legacy.auto_detected_doc.unwrap_or(legacy.doc_file.is_some());
        let record = FileRecord {
            id: String::new(),
            name: legacy.name.unwrap_or_default(),
            relative_path: legacy.relative_path,
            directory: String::new(),
            test_completed: legacy.test_completed.unwrap_or(auto_test),
            doc_completed: legacy.doc_completed.unwrap_or(auto_doc),
            auto_detected_test: auto_test,
            auto_detected_doc: auto_doc,
            test_file: legacy.test_file,
            doc_file: legacy.doc_file,
            manual_test_override: legacy.manual_test_override,
            manual_doc_override: legacy.manual_doc_override,
            notes: legacy.notes.unwrap_or_default(),
            created_at: parse_ts(legacy.created_at.as_deref()).unwrap_or(now),
            last_updated: parse_ts(legacy.last_updated.as_deref()),
        };
        files.extend(settler.settle(record));
    }

    Parsed {
        set: RecordSet::new(files, last_scan),
        migrated_from: None,
        warnings: settler.finish(),
    }
}
