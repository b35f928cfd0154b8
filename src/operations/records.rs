//! Single-record operations: show and update.

use serde::Serialize;

use crate::error::Result;
use crate::models::record::{FileRecord, RecordEdit};
use crate::tracker::Tracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStatus {
    Completed,
    Pending,
}

/// Where a completion value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeOrigin {
    /// Companion found by the scan and not overridden.
    Auto,
    /// User override in effect.
    Manual,
    /// Neither detected nor overridden.
    None,
}

/// Display status of one completion field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub status: BadgeStatus,
    pub origin: BadgeOrigin,
}

impl Badge {
    #[must_use]
    pub fn new(completed: bool, auto_detected: bool, overridden: bool) -> Self {
        let status = if completed {
            BadgeStatus::Completed
        } else {
            BadgeStatus::Pending
        };
        let origin = if overridden {
            BadgeOrigin::Manual
        } else if auto_detected {
            BadgeOrigin::Auto
        } else {
            BadgeOrigin::None
        };
        Self { status, origin }
    }

    #[must_use]
    pub fn test(record: &FileRecord) -> Self {
        Self::new(
            record.test_completed,
            record.auto_detected_test,
            record.manual_test_override.is_some(),
        )
    }

    #[must_use]
    pub fn doc(record: &FileRecord) -> Self {
        Self::new(
            record.doc_completed,
            record.auto_detected_doc,
            record.manual_doc_override.is_some(),
        )
    }
}

/// A record together with its display badges.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetail {
    #[serde(flatten)]
    pub record: FileRecord,
    pub test_badge: Badge,
    pub doc_badge: Badge,
}

impl From<FileRecord> for RecordDetail {
    fn from(record: FileRecord) -> Self {
        Self {
            test_badge: Badge::test(&record),
            doc_badge: Badge::doc(&record),
            record,
        }
    }
}

/// Look up one record by id.
pub fn show_record(tracker: &Tracker, id: &str) -> Result<RecordDetail> {
    Ok(tracker.record(id)?.clone().into())
}

/// Apply an edit to one record and persist it.
pub fn update_record(tracker: &mut Tracker, id: &str, edit: &RecordEdit) -> Result<RecordDetail> {
    Ok(tracker.update(id, edit)?.into())
}
