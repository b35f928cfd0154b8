use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::record::FileRecord;

/// Current schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 2;

/// The persisted envelope: records plus aggregate counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSet {
    pub version: u32,
    pub last_scan: Option<DateTime<Utc>>,
    pub total_files: usize,
    pub completed_tests: usize,
    pub completed_docs: usize,
    pub files: Vec<FileRecord>,
}

impl Default for RecordSet {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            last_scan: None,
            total_files: 0,
            completed_tests: 0,
            completed_docs: 0,
            files: Vec::new(),
        }
    }
}

impl RecordSet {
    /// Build an envelope around `files` with counters computed.
    #[must_use]
    pub fn new(files: Vec<FileRecord>, last_scan: Option<DateTime<Utc>>) -> Self {
        let mut set = Self {
            last_scan,
            files,
            ..Self::default()
        };
        set.recount();
        set
    }

    /// Recompute `total_files`, `completed_tests` and `completed_docs`.
    pub fn recount(&mut self) {
        self.total_files = self.files.len();
        self.completed_tests = self.files.iter().filter(|f| f.test_completed).count();
        self.completed_docs = self.files.iter().filter(|f| f.doc_completed).count();
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut FileRecord> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, test: bool, doc: bool) -> FileRecord {
        let mut r = FileRecord::discovered(path, None, None, Utc::now());
        r.test_completed = test;
        r.doc_completed = doc;
        r
    }

    #[test]
    fn counters_match_flags() {
        let set = RecordSet::new(
            vec![
                record("A.java", true, false),
                record("B.java", true, true),
                record("C.java", false, false),
            ],
            None,
        );
        assert_eq!(set.total_files, 3);
        assert_eq!(set.completed_tests, 2);
        assert_eq!(set.completed_docs, 1);
        assert_eq!(set.version, SCHEMA_VERSION);
    }

    #[test]
    fn envelope_uses_store_field_names() {
        let json = serde_json::to_string(&RecordSet::default()).unwrap();
        assert!(json.contains("\"lastScan\":null"));
        assert!(json.contains("\"totalFiles\":0"));
        assert!(json.contains("\"completedTests\":0"));
        assert!(json.contains("\"completedDocs\":0"));
        assert!(json.contains("\"files\":[]"));
    }

    #[test]
    fn get_by_id() {
        let r = record("pkg/A.java", false, false);
        let id = r.id.clone();
        let mut set = RecordSet::new(vec![r], None);
        assert!(set.get(&id).is_some());
        assert!(set.get("missing").is_none());
        set.get_mut(&id).unwrap().notes = "x".into();
        assert_eq!(set.get(&id).unwrap().notes, "x");
    }
}
