use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::hasher;

/// Completion status of one tracked Java source file.
///
/// Serialized in camelCase so the JSON store stays readable by the existing
/// web front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Stable id derived from `relative_path` (see [`record_id`]).
    pub id: String,
    /// File name including extension.
    pub name: String,
    /// Path relative to the scan root (forward slashes).
    pub relative_path: String,
    /// Parent directory of `relative_path`, empty at the root.
    pub directory: String,
    pub test_completed: bool,
    pub doc_completed: bool,
    /// Whether the last scan found the test companion.
    pub auto_detected_test: bool,
    /// Whether the last scan found the doc companion.
    pub auto_detected_doc: bool,
    pub test_file: Option<String>,
    pub doc_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_test_override: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_doc_override: Option<bool>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// A user edit to one record. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEdit {
    pub test_completed: Option<bool>,
    pub doc_completed: Option<bool>,
    pub notes: Option<String>,
}

/// Derive the record id for a relative path.
///
/// Hex SHA-256 of the normalized path bytes: deterministic, alphanumeric,
/// and collision-checked per scan by the resolver.
#[must_use]
pub fn record_id(relative_path: &str) -> String {
    hasher::hash_bytes(normalize_path(relative_path).as_bytes())
}

/// Normalize a relative path to forward slashes without a leading `./`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut trimmed = path.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.trim_start_matches('/').to_string()
}

/// Split a normalized relative path into `(directory, name)`.
#[must_use]
pub fn split_path(relative_path: &str) -> (String, String) {
    match relative_path.rsplit_once('/') {
        Some((dir, name)) => (dir.to_string(), name.to_string()),
        None => (String::new(), relative_path.to_string()),
    }
}

/// The override to store when the user sets `value` while detection says `auto`.
fn override_for(value: bool, auto: bool) -> Option<bool> {
    (value != auto).then_some(value)
}

impl FileRecord {
    /// A freshly discovered record: completion mirrors detection, no overrides.
    #[must_use]
    pub fn discovered(
        relative_path: &str,
        test_file: Option<String>,
        doc_file: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let relative_path = normalize_path(relative_path);
        let (directory, name) = split_path(&relative_path);
        let auto_detected_test = test_file.is_some();
        let auto_detected_doc = doc_file.is_some();
        Self {
            id: record_id(&relative_path),
            name,
            relative_path,
            directory,
            test_completed: auto_detected_test,
            doc_completed: auto_detected_doc,
            auto_detected_test,
            auto_detected_doc,
            test_file,
            doc_file,
            manual_test_override: None,
            manual_doc_override: None,
            notes: String::new(),
            created_at,
            last_updated: None,
        }
    }

    /// Both tests and docs are complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.test_completed && self.doc_completed
    }

    /// Number of completed fields (0 to 2).
    #[must_use]
    pub fn completed_count(&self) -> u8 {
        u8::from(self.test_completed) + u8::from(self.doc_completed)
    }

    /// Drop overrides that agree with the current auto-detection.
    pub fn normalize_overrides(&mut self) {
        if self.manual_test_override == Some(self.auto_detected_test) {
            self.manual_test_override = None;
        }
        if self.manual_doc_override == Some(self.auto_detected_doc) {
            self.manual_doc_override = None;
        }
    }

    /// Recompute the completion flags from overrides and detection.
    pub fn refresh_completion(&mut self) {
        self.test_completed = self.manual_test_override.unwrap_or(self.auto_detected_test);
        self.doc_completed = self.manual_doc_override.unwrap_or(self.auto_detected_doc);
    }

    /// Apply a user edit.
    ///
    /// A completion value that differs from auto-detection is stored as an
    /// override; a value equal to auto-detection clears the override.
    /// `last_updated` is always stamped.
    pub fn apply_edit(&mut self, edit: &RecordEdit, now: DateTime<Utc>) {
        if let Some(value) = edit.test_completed {
            self.manual_test_override = override_for(value, self.auto_detected_test);
        }
        if let Some(value) = edit.doc_completed {
            self.manual_doc_override = override_for(value, self.auto_detected_doc);
        }
        if let Some(notes) = &edit.notes {
            self.notes.clone_from(notes);
        }
        self.refresh_completion();
        self.last_updated = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn record_id_is_deterministic() {
        assert_eq!(record_id("src/Foo.java"), record_id("src/Foo.java"));
        assert_ne!(record_id("src/Foo.java"), record_id("src/Bar.java"));
        assert!(record_id("a/b.java").chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn record_id_ignores_separator_style() {
        assert_eq!(record_id("src\\Foo.java"), record_id("src/Foo.java"));
        assert_eq!(record_id("./src/Foo.java"), record_id("src/Foo.java"));
    }

    #[test]
    fn split_path_root_and_nested() {
        assert_eq!(split_path("Foo.java"), (String::new(), "Foo.java".into()));
        assert_eq!(
            split_path("a/b/Foo.java"),
            ("a/b".into(), "Foo.java".into())
        );
    }

    #[test]
    fn discovered_mirrors_detection() {
        let r = FileRecord::discovered("src/Foo.java", Some("src/Foo_tests.java".into()), None, ts());
        assert_eq!(r.name, "Foo.java");
        assert_eq!(r.directory, "src");
        assert!(r.auto_detected_test && r.test_completed);
        assert!(!r.auto_detected_doc && !r.doc_completed);
        assert!(r.manual_test_override.is_none());
        assert!(r.last_updated.is_none());
    }

    #[test]
    fn edit_against_detection_sets_override() {
        let mut r = FileRecord::discovered("Foo.java", None, None, ts());
        let edit = RecordEdit {
            test_completed: Some(true),
            ..Default::default()
        };
        r.apply_edit(&edit, ts());
        assert!(r.test_completed);
        assert_eq!(r.manual_test_override, Some(true));
        assert_eq!(r.last_updated, Some(ts()));
    }

    #[test]
    fn edit_back_to_detection_clears_override() {
        let mut r = FileRecord::discovered("Foo.java", None, Some("Foo.pdf".into()), ts());
        let uncheck = RecordEdit {
            doc_completed: Some(false),
            ..Default::default()
        };
        r.apply_edit(&uncheck, ts());
        assert_eq!(r.manual_doc_override, Some(false));
        assert!(!r.doc_completed);

        let recheck = RecordEdit {
            doc_completed: Some(true),
            ..Default::default()
        };
        r.apply_edit(&recheck, ts());
        assert_eq!(r.manual_doc_override, None);
        assert!(r.doc_completed);
    }

    #[test]
    fn notes_only_edit_keeps_flags() {
        let mut r = FileRecord::discovered("Foo.java", None, None, ts());
        let edit = RecordEdit {
            notes: Some("needs mocks".into()),
            ..Default::default()
        };
        r.apply_edit(&edit, ts());
        assert_eq!(r.notes, "needs mocks");
        assert!(!r.test_completed);
        assert!(r.manual_test_override.is_none());
    }

    #[test]
    fn absent_overrides_are_not_serialized() {
        let r = FileRecord::discovered("Foo.java", None, None, ts());
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("manualTestOverride"));
        assert!(json.contains("\"testFile\":null"));
        assert!(json.contains("\"relativePath\":\"Foo.java\""));
    }
}
