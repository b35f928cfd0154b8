use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::error::{Result, TrackerError};
use crate::models::migrate::Parsed;
use crate::models::record::FileRecord;
use crate::models::record_set::{RecordSet, SCHEMA_VERSION};
use crate::store::RecordStore;

use super::Database;

const META_SCHEMA_VERSION: &str = "schema_version";
const META_LAST_SCAN: &str = "last_scan";

const SELECT_FILES: &str = "SELECT id, name, relative_path, directory, test_completed, doc_completed,
        auto_detected_test, auto_detected_doc, test_file, doc_file,
        manual_test_override, manual_doc_override, notes, created_at, last_updated
 FROM files ORDER BY position";

/// A row with timestamps still in text form.
struct RawRow {
    record: FileRecord,
    created_at: String,
    last_updated: Option<String>,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        record: FileRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            relative_path: row.get(2)?,
            directory: row.get(3)?,
            test_completed: row.get(4)?,
            doc_completed: row.get(5)?,
            auto_detected_test: row.get(6)?,
            auto_detected_doc: row.get(7)?,
            test_file: row.get(8)?,
            doc_file: row.get(9)?,
            manual_test_override: row.get(10)?,
            manual_doc_override: row.get(11)?,
            notes: row.get(12)?,
            created_at: DateTime::<Utc>::MIN_UTC,
            last_updated: None,
        },
        created_at: row.get(13)?,
        last_updated: row.get(14)?,
    })
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TrackerError::MalformedPriorState {
            detail: format!("bad timestamp {raw:?}: {e}"),
        })
}

impl Database {
    // ─── Meta ───

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |r| {
                r.get::<_, Option<String>>(0)
            })
            .optional()?;
        Ok(value.flatten())
    }

    // ─── Records ───

    /// Read every stored record in stored order.
    pub fn read_records(&self) -> Result<RecordSet> {
        if let Some(version) = self.get_meta(META_SCHEMA_VERSION)? {
            if version != SCHEMA_VERSION.to_string() {
                return Err(TrackerError::MalformedPriorState {
                    detail: format!("unsupported schema version {version}"),
                });
            }
        }

        let mut stmt = self.conn().prepare(SELECT_FILES)?;
        let rows = stmt.query_map([], map_row)?;
        let mut files = Vec::new();
        for raw in rows {
            let raw = raw?;
            let mut record = raw.record;
            record.created_at = parse_ts(&raw.created_at)?;
            record.last_updated = raw.last_updated.as_deref().map(parse_ts).transpose()?;
            files.push(record);
        }

        let last_scan = self
            .get_meta(META_LAST_SCAN)?
            .as_deref()
            .map(parse_ts)
            .transpose()?;
        Ok(RecordSet::new(files, last_scan))
    }

    /// Replace all records in one transaction.
    pub fn write_records(&self, set: &RecordSet) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM files", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO files (id, position, name, relative_path, directory,
                    test_completed, doc_completed, auto_detected_test, auto_detected_doc,
                    test_file, doc_file, manual_test_override, manual_doc_override,
                    notes, created_at, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?;
            for (position, f) in set.files.iter().enumerate() {
                stmt.execute(params![
                    f.id,
                    position as i64,
                    f.name,
                    f.relative_path,
                    f.directory,
                    f.test_completed,
                    f.doc_completed,
                    f.auto_detected_test,
                    f.auto_detected_doc,
                    f.test_file,
                    f.doc_file,
                    f.manual_test_override,
                    f.manual_doc_override,
                    f.notes,
                    f.created_at.to_rfc3339(),
                    f.last_updated.map(|t| t.to_rfc3339()),
                ])?;
            }
        }
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![META_SCHEMA_VERSION, SCHEMA_VERSION.to_string()],
        )?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![META_LAST_SCAN, set.last_scan.map(|t| t.to_rfc3339())],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Update the user-editable columns of one record.
    pub fn update_record(&self, record: &FileRecord) -> Result<()> {
        let changed = self.conn().execute(
            "UPDATE files SET test_completed = ?2, doc_completed = ?3,
                manual_test_override = ?4, manual_doc_override = ?5,
                notes = ?6, last_updated = ?7
             WHERE id = ?1",
            params![
                record.id,
                record.test_completed,
                record.doc_completed,
                record.manual_test_override,
                record.manual_doc_override,
                record.notes,
                record.last_updated.map(|t| t.to_rfc3339()),
            ],
        )?;
        if changed == 0 {
            return Err(TrackerError::RecordNotFound {
                id: record.id.clone(),
            });
        }
        Ok(())
    }
}

impl RecordStore for Database {
    fn load_strict(&self) -> Result<Parsed> {
        Ok(Parsed {
            set: self.read_records()?,
            migrated_from: None,
            warnings: self.recovered().map(str::to_string).into_iter().collect(),
        })
    }

    fn save(&self, set: &RecordSet) -> Result<()> {
        self.write_records(set)
    }

    fn save_record(&self, _set: &RecordSet, record: &FileRecord) -> Result<()> {
        self.update_record(record)
    }

    fn quarantine(&self) -> Result<Option<String>> {
        self.backup()
    }

    fn location(&self) -> String {
        self.path()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }
}
