use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::ffi::ErrorCode;
use rusqlite::Connection;

use crate::db::schema::CREATE_SCHEMA;
use crate::error::{Result, TrackerError};
use crate::store::malformed_warning;

/// SQLite-backed record store.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
    /// Set when an unreadable file was moved aside on open.
    recovered: Option<String>,
}

/// Path of a sibling file: `tracker.db` + `-wal` is `tracker.db-wal`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn is_unreadable(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(err.code, ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt)
    )
}

impl Database {
    /// Open (or create) a database at the given path and apply schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=NORMAL;\
             PRAGMA temp_store=MEMORY;",
        )?;
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
            recovered: None,
        })
    }

    /// Open the database at `path`, moving an unreadable file to `<path>.bak`
    /// and starting from an empty one.
    pub fn open_or_recover(path: &Path) -> Result<Self> {
        let detail = match Self::open(path) {
            Ok(db) => return Ok(db),
            Err(TrackerError::Database(e)) if path.exists() && is_unreadable(&e) => e.to_string(),
            Err(e) => return Err(e),
        };

        let backup = sibling(path, ".bak");
        fs::rename(path, &backup)?;
        let wal = sibling(path, "-wal");
        if wal.exists() {
            fs::rename(&wal, sibling(path, ".bak-wal"))?;
        }
        let shm = sibling(path, "-shm");
        if shm.exists() {
            fs::remove_file(&shm)?;
        }

        let backup = backup.display().to_string();
        tracing::warn!(
            store = %path.display(),
            detail = %detail,
            backup = %backup,
            "stored database is unreadable; starting from an empty store"
        );
        let mut db = Self::open(path)?;
        db.recovered = Some(malformed_warning(&detail, Some(&backup)));
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_SCHEMA)?;
        Ok(Self {
            conn,
            path: None,
            recovered: None,
        })
    }

    /// Access the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Warning left by [`Database::open_or_recover`], if it moved a file aside.
    #[must_use]
    pub fn recovered(&self) -> Option<&str> {
        self.recovered.as_deref()
    }

    /// Copy the database file (and its write-ahead log) to `<path>.bak`.
    pub fn backup(&self) -> Result<Option<String>> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        if let Err(e) = self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);") {
            tracing::debug!(error = %e, "checkpoint before backup failed");
        }
        let backup = sibling(path, ".bak");
        fs::copy(path, &backup)?;
        let wal = sibling(path, "-wal");
        if wal.exists() {
            fs::copy(&wal, sibling(path, ".bak-wal"))?;
        }
        Ok(Some(backup.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_in_memory_works() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn open_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tracker.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        assert!(db.recovered().is_none());
    }

    #[test]
    fn garbage_file_is_moved_aside() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tracker.db");
        let garbage = "this is not a database\n".repeat(200);
        fs::write(&path, &garbage).unwrap();

        assert!(Database::open(&path).is_err());
        let db = Database::open_or_recover(&path).unwrap();
        let warning = db.recovered().unwrap();
        assert!(warning.contains("malformed"));
        assert!(warning.contains("tracker.db.bak"));
        assert_eq!(fs::read_to_string(tmp.path().join("tracker.db.bak")).unwrap(), garbage);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_parent_is_not_recovered() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent").join("tracker.db");
        assert!(Database::open_or_recover(&path).is_err());
        assert!(!tmp.path().join("absent").exists());
    }

    #[test]
    fn backup_copies_committed_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tracker.db");
        let db = Database::open(&path).unwrap();
        db.conn()
            .execute("INSERT INTO meta (key, value) VALUES ('k', 'v')", [])
            .unwrap();

        let backup = db.backup().unwrap().unwrap();
        let copy = Connection::open(&backup).unwrap();
        let value: String = copy
            .query_row("SELECT value FROM meta WHERE key = 'k'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(value, "v");
        assert!(Database::open_in_memory().unwrap().backup().unwrap().is_none());
    }
}
