use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::migrate::Parsed;
use crate::models::record_set::RecordSet;
use crate::store::{parse_text, RecordStore};

/// Record set stored as one pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl RecordStore for JsonFileStore {
    fn load_strict(&self) -> Result<Parsed> {
        if !self.path.exists() {
            return Ok(Parsed::default());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Parsed::default());
        }
        parse_text(&text)
    }

    /// Write to a temp file next to the target, then rename over it.
    fn save(&self, set: &RecordSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut set = set.clone();
        set.recount();
        let json = serde_json::to_string_pretty(&set)?;
        let tmp = self.sibling(".tmp");
        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn quarantine(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup = self.sibling(".bak");
        fs::copy(&self.path, &backup)?;
        Ok(Some(backup.display().to_string()))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FileRecord;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("java-files.json"));
        let loaded = store.load().unwrap();
        assert!(loaded.set.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn save_then_load_is_lossless() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("data").join("java-files.json"));
        let mut r = FileRecord::discovered("a/Foo.java", None, Some("a/Foo.pdf".into()), Utc::now());
        r.manual_test_override = Some(true);
        r.refresh_completion();
        r.notes = "ünïcode notes".into();
        r.last_updated = Some(Utc::now());
        let set = RecordSet::new(vec![r], Some(Utc::now()));

        store.save(&set).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.set, set);
        assert!(!store.sibling(".tmp").exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("java-files.json");
        fs::create_dir_all(path.join("occupied")).unwrap();
        let store = JsonFileStore::new(&path);

        assert!(store.save(&RecordSet::default()).is_err());
        assert!(!store.sibling(".tmp").exists());
        assert!(path.join("occupied").exists());
    }

    #[test]
    fn malformed_file_is_backed_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("java-files.json");
        fs::write(&path, "{ definitely not json").unwrap();
        let store = JsonFileStore::new(&path);

        let loaded = store.load().unwrap();
        assert!(loaded.set.is_empty());
        assert_eq!(loaded.warnings.len(), 1);
        let backup = tmp.path().join("java-files.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ definitely not json");
    }

    #[test]
    fn clear_writes_empty_envelope() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("java-files.json"));
        let set = RecordSet::new(
            vec![FileRecord::discovered("A.java", None, None, Utc::now())],
            None,
        );
        store.save(&set).unwrap();
        store.clear().unwrap();
        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"files\": []"));
        assert!(store.load().unwrap().set.is_empty());
    }
}
