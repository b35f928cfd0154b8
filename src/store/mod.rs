//! Persistence of the merged record set.
//!
//! Two backends: a flat JSON file (the default, compatible with the existing
//! web front end) and a single SQLite file. Both write all-or-nothing.

pub mod json_file;

use chrono::Utc;

use crate::config::{Config, StoreBackend};
use crate::db::Database;
use crate::error::{Result, TrackerError};
use crate::models::migrate::Parsed;
use crate::models::record::FileRecord;
use crate::models::record_set::RecordSet;

pub use json_file::JsonFileStore;

/// Prior state handed to a merge pass.
#[derive(Debug, Clone, Default)]
pub struct LoadedState {
    pub set: RecordSet,
    pub warnings: Vec<String>,
}

pub trait RecordStore: Send {
    /// Load the stored set. A malformed store is `MalformedPriorState`.
    fn load_strict(&self) -> Result<Parsed>;

    /// Replace the stored set atomically.
    fn save(&self, set: &RecordSet) -> Result<()>;

    /// Persist one edited record. Backends that can update a single row
    /// override this; the default rewrites the whole set.
    fn save_record(&self, set: &RecordSet, _record: &FileRecord) -> Result<()> {
        self.save(set)
    }

    /// Set aside an unreadable store before it gets overwritten.
    fn quarantine(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Human-readable location, for logs and output.
    fn location(&self) -> String;

    /// Load, degrading a malformed store to an empty set with a warning.
    fn load(&self) -> Result<LoadedState> {
        match self.load_strict() {
            Ok(parsed) => {
                let mut warnings = parsed.warnings;
                if let Some(from) = parsed.migrated_from {
                    warnings.push(format!("migrated stored records from schema version {from}"));
                }
                Ok(LoadedState {
                    set: parsed.set,
                    warnings,
                })
            }
            Err(TrackerError::MalformedPriorState { detail }) => {
                let backup = self.quarantine()?;
                tracing::warn!(
                    store = %self.location(),
                    detail = %detail,
                    backup = backup.as_deref().unwrap_or("-"),
                    "stored records are malformed; starting from an empty set"
                );
                Ok(LoadedState {
                    set: RecordSet::default(),
                    warnings: vec![malformed_warning(&detail, backup.as_deref())],
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Remove every record (explicit administrative action).
    fn clear(&self) -> Result<()> {
        self.save(&RecordSet::default())
    }
}

/// Warning reported when a malformed store is treated as empty.
pub(crate) fn malformed_warning(detail: &str, backup: Option<&str>) -> String {
    let mut warning = format!("stored records are malformed ({detail}); treated as empty");
    if let Some(backup) = backup {
        warning.push_str(", previous contents saved to ");
        warning.push_str(backup);
    }
    warning
}

/// Open the store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn RecordStore>> {
    config.ensure_state_dir()?;
    let path = config.data_path();
    match config.settings.store.backend {
        StoreBackend::Json => Ok(Box::new(JsonFileStore::new(path))),
        StoreBackend::Sqlite => Ok(Box::new(Database::open_or_recover(&path)?)),
    }
}

/// Parse helper shared by backends that hold a JSON document.
pub(crate) fn parse_text(text: &str) -> Result<Parsed> {
    crate::models::migrate::parse_document(text, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Broken {
        quarantined: Cell<bool>,
    }

    impl RecordStore for Broken {
        fn load_strict(&self) -> Result<Parsed> {
            Err(TrackerError::MalformedPriorState {
                detail: "bad".into(),
            })
        }
        fn save(&self, _set: &RecordSet) -> Result<()> {
            Ok(())
        }
        fn quarantine(&self) -> Result<Option<String>> {
            self.quarantined.set(true);
            Ok(Some("broken.bak".into()))
        }
        fn location(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn malformed_store_degrades_to_empty() {
        let store = Broken {
            quarantined: Cell::new(false),
        };
        let loaded = store.load().unwrap();
        assert!(loaded.set.is_empty());
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("broken.bak"));
        assert!(store.quarantined.get());
    }
}
