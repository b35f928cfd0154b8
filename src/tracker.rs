//! The single owner of the in-memory record set.
//!
//! All mutation goes through [`Tracker::scan`], [`Tracker::update`],
//! [`Tracker::replace_all`] or [`Tracker::clear`]. Each persists first and
//! only then swaps the in-memory set, so a failed write leaves both the store
//! and the tracker unchanged.

use chrono::Utc;
use serde::Serialize;

use crate::batch::{BatchProgress, DEFAULT_BATCH_SIZE};
use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::ingest::listing::SourceEnumerator;
use crate::ingest::resolver;
use crate::merge::{self, MergeOutcome};
use crate::models::record::{FileRecord, RecordEdit};
use crate::models::record_set::RecordSet;
use crate::store::{self, RecordStore};

/// Notification sent to subscribers after a successful mutation.
#[derive(Debug, Clone, Copy)]
pub enum TrackerEvent<'a> {
    Scanned {
        set: &'a RecordSet,
        outcome: &'a MergeOutcome,
    },
    Updated {
        record: &'a FileRecord,
    },
    Replaced {
        set: &'a RecordSet,
    },
    Cleared,
}

type Subscriber = Box<dyn FnMut(&TrackerEvent<'_>) + Send>;

/// Statistics from a scan-and-merge pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Every file encountered, any extension.
    pub files_seen: usize,
    /// Tracked source files found.
    pub sources_found: usize,
    pub outcome: MergeOutcome,
    pub total_files: usize,
    pub completed_tests: usize,
    pub completed_docs: usize,
    /// Skipped directories and recovered store problems.
    pub warnings: Vec<String>,
}

pub struct Tracker {
    store: Box<dyn RecordStore>,
    set: RecordSet,
    load_warnings: Vec<String>,
    batch_size: usize,
    subscribers: Vec<Subscriber>,
}

impl Tracker {
    /// Open the configured store and load its records.
    pub fn open(config: &Config) -> Result<Self> {
        let store = store::open_store(config)?;
        Self::with_store(store, config.settings.scan.batch_size)
    }

    /// Wrap an already-open store.
    pub fn with_store(store: Box<dyn RecordStore>, batch_size: usize) -> Result<Self> {
        let loaded = store.load()?;
        Ok(Self {
            store,
            set: loaded.set,
            load_warnings: loaded.warnings,
            batch_size: if batch_size == 0 {
                DEFAULT_BATCH_SIZE
            } else {
                batch_size
            },
            subscribers: Vec::new(),
        })
    }

    #[must_use]
    pub fn records(&self) -> &RecordSet {
        &self.set
    }

    /// Warnings raised while loading the store (migration, recovery).
    #[must_use]
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.store.location()
    }

    pub fn record(&self, id: &str) -> Result<&FileRecord> {
        self.set.get(id).ok_or_else(|| TrackerError::RecordNotFound {
            id: id.to_string(),
        })
    }

    /// Register a callback run after every successful mutation.
    pub fn subscribe<F>(&mut self, f: F)
    where
        F: FnMut(&TrackerEvent<'_>) + Send + 'static,
    {
        self.subscribers.push(Box::new(f));
    }

    fn notify(&mut self, event: &TrackerEvent<'_>) {
        for s in &mut self.subscribers {
            s(event);
        }
    }

    /// Enumerate sources, resolve companions, merge with stored state, persist.
    ///
    /// `on_progress` runs after each resolution batch. On any error nothing
    /// is written.
    pub fn scan<S, P>(&mut self, source: &S, on_progress: P) -> Result<ScanReport>
    where
        S: SourceEnumerator + ?Sized,
        P: FnMut(BatchProgress),
    {
        let index = source.enumerate()?;
        let now = Utc::now();
        let fresh = resolver::resolve_all(&index, now, self.batch_size, on_progress)?;
        let (merged, outcome) = merge::merge(fresh, &self.set, now);

        self.store.save(&merged)?;

        let mut warnings = std::mem::take(&mut self.load_warnings);
        warnings.extend(index.warnings.iter().cloned());
        let report = ScanReport {
            files_seen: index.all_files.len(),
            sources_found: index.sources.len(),
            total_files: merged.total_files,
            completed_tests: merged.completed_tests,
            completed_docs: merged.completed_docs,
            outcome,
            warnings,
        };
        self.set = merged;

        tracing::info!(
            store = %self.store.location(),
            sources = report.sources_found,
            added = report.outcome.added.len(),
            missing = report.outcome.missing.len(),
            completed_tests = report.completed_tests,
            completed_docs = report.completed_docs,
            "scan merged"
        );

        let set = self.set.clone();
        self.notify(&TrackerEvent::Scanned {
            set: &set,
            outcome: &report.outcome,
        });
        Ok(report)
    }

    /// Apply a user edit to one record and persist it.
    pub fn update(&mut self, id: &str, edit: &RecordEdit) -> Result<FileRecord> {
        let mut record = self.record(id)?.clone();
        record.apply_edit(edit, Utc::now());

        let mut next = self.set.clone();
        if let Some(slot) = next.get_mut(id) {
            *slot = record.clone();
        }
        next.recount();

        self.store.save_record(&next, &record)?;
        self.set = next;
        tracing::debug!(id = %id, "record updated");
        self.notify(&TrackerEvent::Updated { record: &record });
        Ok(record)
    }

    /// Replace every record (import).
    pub fn replace_all(&mut self, mut set: RecordSet) -> Result<()> {
        set.recount();
        self.store.save(&set)?;
        self.set = set;
        let set = self.set.clone();
        self.notify(&TrackerEvent::Replaced { set: &set });
        Ok(())
    }

    /// Remove every record.
    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.set = RecordSet::default();
        self.notify(&TrackerEvent::Cleared);
        Ok(())
    }
}
