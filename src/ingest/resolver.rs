use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::batch::{self, BatchProgress};
use crate::error::{Result, TrackerError};
use crate::ingest::scanner::{ScanIndex, SourceFile, DOC_EXT, SOURCE_EXT, TEST_SUFFIX};
use crate::models::record::FileRecord;

/// Companion paths found for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Companions {
    pub test_file: Option<String>,
    pub doc_file: Option<String>,
}

fn in_directory(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

/// Expected test companion: `<dir>/<base>_tests.java`.
#[must_use]
pub fn test_companion_path(source: &SourceFile) -> String {
    in_directory(
        &source.directory,
        &format!("{}{TEST_SUFFIX}.{SOURCE_EXT}", source.base_name()),
    )
}

/// Expected doc companion: `<dir>/<base>.pdf`.
#[must_use]
pub fn doc_companion_path(source: &SourceFile) -> String {
    in_directory(
        &source.directory,
        &format!("{}.{DOC_EXT}", source.base_name()),
    )
}

/// Look up both companions in the scan index. Same-directory only.
#[must_use]
pub fn resolve(source: &SourceFile, index: &ScanIndex) -> Companions {
    let test = test_companion_path(source);
    let doc = doc_companion_path(source);
    Companions {
        test_file: index.contains(&test).then_some(test),
        doc_file: index.contains(&doc).then_some(doc),
    }
}

/// Resolve every source in the index into a fresh record.
///
/// Works in batches of `batch_size`, calling `on_yield` between batches.
/// Fails with `IdCollision` if two distinct paths map to the same id.
pub fn resolve_all<Y>(
    index: &ScanIndex,
    now: DateTime<Utc>,
    batch_size: usize,
    on_yield: Y,
) -> Result<Vec<FileRecord>>
where
    Y: FnMut(BatchProgress),
{
    let records = batch::map_batched(
        &index.sources,
        batch_size,
        |source| {
            let companions = resolve(source, index);
            FileRecord::discovered(
                &source.relative_path,
                companions.test_file,
                companions.doc_file,
                now,
            )
        },
        on_yield,
    );

    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(records.len());
    for r in &records {
        if let Some(first) = seen.insert(&r.id, &r.relative_path) {
            if first != r.relative_path {
                return Err(TrackerError::IdCollision {
                    first: first.to_string(),
                    second: r.relative_path.clone(),
                });
            }
        }
    }

    Ok(records)
}
