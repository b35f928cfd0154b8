//! Scan operation shared between CLI and MCP.

use std::path::PathBuf;

use serde::Serialize;

use crate::batch::BatchProgress;
use crate::config::Config;
use crate::error::Result;
use crate::ingest::listing::Listing;
use crate::tracker::{ScanReport, Tracker};

/// Where a scan gets its source files from.
#[derive(Debug, Clone)]
pub enum ScanSource {
    /// Walk a directory tree.
    Directory(PathBuf),
    /// Use a pre-supplied path list.
    Listing(Listing),
}

/// Serializable scan output.
///
/// Ensures CLI and MCP output the same fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutput {
    pub files_seen: usize,
    pub sources_found: usize,
    pub added: usize,
    pub updated: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub missing: usize,
    /// Relative paths of stored records the scan no longer found.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_paths: Vec<String>,
    pub total_files: usize,
    pub completed_tests: usize,
    pub completed_docs: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde's skip_serializing_if
fn is_zero(v: &usize) -> bool {
    *v == 0
}

impl From<ScanReport> for ScanOutput {
    fn from(report: ScanReport) -> Self {
        Self {
            files_seen: report.files_seen,
            sources_found: report.sources_found,
            added: report.outcome.added.len(),
            updated: report.outcome.updated.len(),
            missing: report.outcome.missing.len(),
            missing_paths: Vec::new(),
            total_files: report.total_files,
            completed_tests: report.completed_tests,
            completed_docs: report.completed_docs,
            warnings: report.warnings,
        }
    }
}

/// Scan `source` against the configured store and persist the merge.
pub fn run_scan<P>(config: &Config, source: &ScanSource, on_progress: P) -> Result<ScanOutput>
where
    P: FnMut(BatchProgress),
{
    let mut tracker = Tracker::open(config)?;
    scan_with(&mut tracker, config, source, on_progress)
}

/// Scan using an already-open tracker.
pub fn scan_with<P>(
    tracker: &mut Tracker,
    config: &Config,
    source: &ScanSource,
    on_progress: P,
) -> Result<ScanOutput>
where
    P: FnMut(BatchProgress),
{
    let report = match source {
        ScanSource::Directory(root) => {
            let scanner = config.scanner(root.clone());
            tracker.scan(&scanner, on_progress)?
        }
        ScanSource::Listing(listing) => tracker.scan(listing, on_progress)?,
    };

    let missing_paths = report
        .outcome
        .missing
        .iter()
        .filter_map(|id| tracker.records().get(id))
        .map(|r| r.relative_path.clone())
        .collect();

    let mut output = ScanOutput::from(report);
    output.missing_paths = missing_paths;
    Ok(output)
}
