//! Source enumeration from a pre-supplied flat file list.
//!
//! This is the upload path: no filesystem access, just `(relativePath, name)`
//! pairs. When a relative path is not available the bare name is used, which
//! places the file at the root.

use std::io::BufRead;

use crate::error::Result;
use crate::ingest::scanner::{ScanIndex, Scanner};

/// One entry of an uploaded file batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    /// Full relative path including directories, when the source provides it.
    pub relative_path: Option<String>,
    pub name: String,
}

impl ListedFile {
    /// Entry for a relative path; the name is its last segment.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path).to_string();
        Self {
            relative_path: Some(path.to_string()),
            name,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.relative_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Anything that can produce a scan index.
pub trait SourceEnumerator {
    fn enumerate(&self) -> Result<ScanIndex>;
}

impl SourceEnumerator for Scanner {
    fn enumerate(&self) -> Result<ScanIndex> {
        self.scan()
    }
}

/// An in-memory file batch.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    files: Vec<ListedFile>,
}

impl Listing {
    #[must_use]
    pub fn new(files: Vec<ListedFile>) -> Self {
        Self { files }
    }

    /// Read one relative path per line; blank lines and `#` comments are skipped.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut files = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let path = line.trim();
            if path.is_empty() || path.starts_with('#') {
                continue;
            }
            files.push(ListedFile::from_path(path));
        }
        Ok(Self { files })
    }

    /// Build a listing from relative paths, skipping blank entries.
    #[must_use]
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files = paths
            .into_iter()
            .filter(|p| !p.as_ref().trim().is_empty())
            .map(|p| ListedFile::from_path(p.as_ref().trim()))
            .collect();
        Self { files }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceEnumerator for Listing {
    fn enumerate(&self) -> Result<ScanIndex> {
        Ok(ScanIndex::from_paths(self.files.iter().map(ListedFile::path)))
    }
}
