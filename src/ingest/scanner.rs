use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::models::record::{normalize_path, split_path};

/// Extension of tracked source files (without the dot).
pub const SOURCE_EXT: &str = "java";
/// Extension of documentation companions (without the dot).
pub const DOC_EXT: &str = "pdf";
/// Suffix appended to the base name of a source to name its test companion.
pub const TEST_SUFFIX: &str = "_tests";

/// Directories skipped during traversal unless configured otherwise.
pub const DEFAULT_IGNORED_DIRS: &[&str] =
    &["node_modules", ".git", "target", "build", "dist", ".idea", ".jtrack"];

/// A tracked source file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Path relative to the scan root (forward slashes).
    pub relative_path: String,
    pub name: String,
    /// Parent directory relative to the scan root, empty at the root.
    pub directory: String,
}

impl SourceFile {
    /// Build from a normalized relative path.
    #[must_use]
    pub fn from_relative(relative_path: &str) -> Self {
        let relative_path = normalize_path(relative_path);
        let (directory, name) = split_path(&relative_path);
        Self {
            relative_path,
            name,
            directory,
        }
    }

    /// File name without the source extension.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.name
            .strip_suffix(SOURCE_EXT)
            .and_then(|n| n.strip_suffix('.'))
            .unwrap_or(&self.name)
    }
}

/// Everything one scan learned about the tree.
#[derive(Debug, Clone, Default)]
pub struct ScanIndex {
    /// Tracked source files, sorted by relative path.
    pub sources: Vec<SourceFile>,
    /// Relative path of every file encountered, any extension.
    pub all_files: HashSet<String>,
    /// Directories that could not be read and were skipped.
    pub warnings: Vec<String>,
}

impl ScanIndex {
    /// Build an index from a set of relative file paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let all_files: HashSet<String> = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();
        let sorted: BTreeSet<&String> = all_files.iter().collect();
        let sources = sorted
            .into_iter()
            .filter(|p| is_source_file(p))
            .map(|p| SourceFile::from_relative(p))
            .collect();
        Self {
            sources,
            all_files,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn contains(&self, relative_path: &str) -> bool {
        self.all_files.contains(relative_path)
    }
}

/// Whether a file name or path names a tracked source file.
#[must_use]
pub fn is_source_file(name: &str) -> bool {
    name.strip_suffix(SOURCE_EXT)
        .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1 && !stem.ends_with("/."))
}

/// Sequential directory walker for the source tree.
pub struct Scanner {
    root: PathBuf,
    ignored_dirs: HashSet<String>,
    respect_gitignore: bool,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| (*s).to_string()).collect(),
            respect_gitignore: false,
        }
    }

    /// Replace the set of ignored directory names.
    #[must_use]
    pub fn with_ignored_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    /// Walk the tree once and index every file.
    ///
    /// Unreadable subdirectories are skipped with a warning. A missing or
    /// unreadable root is `RootNotFound`.
    pub fn scan(&self) -> Result<ScanIndex> {
        let root_err = || TrackerError::RootNotFound {
            path: self.root.display().to_string(),
        };
        if !self.root.is_dir() {
            return Err(root_err());
        }
        std::fs::read_dir(&self.root).map_err(|_| root_err())?;

        let ignored = self.ignored_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(false) // Prevent symlink loops
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |e| {
                let is_dir = e.file_type().is_some_and(|ft| ft.is_dir());
                e.depth() == 0 || !is_dir || !ignored.contains(e.file_name().to_string_lossy().as_ref())
            })
            .build();

        let mut paths = Vec::new();
        let mut warnings = Vec::new();
        for entry in walker {
            match entry {
                Ok(e) => {
                    if e.file_type().is_some_and(|ft| ft.is_file()) {
                        paths.push(self.relative(e.path()));
                    }
                }
                Err(err) => {
                    let skipped = TrackerError::Traversal {
                        path: error_path(&err)
                            .map_or_else(|| self.root.display().to_string(), |p| self.relative(p)),
                        detail: err.to_string(),
                    };
                    tracing::warn!(error = %skipped, "skipping unreadable directory");
                    warnings.push(skipped.to_string());
                }
            }
        }

        let mut index = ScanIndex::from_paths(paths);
        index.warnings = warnings;
        tracing::debug!(
            root = %self.root.display(),
            files = index.all_files.len(),
            sources = index.sources.len(),
            "scan complete"
        );
        Ok(index)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Find the path an `ignore` error refers to, if any.
fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn is_source_file_works() {
        assert!(is_source_file("Foo.java"));
        assert!(is_source_file("a/b/Foo_tests.java"));
        assert!(!is_source_file("Foo.pdf"));
        assert!(!is_source_file("Foo.javax"));
        assert!(!is_source_file("Foojava"));
        assert!(!is_source_file(".java"));
        assert!(!is_source_file("a/.java"));
    }

    #[test]
    fn base_name_strips_only_the_extension() {
        assert_eq!(SourceFile::from_relative("x/Foo.java").base_name(), "Foo");
        assert_eq!(
            SourceFile::from_relative("Foo.java.java").base_name(),
            "Foo.java"
        );
    }

    #[test]
    fn scanner_indexes_all_files_and_sources() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/pkg")).unwrap();
        fs::write(tmp.path().join("src/pkg/Foo.java"), "class Foo {}").unwrap();
        fs::write(tmp.path().join("src/pkg/Foo.pdf"), "%PDF").unwrap();
        fs::write(tmp.path().join("README.md"), "# hi").unwrap();

        let index = Scanner::new(tmp.path()).scan().unwrap();
        assert_eq!(index.sources.len(), 1);
        assert_eq!(index.sources[0].relative_path, "src/pkg/Foo.java");
        assert_eq!(index.sources[0].directory, "src/pkg");
        assert_eq!(index.all_files.len(), 3);
        assert!(index.contains("src/pkg/Foo.pdf"));
        assert!(index.warnings.is_empty());
    }

    #[test]
    fn scanner_skips_ignored_dirs() {
        let tmp = TempDir::new().unwrap();
        for dir in ["target", "build", ".git", "node_modules"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
            fs::write(tmp.path().join(dir).join("Gen.java"), "").unwrap();
        }
        fs::write(tmp.path().join("Main.java"), "").unwrap();

        let index = Scanner::new(tmp.path()).scan().unwrap();
        assert_eq!(index.sources.len(), 1);
        assert_eq!(index.sources[0].relative_path, "Main.java");
        assert_eq!(index.all_files.len(), 1);
    }

    #[test]
    fn ignored_name_only_applies_to_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("build"), "a file called build").unwrap();
        fs::write(tmp.path().join("A.java"), "").unwrap();
        let index = Scanner::new(tmp.path()).scan().unwrap();
        assert!(index.contains("build"));
    }

    #[test]
    fn custom_ignored_dirs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("generated")).unwrap();
        fs::create_dir_all(tmp.path().join("build")).unwrap();
        fs::write(tmp.path().join("generated/G.java"), "").unwrap();
        fs::write(tmp.path().join("build/B.java"), "").unwrap();

        let index = Scanner::new(tmp.path())
            .with_ignored_dirs(["generated"])
            .scan()
            .unwrap();
        let paths: Vec<_> = index.sources.iter().map(|s| s.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["build/B.java"]);
    }

    #[test]
    fn sources_are_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("b/Z.java"), "").unwrap();
        fs::write(tmp.path().join("A.java"), "").unwrap();
        fs::write(tmp.path().join("M.java"), "").unwrap();
        let index = Scanner::new(tmp.path()).scan().unwrap();
        let paths: Vec<_> = index.sources.iter().map(|s| s.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["A.java", "M.java", "b/Z.java"]);
    }

    #[test]
    fn gitignore_is_opt_in() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "Skip.java\n").unwrap();
        fs::write(tmp.path().join("Skip.java"), "").unwrap();
        fs::write(tmp.path().join("Keep.java"), "").unwrap();

        let all = Scanner::new(tmp.path()).scan().unwrap();
        assert_eq!(all.sources.len(), 2);

        let filtered = Scanner::new(tmp.path()).respect_gitignore(true).scan().unwrap();
        assert_eq!(filtered.sources.len(), 1);
        assert_eq!(filtered.sources[0].name, "Keep.java");
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = Scanner::new(tmp.path().join("nope")).scan().unwrap_err();
        assert!(matches!(err, TrackerError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("Foo.java");
        fs::write(&file, "").unwrap();
        let err = Scanner::new(&file).scan().unwrap_err();
        assert!(matches!(err, TrackerError::RootNotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdir_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("Hidden.java"), "").unwrap();
        fs::write(tmp.path().join("Open.java"), "").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to assert in that case.
        let readable_anyway = fs::read_dir(&locked).is_ok();
        let index = Scanner::new(tmp.path()).scan().unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(index.contains("Open.java"));
        if !readable_anyway {
            assert!(!index.contains("locked/Hidden.java"));
            assert!(!index.warnings.is_empty());
        }
    }

    #[test]
    fn from_paths_normalizes() {
        let index = ScanIndex::from_paths(["src\\A.java", "./src/A_tests.java", ""]);
        assert_eq!(index.all_files.len(), 2);
        assert!(index.contains("src/A.java"));
        assert_eq!(index.sources.len(), 2);
    }
}
