//! Record listing: search, visibility toggles, sorting and paging.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::batch::{self, BatchProgress};
use crate::error::TrackerError;
use crate::models::record::{normalize_path, FileRecord};
use crate::models::record_set::RecordSet;
use crate::operations::records::RecordDetail;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Path,
    /// Completed count, descending. Ties keep stored order.
    Status,
}

impl FromStr for SortKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "path" => Ok(Self::Path),
            "status" => Ok(Self::Status),
            _ => Err(TrackerError::InvalidSortKey { key: s.to_string() }),
        }
    }
}

/// Filter options for listing records.
#[derive(Debug, Clone)]
pub struct ListFilter {
    /// Case-insensitive substring of name or relative path.
    pub search: Option<String>,
    /// Include records with both tests and docs complete.
    pub show_completed: bool,
    /// Include records missing tests or docs.
    pub show_incomplete: bool,
    /// Include records with any auto-detected companion.
    pub show_auto_detected: bool,
    /// Keep only records in one of these directories or below. Empty keeps all.
    pub directories: Vec<String>,
    pub sort: SortKey,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            search: None,
            show_completed: true,
            show_incomplete: true,
            show_auto_detected: true,
            directories: Vec::new(),
            sort: SortKey::default(),
            offset: 0,
            limit: None,
        }
    }
}

impl ListFilter {
    /// Whether `record` passes search and visibility toggles.
    #[must_use]
    pub fn matches(&self, record: &FileRecord, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !record.name.to_lowercase().contains(needle)
                && !record.relative_path.to_lowercase().contains(needle)
            {
                return false;
            }
        }
        let complete = record.is_complete();
        if complete && !self.show_completed {
            return false;
        }
        if !complete && !self.show_incomplete {
            return false;
        }
        if !self.show_auto_detected && (record.auto_detected_test || record.auto_detected_doc) {
            return false;
        }
        self.in_directories(&record.directory)
    }

    /// Prefix match on whole path segments: `src/main` covers `src/main/util`
    /// but not `src/mainframe`.
    fn in_directories(&self, directory: &str) -> bool {
        if self.directories.is_empty() {
            return true;
        }
        self.directories.iter().any(|d| {
            let d = normalize_path(d);
            let d = d.trim_end_matches('/');
            d.is_empty()
                || directory == d
                || directory
                    .strip_prefix(d)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// One listed record.
pub type ListEntry = RecordDetail;

#[derive(Debug, Clone, Serialize)]
pub struct ListSummary {
    /// Records in the store.
    pub total: usize,
    /// Records passing the filter, before paging.
    pub matched: usize,
    /// Records in this page.
    pub returned: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub results: Vec<ListEntry>,
    pub summary: ListSummary,
}

fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn sort_records(records: &mut [&FileRecord], key: SortKey) {
    match key {
        SortKey::Name => records.sort_by(|a, b| text_order(&a.name, &b.name)),
        SortKey::Path => records.sort_by(|a, b| text_order(&a.relative_path, &b.relative_path)),
        SortKey::Status => records.sort_by(|a, b| b.completed_count().cmp(&a.completed_count())),
    }
}

/// Filter, sort and page `set`. Filtering runs in batches of `batch_size`
/// with `on_yield` called after each.
pub fn list_records<Y>(set: &RecordSet, filter: &ListFilter, batch_size: usize, on_yield: Y) -> ListResult
where
    Y: FnMut(BatchProgress),
{
    let needle = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&FileRecord> = Vec::new();
    batch::for_each_batch(
        &set.files,
        batch_size,
        |record| {
            if filter.matches(record, needle.as_deref()) {
                matched.push(record);
            }
        },
        on_yield,
    );
    sort_records(&mut matched, filter.sort);

    let matched_count = matched.len();
    let page = matched
        .into_iter()
        .skip(filter.offset)
        .take(filter.limit.unwrap_or(usize::MAX));
    let results: Vec<ListEntry> = page.map(|r| RecordDetail::from(r.clone())).collect();

    ListResult {
        summary: ListSummary {
            total: set.files.len(),
            matched: matched_count,
            returned: results.len(),
        },
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::RecordEdit;
    use chrono::Utc;

    fn sample() -> RecordSet {
        let now = Utc::now();
        let both = FileRecord::discovered(
            "core/Zeta.java",
            Some("core/Zeta_tests.java".into()),
            Some("core/Zeta.pdf".into()),
            now,
        );
        let test_only =
            FileRecord::discovered("core/alpha.java", Some("core/alpha_tests.java".into()), None, now);
        let mut manual = FileRecord::discovered("util/Beta.java", None, None, now);
        manual.apply_edit(
            &RecordEdit {
                test_completed: Some(true),
                doc_completed: Some(true),
                ..Default::default()
            },
            now,
        );
        let none = FileRecord::discovered("util/Gamma.java", None, None, now);
        RecordSet::new(vec![both, test_only, manual, none], Some(now))
    }

    fn names(result: &ListResult) -> Vec<&str> {
        result.results.iter().map(|e| e.record.name.as_str()).collect()
    }

    #[test]
    fn default_lists_everything_by_name() {
        let result = list_records(&sample(), &ListFilter::default(), 10, |_| {});
        assert_eq!(result.summary.total, 4);
        assert_eq!(result.summary.matched, 4);
        assert_eq!(
            names(&result),
            vec!["alpha.java", "Beta.java", "Gamma.java", "Zeta.java"]
        );
    }

    #[test]
    fn search_is_case_insensitive_over_name_and_path() {
        let filter = ListFilter {
            search: Some("UTIL".into()),
            ..Default::default()
        };
        let result = list_records(&sample(), &filter, 10, |_| {});
        assert_eq!(names(&result), vec!["Beta.java", "Gamma.java"]);

        let filter = ListFilter {
            search: Some("zeta".into()),
            ..Default::default()
        };
        assert_eq!(list_records(&sample(), &filter, 10, |_| {}).summary.matched, 1);
    }

    #[test]
    fn visibility_toggles() {
        let hide_complete = ListFilter {
            show_completed: false,
            ..Default::default()
        };
        let result = list_records(&sample(), &hide_complete, 10, |_| {});
        assert_eq!(names(&result), vec!["alpha.java", "Gamma.java"]);

        let hide_auto = ListFilter {
            show_auto_detected: false,
            ..Default::default()
        };
        let result = list_records(&sample(), &hide_auto, 10, |_| {});
        assert_eq!(names(&result), vec!["Beta.java", "Gamma.java"]);

        let nothing = ListFilter {
            show_completed: false,
            show_incomplete: false,
            ..Default::default()
        };
        assert_eq!(list_records(&sample(), &nothing, 10, |_| {}).summary.matched, 0);
    }

    #[test]
    fn directory_filter_matches_whole_segments() {
        let mut set = sample();
        set.files.push(FileRecord::discovered("utility/Delta.java", None, None, Utc::now()));
        set.files.push(FileRecord::discovered("util/deep/Eps.java", None, None, Utc::now()));
        set.recount();

        let filter = ListFilter {
            directories: vec!["util".into()],
            ..Default::default()
        };
        let result = list_records(&set, &filter, 10, |_| {});
        assert_eq!(names(&result), vec!["Beta.java", "Eps.java", "Gamma.java"]);

        let filter = ListFilter {
            directories: vec!["./util/deep/".into(), "core".into()],
            ..Default::default()
        };
        let result = list_records(&set, &filter, 10, |_| {});
        assert_eq!(names(&result), vec!["alpha.java", "Eps.java", "Zeta.java"]);
    }

    #[test]
    fn directory_filter_combines_with_toggles() {
        let filter = ListFilter {
            directories: vec!["util".into()],
            show_completed: false,
            ..Default::default()
        };
        let result = list_records(&sample(), &filter, 10, |_| {});
        assert_eq!(names(&result), vec!["Gamma.java"]);
    }

    #[test]
    fn status_sort_is_descending_and_stable() {
        let filter = ListFilter {
            sort: SortKey::Status,
            ..Default::default()
        };
        let result = list_records(&sample(), &filter, 10, |_| {});
        assert_eq!(
            names(&result),
            vec!["Zeta.java", "Beta.java", "alpha.java", "Gamma.java"]
        );
    }

    #[test]
    fn path_sort() {
        let filter = ListFilter {
            sort: SortKey::Path,
            ..Default::default()
        };
        let result = list_records(&sample(), &filter, 10, |_| {});
        assert_eq!(
            names(&result),
            vec!["alpha.java", "Zeta.java", "Beta.java", "Gamma.java"]
        );
    }

    #[test]
    fn paging() {
        let filter = ListFilter {
            offset: 1,
            limit: Some(2),
            ..Default::default()
        };
        let result = list_records(&sample(), &filter, 10, |_| {});
        assert_eq!(names(&result), vec!["Beta.java", "Gamma.java"]);
        assert_eq!(result.summary.matched, 4);
        assert_eq!(result.summary.returned, 2);
    }

    #[test]
    fn filtering_yields_per_batch() {
        let mut yields = 0;
        list_records(&sample(), &ListFilter::default(), 3, |_| yields += 1);
        assert_eq!(yields, 2);
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!("Status".parse::<SortKey>().unwrap(), SortKey::Status);
        assert!(matches!(
            "size".parse::<SortKey>(),
            Err(TrackerError::InvalidSortKey { .. })
        ));
    }
}
