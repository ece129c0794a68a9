//! File name filtering
//!
//! A pure predicate over file names, shared read-only across all
//! workers. A file matches when:
//! - no substring filter is set, OR the name contains the substring
//!   (case-insensitive), AND
//! - the extension set is empty, OR the file's extension (lowercased,
//!   dot-prefixed) is in the set.
//!
//! Extensions supplied with or without a leading dot normalize to the
//! same form, so `txt` and `.txt` are equivalent.

use std::collections::HashSet;
use std::path::Path;

/// Filter applied to every file name discovered during a scan
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    /// Case-insensitive substring the name must contain (stored lowercase)
    name_contains: Option<String>,

    /// Accepted extensions, lowercase and dot-prefixed; empty = match all
    extensions: HashSet<String>,
}

impl FileFilter {
    /// Build a filter from an optional name substring and a list of extensions
    pub fn new<I, S>(name_contains: Option<&str>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name_contains = name_contains
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let extensions = extensions
            .into_iter()
            .filter_map(|ext| normalize_extension(ext.as_ref()))
            .collect();

        Self {
            name_contains,
            extensions,
        }
    }

    /// A filter that matches every file
    pub fn match_all() -> Self {
        Self::default()
    }

    /// True if this filter accepts every file name
    pub fn is_match_all(&self) -> bool {
        self.name_contains.is_none() && self.extensions.is_empty()
    }

    /// Test whether a file name passes the filter
    pub fn matches(&self, file_name: &str) -> bool {
        if let Some(ref needle) = self.name_contains {
            if !file_name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if self.extensions.is_empty() {
            return true;
        }

        match extension_of(file_name) {
            Some(ext) => self.extensions.contains(&ext),
            None => false,
        }
    }
}

/// Normalize a user-supplied extension to lowercase with a leading dot
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.').to_lowercase();
    if ext.is_empty() {
        None
    } else {
        Some(format!(".{ext}"))
    }
}

/// Extract the lowercased, dot-prefixed extension of a file name
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all() {
        let filter = FileFilter::match_all();
        assert!(filter.is_match_all());
        assert!(filter.matches("anything.bin"));
        assert!(filter.matches("no_extension"));
    }

    #[test]
    fn test_extension_normalization() {
        // With and without leading dot must normalize identically
        let with_dot = FileFilter::new(None, [".txt"]);
        let without_dot = FileFilter::new(None, ["txt"]);

        assert!(with_dot.matches("notes.txt"));
        assert!(without_dot.matches("notes.txt"));
        assert!(!with_dot.matches("notes.log"));
        assert!(!without_dot.matches("notes.log"));
    }

    #[test]
    fn test_extension_case_insensitive() {
        let filter = FileFilter::new(None, ["TXT"]);
        assert!(filter.matches("README.txt"));
        assert!(filter.matches("readme.TXT"));
        assert!(!filter.matches("readme.md"));
    }

    #[test]
    fn test_name_substring_case_insensitive() {
        let filter = FileFilter::new(Some("Report"), Vec::<&str>::new());
        assert!(filter.matches("annual_report.pdf"));
        assert!(filter.matches("REPORT-2024.xlsx"));
        assert!(!filter.matches("summary.pdf"));
    }

    #[test]
    fn test_combined_filters() {
        let filter = FileFilter::new(Some("log"), ["txt"]);
        assert!(filter.matches("syslog.txt"));
        assert!(!filter.matches("syslog.gz"));
        assert!(!filter.matches("notes.txt"));
    }

    #[test]
    fn test_no_extension_file() {
        let filter = FileFilter::new(None, ["txt"]);
        assert!(!filter.matches("Makefile"));

        // Leading-dot names have no extension per Path semantics
        assert!(!filter.matches(".gitignore"));
    }

    #[test]
    fn test_empty_inputs_ignored() {
        let filter = FileFilter::new(Some("  "), ["", "  ", "."]);
        assert!(filter.is_match_all());
    }
}
