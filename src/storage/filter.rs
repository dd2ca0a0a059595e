//! Entry filtering
//!
//! Decides which directory entries are visible. Applied while listing each
//! directory, so a filtered directory is never read from disk.

use std::collections::HashSet;

/// Leading character of a hidden entry's base name.
pub const HIDDEN_MARKER: char = '.';

/// Filtering rules shared by every tree build and listing.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub show_hidden: bool,
    pub ignored_dir_names: HashSet<String>,
}

impl FilterConfig {
    pub fn new<I, S>(show_hidden: bool, ignored_dir_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            show_hidden,
            ignored_dir_names: ignored_dir_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list of directory names, e.g. `"node_modules, target"`.
    pub fn parse_ignore_list(list: &str) -> HashSet<String> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        !self.show_hidden && name.starts_with(HIDDEN_MARKER)
    }

    /// Exact base-name match; only applies to directories.
    pub fn is_ignored_dir(&self, name: &str, is_dir: bool) -> bool {
        is_dir && self.ignored_dir_names.contains(name)
    }

    /// Returns the reason an entry is excluded, or `None` when it is visible.
    pub fn exclusion(&self, name: &str, is_dir: bool) -> Option<SkipReason> {
        if self.is_hidden(name) {
            Some(SkipReason::Hidden)
        } else if self.is_ignored_dir(name, is_dir) {
            Some(SkipReason::IgnoredDirectory)
        } else {
            None
        }
    }
}

/// Why an entry was left out of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Hidden,
    IgnoredDirectory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignore_list() {
        let set = FilterConfig::parse_ignore_list(" node_modules, target,,.git ");
        assert_eq!(set.len(), 3);
        assert!(set.contains("node_modules"));
        assert!(set.contains("target"));
        assert!(set.contains(".git"));
        assert!(FilterConfig::parse_ignore_list("").is_empty());
    }

    #[test]
    fn test_hidden_filter() {
        let filter = FilterConfig::new(false, Vec::<String>::new());
        assert_eq!(filter.exclusion(".env", false), Some(SkipReason::Hidden));
        assert_eq!(filter.exclusion("env", false), None);

        let filter = FilterConfig::new(true, Vec::<String>::new());
        assert_eq!(filter.exclusion(".env", false), None);
    }

    #[test]
    fn test_ignored_dir_only_matches_directories() {
        let filter = FilterConfig::new(true, ["node_modules"]);
        assert_eq!(
            filter.exclusion("node_modules", true),
            Some(SkipReason::IgnoredDirectory)
        );
        assert_eq!(filter.exclusion("node_modules", false), None);
        assert_eq!(filter.exclusion("node_modules2", true), None);
    }
}
