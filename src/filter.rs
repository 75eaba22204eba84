use crate::page::{Page, PageId, PageIndex};
use crate::path;
use std::collections::HashSet;

/// Trailing markers that turn a pattern into a subtree wildcard
const WILDCARD_SUFFIXES: [&str; 2] = ["/*", "/+"];

/// How a delete request picks pages
#[derive(Debug)]
enum Selection {
    /// Only the page stored under exactly this path
    Exact(String),

    /// Pages whose path starts with `prefix`, plus the subtree root when the
    /// pattern ended in a wildcard
    Pattern {
        root: Option<String>,
        prefix: String,
    },
}

/// Page selector for delete requests
#[derive(Debug)]
pub struct DeleteFilter {
    path: String,
    selection: Selection,
}

impl DeleteFilter {
    /// Build a filter from a raw request path.
    ///
    /// The path is normalized first. In pattern mode a trailing `/*` or `/+`
    /// also selects the page stored at the path without that suffix, and the
    /// prefix test then requires a `/` after it. Every other character of the
    /// pattern is taken literally.
    pub fn new(raw_path: &str, use_pattern: bool) -> Self {
        let path = path::normalize(raw_path);

        let selection = if use_pattern {
            let (root, prefix) = if WILDCARD_SUFFIXES.iter().any(|s| path.ends_with(s)) {
                // "/*" and "/+" both mean one or more slashes after the root
                (
                    Some(path[..path.len() - 2].to_string()),
                    path[..path.len() - 1].to_string(),
                )
            } else {
                (None, path.clone())
            };
            ::log::debug!(
                "Pattern delete for '{}' uses prefix '{}' and root {:?}",
                path,
                prefix,
                root
            );
            Selection::Pattern { root, prefix }
        } else {
            Selection::Exact(path.clone())
        };

        Self { path, selection }
    }

    /// Normalized path the filter was built from
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.selection, Selection::Pattern { .. })
    }

    /// Whether a page falls under this filter
    pub fn matches(&self, page: &Page) -> bool {
        match &self.selection {
            Selection::Exact(path) => page.path == *path,
            Selection::Pattern { root, prefix } => {
                root.as_deref() == Some(page.path.as_str())
                    || page.path.starts_with(prefix.as_str())
            }
        }
    }

    /// Identities of every page in the index selected by this filter
    pub fn select(&self, index: &PageIndex) -> HashSet<PageId> {
        index
            .pages
            .iter()
            .filter(|p| self.matches(p))
            .map(|p| p.id)
            .collect()
    }

    /// Paths still present in the index that this filter selects
    pub fn remaining<'a>(&self, index: &'a PageIndex) -> Vec<&'a str> {
        index
            .pages
            .iter()
            .filter(|p| self.matches(p))
            .map(|p| p.path.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::IndexId;

    fn index_with(paths: &[&str]) -> PageIndex {
        let mut index = PageIndex::new(IndexId::new());
        for path in paths {
            index.upsert(path, "<html></html>".to_string());
        }
        index
    }

    fn selected_paths(filter: &DeleteFilter, index: &PageIndex) -> Vec<String> {
        let ids = filter.select(index);
        let mut paths: Vec<String> = index
            .pages
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| p.path.clone())
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_exact_filter() {
        let index = index_with(&["/#!test", "/#!test/x"]);
        let filter = DeleteFilter::new("/#!TEST", false);
        assert!(!filter.is_pattern());
        assert_eq!(selected_paths(&filter, &index), ["/#!test"]);
    }

    #[test]
    fn test_exact_filter_applies_fragment_rewrite() {
        let index = index_with(&["/#!about"]);
        let filter = DeleteFilter::new("/?_escaped_fragment_=about", false);
        assert_eq!(filter.path(), "/#!about");
        assert_eq!(selected_paths(&filter, &index), ["/#!about"]);
    }

    #[test]
    fn test_wildcard_selects_root_and_subtree() {
        let index = index_with(&[
            "/#!test",
            "/#!test/x",
            "/#!test/y",
            "/#!nottest/",
            "/#!testnot",
        ]);
        for pattern in ["/#!test/*", "/#!test/+"] {
            let filter = DeleteFilter::new(pattern, true);
            assert_eq!(
                selected_paths(&filter, &index),
                ["/#!test", "/#!test/x", "/#!test/y"],
                "pattern {}",
                pattern
            );
        }
    }

    #[test]
    fn test_wildcard_accepts_repeated_slashes() {
        let index = index_with(&["/#!test//deep", "/#!test/"]);
        let filter = DeleteFilter::new("/#!test/*", true);
        assert_eq!(selected_paths(&filter, &index), ["/#!test/", "/#!test//deep"]);
    }

    #[test]
    fn test_plain_pattern_is_literal_prefix() {
        let index = index_with(&["/#!test", "/#!testnot", "/#!other", "/x/#!test"]);
        let filter = DeleteFilter::new("/#!test", true);
        // no segment boundary check without a trailing wildcard
        assert_eq!(selected_paths(&filter, &index), ["/#!test", "/#!testnot"]);
    }

    #[test]
    fn test_pattern_metacharacters_are_literal() {
        let index = index_with(&["/#!a.b/c", "/#!axb/c"]);
        let filter = DeleteFilter::new("/#!a.b/*", true);
        assert_eq!(selected_paths(&filter, &index), ["/#!a.b/c"]);
    }

    #[test]
    fn test_remaining_reports_leftovers() {
        let index = index_with(&["/#!test/x", "/#!other"]);
        let filter = DeleteFilter::new("/#!test/*", true);
        assert_eq!(filter.remaining(&index), ["/#!test/x"]);
    }

    #[test]
    fn test_long_wildcard_pattern() {
        let root = format!("/#!{}", "a".repeat(400_000));
        let child = format!("{}/x", root);
        let index = index_with(&[root.as_str(), child.as_str(), "/#!a"]);
        let filter = DeleteFilter::new(&format!("{}/*", root), true);
        assert_eq!(filter.select(&index).len(), 2);
    }
}
