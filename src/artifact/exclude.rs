//! tar-style exclusion list.
//!
//! One glob per line; blank lines and `#` comments are ignored. Patterns are
//! matched against member paths relative to the archive root (`./` prefix
//! removed). A pattern with no `/` matches any single path component, like
//! an unanchored tar exclude. An excluded directory excludes everything
//! below it.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Default)]
pub struct ExcludeList {
    patterns: Vec<Pattern>,
}

impl ExcludeList {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading exclude file '{}'", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing exclude file '{}'", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let normalized = normalize(line);
            if normalized.is_empty() {
                continue;
            }
            let pattern = Pattern::new(normalized)
                .with_context(|| format!("line {}: invalid pattern '{}'", lineno + 1, line))?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `rel` (relative to the archive root) or any of its ancestors
    /// is matched by a pattern.
    pub fn is_excluded(&self, rel: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        rel.ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.matches(p))
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(text) = path.to_str() else {
            return false;
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(text);

        self.patterns.iter().any(|pattern| {
            if pattern.as_str().contains('/') {
                pattern.matches_with(text, MATCH_OPTIONS)
            } else {
                pattern.matches_with(name, MATCH_OPTIONS)
            }
        })
    }
}

fn normalize(line: &str) -> &str {
    let mut s = line;
    while let Some(rest) = s.strip_prefix("./") {
        s = rest;
    }
    s.trim_start_matches('/').trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_skips_comments_and_normalizes() {
        let list = ExcludeList::parse("# runtime state\n\n./dev/*\n/proc/\nvar/cache/dnf\n").unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.is_excluded(Path::new("dev/null")));
        assert!(list.is_excluded(Path::new("proc")));
        assert!(list.is_excluded(Path::new("var/cache/dnf")));
        assert!(!list.is_excluded(Path::new("dev")));
        assert!(!list.is_excluded(Path::new("var/cache")));
    }

    #[test]
    fn test_ancestor_match_excludes_subtree() {
        let list = ExcludeList::parse("var/log\n").unwrap();
        assert!(list.is_excluded(Path::new("var/log/dnf.log")));
        assert!(list.is_excluded(Path::new("var/log/journal/abc")));
        assert!(!list.is_excluded(Path::new("var/lib")));
    }

    #[test]
    fn test_component_pattern_is_unanchored() {
        let list = ExcludeList::parse("*.pyc\n").unwrap();
        assert!(list.is_excluded(Path::new("usr/lib/python3/foo.pyc")));
        assert!(!list.is_excluded(Path::new("usr/lib/python3/foo.py")));
    }

    #[test]
    fn test_invalid_pattern_names_line() {
        let err = ExcludeList::parse("ok\n[\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = ExcludeList::load(&temp.path().join("exclude.txt")).unwrap_err();
        assert!(err.to_string().contains("reading exclude file"));
    }

    #[test]
    fn test_empty_list_excludes_nothing() {
        let list = ExcludeList::default();
        assert!(list.is_empty());
        assert!(!list.is_excluded(Path::new("etc/motd")));
    }
}
