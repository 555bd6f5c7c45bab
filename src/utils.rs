//! Utility functions for path handling and name matching.

use std::path::{Component, Path, PathBuf};

/// Resolve a layout's `root` value to an absolute path.
///
/// `~` expands to `home`; relative paths are joined onto `default_root`.
/// Returns `None` when the path cannot be made absolute with what is known.
/// Pure: nothing touches the filesystem.
pub fn resolve_root(
    raw: &str,
    home: Option<&Path>,
    default_root: Option<&Path>,
) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = if trimmed == "~" {
        home?.to_path_buf()
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        home?.join(rest)
    } else {
        let path = PathBuf::from(trimmed);
        if path.is_absolute() {
            path
        } else {
            default_root.filter(|d| d.is_absolute())?.join(path)
        }
    };
    Some(normalize(&path))
}

/// Lexically drop `.` components and fold `..` into its parent.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Derive a layout name from its file: `~/.config/trellis/layouts/web.kdl` is `web`.
pub fn layout_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Filter names by fuzzy matching against the filter string.
/// Returns indices of matching names sorted by score (best first).
pub fn filter_names_fuzzy(names: &[String], filter: &str) -> Vec<usize> {
    use fuzzy_matcher::skim::SkimMatcherV2;
    use fuzzy_matcher::FuzzyMatcher;

    let filter = filter.trim();
    if filter.is_empty() {
        return (0..names.len()).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(usize, i64)> = names
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| matcher.fuzzy_match(name, filter).map(|score| (idx, score)))
        .collect();

    // Best match first, declaration order among ties.
    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    scored.into_iter().map(|(idx, _)| idx).collect()
}
