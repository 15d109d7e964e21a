//! Glob expansion over the local filesystem.

use crate::errors::{IfnsError, Result};
use globset::GlobBuilder;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Split a pattern into the directory to walk and the number of components
/// below it (`None` when the pattern has `**`).
fn walk_plan(pattern: &str) -> (PathBuf, Option<usize>) {
    let mut root = PathBuf::new();
    let mut rest = 0usize;
    let mut in_rest = false;
    for comp in Path::new(pattern).components() {
        let text = comp.as_os_str().to_string_lossy();
        if !in_rest && !has_glob_meta(&text) {
            root.push(comp.as_os_str());
        } else {
            in_rest = true;
            rest += 1;
        }
    }
    let depth = if pattern.contains("**") { None } else { Some(rest) };
    (root, depth)
}

/// Expand a glob into the sorted list of matching files.
///
/// `*` does not cross directory separators; `**` does. A pattern with no
/// wildcard matches that single file if it exists.
///
/// # Errors
///
/// `InvalidGlob` when the pattern does not compile.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| IfnsError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?
        .compile_matcher();

    let (root, depth) = walk_plan(pattern);
    let relative = root.as_os_str().is_empty();
    let walk_root = if relative { PathBuf::from(".") } else { root };
    if !walk_root.exists() {
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(&walk_root).follow_links(true);
    if let Some(depth) = depth {
        walker = walker.max_depth(depth);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(pattern, error = %err, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let candidate = if relative {
            path.strip_prefix(Component::CurDir).unwrap_or(path)
        } else {
            path
        };
        if matcher.is_match(candidate) {
            files.push(candidate.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Lowercased file extension, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walk_plan_splits_static_prefix() {
        let (root, depth) = walk_plan("data/features/*.csv");
        assert_eq!(root, PathBuf::from("data/features"));
        assert_eq!(depth, Some(1));

        let (root, depth) = walk_plan("logs/**/*.ndjson");
        assert_eq!(root, PathBuf::from("logs"));
        assert_eq!(depth, None);
    }

    #[test]
    fn test_expand_glob_matches_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "x").unwrap();
        fs::write(dir.path().join("a.csv"), "x").unwrap();
        fs::write(dir.path().join("c.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("d.csv"), "x").unwrap();

        let pattern = format!("{}/*.csv", dir.path().display());
        let files = expand_glob(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);

        let deep = format!("{}/**/*.csv", dir.path().display());
        assert_eq!(expand_glob(&deep).unwrap().len(), 3);
    }

    #[test]
    fn test_expand_glob_missing_root_is_empty() {
        assert!(expand_glob("/nonexistent/dir/*.csv").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let err = expand_glob("data/[unclosed").unwrap_err();
        assert!(matches!(err, IfnsError::InvalidGlob { .. }));
    }
}
