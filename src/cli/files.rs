//! File argument expansion

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand file arguments into paths, in argument order.
///
/// A plain path is kept as-is even when it does not exist, so analysis can
/// report the read failure. A glob that matches nothing is skipped with a
/// warning. Paths matched more than once are kept at their first position.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        if !has_glob_meta(pattern) {
            push_unique(&mut files, PathBuf::from(pattern));
            continue;
        }

        let mut matched = 0usize;
        let entries =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    matched += 1;
                    push_unique(&mut files, path);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable match for '{}': {}", pattern, e),
            }
        }
        if matched == 0 {
            warn!("Pattern '{}' matched no files", pattern);
        } else {
            debug!("Pattern '{}' matched {} files", pattern, matched);
        }
    }
    Ok(files)
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
    if !files.contains(&path) {
        files.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_glob_expands_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.ts"), "").unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("c.py"), "").unwrap();
        fs::create_dir(dir.path().join("d.ts")).unwrap();

        let pattern = format!("{}/*.ts", dir.path().display());
        let files = expand_patterns(&[pattern]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_literal_paths_pass_through() {
        let files = expand_patterns(&["missing.ts".to_string()]).unwrap();
        assert_eq!(files, vec![PathBuf::from("missing.ts")]);
    }

    #[test]
    fn test_empty_glob_is_skipped_and_duplicates_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        let literal = dir.path().join("a.ts").display().to_string();
        let patterns = vec![
            format!("{}/*.rb", dir.path().display()),
            literal.clone(),
            format!("{}/*.ts", dir.path().display()),
        ];
        let files = expand_patterns(&patterns).unwrap();
        assert_eq!(files, vec![PathBuf::from(literal)]);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(expand_patterns(&["src/[.ts".to_string()]).is_err());
    }
}
