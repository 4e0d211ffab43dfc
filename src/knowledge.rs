//! Knowledge base of principle documentation
//!
//! Documentation lives as markdown files under a root directory, one file
//! per principle (`<root>/<slug>.md`, e.g. `srp.md`, `dependency-rule.md`).
//! Lookups are read-through: the first lookup of a key reads the file, later
//! lookups are served from the cache. Entries are immutable once cached, so
//! two concurrent first lookups of the same key may both read the file and
//! store equal content. That duplicate work is harmless.
//!
//! `reference_for` only needs to know that a document exists. Positive
//! answers are remembered separately from content; misses are re-checked
//! so a document added later is picked up.
//!
//! The cache lives exactly as long as the `KnowledgeBase` value; share it
//! with `Arc` instead of reaching for a global.

use crate::files::SourceReader;
use dashmap::{DashMap, DashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default knowledge-base location, relative to the working directory
pub const DEFAULT_KB_PATH: &str = "../docs/specs";

pub struct KnowledgeBase {
    root: PathBuf,
    reader: Arc<dyn SourceReader>,
    cache: DashMap<String, Arc<String>>,
    existing: DashSet<String>,
}

impl KnowledgeBase {
    pub fn new(root: impl Into<PathBuf>, reader: Arc<dyn SourceReader>) -> Self {
        Self {
            root: root.into(),
            reader,
            cache: DashMap::new(),
            existing: DashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document for `principle`
    pub fn document_path(&self, principle: &str) -> PathBuf {
        self.root.join(format!("{}.md", slug(principle)))
    }

    /// Documentation reference string for `principle`, or `""` when the
    /// document does not exist.
    pub fn reference_for(&self, principle: &str) -> String {
        let path = self.document_path(principle);
        if self.cache.contains_key(principle) || self.existing.contains(principle) {
            return path.display().to_string();
        }
        if self.reader.exists(&path) {
            self.existing.insert(principle.to_string());
            path.display().to_string()
        } else {
            String::new()
        }
    }

    /// Documentation content for `principle`. Misses return `None`, never an error.
    pub fn lookup(&self, principle: &str) -> Option<Arc<String>> {
        if let Some(entry) = self.cache.get(principle) {
            return Some(Arc::clone(&entry));
        }

        let path = self.document_path(principle);
        match self.reader.read(&path) {
            Ok(content) => {
                let content = Arc::new(content);
                self.cache
                    .insert(principle.to_string(), Arc::clone(&content));
                Some(content)
            }
            Err(e) => {
                debug!("Knowledge base miss for {} ({}): {}", principle, path.display(), e);
                None
            }
        }
    }

    /// Number of cached entries
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

/// `DependencyRule` -> `dependency-rule`, `SRP` -> `srp`
pub fn slug(principle: &str) -> String {
    let mut out = String::with_capacity(principle.len() + 4);
    let mut prev_lower = false;
    for c in principle.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() && prev_lower {
                out.push('-');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            out.push(c.to_ascii_lowercase());
        } else {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            prev_lower = false;
        }
    }
    out.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemorySources;

    fn kb(sources: Arc<MemorySources>) -> KnowledgeBase {
        KnowledgeBase::new("kb", sources)
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("SRP"), "srp");
        assert_eq!(slug("DependencyRule"), "dependency-rule");
        assert_eq!(slug("SelfValidating"), "self-validating");
        assert_eq!(slug("clean code"), "clean-code");
    }

    #[test]
    fn test_lookup_is_cached_after_first_read() {
        let sources = Arc::new(MemorySources::new([("kb/srp.md", "# Single Responsibility")]));
        let kb = kb(Arc::clone(&sources));

        let first = kb.lookup("SRP").expect("first lookup");
        let reads_after_first = sources.reads();
        let second = kb.lookup("SRP").expect("second lookup");

        assert_eq!(first, second);
        assert_eq!(reads_after_first, 1);
        assert_eq!(sources.reads(), 1, "second lookup must not read again");
        assert_eq!(kb.cached(), 1);
    }

    #[test]
    fn test_miss_returns_none_and_empty_reference() {
        let sources = Arc::new(MemorySources::default());
        let kb = kb(sources);
        assert!(kb.lookup("OCP").is_none());
        assert_eq!(kb.reference_for("OCP"), "");
        assert_eq!(kb.cached(), 0);
    }

    #[test]
    fn test_reference_for_existing_document() {
        let sources = Arc::new(MemorySources::new([("kb/dependency-rule.md", "rule")]));
        let kb = kb(sources);
        let reference = kb.reference_for("DependencyRule");
        assert!(reference.ends_with("dependency-rule.md"), "got {}", reference);
    }

    #[test]
    fn test_reference_for_remembers_existing_documents() {
        let sources = Arc::new(MemorySources::new([("kb/srp.md", "srp")]));
        let kb = kb(Arc::clone(&sources));

        for _ in 0..3 {
            assert!(kb.reference_for("SRP").ends_with("srp.md"));
        }
        assert_eq!(sources.exists_checks(), 1);
        assert_eq!(sources.reads(), 0);

        // Misses are checked again each time
        kb.reference_for("OCP");
        kb.reference_for("OCP");
        assert_eq!(sources.exists_checks(), 3);
    }
}
