//! Source access abstraction.
//!
//! Agents and the knowledge base never touch the filesystem directly; they
//! receive a `SourceReader`. This keeps rule bodies pure and lets tests
//! count reads or serve content from memory.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for reading source files and documentation.
///
/// Implementations must be `Send + Sync` so agents can share one reader
/// across rayon's parallel agent execution.
pub trait SourceReader: Send + Sync {
    /// Read the full content of `path`.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` exists and is readable as a file.
    fn exists(&self, path: &Path) -> bool;
}

/// Reads straight from disk. Every call hits the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory sources keyed by path, with read and existence-check counters.
#[derive(Debug, Default)]
pub struct MemorySources {
    contents: HashMap<PathBuf, String>,
    reads: AtomicUsize,
    exists_checks: AtomicUsize,
}

impl MemorySources {
    /// Build from `(path, content)` pairs.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let contents = entries
            .into_iter()
            .map(|(path, body)| (PathBuf::from(path), body.to_string()))
            .collect();
        Self {
            contents,
            reads: AtomicUsize::new(0),
            exists_checks: AtomicUsize::new(0),
        }
    }

    /// Add or replace one entry.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.contents.insert(PathBuf::from(path), content.to_string());
        self
    }

    /// Number of `read` calls served so far (including misses).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `exists` calls served so far.
    pub fn exists_checks(&self) -> usize {
        self.exists_checks.load(Ordering::SeqCst)
    }
}

impl SourceReader for MemorySources {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.contents.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_checks.fetch_add(1, Ordering::SeqCst);
        self.contents.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sources_basics() {
        let sources = MemorySources::new([("src/a.ts", "class A {}")]).with_file("b.py", "x = 1");

        assert_eq!(sources.read(Path::new("src/a.ts")).unwrap(), "class A {}");
        assert!(sources.exists(Path::new("b.py")));
        assert!(!sources.exists(Path::new("c.py")));

        let err = sources.read(Path::new("c.py")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(sources.reads(), 2);
    }

    #[test]
    fn test_fs_reader_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "pass\n").unwrap();

        assert_eq!(FsReader.read(&file).unwrap(), "pass\n");
        assert!(FsReader.exists(&file));
        assert!(!FsReader.exists(&dir.path().join("missing.py")));
        assert!(FsReader.read(&dir.path().join("missing.py")).is_err());
    }
}
