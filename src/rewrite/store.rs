//! Whole-file read/write collaborator used by the patcher.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{ExpectError, Result};

/// Reads and writes complete source files. No partial or byte-range writes.
pub trait SourceStore: Send {
    fn read(&self, path: &Path) -> Result<String>;
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

/// Direct filesystem access. Writes are not atomic.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskStore;

impl SourceStore for DiskStore {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|source| ExpectError::io(path, source))
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|source| ExpectError::io(path, source))
    }
}

/// In-memory file set, for driving the engine without touching disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    files: HashMap<PathBuf, String>,
    writes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    #[must_use]
    pub fn contents(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SourceStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            ExpectError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory store"),
            )
        })
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        self.writes += 1;
        Ok(())
    }
}
