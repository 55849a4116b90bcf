#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use expect_patch::CallSite;
use expect_patch::core::config::Config;
use expect_patch::engine::Engine;

/// A throwaway source file that an engine rewrites on disk.
pub struct SourceFixture {
    _dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl SourceFixture {
    pub fn new(name: &str, source: &str) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let path = dir.path().join(sanitize(name)).with_extension("rs");
        fs::write(&path, source).expect("write fixture");
        let path = fs::canonicalize(&path).expect("canonicalize fixture");
        Self { _dir: dir, path }
    }

    pub fn read(&self) -> String {
        fs::read_to_string(&self.path).expect("read fixture")
    }

    /// Call site at `line`, column 0 (nearest call on the line).
    pub fn site(&self, line: u32) -> CallSite {
        CallSite::new(&self.path, line, 0, "fixture_crate::tests")
    }

    /// 1-based number of the first line containing `needle`.
    pub fn line_of(&self, needle: &str) -> u32 {
        self.read()
            .lines()
            .position(|line| line.contains(needle))
            .and_then(|idx| u32::try_from(idx + 1).ok())
            .unwrap_or_else(|| panic!("{needle:?} not in {}", self.path.display()))
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().expect("fixture has parent")
    }
}

pub fn engine() -> Engine {
    Engine::new(Config::default()).expect("default engine")
}

pub fn engine_with(edit: impl FnOnce(&mut Config)) -> Engine {
    let mut config = Config::default();
    edit(&mut config);
    Engine::new(config).expect("configured engine")
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
