//! Caller locator: turns a recorded call site into the file and line that
//! address the call in the file as it is on disk right now.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{ExpectError, Result};
use crate::rewrite::ledger::EditLedger;

/// Where an assertion macro was invoked, as captured at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// `file!()`: usually relative to the workspace root.
    pub file: PathBuf,
    /// `line!()`, 1-indexed, in the file as compiled.
    pub line: u32,
    /// `column!()`, 1-indexed; 0 when unknown.
    pub column: u32,
    /// `module_path!()` of the caller.
    pub module_path: String,
}

impl CallSite {
    #[must_use]
    pub fn new(
        file: impl Into<PathBuf>,
        line: u32,
        column: u32,
        module_path: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            module_path: module_path.into(),
        }
    }
}

/// A call site pinned to an absolute path and a ledger-adjusted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSite {
    pub path: PathBuf,
    /// Line before any edit this run; the ledger and repeat memo key.
    pub original_line: u32,
    /// Line in the current file contents.
    pub line: u32,
    pub column: u32,
}

/// Resolves `file!()` paths against the workspace.
#[derive(Debug, Clone, Default)]
pub struct CallerLocator {
    workspace_root: Option<PathBuf>,
}

impl CallerLocator {
    #[must_use]
    pub fn new(workspace_root: Option<PathBuf>) -> Self {
        Self { workspace_root }
    }

    /// Resolve `site` and translate its line through `ledger`.
    pub fn locate(&self, site: &CallSite, ledger: &EditLedger) -> Result<ResolvedSite> {
        if site.line == 0 {
            return Err(ExpectError::CallerResolution {
                file: site.file.display().to_string(),
                details: "no line information for the call".to_string(),
            });
        }
        let path = self.resolve_path(&site.file)?;
        Ok(ResolvedSite {
            line: ledger.translate(&path, site.line),
            original_line: site.line,
            column: site.column,
            path,
        })
    }

    /// Absolute, canonical path of a source file named by `file!()`.
    ///
    /// Candidates in order: the path itself when absolute, the configured
    /// workspace root, ancestors of `CARGO_MANIFEST_DIR`, ancestors of the
    /// current directory.
    pub fn resolve_path(&self, file: &Path) -> Result<PathBuf> {
        let found = self
            .candidates(file)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ExpectError::CallerResolution {
                file: file.display().to_string(),
                details: "source file not found from workspace root, manifest dir or cwd"
                    .to_string(),
            })?;
        fs::canonicalize(&found).map_err(|err| ExpectError::CallerResolution {
            file: found.display().to_string(),
            details: err.to_string(),
        })
    }

    fn candidates(&self, file: &Path) -> Vec<PathBuf> {
        if file.is_absolute() {
            return vec![file.to_path_buf()];
        }
        let mut out = Vec::new();
        if let Some(root) = &self.workspace_root {
            out.push(root.join(file));
        }
        if let Some(manifest) = env::var_os("CARGO_MANIFEST_DIR") {
            out.extend(Path::new(&manifest).ancestors().map(|dir| dir.join(file)));
        }
        if let Ok(cwd) = env::current_dir() {
            out.extend(cwd.ancestors().map(|dir| dir.join(file)));
        }
        out
    }
}
