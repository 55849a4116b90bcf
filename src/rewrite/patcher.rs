//! Source patcher: rewrites exactly one call line and records the line delta.
//!
//! Every patch reads the whole file, replaces the target line, writes the
//! whole file back, then registers the net added lines with the ledger.

#![allow(missing_docs)]

use std::path::Path;

use crate::core::errors::{ExpectError, Result};
use crate::rewrite::ledger::EditLedger;
use crate::rewrite::locator::ResolvedSite;
use crate::rewrite::store::SourceStore;
use crate::syntax::{Dialect, FieldValue};

/// What to do with the call line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchMode {
    /// Add the missing expected value.
    Append(String),
    /// Replace an existing expected value; single-line literals only.
    Override(String),
    /// Replace a field-expansion call with one call per field.
    FanOut(Vec<FieldValue>),
}

impl PatchMode {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Append(_) => "append",
            Self::Override(_) => "override",
            Self::FanOut(_) => "fan_out",
        }
    }
}

/// Borrowing view over the collaborators a patch needs.
pub struct SourcePatcher<'a, S: SourceStore, D: Dialect> {
    store: &'a mut S,
    dialect: &'a D,
    ledger: &'a mut EditLedger,
}

impl<'a, S: SourceStore, D: Dialect> SourcePatcher<'a, S, D> {
    pub fn new(store: &'a mut S, dialect: &'a D, ledger: &'a mut EditLedger) -> Self {
        Self {
            store,
            dialect,
            ledger,
        }
    }

    /// Apply `mode` at `site`. Returns the net number of lines added.
    pub fn apply(&mut self, site: &ResolvedSite, mode: &PatchMode) -> Result<u32> {
        if let PatchMode::Override(literal) = mode
            && literal.contains('\n')
        {
            return Err(ExpectError::shape(
                &site.path,
                site.line,
                "multi-line literal cannot override an existing value",
            ));
        }

        let contents = self.store.read(&site.path)?;
        let mut lines: Vec<&str> = contents.split('\n').collect();
        let idx = line_index(&site.path, site.line, lines.len())?;

        let (body, crlf) = match lines[idx].strip_suffix('\r') {
            Some(body) => (body, true),
            None => (lines[idx], false),
        };
        let edited = match mode {
            PatchMode::Append(literal) => self.dialect.append_argument(body, site.column, literal),
            PatchMode::Override(literal) => {
                self.dialect.replace_last_argument(body, site.column, literal)
            }
            PatchMode::FanOut(fields) => self.dialect.fan_out(body, site.column, fields),
        }
        .map_err(|shape| ExpectError::shape(&site.path, site.line, shape))?;

        let edited = if crlf {
            format!("{}\r", edited.replace('\n', "\r\n"))
        } else {
            edited
        };
        let added = count_newlines(&edited);
        lines[idx] = &edited;
        self.store.write(&site.path, &lines.join("\n"))?;

        match mode {
            PatchMode::Append(_) if added > 0 => {
                self.ledger.register(&site.path, site.original_line, added);
            }
            PatchMode::FanOut(_) => {
                self.ledger.register(&site.path, site.original_line, added);
            }
            _ => {}
        }
        Ok(added)
    }
}

fn line_index(path: &Path, line: u32, line_count: usize) -> Result<usize> {
    usize::try_from(line)
        .ok()
        .and_then(|line| line.checked_sub(1))
        .filter(|idx| *idx < line_count)
        .ok_or_else(|| ExpectError::LineRange {
            path: path.to_path_buf(),
            line,
            line_count,
        })
}

fn count_newlines(text: &str) -> u32 {
    u32::try_from(memchr::memchr_iter(b'\n', text.as_bytes()).count()).unwrap_or(u32::MAX)
}
