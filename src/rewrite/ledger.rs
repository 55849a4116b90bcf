//! Edit ledger: line-count deltas from rewrites already committed this run.
//!
//! Records are keyed by the line number as it was before ANY edit, so
//! translating a freshly observed (compile-time) line is an order-independent
//! sum over every earlier edit at or above it.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

/// One committed rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub path: PathBuf,
    /// 1-indexed line in the original, unedited file.
    pub line: u32,
    /// Net lines added; 0 for same-line edits.
    pub added_lines: u32,
}

/// Append-only list of [`EditRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct EditLedger {
    records: Vec<EditRecord>,
}

impl EditLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed edit at original `line`.
    pub fn register(&mut self, path: impl AsRef<Path>, line: u32, added_lines: u32) {
        self.records.push(EditRecord {
            path: path.as_ref().to_path_buf(),
            line,
            added_lines,
        });
    }

    /// Current-file line for original `line`.
    #[must_use]
    pub fn translate(&self, path: &Path, line: u32) -> u32 {
        self.records
            .iter()
            .filter(|record| record.path == path && record.line <= line)
            .fold(line, |acc, record| acc.saturating_add(record.added_lines))
    }

    #[must_use]
    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget every record, for engines reused across simulated runs.
    pub fn reset(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_ledger_is_identity() {
        let ledger = EditLedger::new();
        assert_eq!(ledger.translate(Path::new("/a.rs"), 17), 17);
        assert!(ledger.is_empty());
    }

    #[test]
    fn accumulates_all_earlier_edits_in_file() {
        let mut ledger = EditLedger::new();
        ledger.register("/a.rs", 10, 3);
        ledger.register("/a.rs", 20, 1);
        ledger.register("/b.rs", 5, 7);

        assert_eq!(ledger.translate(Path::new("/a.rs"), 9), 9);
        assert_eq!(ledger.translate(Path::new("/a.rs"), 10), 13);
        assert_eq!(ledger.translate(Path::new("/a.rs"), 15), 18);
        assert_eq!(ledger.translate(Path::new("/a.rs"), 30), 34);
        assert_eq!(ledger.translate(Path::new("/b.rs"), 30), 37);
        assert_eq!(ledger.translate(Path::new("/c.rs"), 30), 30);
    }

    #[test]
    fn zero_line_edits_are_recorded_but_neutral() {
        let mut ledger = EditLedger::new();
        ledger.register("/a.rs", 4, 0);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.translate(Path::new("/a.rs"), 8), 8);
    }

    #[test]
    fn reset_clears_records() {
        let mut ledger = EditLedger::new();
        ledger.register("/a.rs", 1, 2);
        ledger.reset();
        assert_eq!(ledger.translate(Path::new("/a.rs"), 5), 5);
    }

    proptest! {
        #[test]
        fn translation_is_monotonic_and_order_independent(
            edits in proptest::collection::vec((1u32..200, 0u32..5), 0..20),
            query in 1u32..250,
        ) {
            let path = Path::new("/f.rs");
            let mut forward = EditLedger::new();
            let mut backward = EditLedger::new();
            for (line, added) in &edits {
                forward.register(path, *line, *added);
            }
            for (line, added) in edits.iter().rev() {
                backward.register(path, *line, *added);
            }

            let translated = forward.translate(path, query);
            prop_assert!(translated >= query);
            prop_assert_eq!(translated, backward.translate(path, query));
            prop_assert!(forward.translate(path, query + 1) > translated);
            if edits.iter().all(|(line, _)| *line > query) {
                prop_assert_eq!(translated, query);
            }
        }
    }
}
