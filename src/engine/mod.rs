//! Assertion engine: compare, record, override and fan out at one call site.
//!
//! The engine is a pure decide-and-patch component. It never panics and
//! never halts the caller; every assertion ends in an [`Outcome`] or an
//! [`ExpectError`], and the harness decides what a failed test looks like.

#![allow(missing_docs)]

pub mod fields;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::config::Config;
use crate::core::errors::{ExpectError, Result};
use crate::logger::jsonl::{EventType, JournalEntry, JsonlWriter};
use crate::oracle::equality;
use crate::oracle::json::{json_text, json_text_equal};
use crate::rewrite::ledger::EditLedger;
use crate::rewrite::locator::{CallSite, CallerLocator, ResolvedSite};
use crate::rewrite::patcher::{PatchMode, SourcePatcher};
use crate::rewrite::store::{DiskStore, SourceStore};
use crate::syntax::{Dialect, RustDialect};
use crate::value::canonical::{canonicalize, describe};
use crate::value::model::Value;

/// Result of one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Values are equal; nothing was written.
    Passed,
    /// The missing expected value was appended.
    Recorded {
        path: PathBuf,
        line: u32,
        literal: String,
        added_lines: u32,
    },
    /// A mismatched expected value was replaced.
    Overridden {
        path: PathBuf,
        line: u32,
        literal: String,
    },
    /// One field-expansion call became `calls` equality calls.
    Expanded {
        path: PathBuf,
        line: u32,
        calls: usize,
        added_lines: u32,
    },
    /// The call site was already patched this run with the same literal.
    Repeated { path: PathBuf, line: u32 },
    /// Values differ and no rewrite applies.
    Mismatch { expected: String, actual: String },
}

impl Outcome {
    /// Whether the enclosing test should fail.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }

    /// Whether a source file was written for this outcome.
    #[must_use]
    pub const fn wrote_source(&self) -> bool {
        matches!(
            self,
            Self::Recorded { .. } | Self::Overridden { .. } | Self::Expanded { .. }
        )
    }
}

type MemoKey = (PathBuf, u32, u32);

/// Assertion engine owning its ledger, store and dialect.
pub struct Engine<S: SourceStore = DiskStore, D: Dialect = RustDialect> {
    config: Config,
    dialect: D,
    store: S,
    ledger: EditLedger,
    locator: CallerLocator,
    journal: Option<JsonlWriter>,
    config_hash: Option<String>,
    memo: HashMap<MemoKey, String>,
}

impl Engine {
    /// Engine writing to disk with the Rust dialect.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_parts(config, DiskStore, RustDialect::new()?))
    }
}

impl<S: SourceStore, D: Dialect> Engine<S, D> {
    /// Engine over an arbitrary store and dialect.
    pub fn with_parts(config: Config, store: S, dialect: D) -> Self {
        let journal = config
            .journal
            .enabled
            .then(|| JsonlWriter::open(&config.journal.path));
        let config_hash = journal.as_ref().and_then(|_| config.stable_hash().ok());
        Self {
            locator: CallerLocator::new(config.rewrite.workspace_root.clone()),
            config,
            dialect,
            store,
            ledger: EditLedger::new(),
            journal,
            config_hash,
            memo: HashMap::new(),
        }
    }

    /// Compare or record one or two values at `site`.
    ///
    /// One value appends its literal as the expected argument. Two values
    /// pass when equal; otherwise the expected argument is overridden in
    /// override mode, or the outcome is a mismatch.
    pub fn check(&mut self, site: &CallSite, values: &[Value]) -> Result<Outcome> {
        match values {
            [actual] => {
                let literal = self.literal(site, actual)?;
                self.patch(site, PatchMode::Append(literal))
            }
            [actual, expected] => {
                if equality::equal(actual, expected, &self.dialect) {
                    return Ok(Outcome::Passed);
                }
                if self.config.rewrite.override_mode {
                    let literal = self.literal(site, actual)?;
                    return self.patch(site, PatchMode::Override(literal));
                }
                Ok(self.mismatch(
                    site,
                    describe(expected, &self.dialect),
                    describe(actual, &self.dialect),
                ))
            }
            _ => Err(ExpectError::ArgumentCount {
                given: values.len(),
            }),
        }
    }

    /// Compare `actual` as indented JSON, or record it when `expected` is absent.
    pub fn check_json<T: Serialize + ?Sized>(
        &mut self,
        site: &CallSite,
        actual: &T,
        expected: Option<&str>,
    ) -> Result<Outcome> {
        let text = json_text(actual)?;
        let Some(expected) = expected else {
            let literal = self.dialect.json_literal(&text);
            return self.patch(site, PatchMode::Append(literal));
        };
        if json_text_equal(&text, expected, &self.dialect) {
            return Ok(Outcome::Passed);
        }
        if self.config.rewrite.override_mode {
            let literal = self.dialect.json_literal(&text);
            return self.patch(site, PatchMode::Override(literal));
        }
        let expected = self.dialect.strip_raw_delimiters(expected.trim()).trim();
        Ok(self.mismatch(site, expected.to_string(), text.trim().to_string()))
    }

    /// Replace a field-expansion call with one equality call per field.
    pub fn expand_fields(&mut self, site: &CallSite, value: &Value) -> Result<Outcome> {
        let fields = fields::expand(value, Some(site.module_path.as_str()), &self.dialect)?;
        self.patch(site, PatchMode::FanOut(fields))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &EditLedger {
        &self.ledger
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Forget every edit and memoized call site, as if a new run started.
    pub fn reset(&mut self) {
        self.ledger.reset();
        self.memo.clear();
    }

    // ──────────────────────── internals ────────────────────────

    fn literal(&self, site: &CallSite, value: &Value) -> Result<String> {
        canonicalize(value, Some(site.module_path.as_str()), &self.dialect)
    }

    fn patch(&mut self, site: &CallSite, mode: PatchMode) -> Result<Outcome> {
        let resolved = self.locator.locate(site, &self.ledger)?;
        let memo_text = memo_text(&mode);
        let key = (resolved.path.clone(), resolved.original_line, resolved.column);

        if self.config.rewrite.dedupe_repeated_calls
            && let Some(previous) = self.memo.get(&key).cloned()
        {
            return Ok(self.repeat(&resolved, previous, memo_text));
        }

        let added_lines = SourcePatcher::new(&mut self.store, &self.dialect, &mut self.ledger)
            .apply(&resolved, &mode)?;
        if self.config.rewrite.dedupe_repeated_calls {
            self.memo.insert(key, memo_text);
        }

        let (event, outcome) = match mode {
            PatchMode::Append(literal) => (
                EventType::Record,
                Outcome::Recorded {
                    path: resolved.path.clone(),
                    line: resolved.line,
                    literal,
                    added_lines,
                },
            ),
            PatchMode::Override(literal) => (
                EventType::Override,
                Outcome::Overridden {
                    path: resolved.path.clone(),
                    line: resolved.line,
                    literal,
                },
            ),
            PatchMode::FanOut(fields) => (
                EventType::FanOut,
                Outcome::Expanded {
                    path: resolved.path.clone(),
                    line: resolved.line,
                    calls: fields.len(),
                    added_lines,
                },
            ),
        };
        self.journal_outcome(event, &resolved, &outcome);
        Ok(outcome)
    }

    fn repeat(&mut self, resolved: &ResolvedSite, previous: String, current: String) -> Outcome {
        if previous == current {
            let mut entry = JournalEntry::new(EventType::Repeated).at(
                &resolved.path,
                resolved.original_line,
                resolved.line,
            );
            entry.literal = Some(previous);
            self.journal(entry);
            return Outcome::Repeated {
                path: resolved.path.clone(),
                line: resolved.line,
            };
        }
        let mut entry = JournalEntry::new(EventType::Mismatch).at(
            &resolved.path,
            resolved.original_line,
            resolved.line,
        );
        entry.expected = Some(previous.clone());
        entry.actual = Some(current.clone());
        self.journal(entry);
        Outcome::Mismatch {
            expected: previous,
            actual: current,
        }
    }

    fn mismatch(&mut self, site: &CallSite, expected: String, actual: String) -> Outcome {
        if self.journal.is_some() {
            let mut entry = JournalEntry::new(EventType::Mismatch);
            entry.file = Some(site.file.display().to_string());
            entry.original_line = Some(site.line);
            entry.expected = Some(expected.clone());
            entry.actual = Some(actual.clone());
            self.journal(entry);
        }
        Outcome::Mismatch { expected, actual }
    }

    fn journal_outcome(&mut self, event: EventType, resolved: &ResolvedSite, outcome: &Outcome) {
        if self.journal.is_none() {
            return;
        }
        let mut entry =
            JournalEntry::new(event).at(&resolved.path, resolved.original_line, resolved.line);
        match outcome {
            Outcome::Recorded {
                literal,
                added_lines,
                ..
            } => {
                entry.literal = Some(literal.clone());
                entry.added_lines = Some(*added_lines);
            }
            Outcome::Overridden { literal, .. } => entry.literal = Some(literal.clone()),
            Outcome::Expanded {
                calls, added_lines, ..
            } => {
                entry.calls = Some(*calls);
                entry.added_lines = Some(*added_lines);
            }
            _ => {}
        }
        self.journal(entry);
    }

    fn journal(&mut self, mut entry: JournalEntry) {
        if let Some(writer) = self.journal.as_mut() {
            entry.config_hash.clone_from(&self.config_hash);
            writer.write_entry(&entry);
        }
    }
}

/// Text a call site is memoized with: the literal, or one `suffix: literal`
/// line per fan-out field.
fn memo_text(mode: &PatchMode) -> String {
    match mode {
        PatchMode::Append(literal) | PatchMode::Override(literal) => literal.clone(),
        PatchMode::FanOut(fields) => fields
            .iter()
            .map(|field| format!("{}: {}", field.suffix, field.literal))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Human-readable `path:line` for failure messages.
#[must_use]
pub fn site_label(file: &Path, line: u32) -> String {
    format!("{}:{line}", file.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::store::MemoryStore;
    use crate::value::model::Expectable;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        path: PathBuf,
    }

    fn fixture(source: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flow_test.rs");
        fs::write(&path, source).unwrap();
        let path = fs::canonicalize(&path).unwrap();
        Fixture { _dir: dir, path }
    }

    fn disk_engine(config: Config) -> Engine {
        Engine::new(config).unwrap()
    }

    fn site(fx: &Fixture, line: u32) -> CallSite {
        CallSite::new(&fx.path, line, 5, "app::tests")
    }

    fn override_config() -> Config {
        let mut config = Config::default();
        config.rewrite.override_mode = true;
        config
    }

    #[test]
    fn equal_values_pass_without_writing() {
        let fx = fixture("    expect!(1, 1);\n");
        let mut engine = disk_engine(Config::default());
        let outcome = engine
            .check(&site(&fx, 1), &[1i64.to_value(), 1i64.to_value()])
            .unwrap();
        assert_eq!(outcome, Outcome::Passed);
        assert!(!outcome.wrote_source());
        assert_eq!(fs::read_to_string(&fx.path).unwrap(), "    expect!(1, 1);\n");
    }

    #[test]
    fn single_value_is_recorded() {
        let fx = fixture("fn t() {\n    expect!(1);\n}\n");
        let mut engine = disk_engine(Config::default());
        let outcome = engine.check(&site(&fx, 2), &[1i64.to_value()]).unwrap();
        assert_eq!(
            outcome,
            Outcome::Recorded {
                path: fx.path.clone(),
                line: 2,
                literal: "1".into(),
                added_lines: 0,
            }
        );
        assert_eq!(
            fs::read_to_string(&fx.path).unwrap(),
            "fn t() {\n    expect!(1, 1);\n}\n"
        );
    }

    #[test]
    fn mismatch_reports_both_literals() {
        let fx = fixture("    expect!(s, \"abd\");\n");
        let mut engine = disk_engine(Config::default());
        let outcome = engine
            .check(&site(&fx, 1), &["abc".to_value(), "abd".to_value()])
            .unwrap();
        assert!(outcome.is_failure());
        assert_eq!(
            outcome,
            Outcome::Mismatch {
                expected: "\"abd\"".into(),
                actual: "\"abc\"".into(),
            }
        );
    }

    #[test]
    fn argument_count_is_checked_before_any_io() {
        let site = CallSite::new("does/not/exist.rs", 1, 1, "app");
        let mut engine = disk_engine(Config::default());
        let err = engine.check(&site, &[]).unwrap_err();
        assert_eq!(err.code(), "EXP-2001");
        let three = [1i64.to_value(), 2i64.to_value(), 3i64.to_value()];
        assert_eq!(engine.check(&site, &three).unwrap_err().code(), "EXP-2001");
    }

    #[test]
    fn override_replaces_expected() {
        let fx = fixture("    expect!(n, 2); // pinned\n");
        let mut engine = disk_engine(override_config());
        let outcome = engine
            .check(&site(&fx, 1), &[3i64.to_value(), 2i64.to_value()])
            .unwrap();
        assert!(matches!(outcome, Outcome::Overridden { ref literal, .. } if literal == "3"));
        assert_eq!(
            fs::read_to_string(&fx.path).unwrap(),
            "    expect!(n, 3); // pinned\n"
        );
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn multi_line_records_shift_later_calls() {
        let fx = fixture("expect!(a);\nexpect!(b);\n");
        let mut engine = disk_engine(Config::default());
        engine
            .check(&site(&fx, 1), &["x\ny".to_value()])
            .unwrap();
        let outcome = engine.check(&site(&fx, 2), &[7i64.to_value()]).unwrap();
        assert!(matches!(outcome, Outcome::Recorded { line: 3, .. }));
        assert_eq!(
            fs::read_to_string(&fx.path).unwrap(),
            "expect!(a, r#\"x\ny\"#);\nexpect!(b, 7);\n"
        );
    }

    #[test]
    fn repeated_call_with_same_literal_is_not_patched_twice() {
        let fx = fixture("expect!(v);\n");
        let mut engine = disk_engine(Config::default());
        engine.check(&site(&fx, 1), &[5i64.to_value()]).unwrap();
        let again = engine.check(&site(&fx, 1), &[5i64.to_value()]).unwrap();
        assert_eq!(
            again,
            Outcome::Repeated {
                path: fx.path.clone(),
                line: 1,
            }
        );
        assert_eq!(fs::read_to_string(&fx.path).unwrap(), "expect!(v, 5);\n");

        let changed = engine.check(&site(&fx, 1), &[6i64.to_value()]).unwrap();
        assert_eq!(
            changed,
            Outcome::Mismatch {
                expected: "5".into(),
                actual: "6".into(),
            }
        );
    }

    #[test]
    fn dedupe_can_be_disabled() {
        let fx = fixture("expect!(v);\n");
        let mut config = Config::default();
        config.rewrite.dedupe_repeated_calls = false;
        let mut engine = disk_engine(config);
        engine.check(&site(&fx, 1), &[5i64.to_value()]).unwrap();
        engine.check(&site(&fx, 1), &[5i64.to_value()]).unwrap();
        assert_eq!(fs::read_to_string(&fx.path).unwrap(), "expect!(v, 5, 5);\n");
    }

    #[test]
    fn reset_forgets_memo_and_ledger() {
        let fx = fixture("expect!(v);\n");
        let mut engine = disk_engine(Config::default());
        engine.check(&site(&fx, 1), &["a\nb".to_value()]).unwrap();
        assert_eq!(engine.ledger().len(), 1);
        engine.reset();
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn json_record_and_compare() {
        #[derive(Serialize, Default)]
        #[serde(rename_all = "PascalCase")]
        struct Person {
            name: String,
            age: u32,
        }

        let fx = fixture("    expect_json!(person);\n");
        let mut engine = disk_engine(Config::default());
        let outcome = engine
            .check_json(&site(&fx, 1), &Person::default(), None)
            .unwrap();
        assert!(matches!(outcome, Outcome::Recorded { added_lines: 4, .. }));
        let expected = "{\n  \"Name\": \"\",\n  \"Age\": 0\n }";
        assert_eq!(
            fs::read_to_string(&fx.path).unwrap(),
            format!("    expect_json!(person, r#\"\n{expected}\"#);\n")
        );

        let recorded = format!("r#\"\n{expected}\"#");
        let passed = engine
            .check_json(&site(&fx, 9), &Person::default(), Some(recorded.as_str()))
            .unwrap();
        assert_eq!(passed, Outcome::Passed);

        let other = Person {
            name: "Ada".into(),
            age: 36,
        };
        let failed = engine
            .check_json(&site(&fx, 9), &other, Some(expected))
            .unwrap();
        assert!(failed.is_failure());
    }

    #[test]
    fn json_override_is_unsupported_shape() {
        let fx = fixture("expect_json!(v, \"{}\");\n");
        let mut engine = disk_engine(override_config());
        let err = engine
            .check_json(&site(&fx, 1), &vec![1, 2], Some("{}"))
            .unwrap_err();
        assert_eq!(err.code(), "EXP-2004");
        assert_eq!(
            fs::read_to_string(&fx.path).unwrap(),
            "expect_json!(v, \"{}\");\n"
        );
    }

    #[test]
    fn fan_out_through_memory_store() {
        struct Pair {
            a: i32,
            b: String,
        }
        crate::expectable_struct!(Pair { a, b });

        let source = "    expect_fields!(pair);\n    expect!(2);\n";
        let fx = fixture(source);
        let store = MemoryStore::new().with_file(&fx.path, source);
        let mut engine =
            Engine::with_parts(Config::default(), store, RustDialect::new().unwrap());

        let pair = Pair {
            a: 1,
            b: "x".into(),
        };
        let outcome = engine
            .expand_fields(&site(&fx, 1), &pair.to_value())
            .unwrap();
        assert!(matches!(
            outcome,
            Outcome::Expanded {
                calls: 2,
                added_lines: 1,
                ..
            }
        ));
        engine.check(&site(&fx, 2), &[2i64.to_value()]).unwrap();

        assert_eq!(
            engine.store().contents(&fx.path),
            Some("    expect!(pair.a, 1);\n    expect!(pair.b, \"x\");\n    expect!(2, 2);\n")
        );
        // The file on disk is untouched; only the store saw writes.
        assert_eq!(fs::read_to_string(&fx.path).unwrap(), source);
    }

    #[test]
    fn journal_records_each_rewrite() {
        let fx = fixture("expect!(a);\nexpect!(b, 1);\n");
        let journal_dir = tempfile::tempdir().unwrap();
        let journal_path = journal_dir.path().join("rewrites.jsonl");
        let mut config = Config::default();
        config.journal.enabled = true;
        config.journal.path.clone_from(&journal_path);

        let mut engine = disk_engine(config);
        engine.check(&site(&fx, 1), &[1i64.to_value()]).unwrap();
        engine
            .check(&site(&fx, 2), &[2i64.to_value(), 1i64.to_value()])
            .unwrap();

        let contents = fs::read_to_string(&journal_path).unwrap();
        let events: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "record");
        assert_eq!(events[0]["literal"], "1");
        assert!(events[0]["config_hash"].is_string());
        assert_eq!(events[1]["event"], "mismatch");
        assert_eq!(events[1]["severity"], "warning");
    }
}
