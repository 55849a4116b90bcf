//! Rewrite journal: JSONL append-only log of source edits with graceful degradation.

pub mod jsonl;
