//! Source rewriting: caller location, edit ledger, whole-file store, patcher.

pub mod ledger;
pub mod locator;
pub mod patcher;
pub mod store;
