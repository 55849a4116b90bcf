#![forbid(unsafe_code)]

//! expect_patch — record-and-verify assertions that write their own expected values.
//!
//! Call `expect!(value)` and run the test: the literal of `value` is appended
//! to that very call in your source file. Later runs compare against it.
//! `EXPECT_OVERRIDE=true` replaces stale single-line expectations in place.
//!
//! Three assertion shapes:
//! 1. **`expect!`** — literal comparison for scalars, named scalars and
//!    `Display` types
//! 2. **`expect_json!`** — indented JSON comparison for anything `Serialize`
//! 3. **`expect_fields!`** — expands into one `expect!` per struct field or
//!    map entry
//!
//! # Library usage
//!
//! ```rust
//! use expect_patch::prelude::*;
//!
//! struct UserId(u64);
//! expectable_newtype!(UserId);
//!
//! expect!(UserId(7), UserId(7));
//! ```
//!
//! The engine can also be driven directly, e.g. from another harness:
//!
//! ```rust,no_run
//! use expect_patch::core::config::Config;
//! use expect_patch::engine::Engine;
//! ```

pub mod prelude;

pub mod censor;
pub mod core;
pub mod engine;
pub mod harness;
pub mod logger;
pub mod oracle;
pub mod rewrite;
pub mod syntax;
pub mod value;

pub use crate::rewrite::locator::CallSite;
pub use crate::value::model::{Expectable, Value};
