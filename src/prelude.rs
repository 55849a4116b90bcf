//! Convenience re-exports for test modules.
//!
//! ```rust,no_run
//! use expect_patch::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{ExpectError, Result};

// Values
pub use crate::value::model::{Expectable, Value};

// Engine
pub use crate::engine::{Engine, Outcome};
pub use crate::rewrite::locator::CallSite;
pub use crate::syntax::{Dialect, RustDialect};

// Macros
pub use crate::{
    expect, expect_fields, expect_json, expect_ok, expectable_display, expectable_newtype,
    expectable_struct,
};
