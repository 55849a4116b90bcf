//! Test-harness glue behind the assertion macros.
//!
//! One engine per test process, built from [`Config::load`] on first use.
//! Assertions serialize through its mutex, so parallel tests never interleave
//! two rewrites of the same file. A mismatch or any error panics at the
//! macro's call site, which fails the current test and only that test.

use std::fmt::Display;
use std::sync::LazyLock;

use parking_lot::Mutex;
use serde::Serialize;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::engine::{Engine, Outcome, site_label};
use crate::rewrite::locator::CallSite;
use crate::value::model::Value;

static ENGINE: LazyLock<Result<Mutex<Engine>>> =
    LazyLock::new(|| Ok(Mutex::new(Engine::new(Config::load(None)?)?)));

/// Run `f` against the process-wide engine.
///
/// # Panics
///
/// Panics when the configuration could not be loaded.
#[track_caller]
pub fn with_engine<R>(f: impl FnOnce(&mut Engine) -> R) -> R {
    match &*ENGINE {
        Ok(engine) => f(&mut engine.lock()),
        Err(err) => panic!("expect_patch could not start: {err}"),
    }
}

#[doc(hidden)]
#[track_caller]
pub fn check(site: &CallSite, values: &[Value]) {
    let result = with_engine(|engine| engine.check(site, values));
    settle(site, result);
}

#[doc(hidden)]
#[track_caller]
pub fn check_json<T: Serialize + ?Sized>(site: &CallSite, actual: &T, expected: Option<&str>) {
    let result = with_engine(|engine| engine.check_json(site, actual, expected));
    settle(site, result);
}

#[doc(hidden)]
#[track_caller]
pub fn check_fields(site: &CallSite, value: &Value) {
    let result = with_engine(|engine| engine.expand_fields(site, value));
    settle(site, result);
}

#[doc(hidden)]
#[track_caller]
pub fn ok<T, E: Display>(result: std::result::Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected no error, got: {err}"),
    }
}

#[track_caller]
fn settle(site: &CallSite, result: Result<Outcome>) {
    match result {
        Ok(Outcome::Mismatch { expected, actual }) => panic!(
            "{}: values differ\n  expected: {expected}\n    actual: {actual}",
            site_label(&site.file, site.line)
        ),
        Ok(_) => {}
        Err(err) => panic!("{}: {err}", site_label(&site.file, site.line)),
    }
}

/// Capture the invoking call site.
#[doc(hidden)]
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(
            ::std::file!(),
            ::std::line!(),
            ::std::column!(),
            ::std::module_path!(),
        )
    };
}

/// Assert that a value equals its expected literal, or record it.
///
/// `expect!(actual)` appends the literal of `actual` to this very call in the
/// source file. `expect!(actual, expected)` compares, and in override mode
/// (`EXPECT_OVERRIDE=true`) replaces a stale `expected`.
///
/// ```rust
/// use expect_patch::expect;
///
/// expect!(2 + 2, 4);
/// expect!(100_000, 100000);
/// expect!(Some("a"), "a");
/// ```
#[macro_export]
macro_rules! expect {
    () => {
        $crate::harness::check(&$crate::call_site!(), &[])
    };
    ($actual:expr $(,)?) => {
        $crate::harness::check(
            &$crate::call_site!(),
            &[$crate::Expectable::to_value(&$actual)],
        )
    };
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::harness::check(
            &$crate::call_site!(),
            &[
                $crate::Expectable::to_value(&$actual),
                $crate::Expectable::to_value(&$expected),
            ],
        )
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::harness::check(
            &$crate::call_site!(),
            &[$($crate::Expectable::to_value(&$arg)),+],
        )
    };
}

/// Assert that a serializable value matches its indented JSON, or record it.
///
/// ```rust
/// use expect_patch::expect_json;
///
/// expect_json!(vec![1, 2], r#"
/// [
///   1,
///   2
///  ]"#);
/// ```
#[macro_export]
macro_rules! expect_json {
    ($actual:expr $(,)?) => {
        $crate::harness::check_json(&$crate::call_site!(), &$actual, ::std::option::Option::None)
    };
    ($actual:expr, $expected:expr $(,)?) => {
        $crate::harness::check_json(
            &$crate::call_site!(),
            &$actual,
            ::std::option::Option::Some(::std::convert::AsRef::<str>::as_ref(&$expected)),
        )
    };
}

/// Replace this call with one `expect!` per field or map entry of the value.
#[macro_export]
macro_rules! expect_fields {
    ($actual:expr $(,)?) => {
        $crate::harness::check_fields(
            &$crate::call_site!(),
            &$crate::Expectable::to_value(&$actual),
        )
    };
}

/// Unwrap a `Result`, failing the test with the error's display text.
///
/// ```rust
/// use expect_patch::expect_ok;
///
/// let n: u8 = expect_ok!("7".parse::<u8>());
/// assert_eq!(n, 7);
/// ```
#[macro_export]
macro_rules! expect_ok {
    ($result:expr $(,)?) => {
        $crate::harness::ok($result)
    };
}
