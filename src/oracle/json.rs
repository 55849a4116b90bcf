//! JSON comparison path for composite values the literal form cannot carry.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::core::errors::{ExpectError, Result};
use crate::syntax::Dialect;

/// Serialize with a one-space indent and a one-space prefix on every line
/// after the first.
pub fn json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
    value.serialize(&mut serializer)?;
    let text = String::from_utf8(buf).map_err(|err| ExpectError::Serialization {
        context: "json_text",
        details: err.to_string(),
    })?;
    Ok(text.replace('\n', "\n "))
}

/// Compare two JSON texts after trimming one layer of raw delimiters and
/// surrounding whitespace from each.
#[must_use]
pub fn json_text_equal(actual: &str, expected: &str, dialect: &dyn Dialect) -> bool {
    normalize(actual, dialect) == normalize(expected, dialect)
}

/// Serialize `actual` and compare it with the authored `expected` text.
pub fn json_equal<T: Serialize + ?Sized>(
    actual: &T,
    expected: &str,
    dialect: &dyn Dialect,
) -> Result<bool> {
    let text = json_text(actual)?;
    Ok(json_text_equal(&text, expected, dialect))
}

fn normalize<'a>(text: &'a str, dialect: &dyn Dialect) -> &'a str {
    dialect.strip_raw_delimiters(text.trim()).trim()
}
