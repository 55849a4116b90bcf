//! Censoring helpers for values that change between runs (ids, timestamps).
//!
//! ```rust
//! use expect_patch::censor;
//!
//! assert_eq!(censor::digits(&"order-1234"), "order-XXXX");
//! assert_eq!(censor::alphanumeric(&"ab-12"), "XX-XX");
//! ```

use crate::value::model::{Expectable, Value};

/// Replace ASCII digits with `X`. Numbers are rendered to text first.
#[must_use]
pub fn digits(value: &impl Expectable) -> String {
    mask(&value.to_value(), true, |c| c.is_ascii_digit())
}

/// Replace ASCII letters with `X`. Only strings are censored.
#[must_use]
pub fn chars(value: &impl Expectable) -> String {
    mask(&value.to_value(), false, |c| c.is_ascii_alphabetic())
}

/// Replace ASCII letters and digits with `X`. Numbers are rendered to text first.
#[must_use]
pub fn alphanumeric(value: &impl Expectable) -> String {
    mask(&value.to_value(), true, |c| c.is_ascii_alphanumeric())
}

fn mask(value: &Value, numbers: bool, hide: fn(char) -> bool) -> String {
    let censor = |text: &str| {
        text.chars()
            .map(|c| if hide(c) { 'X' } else { c })
            .collect::<String>()
    };
    match value {
        Value::String(text) => censor(text),
        Value::Integer(i) if numbers => censor(&i.to_string()),
        Value::Float(f) if numbers => censor(&f.to_string()),
        Value::Pointer(Some(target)) => mask(target, numbers, hide),
        other => plain_text(other),
    }
}

/// Display text of a value, without literal quoting.
fn plain_text(value: &Value) -> String {
    match value {
        Value::Nil | Value::Pointer(None) => "None".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(text) | Value::Custom(text) => text.clone(),
        Value::Pointer(Some(target)) => plain_text(target),
        Value::Struct(st) if st.display.is_some() => st.display.clone().unwrap_or_default(),
        other => other.dump(),
    }
}
