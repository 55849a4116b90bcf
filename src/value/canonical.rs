//! Value canonicalizer: deterministic literal text for a [`Value`].
//!
//! Pure function of the value, the caller's module and the dialect. Rules in
//! priority order: nil, booleans, numbers, strings, maps (no literal form),
//! named scalars, pointers, display text, verbose dump.

use crate::core::errors::{ExpectError, Result};
use crate::syntax::Dialect;
use crate::value::model::{BaseKind, NamedScalar, Value};

/// Hint attached to map literal requests.
pub const MAP_HINT: &str = "compare it with expect_json! instead";

/// Render `value` as a literal that can replace source text in `caller_module`.
///
/// `caller_module` of `None` renders named scalars unqualified, which is what
/// comparison and failure messages use.
pub fn canonicalize(
    value: &Value,
    caller_module: Option<&str>,
    dialect: &dyn Dialect,
) -> Result<String> {
    match value {
        Value::Nil | Value::Pointer(None) => Ok(dialect.nil()),
        Value::Bool(b) => Ok(dialect.boolean(*b)),
        Value::Integer(i) => Ok(dialect.typed_integer(*i)),
        Value::Float(f) => Ok(dialect.float(*f)),
        Value::String(s) => Ok(dialect.string(s)),
        Value::Map(_) => Err(ExpectError::UnsupportedLiteral {
            kind: "map",
            hint: MAP_HINT,
        }),
        Value::Named(named) => named_literal(named, caller_module, dialect),
        Value::Pointer(Some(target)) => canonicalize(target, caller_module, dialect),
        Value::Custom(text) => Ok(dialect.quoted(text)),
        Value::Struct(st) => Ok(st
            .display
            .as_deref()
            .map_or_else(|| dialect.quoted(&value.dump()), |text| dialect.quoted(text))),
        Value::Seq(_) => Ok(dialect.quoted(&value.dump())),
    }
}

/// Literal for failure messages: the canonical form, or the dump when none exists.
#[must_use]
pub fn describe(value: &Value, dialect: &dyn Dialect) -> String {
    canonicalize(value, None, dialect).unwrap_or_else(|_| value.dump())
}

fn named_literal(
    named: &NamedScalar,
    caller_module: Option<&str>,
    dialect: &dyn Dialect,
) -> Result<String> {
    let inner = match (named.base, named.inner.as_ref()) {
        (BaseKind::String, Value::String(s)) => dialect.quoted(s),
        (BaseKind::Integer, Value::Integer(i)) => dialect.integer(*i),
        (BaseKind::Float, Value::Float(f)) => dialect.float(*f),
        (base, _) => {
            return Err(ExpectError::UnsupportedKind {
                type_name: named.type_name.clone(),
                kind: base.label(),
            });
        }
    };
    let qualifier = dialect.qualifier(&named.module_path, caller_module);
    Ok(dialect.named(&qualifier, &named.type_name, &inner))
}
