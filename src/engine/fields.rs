//! Field expander: one literal per struct field or map entry.

use crate::core::errors::Result;
use crate::syntax::{Dialect, FieldValue};
use crate::value::canonical::canonicalize;
use crate::value::model::Value;

/// Enumerate `value` into fan-out lines.
///
/// Structs yield their fields in declaration order, maps one line per key
/// (sorted by key literal so reruns produce the same file). Anything else,
/// or an empty struct/map, yields a single whole-value line with an empty
/// suffix.
pub fn expand(
    value: &Value,
    caller_module: Option<&str>,
    dialect: &dyn Dialect,
) -> Result<Vec<FieldValue>> {
    let fields = match value {
        Value::Pointer(Some(target)) => return expand(target, caller_module, dialect),
        Value::Struct(st) => st
            .fields
            .iter()
            .map(|(name, field)| {
                Ok(FieldValue {
                    suffix: dialect.field_suffix(name),
                    literal: canonicalize(field, caller_module, dialect)?,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Map(entries) => {
            let mut fields = entries
                .iter()
                .map(|(key, entry)| {
                    let key_literal = key_literal(key, caller_module, dialect)?;
                    Ok((
                        key_literal.clone(),
                        FieldValue {
                            suffix: dialect.index_suffix(&key_literal, key.is_string()),
                            literal: canonicalize(entry, caller_module, dialect)?,
                        },
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            fields.into_iter().map(|(_, field)| field).collect()
        }
        _ => Vec::new(),
    };

    if fields.is_empty() {
        return Ok(vec![FieldValue {
            suffix: String::new(),
            literal: canonicalize(value, caller_module, dialect)?,
        }]);
    }
    Ok(fields)
}

/// Index keys take their type from the map, so integers stay unsuffixed.
fn key_literal(key: &Value, caller_module: Option<&str>, dialect: &dyn Dialect) -> Result<String> {
    match key {
        Value::Integer(i) => Ok(dialect.integer(*i)),
        other => canonicalize(other, caller_module, dialect),
    }
}
