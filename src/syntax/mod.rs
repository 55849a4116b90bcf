//! Host-language syntax: literal emission and call-line rewriting.
//!
//! Everything that depends on how the target language spells literals and
//! calls sits behind [`Dialect`], so canonicalization, the ledger and the
//! patcher stay language-agnostic. [`RustDialect`] is the shipped
//! implementation.

pub mod rust;
pub mod scan;

pub use rust::RustDialect;

use crate::value::model::Value;

/// One fan-out line: an access-path suffix and the literal it must equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// `.name`, `["key"]`, or empty for the whole value.
    pub suffix: String,
    pub literal: String,
}

/// Literal spelling and call-shape editing for one target language.
///
/// Line-editing methods take a single physical line (without its newline) and
/// the 1-based column the call was recorded at (0 when unknown); they return
/// the replacement text or a description of the unsupported shape.
pub trait Dialect: Send {
    /// Literal for the absent value.
    fn nil(&self) -> String;
    fn boolean(&self, value: bool) -> String;
    /// Integer whose type is fixed by where it appears (constructor, index).
    fn integer(&self, value: i128) -> String;
    /// Integer standing alone as an argument, typed when the default
    /// integer type cannot hold it.
    fn typed_integer(&self, value: i128) -> String {
        self.integer(value)
    }
    /// Fixed-point text, never exponential.
    fn float(&self, value: f64) -> String;
    /// Single-line quoted literal with escapes.
    fn quoted(&self, value: &str) -> String;
    /// Raw multi-line literal, `None` if the content cannot be carried raw.
    fn raw(&self, value: &str) -> Option<String>;
    /// `Type(inner)` with an optional qualifier prefix.
    fn named(&self, qualifier: &str, type_name: &str, inner: &str) -> String;
    /// Prefix needed to name a type from `type_module` inside `caller_module`.
    fn qualifier(&self, type_module: &str, caller_module: Option<&str>) -> String;
    /// Access-path suffix for a struct field.
    fn field_suffix(&self, name: &str) -> String;
    /// Access-path suffix for a map key given its literal.
    fn index_suffix(&self, key_literal: &str, key_is_string: bool) -> String;
    /// Wrap indented JSON for embedding as an expected argument.
    fn json_literal(&self, json: &str) -> String;
    /// Remove one layer of raw-literal delimiters, if present.
    fn strip_raw_delimiters<'a>(&self, text: &'a str) -> &'a str;
    /// Read a scalar literal back into a value.
    fn parse_literal(&self, text: &str) -> Option<Value>;

    /// Add `literal` as a new trailing argument of the call.
    fn append_argument(&self, line: &str, column: u32, literal: &str) -> Result<String, String>;
    /// Replace the trailing argument of the call with `literal`.
    fn replace_last_argument(&self, line: &str, column: u32, literal: &str)
    -> Result<String, String>;
    /// Replace a field-expansion call with one equality call per field,
    /// joined by `\n`.
    fn fan_out(&self, line: &str, column: u32, fields: &[FieldValue]) -> Result<String, String>;

    /// Literal for a string, raw when it spans lines.
    fn string(&self, value: &str) -> String {
        if value.contains('\n') {
            self.raw(value).unwrap_or_else(|| self.quoted(value))
        } else {
            self.quoted(value)
        }
    }

    /// Inverse of [`Dialect::string`] for quoted and raw literals.
    fn unquote(&self, literal: &str) -> Option<String> {
        match self.parse_literal(literal)? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }
}
