//! Rust spelling of literals and of `expect!`-family call lines.

#![allow(missing_docs)]

use std::fmt::Write as _;

use regex::Regex;

use crate::core::errors::{ExpectError, Result};
use crate::syntax::scan::{CallSpan, find_close};
use crate::syntax::{Dialect, FieldValue};
use crate::value::model::Value;

/// Macro names recognized on a call line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNames {
    pub equal: String,
    pub json: String,
    pub fields: String,
}

impl Default for CallNames {
    fn default() -> Self {
        Self {
            equal: "expect".to_string(),
            json: "expect_json".to_string(),
            fields: "expect_fields".to_string(),
        }
    }
}

/// Rust literal and macro-call dialect.
#[derive(Debug, Clone)]
pub struct RustDialect {
    names: CallNames,
    opener: Regex,
}

impl RustDialect {
    /// Dialect for this crate's own `expect!`, `expect_json!` and `expect_fields!`.
    pub fn new() -> Result<Self> {
        Self::with_call_names(CallNames::default())
    }

    /// Dialect for re-exported or renamed macros.
    pub fn with_call_names(names: CallNames) -> Result<Self> {
        let mut alternatives = [&names.fields, &names.json, &names.equal]
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>();
        // Longest first so `expect` never shadows `expect_fields`.
        alternatives.sort_by_key(|alt| std::cmp::Reverse(alt.len()));
        let pattern = format!(
            r"\b(?:[A-Za-z_][A-Za-z0-9_]*::)*({})!\s*\(",
            alternatives.join("|")
        );
        let opener = Regex::new(&pattern).map_err(|err| ExpectError::InvalidConfig {
            details: format!("invalid call name pattern {pattern:?}: {err}"),
        })?;
        Ok(Self { names, opener })
    }

    #[must_use]
    pub fn call_names(&self) -> &CallNames {
        &self.names
    }

    /// Locate the call recorded at `column` on `line`.
    fn locate(&self, line: &str, column: u32) -> std::result::Result<CallSpan, String> {
        let target = column_to_byte(line, column);
        let mut best: Option<(usize, CallSpan)> = None;

        for caps in self.opener.captures_iter(line) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let open = whole.end() - 1;
            let Some((close, commas)) = find_close(line, open) else {
                continue;
            };
            let distance = target.map_or(0, |t| whole.start().abs_diff(t));
            if best.as_ref().is_none_or(|(d, _)| distance < *d) {
                best = Some((
                    distance,
                    CallSpan {
                        start: whole.start(),
                        name_start: name.start(),
                        name_end: name.end(),
                        open,
                        close,
                        commas,
                    },
                ));
            }
        }

        best.map(|(_, span)| span).ok_or_else(|| {
            if self.opener.is_match(line) {
                format!("call does not close on this line: {}", line.trim())
            } else {
                format!("no expect call found on line: {}", line.trim())
            }
        })
    }
}

impl Dialect for RustDialect {
    fn nil(&self) -> String {
        "None::<()>".to_string()
    }

    fn boolean(&self, value: bool) -> String {
        value.to_string()
    }

    fn integer(&self, value: i128) -> String {
        value.to_string()
    }

    fn typed_integer(&self, value: i128) -> String {
        if i32::try_from(value).is_ok() {
            return value.to_string();
        }
        let suffix = if i64::try_from(value).is_ok() {
            "i64"
        } else if u64::try_from(value).is_ok() {
            "u64"
        } else {
            "i128"
        };
        format!("{value}_{suffix}")
    }

    fn float(&self, value: f64) -> String {
        if value.is_nan() {
            return "f64::NAN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 {
                "f64::INFINITY".to_string()
            } else {
                "f64::NEG_INFINITY".to_string()
            };
        }
        // f64's Display never switches to exponent notation.
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{text}.0")
        }
    }

    fn quoted(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('"');
        for ch in value.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\0' => out.push_str("\\0"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{{{:x}}}", u32::from(c));
                }
                c => out.push(c),
            }
        }
        out.push('"');
        out
    }

    fn raw(&self, value: &str) -> Option<String> {
        if value.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
            return None;
        }
        let hashes = "#".repeat(raw_hash_count(value));
        Some(format!("r{hashes}\"{value}\"{hashes}"))
    }

    fn named(&self, qualifier: &str, type_name: &str, inner: &str) -> String {
        format!("{qualifier}{type_name}({inner})")
    }

    fn qualifier(&self, type_module: &str, caller_module: Option<&str>) -> String {
        let Some(caller) = caller_module else {
            return String::new();
        };
        // Function-local types carry the enclosing fn in their path.
        let local = type_module
            .strip_prefix(caller)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"));
        if type_module.is_empty() || local {
            return String::new();
        }
        let type_crate = type_module.split("::").next().unwrap_or_default();
        let caller_crate = caller.split("::").next().unwrap_or_default();
        if type_crate == caller_crate {
            match type_module.split_once("::") {
                Some((_, rest)) => format!("crate::{rest}::"),
                None => "crate::".to_string(),
            }
        } else {
            format!("{type_module}::")
        }
    }

    fn field_suffix(&self, name: &str) -> String {
        format!(".{name}")
    }

    fn index_suffix(&self, key_literal: &str, key_is_string: bool) -> String {
        if key_is_string {
            format!("[{key_literal}]")
        } else {
            format!("[&{key_literal}]")
        }
    }

    fn json_literal(&self, json: &str) -> String {
        let body = format!("\n{json}");
        self.raw(&body).unwrap_or_else(|| self.quoted(&body))
    }

    fn strip_raw_delimiters<'a>(&self, text: &'a str) -> &'a str {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('r') else {
            return text;
        };
        let hashes = rest.len() - rest.trim_start_matches('#').len();
        let open = &rest[hashes..];
        let Some(body) = open.strip_prefix('"') else {
            return text;
        };
        let close = format!("\"{}", "#".repeat(hashes));
        body.strip_suffix(close.as_str()).unwrap_or(text)
    }

    fn parse_literal(&self, text: &str) -> Option<Value> {
        let text = text.trim();
        if text == "None" || (text.starts_with("None::<") && text.ends_with('>')) {
            return Some(Value::Nil);
        }
        match text {
            "true" => return Some(Value::Bool(true)),
            "false" => return Some(Value::Bool(false)),
            "f64::NAN" => return Some(Value::Float(f64::NAN)),
            "f64::INFINITY" => return Some(Value::Float(f64::INFINITY)),
            "f64::NEG_INFINITY" => return Some(Value::Float(f64::NEG_INFINITY)),
            _ => {}
        }
        if text.starts_with('"') {
            return parse_quoted(text).map(Value::String);
        }
        if text.starts_with('r') {
            let stripped = self.strip_raw_delimiters(text);
            return (stripped.len() != text.len()).then(|| Value::String(stripped.to_string()));
        }
        let digits: String = text.chars().filter(|c| *c != '_').collect();
        let (number, suffix) = split_numeric_suffix(&digits);
        let float_suffix = suffix.is_some_and(|s| s.starts_with('f'));
        if !float_suffix && let Ok(int) = number.parse::<i128>() {
            return Some(Value::Integer(int));
        }
        if (float_suffix || number.contains(['.', 'e', 'E']))
            && let Ok(float) = number.parse::<f64>()
        {
            return Some(Value::Float(float));
        }
        None
    }

    fn append_argument(
        &self,
        line: &str,
        column: u32,
        literal: &str,
    ) -> std::result::Result<String, String> {
        let span = self.locate(line, column)?;
        Ok(format!("{}, {literal}{}", span.head(line), span.tail(line)))
    }

    fn replace_last_argument(
        &self,
        line: &str,
        column: u32,
        literal: &str,
    ) -> std::result::Result<String, String> {
        let span = self.locate(line, column)?;
        let Some(comma) = span.last_separator(line) else {
            return Err(format!(
                "no comma before a trailing expected value: {}",
                line.trim()
            ));
        };
        Ok(format!("{} {literal}{}", &line[..=comma], span.tail(line)))
    }

    fn fan_out(
        &self,
        line: &str,
        column: u32,
        fields: &[FieldValue],
    ) -> std::result::Result<String, String> {
        let Some(last) = fields.len().checked_sub(1) else {
            return Err("field expansion produced no values".to_string());
        };
        let span = self.locate(line, column)?;
        if line[span.name_start..span.name_end] != self.names.fields {
            return Err(format!(
                "expected a {}! call: {}",
                self.names.fields,
                line.trim()
            ));
        }
        // Past the closing `)`: an optional `;`, then whatever else the line holds.
        let after = &span.tail(line)[1..];
        let (terminator, rest) = match after.strip_prefix(';') {
            Some(rest) => (";", rest),
            None => ("", after),
        };
        if last > 0 && terminator.is_empty() {
            return Err(format!(
                "{}! must be a statement ending in `;` to expand: {}",
                self.names.fields,
                line.trim()
            ));
        }

        let call = format!(
            "{}{}{}",
            &line[span.start..span.name_start],
            self.names.equal,
            &span.head(line)[span.name_end..]
        );
        let indent = &line[..line.len() - line.trim_start().len()];
        let lines: Vec<String> = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let lead = if idx == 0 { &line[..span.start] } else { indent };
                let trailer = if idx == last { rest } else { "" };
                format!(
                    "{lead}{call}{}, {}){terminator}{trailer}",
                    field.suffix, field.literal
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

const NUMERIC_SUFFIXES: [&str; 14] = [
    "i128", "u128", "isize", "usize", "i16", "i32", "i64", "u16", "u32", "u64", "i8", "u8",
    "f32", "f64",
];

/// Split a type suffix such as `i64` off a numeric literal with its `_` removed.
fn split_numeric_suffix(digits: &str) -> (&str, Option<&'static str>) {
    NUMERIC_SUFFIXES
        .iter()
        .find_map(|suffix| {
            let number = digits.strip_suffix(suffix)?;
            number
                .ends_with(|c: char| c.is_ascii_digit())
                .then_some((number, Some(*suffix)))
        })
        .unwrap_or((digits, None))
}

/// Smallest hash count (at least one) whose closing delimiter is absent from `value`.
fn raw_hash_count(value: &str) -> usize {
    let bytes = value.as_bytes();
    let mut needed = 1;
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'"' {
            let run = bytes[idx + 1..].iter().take_while(|b| **b == b'#').count();
            needed = needed.max(run + 1);
        }
    }
    needed
}

/// Byte offset of a 1-based character column, `None` for column 0.
fn column_to_byte(line: &str, column: u32) -> Option<usize> {
    let column = usize::try_from(column).ok()?.checked_sub(1)?;
    Some(
        line.char_indices()
            .nth(column)
            .map_or(line.len(), |(idx, _)| idx),
    )
}

fn parse_quoted(text: &str) -> Option<String> {
    let body = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return None,
            '\\' => match chars.next()? {
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                'u' => {
                    if chars.next()? != '{' {
                        return None;
                    }
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    let code = u32::from_str_radix(&hex, 16).ok()?;
                    out.push(char::from_u32(code)?);
                }
                _ => return None,
            },
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dialect() -> RustDialect {
        RustDialect::new().expect("default call names compile")
    }

    #[test]
    fn scalar_literals() {
        let d = dialect();
        assert_eq!(d.nil(), "None::<()>");
        assert_eq!(d.boolean(true), "true");
        assert_eq!(d.integer(-100_000), "-100000");
        assert_eq!(d.float(1.5), "1.5");
        assert_eq!(d.float(2.0), "2.0");
        assert_eq!(d.float(1e21), "1000000000000000000000.0");
        assert_eq!(d.float(f64::NEG_INFINITY), "f64::NEG_INFINITY");
    }

    #[test]
    fn typed_integer_suffixes_values_outside_i32() {
        let d = dialect();
        assert_eq!(d.typed_integer(-2_147_483_648), "-2147483648");
        assert_eq!(d.typed_integer(2_147_483_648), "2147483648_i64");
        assert_eq!(d.typed_integer(-3_000_000_000), "-3000000000_i64");
        assert_eq!(
            d.typed_integer(i128::from(u64::MAX)),
            "18446744073709551615_u64"
        );
        assert_eq!(
            d.typed_integer(i128::from(u64::MAX) + 1),
            "18446744073709551616_i128"
        );
        assert_eq!(d.integer(2_147_483_648), "2147483648");
    }

    #[test]
    fn quoted_escapes_quotes_and_backslashes() {
        let d = dialect();
        assert_eq!(d.quoted(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
        assert_eq!(d.quoted("a\u{7}b"), r#""a\u{7}b""#);
    }

    #[test]
    fn multi_line_strings_go_raw_with_enough_hashes() {
        let d = dialect();
        assert_eq!(d.string("a\nb"), "r#\"a\nb\"#");
        assert_eq!(d.string("x\"#\ny"), "r##\"x\"#\ny\"##");
        // Carriage returns cannot live in raw literals.
        assert_eq!(d.string("a\r\nb"), r#""a\r\nb""#);
    }

    #[test]
    fn qualifier_rules() {
        let d = dialect();
        assert_eq!(d.qualifier("app::ids", Some("app::ids")), "");
        assert_eq!(d.qualifier("app::ids", None), "");
        assert_eq!(d.qualifier("app::ids", Some("app::tests")), "crate::ids::");
        assert_eq!(d.qualifier("app", Some("app::tests")), "crate::");
        assert_eq!(d.qualifier("other::ids", Some("app")), "other::ids::");
        // A type declared inside a function of the caller's module.
        assert_eq!(d.qualifier("app::tests::records_ids", Some("app::tests")), "");
        assert_eq!(d.qualifier("app::tests_more", Some("app::tests")), "crate::tests_more::");
    }

    #[test]
    fn strip_raw_delimiters_removes_one_layer() {
        let d = dialect();
        assert_eq!(d.strip_raw_delimiters(" r#\"{}\"# "), "{}");
        assert_eq!(d.strip_raw_delimiters("r##\"r#\"x\"#\"##"), "r#\"x\"#");
        assert_eq!(d.strip_raw_delimiters("{}"), "{}");
    }

    #[test]
    fn parse_literal_reads_digit_groups() {
        let d = dialect();
        assert_eq!(d.parse_literal("100_000"), Some(Value::Integer(100_000)));
        assert_eq!(d.parse_literal("-2.50"), Some(Value::Float(-2.5)));
        assert_eq!(d.parse_literal("None"), Some(Value::Nil));
        assert_eq!(d.parse_literal("None::<()>"), Some(Value::Nil));
    }

    #[test]
    fn parse_literal_accepts_type_suffixes() {
        let d = dialect();
        assert_eq!(
            d.parse_literal("1700000000000_i64"),
            Some(Value::Integer(1_700_000_000_000))
        );
        assert_eq!(d.parse_literal("7u8"), Some(Value::Integer(7)));
        assert_eq!(d.parse_literal("2_f32"), Some(Value::Float(2.0)));
        assert_eq!(d.parse_literal("1.5f64"), Some(Value::Float(1.5)));
        assert_eq!(d.parse_literal("i64"), None);
        assert_eq!(d.parse_literal("Person { }"), None);
    }

    #[test]
    fn append_adds_trailing_argument() {
        let d = dialect();
        let out = d.append_argument("    expect!(1);", 5, "1").unwrap();
        assert_eq!(out, "    expect!(1, 1);");
        let out = d
            .append_argument("    expect!(x); // keep me", 0, "\"a\"")
            .unwrap();
        assert_eq!(out, "    expect!(x, \"a\"); // keep me");
    }

    #[test]
    fn append_picks_call_nearest_the_column() {
        let d = dialect();
        let line = "expect!(a); expect!(b);";
        assert_eq!(
            d.append_argument(line, 13, "2").unwrap(),
            "expect!(a); expect!(b, 2);"
        );
        assert_eq!(
            d.append_argument(line, 1, "1").unwrap(),
            "expect!(a, 1); expect!(b);"
        );
    }

    #[test]
    fn append_rejects_open_call() {
        let d = dialect();
        let err = d.append_argument("expect!(x,", 0, "1").unwrap_err();
        assert!(err.contains("does not close"), "{err}");
        let err = d.append_argument("let x = 1;", 0, "1").unwrap_err();
        assert!(err.contains("no expect call"), "{err}");
    }

    #[test]
    fn replace_targets_last_top_level_argument() {
        let d = dialect();
        let out = d
            .replace_last_argument(r#"expect!(s, "a, b");"#, 0, r#""c""#)
            .unwrap();
        assert_eq!(out, r#"expect!(s, "c");"#);
        let err = d.replace_last_argument("expect!(s);", 0, "1").unwrap_err();
        assert!(err.contains("no comma"), "{err}");
    }

    #[test]
    fn fan_out_rewrites_call_name_and_subject() {
        let d = dialect();
        let fields = vec![
            FieldValue {
                suffix: ".a".into(),
                literal: "1".into(),
            },
            FieldValue {
                suffix: ".b".into(),
                literal: "\"x\"".into(),
            },
        ];
        let out = d
            .fan_out("    expect_patch::expect_fields!(item);", 0, &fields)
            .unwrap();
        assert_eq!(
            out,
            "    expect_patch::expect!(item.a, 1);\n    expect_patch::expect!(item.b, \"x\");"
        );
    }

    #[test]
    fn fan_out_keeps_code_before_the_call_on_the_first_line() {
        let d = dialect();
        let fields = vec![
            FieldValue {
                suffix: ".a".into(),
                literal: "1".into(),
            },
            FieldValue {
                suffix: ".b".into(),
                literal: "2".into(),
            },
        ];
        let out = d
            .fan_out("    let x = f(); expect_fields!(x); // pair", 0, &fields)
            .unwrap();
        assert_eq!(
            out,
            "    let x = f(); expect!(x.a, 1);\n    expect!(x.b, 2); // pair"
        );
    }

    #[test]
    fn fan_out_of_several_fields_needs_a_statement() {
        let d = dialect();
        let fields = vec![
            FieldValue {
                suffix: ".a".into(),
                literal: "1".into(),
            },
            FieldValue {
                suffix: ".b".into(),
                literal: "2".into(),
            },
        ];
        let err = d.fan_out("run(expect_fields!(x))", 0, &fields).unwrap_err();
        assert!(err.contains("statement"), "{err}");
    }

    #[test]
    fn fan_out_requires_fields_call() {
        let d = dialect();
        let fields = vec![FieldValue {
            suffix: String::new(),
            literal: "1".into(),
        }];
        assert!(d.fan_out("expect!(x);", 0, &fields).is_err());
    }

    proptest! {
        #[test]
        fn string_literals_reparse(text in any::<String>()) {
            let d = dialect();
            let literal = d.string(&text);
            prop_assert_eq!(d.parse_literal(&literal), Some(Value::String(text)));
        }

        #[test]
        fn integer_literals_reparse(value in any::<i64>()) {
            let d = dialect();
            let literal = d.typed_integer(i128::from(value));
            prop_assert_eq!(d.parse_literal(&literal), Some(Value::Integer(i128::from(value))));
        }

        #[test]
        fn float_literals_reparse(value in -1.0e15f64..1.0e15f64) {
            let d = dialect();
            let literal = d.float(value);
            prop_assert!(!literal.contains('e'));
            prop_assert_eq!(d.parse_literal(&literal), Some(Value::Float(value)));
        }

        #[test]
        fn bool_literals_reparse(value in any::<bool>()) {
            let d = dialect();
            prop_assert_eq!(d.parse_literal(&d.boolean(value)), Some(Value::Bool(value)));
        }
    }
}
