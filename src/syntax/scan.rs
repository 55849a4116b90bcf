//! Single-line scanner for Rust call expressions.
//!
//! Finds the parenthesis that closes a call opened at a known offset and the
//! top-level commas between them, skipping string, raw string, byte string
//! and char literals. A `//` comment or the end of the line before the
//! closing parenthesis means the call does not fit on one line.

#![allow(missing_docs)]

/// Byte offsets of one call on a source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSpan {
    /// Start of the call, including any path qualifier.
    pub start: usize,
    /// Start of the macro name (after any path qualifier).
    pub name_start: usize,
    pub name_end: usize,
    /// The opening `(`.
    pub open: usize,
    /// The matching `)`.
    pub close: usize,
    /// Commas directly inside the call's parentheses.
    pub commas: Vec<usize>,
}

impl CallSpan {
    /// Comma separating the trailing argument, ignoring a trailing `,)`.
    #[must_use]
    pub fn last_separator(&self, line: &str) -> Option<usize> {
        let mut commas = self.commas.iter().rev();
        let last = *commas.next()?;
        if line[last + 1..self.close].trim().is_empty() {
            commas.next().copied()
        } else {
            Some(last)
        }
    }

    /// Everything before the closing parenthesis, minus trailing blanks and a trailing comma.
    #[must_use]
    pub fn head<'a>(&self, line: &'a str) -> &'a str {
        let head = line[..self.close].trim_end();
        head.strip_suffix(',').map_or(head, str::trim_end)
    }

    /// The closing parenthesis and whatever follows it (`;`, comments).
    #[must_use]
    pub fn tail<'a>(&self, line: &'a str) -> &'a str {
        &line[self.close..]
    }
}

/// Scan from the byte after `open` to the matching `)`.
///
/// Returns the closing offset and the depth-one commas, or `None` when the
/// call is not closed on this line.
#[must_use]
pub fn find_close(line: &str, open: usize) -> Option<(usize, Vec<usize>)> {
    let bytes = line.as_bytes();
    let mut depth = 1usize;
    let mut commas = Vec::new();
    let mut i = open + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = skip_string(bytes, i)?,
            b'r' if !is_ident_byte(bytes, i.wrapping_sub(1)) || preceded_by_b(bytes, i) => {
                match skip_raw_string(bytes, i) {
                    Some(next) => i = next,
                    None if starts_raw_string(bytes, i) => return None,
                    None => i += 1,
                }
            }
            b'\'' => i = skip_char_or_lifetime(line, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => return None,
            b'(' | b'[' | b'{' => {
                depth += 1;
                i += 1;
            }
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth == 0 {
                    return (bytes[i] == b')').then_some((i, commas));
                }
                i += 1;
            }
            b',' => {
                if depth == 1 {
                    commas.push(i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn is_ident_byte(bytes: &[u8], idx: usize) -> bool {
    bytes
        .get(idx)
        .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

fn preceded_by_b(bytes: &[u8], idx: usize) -> bool {
    idx > 0 && bytes[idx - 1] == b'b' && !is_ident_byte(bytes, idx.wrapping_sub(2))
}

/// Offset just past the closing quote of a `"..."` literal starting at `start`.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn starts_raw_string(bytes: &[u8], start: usize) -> bool {
    let mut i = start + 1;
    while bytes.get(i) == Some(&b'#') {
        i += 1;
    }
    bytes.get(i) == Some(&b'"')
}

/// Offset just past a complete `r#"..."#` literal starting at `start`.
fn skip_raw_string(bytes: &[u8], start: usize) -> Option<usize> {
    if !starts_raw_string(bytes, start) {
        return None;
    }
    let mut i = start + 1;
    let mut hashes = 0;
    while bytes[i] == b'#' {
        hashes += 1;
        i += 1;
    }
    i += 1;
    while i < bytes.len() {
        if bytes[i] == b'"'
            && bytes.len() >= i + 1 + hashes
            && bytes[i + 1..i + 1 + hashes].iter().all(|b| *b == b'#')
        {
            return Some(i + 1 + hashes);
        }
        i += 1;
    }
    None
}

fn skip_char_or_lifetime(line: &str, start: usize) -> usize {
    let bytes = line.as_bytes();
    match bytes.get(start + 1) {
        Some(b'\\') => {
            let mut i = start + 2;
            while i < bytes.len() {
                if bytes[i] == b'\'' && i > start + 2 {
                    return i + 1;
                }
                i += 1;
            }
            bytes.len()
        }
        Some(_) => {
            // One scalar followed by a quote is a char literal, anything else a lifetime.
            let width = line[start + 1..].chars().next().map_or(1, char::len_utf8);
            if bytes.get(start + 1 + width) == Some(&b'\'') {
                start + 2 + width
            } else {
                start + 1
            }
        }
        None => start + 1,
    }
}
