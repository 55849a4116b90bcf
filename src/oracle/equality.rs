//! Actual-vs-expected equality over values and their literal forms.

use crate::syntax::Dialect;
use crate::value::canonical::canonicalize;
use crate::value::model::Value;

/// Which check accepted the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Structural,
    Literal,
    StringForm,
    Different,
}

impl Verdict {
    #[must_use]
    pub const fn is_equal(self) -> bool {
        !matches!(self, Self::Different)
    }
}

/// Decide whether `actual` satisfies `expected`.
///
/// 1. deep structural equality;
/// 2. equal canonical literals (`100_000` vs `100000`, `Some(1)` vs `1`);
/// 3. a string `expected` equal to the unquoted literal of a non-string `actual`.
#[must_use]
pub fn compare(actual: &Value, expected: &Value, dialect: &dyn Dialect) -> Verdict {
    if actual == expected {
        return Verdict::Structural;
    }

    let actual_literal = canonicalize(actual, None, dialect).ok();
    if let Some(actual_literal) = &actual_literal
        && canonicalize(expected, None, dialect).is_ok_and(|lit| lit == *actual_literal)
    {
        return Verdict::Literal;
    }

    if let (Value::String(text), Some(actual_literal)) = (expected, &actual_literal)
        && !actual.is_string()
    {
        let unquoted = dialect
            .unquote(actual_literal)
            .unwrap_or_else(|| actual_literal.clone());
        if *text == unquoted {
            return Verdict::StringForm;
        }
    }

    Verdict::Different
}

/// Boolean shorthand for [`compare`].
#[must_use]
pub fn equal(actual: &Value, expected: &Value, dialect: &dyn Dialect) -> bool {
    compare(actual, expected, dialect).is_equal()
}
