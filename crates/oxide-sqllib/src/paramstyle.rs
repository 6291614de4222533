//! Placeholder convention detection.
//!
//! [`detect`] classifies a statement by the bind-parameter syntax it uses.
//! Single-quoted string literals are removed first so that `'?'` or
//! `'10:30'` inside constants are not mistaken for placeholders.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)'.*?'").expect("Invalid string literal regex"));

static NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[a-zA-Z]+").expect("Invalid named placeholder regex"));

static PYFORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%\(.*?\)s").expect("Invalid pyformat placeholder regex"));

/// A bind-parameter placeholder convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// Question mark: `WHERE id = ?`.
    Qmark,
    /// Numbered: `WHERE id = $1` or `WHERE id = :1`.
    Numeric,
    /// Named: `WHERE id = :id`.
    Named,
    /// printf-style: `WHERE id = %s`.
    Format,
    /// Named printf-style: `WHERE id = %(id)s`.
    Pyformat,
}

impl ParamStyle {
    /// Returns the conventional lowercase name of the style.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Qmark => "qmark",
            Self::Numeric => "numeric",
            Self::Named => "named",
            Self::Format => "format",
            Self::Pyformat => "pyformat",
        }
    }
}

impl fmt::Display for ParamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detects the placeholder convention used by `sql`.
///
/// Checks run in a fixed priority order and the first hit wins: qmark,
/// numeric, named, format, pyformat. Returns `None` when no placeholder
/// is found. Statements mixing several conventions are not rejected; they
/// report whichever style ranks first.
///
/// # Example
///
/// ```
/// use oxide_sqllib::paramstyle::{detect, ParamStyle};
///
/// assert_eq!(detect("select * from t where id = :name"), Some(ParamStyle::Named));
/// assert_eq!(detect("select * from t where name like '?'"), None);
/// ```
#[must_use]
pub fn detect(sql: &str) -> Option<ParamStyle> {
    let sql = STRING_LITERAL.replace_all(sql, "");

    if sql.contains('?') {
        Some(ParamStyle::Qmark)
    } else if sql.contains("$1") || sql.contains(":1") {
        Some(ParamStyle::Numeric)
    } else if NAMED.is_match(&sql) {
        Some(ParamStyle::Named)
    } else if sql.contains("%s") {
        Some(ParamStyle::Format)
    } else if PYFORMAT.is_match(&sql) {
        Some(ParamStyle::Pyformat)
    } else {
        None
    }
}
