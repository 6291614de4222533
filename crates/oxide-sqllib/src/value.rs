//! Bind values, parameters and result rows.
//!
//! Operations never interpret their SQL; they hand the values collected
//! here to the connection, which binds them in whatever placeholder
//! convention the statement uses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A SQL value passed as a bind parameter or read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns whether this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! int_to_sql_value {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )*
    };
}

int_to_sql_value!(i8, i16, i32, i64, u8, u16, u32);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

/// A result row: column values in select-list order.
pub type Row = Vec<SqlValue>;

/// Bind parameters for one invocation.
///
/// Positional values bind in order; named values bind by placeholder name
/// (without the leading `:`, `@` or `$`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    positional: Vec<SqlValue>,
    named: BTreeMap<String, SqlValue>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            positional: Vec::new(),
            named: BTreeMap::new(),
        }
    }

    /// Appends a positional value.
    #[must_use]
    pub fn bind(mut self, value: impl ToSqlValue) -> Self {
        self.positional.push(value.to_sql_value());
        self
    }

    /// Sets a named value, replacing any earlier value for the same name.
    #[must_use]
    pub fn bind_named(mut self, name: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.named.insert(name.into(), value.to_sql_value());
        self
    }

    /// Returns the positional values.
    #[must_use]
    pub fn positional(&self) -> &[SqlValue] {
        &self.positional
    }

    /// Returns the named values, ordered by name.
    #[must_use]
    pub const fn named(&self) -> &BTreeMap<String, SqlValue> {
        &self.named
    }

    /// Returns whether no values were supplied at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

impl From<Vec<SqlValue>> for Params {
    fn from(positional: Vec<SqlValue>) -> Self {
        Self {
            positional,
            named: BTreeMap::new(),
        }
    }
}

impl From<BTreeMap<String, SqlValue>> for Params {
    fn from(named: BTreeMap<String, SqlValue>) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }
}

/// Builds positional [`Params`](crate::Params) from a list of values.
///
/// ```rust
/// use oxide_sqllib::{params, SqlValue};
///
/// let p = params![1, "hello", None::<i64>];
/// assert_eq!(p.positional()[1], SqlValue::Text("hello".into()));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Params::new()$(.bind($value))+
    };
}

/// Builds named [`Params`](crate::Params) from `name => value` pairs.
///
/// ```rust
/// use oxide_sqllib::{named_params, SqlValue};
///
/// let p = named_params! { "id" => 7 };
/// assert_eq!(p.named()["id"], SqlValue::Int(7));
/// ```
#[macro_export]
macro_rules! named_params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.bind_named($name, $value))+
    };
}
