//! Bound values.
//!
//! Records expose their `#[db(..)]` fields as ordered `(column, value)`
//! pairs through [`Bindable`]. Sequence fields bind as an [`ArrayLiteral`]
//! because the target column is an array, not a scalar.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use tagq_core::{Record, Result, TagqError};

/// A value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(ArrayLiteral),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Array adapter, rendered as a PostgreSQL array literal (`{1,2,3}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArrayLiteral(pub Vec<SqlValue>);

impl ArrayLiteral {
    pub fn new(items: Vec<SqlValue>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[SqlValue] {
        &self.0
    }
}

impl fmt::Display for ArrayLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match item {
                SqlValue::Null => f.write_str("NULL")?,
                SqlValue::Bool(b) => f.write_str(if *b { "t" } else { "f" })?,
                SqlValue::Int(n) => write!(f, "{n}")?,
                SqlValue::Float(x) => write!(f, "{x}")?,
                SqlValue::Text(s) => {
                    f.write_str("\"")?;
                    for c in s.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                    f.write_str("\"")?;
                }
                SqlValue::Array(inner) => write!(f, "{inner}")?,
            }
        }
        f.write_str("}")
    }
}

/// Conversion of a field value into a [`SqlValue`].
pub trait ToSqlValue {
    fn to_sql_value(&self) -> SqlValue;
}

macro_rules! to_sql_int {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }
            }
        )*
    };
}

// Values outside the i64 range bind as their decimal text.
macro_rules! to_sql_wide_int {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(&self) -> SqlValue {
                    i64::try_from(*self).map_or_else(|_| SqlValue::Text(self.to_string()), SqlValue::Int)
                }
            }
        )*
    };
}

to_sql_int!(i8, i16, i32, i64, u8, u16, u32);
to_sql_wide_int!(i128, isize, u64, u128, usize);

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl ToSqlValue for char {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.to_string())
    }
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text((*self).to_string())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

impl<T: ToSqlValue> ToSqlValue for Box<T> {
    fn to_sql_value(&self) -> SqlValue {
        (**self).to_sql_value()
    }
}

impl<T: ToSqlValue> ToSqlValue for Vec<T> {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Array(ArrayLiteral(
            self.iter().map(ToSqlValue::to_sql_value).collect(),
        ))
    }
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(&self) -> SqlValue {
        self.clone()
    }
}

/// Records that can bind their `#[db(..)]` fields.
///
/// Implemented by `#[derive(Record)]`.
pub trait Bindable: Record {
    /// `(column, value)` pairs in declaration order.
    fn bind(&self) -> Vec<(&'static str, SqlValue)>;
}

/// Named values for one statement execution, in declaration order.
pub type BoundValues = IndexMap<String, SqlValue>;

/// Collects every `#[db(..)]` value of `record` by column name.
pub fn values_by_tag<T: Bindable>(record: &T) -> BoundValues {
    record
        .bind()
        .into_iter()
        .filter(|(column, _)| !column.is_empty())
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

/// Returns the value of the field tagged `#[db(tag)]`.
pub fn field_value_by_tag<T: Bindable>(record: &T, tag: &str) -> Result<SqlValue> {
    record
        .bind()
        .into_iter()
        .find(|(column, _)| !column.is_empty() && *column == tag)
        .map(|(_, value)| value)
        .ok_or_else(|| TagqError::field_not_found(T::NAME, tag))
}
