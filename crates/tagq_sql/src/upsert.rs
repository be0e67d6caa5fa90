//! Insert-or-update inside a caller-supplied transaction.
//!
//! [`upsert_row`] reads the record's key, checks whether a row with that key
//! exists, then runs exactly one INSERT or UPDATE. The read and the write go
//! through the same transaction; isolation, locking and rollback belong to
//! the caller.
//!
//! Two transactions racing on the same fresh key can both see "not found"
//! and both insert. With a unique constraint on the key, one of them gets a
//! duplicate-key error from the driver, returned as `ErrorCode::Database`.

use async_trait::async_trait;
use std::fmt;
use tagq_core::{Result, TagqError};
use tracing::debug;

use crate::statement::{build_exists, build_insert, build_update};
use crate::value::{field_value_by_tag, values_by_tag, Bindable, BoundValues, SqlValue};

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Found(T),
    NotFound,
}

impl<T> Outcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

/// A result row, columns in select order.
pub type Row = Vec<SqlValue>;

/// An open transaction on the database driver.
#[async_trait]
pub trait Transaction: Send {
    /// Driver error, returned to callers as the source of an
    /// `ErrorCode::Database` error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a query and returns its first row, or `NotFound` for no rows.
    async fn fetch_optional(
        &mut self,
        statement: &str,
        params: &BoundValues,
    ) -> std::result::Result<Outcome<Row>, Self::Error>;

    /// Runs a statement and returns the number of affected rows.
    async fn execute(
        &mut self,
        statement: &str,
        params: &BoundValues,
    ) -> std::result::Result<u64, Self::Error>;
}

/// Which write an upsert performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inserts `record` into `table`.
pub async fn insert_row<X, T>(tx: &mut X, record: &T, table: &str) -> Result<u64>
where
    X: Transaction + ?Sized,
    T: Bindable,
{
    let statement = build_insert::<T>(table);
    let params = values_by_tag(record);
    debug!(table, statement = %statement, "inserting row");
    tx.execute(&statement, &params)
        .await
        .map_err(TagqError::database)
}

/// Updates the row of `table` whose `key` column matches `record`.
pub async fn update_row<X, T>(tx: &mut X, record: &T, table: &str, key: &str) -> Result<u64>
where
    X: Transaction + ?Sized,
    T: Bindable,
{
    let statement = build_update::<T>(table, key)?;
    let params = values_by_tag(record);
    debug!(table, key, statement = %statement, "updating row");
    tx.execute(&statement, &params)
        .await
        .map_err(TagqError::database)
}

/// Returns whether `table` has a row whose `key` column equals `value`.
///
/// No rows is `Ok(false)`; any driver error is returned as is.
pub async fn exists<X>(tx: &mut X, table: &str, key: &str, value: SqlValue) -> Result<bool>
where
    X: Transaction + ?Sized,
{
    let statement = build_exists(table, key);
    let mut params = BoundValues::new();
    params.insert(key.to_string(), value);

    let outcome = tx
        .fetch_optional(&statement, &params)
        .await
        .map_err(TagqError::database)?;
    debug!(table, key, found = outcome.is_found(), "existence check");
    Ok(outcome.is_found())
}

/// Inserts `record` if no row has its `key` value yet, updates it otherwise.
///
/// Runs one existence check and exactly one write.
pub async fn upsert_row<X, T>(tx: &mut X, record: &T, table: &str, key: &str) -> Result<Operation>
where
    X: Transaction + ?Sized,
    T: Bindable,
{
    let key_value = field_value_by_tag(record, key)?;

    if exists(tx, table, key, key_value).await? {
        update_row(tx, record, table, key).await?;
        return Ok(Operation::Update);
    }

    insert_row(tx, record, table).await?;
    Ok(Operation::Insert)
}
