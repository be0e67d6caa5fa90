//! SQL side of tagq.
//!
//! - `statement`: INSERT / UPDATE / existence-check text with `:column`
//!   placeholders, built from a record's `#[db(..)]` tags
//! - `value`: typed bound values and the PostgreSQL array-literal adapter
//! - `upsert`: insert-or-update inside a caller-supplied transaction

pub mod statement;
pub mod upsert;
pub mod value;

pub use statement::{build_exists, build_insert, build_update, columns};
pub use upsert::{exists, insert_row, update_row, upsert_row, Operation, Outcome, Row, Transaction};
pub use value::{
    field_value_by_tag, values_by_tag, ArrayLiteral, Bindable, BoundValues, SqlValue, ToSqlValue,
};
