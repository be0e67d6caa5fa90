//! tagq: queries derived from field tags.
//!
//! Annotate a struct once and get a paginated GraphQL query document and
//! INSERT / UPDATE statements out of it, plus a transactional upsert.
//!
//! ```ignore
//! use tagq::Record;
//!
//! #[derive(Record)]
//! pub struct Contract {
//!     #[db("id")]
//!     #[gql("id")]
//!     pub id: i64,
//!     #[db("name")]
//!     #[gql("name")]
//!     pub name: String,
//!     #[gql("units")]
//!     pub units: Vec<Unit>,
//! }
//!
//! #[derive(Record)]
//! pub struct Unit {
//!     #[gql("id")]
//!     pub id: i64,
//! }
//!
//! let query = tagq::graphql::build_query::<Contract>(Some("ContractFiltersInput"));
//! let insert = tagq::sql::build_insert::<Contract>("contracts");
//! let op = tagq::sql::upsert_row(&mut tx, &contract, "contracts", "id").await?;
//! ```

pub use tagq_core::{descriptor, error, reflect, scalar};
pub use tagq_graphql as graphql;
pub use tagq_sql as sql;

// Re-export the derive
pub use tagq_macros::Record;

// Re-exports for convenience
pub use tagq_core::{
    ErrorCode, FieldDescriptor, FieldKind, Record, Reflect, Result, Tag, TagqError,
};
pub use tagq_graphql::{build_query, Client, ClientConfig, Request};
pub use tagq_sql::{upsert_row, Bindable, Operation, Outcome, SqlValue, ToSqlValue, Transaction};
