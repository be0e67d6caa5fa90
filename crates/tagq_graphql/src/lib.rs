//! GraphQL side of tagq.
//!
//! - `document`: renders a paginated query document from a record's
//!   `#[gql(..)]` tags
//! - `client`: request accumulator and a client over a pluggable transport

pub mod client;
pub mod document;

pub use client::{Client, ClientConfig, HttpTransport, Request, Transport};
pub use document::{build_query, render_selection, ROOT_DEPTH};
