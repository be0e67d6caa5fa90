//! Core types for tagq.
//!
//! This crate provides the pieces shared by the GraphQL and SQL builders:
//! - `reflect`: per-type field tables produced by `#[derive(Record)]`
//! - `descriptor`: field classification and descriptor trees
//! - `error`: typed error codes

pub mod descriptor;
pub mod error;
pub mod reflect;

pub use descriptor::{
    classify, describe, describe_fields, field_kind, FieldDescriptor, FieldKind,
};
pub use error::{ErrorCode, Result, TagqError};
pub use reflect::{is_optional_wrapper, DeclaredField, Record, Reflect, Tag, TypeInfo, TypeKind};
