//! SQL statement builder.
//!
//! Statements use `:column` placeholders, bound by name from
//! [`values_by_tag`](crate::value::values_by_tag). Rows are flat: only the
//! record's own `#[db(..)]` fields become columns.

use tagq_core::{describe, ErrorCode, Record, Result, Tag, TagqError};

/// Column names of `T` in declaration order.
pub fn columns<T: Record>() -> Vec<&'static str> {
    describe::<T>(Tag::Db, 0)
        .into_iter()
        .map(|field| field.name)
        .collect()
}

/// `INSERT INTO <table> (<cols>) VALUES (<placeholders>);`
pub fn build_insert<T: Record>(table: &str) -> String {
    let columns = columns::<T>();
    let placeholders: Vec<String> = columns.iter().map(|column| format!(":{column}")).collect();

    format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// `UPDATE <table> SET <col> = :<col>, ... WHERE <key> = :<key>;`
///
/// Every column except `key` is assigned. Fails with `FieldNotFound` when no
/// field of `T` is tagged `key`, or when `key` is its only column and the
/// `SET` list would be empty.
pub fn build_update<T: Record>(table: &str, key: &str) -> Result<String> {
    let columns = columns::<T>();
    if !columns.iter().any(|column| *column == key) {
        return Err(TagqError::field_not_found(T::NAME, key));
    }

    let assignments: Vec<String> = columns
        .iter()
        .filter(|column| **column != key)
        .map(|column| format!("{column} = :{column}"))
        .collect();
    if assignments.is_empty() {
        return Err(TagqError::new(
            ErrorCode::FieldNotFound,
            format!("{} has no column to update besides key {key:?}", T::NAME),
        ));
    }

    Ok(format!(
        "UPDATE {table} SET {} WHERE {key} = :{key};",
        assignments.join(", ")
    ))
}

/// Existence check for a single key value, bound as `:<key>`.
pub fn build_exists(table: &str, key: &str) -> String {
    format!("SELECT 1 FROM {table} WHERE {key} = :{key} LIMIT 1;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::tests::Contract;
    use tagq_core::{DeclaredField, Reflect};

    #[test]
    fn test_columns_skip_untagged() {
        assert_eq!(columns::<Contract>(), ["id", "name", "regions", "closed_at"]);
    }

    #[test]
    fn test_build_insert() {
        insta::assert_snapshot!(
            build_insert::<Contract>("contracts"),
            @"INSERT INTO contracts (id, name, regions, closed_at) VALUES (:id, :name, :regions, :closed_at);"
        );
    }

    #[test]
    fn test_build_update() {
        insta::assert_snapshot!(
            build_update::<Contract>("contracts", "id").unwrap(),
            @"UPDATE contracts SET name = :name, regions = :regions, closed_at = :closed_at WHERE id = :id;"
        );
    }

    #[test]
    fn test_build_update_unknown_key() {
        let err = build_update::<Contract>("contracts", "uuid").unwrap_err();
        assert_eq!(err.code, ErrorCode::FieldNotFound);

        // Untagged fields are not columns either.
        assert!(build_update::<Contract>("contracts", "scratch").is_err());
    }

    /// A row that is nothing but its key.
    struct Marker;

    impl Record for Marker {
        const NAME: &'static str = "Marker";

        fn fields() -> Vec<DeclaredField> {
            vec![DeclaredField {
                ident: "id",
                gql: Some("id"),
                db: Some("id"),
                ty: Some(<i64 as Reflect>::type_info),
            }]
        }
    }

    #[test]
    fn test_build_update_key_only_record() {
        assert_eq!(columns::<Marker>(), ["id"]);
        let err = build_update::<Marker>("markers", "id").unwrap_err();
        assert_eq!(err.code, ErrorCode::FieldNotFound);
        assert!(err.message.contains("Marker"));
    }

    #[test]
    fn test_build_exists() {
        insta::assert_snapshot!(
            build_exists("contracts", "id"),
            @"SELECT 1 FROM contracts WHERE id = :id LIMIT 1;"
        );
    }
}
