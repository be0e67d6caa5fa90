//! GraphQL document builder.
//!
//! Builds a paginated query for a record type:
//!
//! ```text
//! query ($after: Int, $limit: Int, $filter: ContractFiltersInput!) {
//! 	Contract(after: $after, limit: $limit, filter: $filter) {
//! 		id
//! 		name
//! 		units {
//! 			id
//! 		}
//! 	}
//! }
//! ```
//!
//! The output is a pure function of the record type and the filter type
//! name, so callers may build once and reuse it.

use std::fmt::Write as _;
use tagq_core::{describe, FieldDescriptor, Record, Tag};

/// Depth of the root record's fields inside the document.
pub const ROOT_DEPTH: usize = 2;

const INDENT: char = '\t';

/// Builds the query document for `T`.
///
/// The document always declares `$after: Int` and `$limit: Int`; a non-empty
/// `filter_type` adds `$filter: <filter_type>!` and passes it to the root
/// selection.
pub fn build_query<T: Record>(filter_type: Option<&str>) -> String {
    let filter_type = filter_type.filter(|name| !name.is_empty());
    let (filter_param, filter_arg) = match filter_type {
        Some(name) => (format!(", $filter: {name}!"), ", filter: $filter"),
        None => (String::new(), ""),
    };

    let fields = describe::<T>(Tag::Gql, ROOT_DEPTH);
    tracing::trace!(root = T::NAME, fields = fields.len(), "building query document");

    format!(
        "query ($after: Int, $limit: Int{filter_param}) {{\n\
         {INDENT}{root}(after: $after, limit: $limit{filter_arg}) {{\n\
         {body}\n\
         {INDENT}}}\n\
         }}",
        root = T::NAME,
        body = render_selection(&fields),
    )
}

/// Renders a selection set, one line per leaf, one tab per depth unit.
///
/// Nested fields render as `name {`, their children, and a closing brace at
/// the same indentation as the name.
pub fn render_selection(fields: &[FieldDescriptor]) -> String {
    let mut output = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        render_field(&mut output, field);
    }
    output
}

fn render_field(output: &mut String, field: &FieldDescriptor) {
    let indent = indent(field.depth);
    if !field.kind.is_nested() {
        let _ = write!(output, "{indent}{}", field.name);
        return;
    }

    let _ = writeln!(output, "{indent}{} {{", field.name);
    if !field.children.is_empty() {
        output.push_str(&render_selection(&field.children));
        output.push('\n');
    }
    let _ = write!(output, "{indent}}}");
}

fn indent(depth: usize) -> String {
    std::iter::repeat(INDENT).take(depth).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagq_core::{describe_fields, DeclaredField, FieldKind, Reflect, TypeInfo, TypeKind};

    macro_rules! record {
        ($name:ident, [$(($ident:literal, $gql:expr, $ty:ty)),* $(,)?]) => {
            struct $name;

            impl Record for $name {
                const NAME: &'static str = stringify!($name);

                fn fields() -> Vec<DeclaredField> {
                    vec![$(DeclaredField {
                        ident: $ident,
                        gql: $gql,
                        db: None,
                        ty: Some(<$ty as Reflect>::type_info),
                    }),*]
                }
            }

            impl Reflect for $name {
                fn type_info() -> TypeInfo {
                    TypeInfo {
                        type_name: std::any::type_name::<Self>(),
                        kind: TypeKind::Composite(<Self as Record>::fields),
                    }
                }
            }
        };
    }

    record!(Unit, [("id", Some("id"), i64)]);
    record!(
        Contract,
        [
            ("id", Some("id"), i64),
            ("name", Some("name"), String),
            ("units", Some("units"), Vec<Unit>),
        ]
    );
    record!(Empty, [("scratch", None, i64)]);
    record!(NullBox, [("value", Some("value"), String), ("valid", Some("valid"), bool)]);
    record!(Owner, [("id", Some("id"), i64), ("secret", None, String)]);
    record!(
        Deep,
        [
            ("id", Some("id"), i64),
            ("owner", Some("owner"), Owner),
            ("note", Some("note"), NullBox),
            ("contracts", Some("contracts"), Vec<Contract>),
            ("cache", None, Vec<Contract>),
        ]
    );

    #[test]
    fn test_contract_selection_body() {
        let body = render_selection(&describe::<Contract>(Tag::Gql, 1));
        assert_eq!(body, "\tid\n\tname\n\tunits {\n\t\tid\n\t}");
    }

    #[test]
    fn test_contract_document() {
        let query = build_query::<Contract>(Some(""));
        let expected = "query ($after: Int, $limit: Int) {\n\
                        \tContract(after: $after, limit: $limit) {\n\
                        \t\tid\n\
                        \t\tname\n\
                        \t\tunits {\n\
                        \t\t\tid\n\
                        \t\t}\n\
                        \t}\n\
                        }";
        assert_eq!(query, expected);
        assert_eq!(query, build_query::<Contract>(None));
    }

    #[test]
    fn test_document_with_filter() {
        let query = build_query::<Unit>(Some("UnitFiltersInput"));
        assert_eq!(
            query,
            "query ($after: Int, $limit: Int, $filter: UnitFiltersInput!) {\n\
             \tUnit(after: $after, limit: $limit, filter: $filter) {\n\
             \t\tid\n\
             \t}\n\
             }"
        );
    }

    #[test]
    fn test_nested_blocks_and_ignored_fields() {
        let body = render_selection(&describe::<Deep>(Tag::Gql, 0));
        let expected = "id\n\
                        owner {\n\
                        \tid\n\
                        }\n\
                        note\n\
                        contracts {\n\
                        \tid\n\
                        \tname\n\
                        \tunits {\n\
                        \t\tid\n\
                        \t}\n\
                        }";
        assert_eq!(body, expected);
        assert!(!body.contains("secret"));
        assert!(!body.contains("cache"));
        assert!(!body.contains("value"));
    }

    #[test]
    fn test_nesting_depth_matches_indent() {
        let fields = describe::<Deep>(Tag::Gql, 3);
        let body = render_selection(&fields);
        let contracts = &fields[3];
        assert_eq!(contracts.kind, FieldKind::NestedList);
        assert!(body.contains("\n\t\t\tcontracts {\n"));
        assert!(body.contains("\n\t\t\t\tunits {\n\t\t\t\t\tid\n\t\t\t\t}\n\t\t\t}"));
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(render_selection(&describe::<Empty>(Tag::Gql, 1)), "");

        let fields = describe_fields(
            &[DeclaredField {
                ident: "empty",
                gql: Some("empty"),
                db: None,
                ty: Some(<Empty as Reflect>::type_info),
            }],
            Tag::Gql,
            1,
        );
        assert_eq!(render_selection(&fields), "\tempty {\n\t}");
    }
}
