//! Field reflector.
//!
//! Walks a record's declared fields and turns the ones carrying the
//! requested tag into an ordered [`FieldDescriptor`] tree.

use crate::reflect::{DeclaredField, Record, Tag, TypeInfo, TypeKind};

/// How a field renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A leaf value.
    Scalar,
    /// A nested record, rendered as a block.
    NestedSingle,
    /// A sequence of records, rendered as a block of the element's fields.
    NestedList,
    /// An optional-wrapper leaf, never expanded.
    OptionalScalar,
    /// A field without the requested tag.
    Ignored,
}

impl FieldKind {
    /// Returns true for kinds that render as a single line.
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar | Self::OptionalScalar)
    }

    /// Returns true for kinds that render as a block with children.
    pub const fn is_nested(&self) -> bool {
        matches!(self, Self::NestedSingle | Self::NestedList)
    }
}

/// A tagged field, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The tag value: GraphQL selection name or SQL column.
    pub name: &'static str,
    pub kind: FieldKind,
    /// Indentation level. Has no meaning beyond formatting.
    pub depth: usize,
    /// Tagged fields of the nested record; empty for leaves.
    pub children: Vec<FieldDescriptor>,
}

impl FieldDescriptor {
    /// Creates a leaf descriptor.
    pub fn leaf(name: &'static str, kind: FieldKind, depth: usize) -> Self {
        Self {
            name,
            kind,
            depth,
            children: Vec::new(),
        }
    }
}

/// Classifies a field type.
///
/// Rules, in order: optional wrappers are leaves whatever their shape;
/// sequences of (non-wrapper) records are lists; (non-wrapper) records are
/// singles; everything else is a scalar.
pub fn classify(info: &TypeInfo) -> FieldKind {
    if info.is_optional_wrapper() {
        return FieldKind::OptionalScalar;
    }

    match info.kind {
        TypeKind::Sequence(elem) => {
            let elem = elem();
            if elem.is_composite() && !elem.is_optional_wrapper() {
                FieldKind::NestedList
            } else {
                FieldKind::Scalar
            }
        }
        TypeKind::Composite(_) => FieldKind::NestedSingle,
        TypeKind::Scalar => FieldKind::Scalar,
    }
}

/// Describes the fields of `T` carrying `tag`.
pub fn describe<T: Record>(tag: Tag, depth: usize) -> Vec<FieldDescriptor> {
    describe_fields(&T::fields(), tag, depth)
}

/// Describes an explicit declared-field table.
///
/// Untagged fields are skipped, so they never show up in output, not even
/// as an empty block.
pub fn describe_fields(fields: &[DeclaredField], tag: Tag, depth: usize) -> Vec<FieldDescriptor> {
    fields
        .iter()
        .filter_map(|field| describe_field(field, tag, depth))
        .collect()
}

/// Kind of a single declared field under `tag`.
pub fn field_kind(field: &DeclaredField, tag: Tag) -> FieldKind {
    if field.tag(tag).is_none() {
        return FieldKind::Ignored;
    }
    field.type_info().as_ref().map_or(FieldKind::Scalar, classify)
}

fn describe_field(field: &DeclaredField, tag: Tag, depth: usize) -> Option<FieldDescriptor> {
    let name = field.tag(tag)?;
    let kind = field_kind(field, tag);
    let Some(info) = field.type_info() else {
        return Some(FieldDescriptor::leaf(name, kind, depth));
    };

    let children = match (kind, info.kind) {
        (FieldKind::NestedSingle, TypeKind::Composite(fields)) => {
            describe_fields(&fields(), tag, depth + 1)
        }
        (FieldKind::NestedList, TypeKind::Sequence(elem)) => match elem().kind {
            TypeKind::Composite(fields) => describe_fields(&fields(), tag, depth + 1),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    Some(FieldDescriptor {
        name,
        kind,
        depth,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Reflect;

    struct Unit;

    impl Record for Unit {
        const NAME: &'static str = "Unit";

        fn fields() -> Vec<DeclaredField> {
            vec![
                DeclaredField {
                    ident: "id",
                    gql: Some("id"),
                    db: None,
                    ty: Some(<i64 as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "scratch",
                    gql: None,
                    db: None,
                    ty: None,
                },
            ]
        }
    }

    impl Reflect for Unit {
        fn type_info() -> TypeInfo {
            TypeInfo {
                type_name: std::any::type_name::<Self>(),
                kind: TypeKind::Composite(<Self as Record>::fields),
            }
        }
    }

    // Composite, but named by the wrapper convention.
    struct NullUnit;

    impl Record for NullUnit {
        const NAME: &'static str = "NullUnit";

        fn fields() -> Vec<DeclaredField> {
            vec![DeclaredField {
                ident: "valid",
                gql: Some("valid"),
                db: None,
                ty: Some(<bool as Reflect>::type_info),
            }]
        }
    }

    impl Reflect for NullUnit {
        fn type_info() -> TypeInfo {
            TypeInfo {
                type_name: std::any::type_name::<Self>(),
                kind: TypeKind::Composite(<Self as Record>::fields),
            }
        }
    }

    struct Contract;

    impl Record for Contract {
        const NAME: &'static str = "Contract";

        fn fields() -> Vec<DeclaredField> {
            vec![
                DeclaredField {
                    ident: "id",
                    gql: Some("id"),
                    db: Some("id"),
                    ty: Some(<i64 as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "name",
                    gql: Some("name"),
                    db: Some("name"),
                    ty: Some(<String as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "units",
                    gql: Some("units"),
                    db: None,
                    ty: Some(<Vec<Unit> as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "owner",
                    gql: Some("owner"),
                    db: None,
                    ty: Some(<Unit as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "note",
                    gql: Some("note"),
                    db: None,
                    ty: Some(<NullUnit as Reflect>::type_info),
                },
                DeclaredField {
                    ident: "tags",
                    gql: Some("tags"),
                    db: Some("tags"),
                    ty: Some(<Vec<String> as Reflect>::type_info),
                },
            ]
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&i64::type_info()), FieldKind::Scalar);
        assert_eq!(classify(&Vec::<String>::type_info()), FieldKind::Scalar);
        assert_eq!(classify(&Unit::type_info()), FieldKind::NestedSingle);
        assert_eq!(classify(&Vec::<Unit>::type_info()), FieldKind::NestedList);
        assert_eq!(classify(&NullUnit::type_info()), FieldKind::OptionalScalar);
        assert_eq!(classify(&Vec::<NullUnit>::type_info()), FieldKind::Scalar);
        assert_eq!(classify(&Option::<i64>::type_info()), FieldKind::OptionalScalar);
    }

    #[test]
    fn test_describe_gql_tree() {
        let fields = describe::<Contract>(Tag::Gql, 1);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["id", "name", "units", "owner", "note", "tags"]);

        let units = &fields[2];
        assert_eq!(units.kind, FieldKind::NestedList);
        assert_eq!(units.depth, 1);
        assert_eq!(units.children, [FieldDescriptor::leaf("id", FieldKind::Scalar, 2)]);

        assert_eq!(fields[3].kind, FieldKind::NestedSingle);
        assert_eq!(fields[3].children.len(), 1);

        let note = &fields[4];
        assert_eq!(note.kind, FieldKind::OptionalScalar);
        assert!(note.children.is_empty());
    }

    #[test]
    fn test_describe_db_is_flat() {
        let fields = describe::<Contract>(Tag::Db, 0);
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["id", "name", "tags"]);
        assert!(fields.iter().all(|f| f.kind.is_leaf() && f.depth == 0));
    }

    #[test]
    fn test_field_kind_ignored() {
        let fields = Contract::fields();
        assert_eq!(field_kind(&fields[2], Tag::Db), FieldKind::Ignored);
        assert_eq!(field_kind(&fields[2], Tag::Gql), FieldKind::NestedList);
        assert_eq!(field_kind(&Unit::fields()[1], Tag::Gql), FieldKind::Ignored);
    }

    #[test]
    fn test_untagged_record_is_empty() {
        let fields = describe_fields(
            &[DeclaredField {
                ident: "scratch",
                gql: None,
                db: None,
                ty: None,
            }],
            Tag::Gql,
            0,
        );
        assert!(fields.is_empty());
    }
}
