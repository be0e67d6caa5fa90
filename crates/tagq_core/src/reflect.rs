//! Compile-time field metadata.
//!
//! Records describe themselves through [`Record`], which `#[derive(Record)]`
//! implements from `#[gql(..)]` and `#[db(..)]` field attributes. Field types
//! describe their shape through [`Reflect`]; leaf types get it from this
//! module or from [`scalar!`](crate::scalar).
//!
//! ```ignore
//! #[derive(Record)]
//! pub struct Contract {
//!     #[db("id")]
//!     #[gql("id")]
//!     pub id: i64,
//!     #[gql("units")]
//!     pub units: Vec<Unit>,
//!     pub cached: bool, // no tag, never rendered
//! }
//! ```

use std::any::type_name;

/// Which annotation a builder reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// `#[gql("..")]`, GraphQL selection names.
    Gql,
    /// `#[db("..")]`, SQL column names.
    Db,
}

impl Tag {
    /// Returns the attribute name for this tag.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gql => "gql",
            Self::Db => "db",
        }
    }
}

/// Structural kind of a field type.
#[derive(Clone, Copy)]
pub enum TypeKind {
    /// A leaf value.
    Scalar,
    /// A homogeneous sequence; the function yields the element type.
    Sequence(fn() -> TypeInfo),
    /// A record; the function yields its declared fields.
    Composite(fn() -> Vec<DeclaredField>),
}

impl std::fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar => f.write_str("Scalar"),
            Self::Sequence(elem) => f.debug_tuple("Sequence").field(&elem()).finish(),
            Self::Composite(_) => f.write_str("Composite(..)"),
        }
    }
}

/// Static type name plus structural kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    /// Fully qualified name as reported by `std::any::type_name`.
    pub type_name: &'static str,
    pub kind: TypeKind,
}

impl TypeInfo {
    /// Type info for a leaf type `T`.
    pub fn scalar<T: ?Sized>() -> Self {
        Self {
            type_name: type_name::<T>(),
            kind: TypeKind::Scalar,
        }
    }

    /// Returns true if the type is a record.
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Composite(_))
    }

    /// Returns true if the type follows the optional-wrapper naming convention.
    pub fn is_optional_wrapper(&self) -> bool {
        is_optional_wrapper(self.type_name)
    }
}

/// One field as declared on a record, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredField {
    /// Rust identifier of the field.
    pub ident: &'static str,
    pub gql: Option<&'static str>,
    pub db: Option<&'static str>,
    /// Shape of the field type; `None` for untagged fields, whose types
    /// are never inspected.
    pub ty: Option<fn() -> TypeInfo>,
}

impl DeclaredField {
    /// Returns the field's value for `tag`, if it carries one.
    pub fn tag(&self, tag: Tag) -> Option<&'static str> {
        match tag {
            Tag::Gql => self.gql,
            Tag::Db => self.db,
        }
        .filter(|name| !name.is_empty())
    }

    pub fn type_info(&self) -> Option<TypeInfo> {
        self.ty.map(|ty| ty())
    }
}

/// Types whose shape the field reflector can classify.
pub trait Reflect {
    fn type_info() -> TypeInfo;
}

/// A record type with tagged fields.
///
/// Implemented by `#[derive(Record)]`.
pub trait Record {
    /// Declared name, used as the GraphQL root selection.
    const NAME: &'static str;

    /// Declared fields in declaration order, tagged or not.
    fn fields() -> Vec<DeclaredField>;
}

/// Marks leaf types as [`Reflect`] scalars.
///
/// ```ignore
/// tagq_core::scalar!(chrono::NaiveDate, uuid::Uuid);
/// ```
#[macro_export]
macro_rules! scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::reflect::Reflect for $ty {
                fn type_info() -> $crate::reflect::TypeInfo {
                    $crate::reflect::TypeInfo::scalar::<$ty>()
                }
            }
        )*
    };
}

scalar!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    &'static str
);

impl<T: Reflect> Reflect for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo {
            type_name: type_name::<Self>(),
            kind: TypeKind::Sequence(T::type_info),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::scalar::<Self>()
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        T::type_info()
    }
}

const WRAPPER_NAME: &str = "Option";
const WRAPPER_PREFIX: &str = "Null";
const WRAPPER_MODULE: &str = "null";

/// Returns true if `type_name` names an optional scalar wrapper.
///
/// The convention: after stripping generic arguments, the last path segment
/// is `Option` or `Null` followed by an uppercase letter (`NullTime`, not
/// `Nullifier`), or the enclosing module is `null` (`null::String`).
pub fn is_optional_wrapper(type_name: &str) -> bool {
    let path = type_name
        .split_once('<')
        .map_or(type_name, |(path, _)| path)
        .trim_start_matches('&')
        .trim();
    let mut segments = path.rsplit("::");
    let base = segments.next().unwrap_or_default();
    let module = segments.next();

    let null_prefixed = base
        .strip_prefix(WRAPPER_PREFIX)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase());

    base == WRAPPER_NAME || null_prefixed || module == Some(WRAPPER_MODULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_wrapper_convention() {
        assert!(is_optional_wrapper("core::option::Option<i32>"));
        assert!(is_optional_wrapper("app::types::NullString"));
        assert!(is_optional_wrapper("NullTime"));
        assert!(is_optional_wrapper("app::null::String"));
        assert!(is_optional_wrapper("null::Int"));

        assert!(!is_optional_wrapper("alloc::string::String"));
        assert!(!is_optional_wrapper("alloc::vec::Vec<core::option::Option<i32>>"));
        assert!(!is_optional_wrapper("app::nullable::Units"));
        assert!(!is_optional_wrapper("app::Contract"));
    }

    #[test]
    fn test_null_prefix_needs_a_word_boundary() {
        assert!(is_optional_wrapper("app::NullInt64"));
        assert!(!is_optional_wrapper("app::Nullifier"));
        assert!(!is_optional_wrapper("app::NullableSettings"));
        assert!(!is_optional_wrapper("app::Null"));
        assert!(!is_optional_wrapper("app::Null2"));
    }

    #[test]
    fn test_builtin_type_info() {
        assert!(matches!(i64::type_info().kind, TypeKind::Scalar));
        assert!(matches!(String::type_info().kind, TypeKind::Scalar));
        assert!(Option::<i32>::type_info().is_optional_wrapper());
        assert_eq!(Box::<u8>::type_info().type_name, "u8");

        match Vec::<u16>::type_info().kind {
            TypeKind::Sequence(elem) => assert_eq!(elem().type_name, "u16"),
            other => panic!("expected sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_declared_field_tags() {
        let field = DeclaredField {
            ident: "name",
            gql: Some("name"),
            db: Some(""),
            ty: Some(String::type_info),
        };
        assert_eq!(field.tag(Tag::Gql), Some("name"));
        assert_eq!(field.tag(Tag::Db), None);
        assert!(field.type_info().is_some());
    }
}
