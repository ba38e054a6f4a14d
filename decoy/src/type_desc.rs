use std::{fmt, sync::Arc};

use crate::{Capability, Value};

/// Declared type of a parameter, return value, property or field.
///
/// Capability-typed members refer to their capability through a constructor
/// function rather than an owned value, so a capability may mention itself
/// (directly or through others) without building a cyclic structure.
#[derive(Clone)]
pub enum TypeDesc {
    Unit,
    Bool,
    Int,
    UInt,
    Float,
    Char,
    Str,
    List(Box<TypeDesc>),
    Map(Box<TypeDesc>),
    Option(Box<TypeDesc>),
    /// A mockable capability, resolved lazily.
    Capability(fn() -> Capability),
    /// A host type the engine knows only by name. Matched against the
    /// wrapped value's type path, see [`Opaque::is_named`](crate::Opaque::is_named).
    Opaque(Arc<str>),
}

impl TypeDesc {
    pub fn list(item: TypeDesc) -> Self {
        TypeDesc::List(Box::new(item))
    }

    pub fn map(value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(value))
    }

    pub fn option(inner: TypeDesc) -> Self {
        TypeDesc::Option(Box::new(inner))
    }

    pub fn opaque(name: &str) -> Self {
        TypeDesc::Opaque(Arc::from(name))
    }

    /// Returns the capability this type denotes, if it is mockable.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            TypeDesc::Capability(build) => Some(build()),
            _ => None,
        }
    }

    pub fn is_capability(&self) -> bool {
        matches!(self, TypeDesc::Capability(_))
    }

    /// Returns `true` if `value` is an instance of this type.
    ///
    /// `Null` is accepted by the reference-like types (`Option`, capabilities
    /// and opaque host types), mirroring how an absent reference satisfies a
    /// typed wildcard.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (TypeDesc::Unit, Value::Unit) => true,
            (TypeDesc::Bool, Value::Bool(_)) => true,
            (TypeDesc::Int, Value::Int(_)) => true,
            (TypeDesc::Int, Value::UInt(u)) => i64::try_from(*u).is_ok(),
            (TypeDesc::UInt, Value::UInt(_)) => true,
            (TypeDesc::UInt, Value::Int(i)) => *i >= 0,
            (TypeDesc::Float, Value::Float(_)) => true,
            (TypeDesc::Char, Value::Char(_)) => true,
            (TypeDesc::Str, Value::Str(_)) => true,
            (TypeDesc::List(item), Value::List(items)) => items.iter().all(|v| item.accepts(v)),
            (TypeDesc::Map(inner), Value::Map(entries)) => {
                entries.values().all(|v| inner.accepts(v))
            }
            (TypeDesc::Option(_), Value::Null) => true,
            (TypeDesc::Option(inner), v) => inner.accepts(v),
            (TypeDesc::Capability(_), Value::Null) => true,
            (TypeDesc::Capability(build), Value::Object(o)) => o.implements(build().name()),
            (TypeDesc::Opaque(_), Value::Null) => true,
            (TypeDesc::Opaque(name), Value::Opaque(o)) => o.is_named(name),
            _ => false,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Unit => write!(f, "()"),
            TypeDesc::Bool => write!(f, "bool"),
            TypeDesc::Int => write!(f, "int"),
            TypeDesc::UInt => write!(f, "uint"),
            TypeDesc::Float => write!(f, "float"),
            TypeDesc::Char => write!(f, "char"),
            TypeDesc::Str => write!(f, "str"),
            TypeDesc::List(item) => write!(f, "list<{item}>"),
            TypeDesc::Map(inner) => write!(f, "map<{inner}>"),
            TypeDesc::Option(inner) => write!(f, "option<{inner}>"),
            TypeDesc::Capability(build) => write!(f, "{}", build().name()),
            TypeDesc::Opaque(name) => write!(f, "{name}"),
        }
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Capability {
        Capability::interface("Widget")
    }

    #[test]
    fn primitives_accept_matching_values() {
        assert!(TypeDesc::Int.accepts(&Value::from(3)));
        assert!(!TypeDesc::Int.accepts(&Value::from("3")));
        assert!(TypeDesc::UInt.accepts(&Value::from(3)));
        assert!(!TypeDesc::UInt.accepts(&Value::from(-3)));
    }

    #[test]
    fn reference_like_types_accept_null() {
        assert!(TypeDesc::option(TypeDesc::Int).accepts(&Value::Null));
        assert!(TypeDesc::Capability(widget).accepts(&Value::Null));
        assert!(!TypeDesc::Str.accepts(&Value::Null));
    }

    #[test]
    fn list_checks_every_item() {
        let ty = TypeDesc::list(TypeDesc::Str);
        assert!(ty.accepts(&Value::from(vec!["a", "b"])));
        assert!(!ty.accepts(&Value::from(vec![Value::from("a"), Value::from(1)])));
    }

    #[derive(Debug, PartialEq)]
    struct Point(i32, i32);

    #[derive(Debug, PartialEq)]
    struct Line;

    #[test]
    fn opaque_checks_the_wrapped_type_name() {
        let point = Value::opaque(Point(1, 2));
        assert!(TypeDesc::opaque("Point").accepts(&point));
        assert!(TypeDesc::opaque("tests::Point").accepts(&point));
        assert!(!TypeDesc::opaque("Line").accepts(&point));
        assert!(!TypeDesc::opaque("oint").accepts(&point));
        assert!(TypeDesc::opaque("Line").accepts(&Value::opaque(Line)));
        assert!(TypeDesc::opaque("Line").accepts(&Value::Null));
    }

    #[test]
    fn display_names_capability() {
        assert_eq!(TypeDesc::Capability(widget).to_string(), "Widget");
        assert_eq!(TypeDesc::list(TypeDesc::Int).to_string(), "list<int>");
    }
}
