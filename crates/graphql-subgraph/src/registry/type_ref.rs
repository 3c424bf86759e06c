//! References to GraphQL types from fields and arguments

use std::fmt;

/// A possibly wrapped reference to a named type, e.g. `[Episode!]!`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    NonNull(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub const STRING: &'static str = "String";
    pub const INT: &'static str = "Int";
    pub const FLOAT: &'static str = "Float";
    pub const BOOLEAN: &'static str = "Boolean";
    pub const ID: &'static str = "ID";

    /// `Type`
    pub fn named(name: impl Into<String>) -> TypeRef {
        TypeRef::Named(name.into())
    }

    /// `Type!`
    pub fn named_nn(name: impl Into<String>) -> TypeRef {
        TypeRef::named(name).non_null()
    }

    /// `[Type]`
    pub fn named_list(name: impl Into<String>) -> TypeRef {
        TypeRef::named(name).list()
    }

    /// `[Type!]!`
    pub fn named_nn_list_nn(name: impl Into<String>) -> TypeRef {
        TypeRef::named_nn(name).list().non_null()
    }

    #[must_use]
    pub fn non_null(self) -> TypeRef {
        match self {
            TypeRef::NonNull(_) => self,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    #[must_use]
    pub fn list(self) -> TypeRef {
        TypeRef::List(Box::new(self))
    }

    /// The name of the type with all the list and non-null wrappers removed
    pub fn named_type(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::NonNull(inner) | TypeRef::List(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::Named(_) => false,
            TypeRef::List(_) => true,
            TypeRef::NonNull(inner) => inner.is_list(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::named(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wrapping() {
        assert_eq!(TypeRef::named_nn_list_nn("Episode").to_string(), "[Episode!]!");
        assert_eq!(TypeRef::named_list("_Entity").to_string(), "[_Entity]");
        assert_eq!(TypeRef::named_nn("Int").non_null().to_string(), "Int!");
    }

    #[test]
    fn named_type_unwraps_everything() {
        let ty = TypeRef::named_nn("_Any").list().non_null();
        assert_eq!(ty.named_type(), "_Any");
        assert!(ty.is_list());
        assert!(ty.is_non_null());
        assert!(!TypeRef::named("Int").is_list());
    }
}
