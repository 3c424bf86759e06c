//! The type system federation metadata is attached to.
//!
//! A registry is a name-indexed collection of types and directives, with just enough of an
//! execution surface to run field resolvers.

mod directives;
mod fields;
mod reachable;
mod resolver;
mod type_ref;
mod types;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

pub use self::{directives::*, fields::*, reachable::reachable_types, resolver::*, type_ref::TypeRef, types::*};
use crate::{entity::EntityType, link::Link, ConfigurationError, Error, InvariantError};

/// Scalars every schema has, never printed
pub const BUILTIN_SCALARS: &[&str] = &["String", "Int", "Float", "Boolean", "ID"];

#[derive(Debug)]
pub struct Registry {
    pub types: BTreeMap<String, MetaType>,
    pub directives: IndexMap<String, MetaDirective>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    /// `@link`s applied to the schema
    pub links: Vec<Link>,
}

impl Registry {
    /// A registry with the built-in scalars and directives
    pub fn new(query_type: impl Into<String>) -> Self {
        let types = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), MetaType::Scalar(ScalarType::new(*name))))
            .collect();

        let directives = builtin_directives()
            .into_iter()
            .map(|directive| (directive.name.clone(), directive))
            .collect();

        Registry {
            types,
            directives,
            query_type: query_type.into(),
            mutation_type: None,
            links: vec![],
        }
    }

    /// Adds a type. A second type with the same name is an error, unless it's the same shared entity.
    pub fn insert_type(&mut self, ty: impl Into<MetaType>) -> Result<(), ConfigurationError> {
        let ty = ty.into();

        if let Some(existing) = self.types.get(ty.name()) {
            if existing.is_same_instance(&ty) {
                return Ok(());
            }
            return Err(ConfigurationError::DuplicateType(ty.name().to_string()));
        }

        self.types.insert(ty.name().to_string(), ty);
        Ok(())
    }

    pub fn insert_directive(&mut self, directive: MetaDirective) {
        self.directives.insert(directive.name.clone(), directive);
    }

    pub fn lookup(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn query(&self) -> Option<&MetaType> {
        self.types.get(&self.query_type)
    }

    pub fn is_root_type(&self, name: &str) -> bool {
        name == self.query_type || self.mutation_type.as_deref() == Some(name)
    }

    /// Every entity of the registry, owned and referenced, ordered by name
    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.types.values().filter_map(MetaType::as_entity)
    }

    /// Evaluates every field thunk and checks that all the types referenced from the registry exist
    pub fn check(&self) -> Result<(), Error> {
        for root in std::iter::once(&self.query_type).chain(self.mutation_type.as_ref()) {
            match self.types.get(root) {
                Some(ty) if ty.is_object_like() => {}
                Some(ty) => {
                    return Err(ConfigurationError::UnexpectedKind {
                        ty: root.clone(),
                        kind: ty.kind(),
                        expected: "object",
                    }
                    .into())
                }
                None => {
                    return Err(ConfigurationError::UnknownType {
                        ty: root.clone(),
                        referenced_by: "schema".to_string(),
                    }
                    .into())
                }
            }
        }

        for ty in self.types.values() {
            self.check_type(ty)?;
        }

        for directive in self.directives.values() {
            for arg in directive.args.values() {
                self.expect_type(arg.ty.named_type(), &format!("@{}({})", directive.name, arg.name))?;
            }
        }

        Ok(())
    }

    fn check_type(&self, ty: &MetaType) -> Result<(), Error> {
        if let Some(fields) = ty.try_fields().map_err(Error::Resolver)? {
            for field in fields.values() {
                let location = format!("{}.{}", ty.name(), field.name);
                self.expect_type(field.ty.named_type(), &location)?;

                for arg in field.args.values() {
                    let location = format!("{location}({})", arg.name);
                    self.expect_type(arg.ty.named_type(), &location)?;
                }
            }
        }

        for interface in ty.interfaces() {
            match self.expect_type(interface, ty.name())? {
                MetaType::Interface(_) => {}
                other => return Err(unexpected_kind(other, "interface")),
            }
        }

        match ty {
            MetaType::Union(union) => {
                for member in &union.possible_types {
                    let member = self.expect_type(member, &union.name)?;
                    if !member.is_object_like() {
                        return Err(unexpected_kind(member, "object"));
                    }
                }
            }
            MetaType::InputObject(input) => {
                for field in input.input_fields.values() {
                    self.expect_type(field.ty.named_type(), &format!("{}.{}", input.name, field.name))?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn expect_type(&self, name: &str, referenced_by: &str) -> Result<&MetaType, ConfigurationError> {
        self.types.get(name).ok_or_else(|| ConfigurationError::UnknownType {
            ty: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    /// Runs the resolver of a field, or reads `parent[field]` if it has none
    pub fn resolve_field(
        &self,
        type_name: &str,
        field_name: &str,
        parent: &Value,
        args: &Map<String, Value>,
        data: &Data,
    ) -> Result<Value, Error> {
        let field = self
            .lookup(type_name)
            .and_then(|ty| ty.field_by_name(field_name))
            .ok_or_else(|| InvariantError::UnknownField {
                ty: type_name.to_string(),
                field: field_name.to_string(),
            })?;

        match &field.resolver {
            Some(resolver) => resolver(ResolverContext {
                registry: self,
                parent,
                args,
                data,
            })
            .map_err(|err| match err.downcast::<Error>() {
                // Built-in resolvers fail with the crate's own errors
                Ok(err) => *err,
                Err(err) => Error::Resolver(err),
            }),
            None => Ok(parent.get(field_name).cloned().unwrap_or(Value::Null)),
        }
    }
}

fn unexpected_kind(ty: &MetaType, expected: &'static str) -> Error {
    ConfigurationError::UnexpectedKind {
        ty: ty.name().to_string(),
        kind: ty.kind(),
        expected,
    }
    .into()
}
