//! Entities: object types that other subgraphs can reference through their keys

use std::{fmt, ops::Deref, sync::Arc};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    key::{EntityKey, KeyDeclaration, KeyFields},
    registry::{Data, Fields, FieldsThunk, MetaField},
    BoxError, ConfigurationError, Error, InvariantError, ValidationError,
};

/// Turns a reference (`{"__typename": "Episode", "id": 1}`) into the entity it designates
pub type ReferenceResolver = Arc<dyn Fn(Value, &Data) -> Result<Value, BoxError> + Send + Sync>;

/// How strictly a reference is checked before it's handed to a reference resolver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceValidation {
    /// Only `__typename` is required
    #[default]
    Typename,
    /// Every field of at least one key must be present as well
    MatchingKey,
}

pub struct EntityType {
    name: String,
    description: Option<String>,
    fields: Fields,
    interfaces: Vec<String>,
    keys: Vec<EntityKey>,
    resolver: Option<ReferenceResolver>,
    validation: ReferenceValidation,
}

impl EntityType {
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            description: None,
            fields: vec![],
            thunk: None,
            interfaces: vec![],
            keys: vec![],
            key_fields: vec![],
            resolver: None,
            validation: ReferenceValidation::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields_definition(&self) -> &Fields {
        &self.fields
    }

    pub fn fields(&self) -> &IndexMap<String, MetaField> {
        self.fields.fields()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Never empty
    pub fn keys(&self) -> &[EntityKey] {
        &self.keys
    }

    /// The top level fields of every key, without duplicates
    pub fn key_fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        for field in self.keys.iter().flat_map(|key| key.fields().top_level_fields()) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }

    pub fn has_reference_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn reference_validation(&self) -> ReferenceValidation {
        self.validation
    }

    /// The first key whose fields are all present in `representation`
    pub fn matching_key(&self, representation: &Value) -> Option<&EntityKey> {
        let object = representation.as_object()?;
        self.keys.iter().find(|key| key.fields().all_fields_are_present(object))
    }

    /// Runs the reference resolver on `representation` and returns its output unchanged.
    pub fn resolve_reference(&self, representation: Value, data: &Data) -> Result<Value, Error> {
        let Some(resolver) = &self.resolver else {
            return Err(InvariantError::MissingReferenceResolver(self.name.clone()).into());
        };

        self.validate_reference(&representation)?;

        resolver(representation, data).map_err(Error::Resolver)
    }

    fn validate_reference(&self, representation: &Value) -> Result<(), ValidationError> {
        let Value::Object(object) = representation else {
            return Err(ValidationError::NotAnObject(representation.to_string()));
        };

        match object.get("__typename").and_then(Value::as_str) {
            None => return Err(ValidationError::MissingTypename),
            Some(typename) if typename != self.name => {
                return Err(ValidationError::TypenameMismatch {
                    expected: self.name.clone(),
                    found: typename.to_string(),
                })
            }
            Some(_) => {}
        }

        if self.validation == ReferenceValidation::MatchingKey && self.matching_key(representation).is_none() {
            return Err(ValidationError::NoMatchingKey(self.name.clone()));
        }

        Ok(())
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .field("fields", &self.fields)
            .field("has_reference_resolver", &self.has_reference_resolver())
            .finish_non_exhaustive()
    }
}

pub struct EntityTypeBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<MetaField>,
    thunk: Option<FieldsThunk>,
    interfaces: Vec<String>,
    keys: Vec<KeyDeclaration>,
    key_fields: Vec<KeyFields>,
    resolver: Option<ReferenceResolver>,
    validation: ReferenceValidation,
}

impl EntityTypeBuilder {
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = MetaField>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Produces the fields lazily, replacing any field added with [`Self::field`].
    ///
    /// Keys can't be checked until the thunk is evaluated, which happens when the schema is built.
    #[must_use]
    pub fn fields_thunk<F>(mut self, thunk: F) -> Self
    where
        F: Fn() -> Result<Vec<MetaField>, BoxError> + Send + Sync + 'static,
    {
        self.thunk = Some(Box::new(thunk));
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<KeyDeclaration>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Legacy configuration: every entry becomes its own resolvable key
    #[must_use]
    pub fn key_fields<I>(mut self, key_fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<KeyFields>,
    {
        self.key_fields.extend(key_fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn resolve_reference<F>(mut self, resolver: F) -> Self
    where
        F: Fn(Value, &Data) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn reference_validation(mut self, validation: ReferenceValidation) -> Self {
        self.validation = validation;
        self
    }

    pub fn build(self) -> Result<EntityType, ConfigurationError> {
        let EntityTypeBuilder {
            name,
            description,
            fields,
            thunk,
            interfaces,
            keys,
            key_fields,
            resolver,
            validation,
        } = self;

        if !keys.is_empty() && !key_fields.is_empty() {
            return Err(ConfigurationError::ConflictingKeyConfiguration { ty: name });
        }

        let declarations = if keys.is_empty() {
            key_fields.into_iter().map(KeyDeclaration::new).collect()
        } else {
            keys
        };

        if declarations.is_empty() {
            return Err(ConfigurationError::MissingKeys { ty: name });
        }

        let keys = declarations
            .into_iter()
            .map(|declaration| {
                let key = EntityKey::new(declaration)?;
                if key.fields().is_empty() {
                    return Err(ConfigurationError::InvalidFieldSet {
                        input: String::new(),
                        reason: format!("a key of '{name}' selects no field"),
                    });
                }
                Ok(key)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fields = match thunk {
            Some(thunk) => Fields::lazy(thunk),
            None => {
                let fields = Fields::new(fields);
                check_top_level_key_fields(&name, &keys, fields.fields())?;
                fields
            }
        };

        Ok(EntityType {
            name,
            description,
            fields,
            interfaces,
            keys,
            resolver,
            validation,
        })
    }

    /// Builds a reference to an entity owned by another subgraph
    pub fn build_ref(self) -> Result<EntityRefType, ConfigurationError> {
        EntityRefType::new(self.build()?)
    }
}

pub(crate) fn check_top_level_key_fields(
    ty: &str,
    keys: &[EntityKey],
    fields: &IndexMap<String, MetaField>,
) -> Result<(), ConfigurationError> {
    for field in keys.iter().flat_map(|key| key.fields().top_level_fields()) {
        if !fields.contains_key(field) {
            return Err(ConfigurationError::UnknownKeyField {
                ty: ty.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

/// A stub for an entity owned by another subgraph.
///
/// It has exactly one key, which is not resolvable, and no reference resolver.
#[derive(Debug)]
pub struct EntityRefType(EntityType);

impl EntityRefType {
    pub fn new(entity: EntityType) -> Result<Self, ConfigurationError> {
        let [key] = entity.keys.as_slice() else {
            return Err(ConfigurationError::StubKeyCount {
                ty: entity.name,
                count: entity.keys.len(),
            });
        };

        if key.is_resolvable() {
            return Err(ConfigurationError::StubResolvable { ty: entity.name });
        }

        if entity.has_reference_resolver() {
            return Err(ConfigurationError::StubWithResolver { ty: entity.name });
        }

        Ok(EntityRefType(entity))
    }

    pub fn as_entity(&self) -> &EntityType {
        &self.0
    }
}

impl Deref for EntityRefType {
    type Target = EntityType;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
