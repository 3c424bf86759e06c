//! `@key` declarations

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    field_set::{FieldSet, Selection},
    ConfigurationError,
};

/// The fields of a key, in the shape they are written in configuration.
///
/// - `"id"` or `"id organization { id }"`: a field set string
/// - `["id", "region"]`: a compound key
/// - `{"organization": ["id", "name"]}`: a key through a sub-object
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum KeyFields {
    Field(String),
    List(Vec<KeyFields>),
    Nested(IndexMap<String, KeyFields>),
}

impl KeyFields {
    /// A key through the sub-object `field`
    pub fn nested(field: impl Into<String>, inner: impl Into<KeyFields>) -> Self {
        KeyFields::Nested(IndexMap::from([(field.into(), inner.into())]))
    }

    /// Reads a key written as JSON, rejecting anything that isn't a string, a list or an object of those
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        serde_json::from_value(value.clone()).map_err(|_| ConfigurationError::UnsupportedKeyShape(value.to_string()))
    }

    pub fn to_field_set(&self) -> Result<FieldSet, ConfigurationError> {
        match self {
            KeyFields::Field(fields) => FieldSet::parse(fields),
            KeyFields::List(items) => {
                let mut field_set = FieldSet::default();
                for item in items {
                    field_set.merge(item.to_field_set()?);
                }
                Ok(field_set)
            }
            KeyFields::Nested(fields) => fields
                .iter()
                .map(|(field, inner)| {
                    if !is_valid_name(field) {
                        return Err(ConfigurationError::InvalidFieldSet {
                            input: field.clone(),
                            reason: "not a valid field name".to_string(),
                        });
                    }
                    Ok(Selection {
                        field: field.clone(),
                        selections: inner.to_field_set()?.0,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(FieldSet),
        }
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl From<&str> for KeyFields {
    fn from(fields: &str) -> Self {
        KeyFields::Field(fields.to_string())
    }
}

impl From<String> for KeyFields {
    fn from(fields: String) -> Self {
        KeyFields::Field(fields)
    }
}

impl From<Vec<&str>> for KeyFields {
    fn from(fields: Vec<&str>) -> Self {
        KeyFields::List(fields.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for KeyFields {
    fn from(fields: Vec<String>) -> Self {
        KeyFields::List(fields.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyFields {
    fn from(fields: [&str; N]) -> Self {
        KeyFields::List(fields.into_iter().map(Into::into).collect())
    }
}

/// One `@key` clause of an entity
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyDeclaration {
    pub fields: KeyFields,
    #[serde(default = "default_resolvable")]
    pub resolvable: bool,
}

fn default_resolvable() -> bool {
    true
}

impl KeyDeclaration {
    pub fn new(fields: impl Into<KeyFields>) -> Self {
        KeyDeclaration {
            fields: fields.into(),
            resolvable: true,
        }
    }

    /// A key of an entity owned by another subgraph
    pub fn unresolvable(fields: impl Into<KeyFields>) -> Self {
        KeyDeclaration {
            fields: fields.into(),
            resolvable: false,
        }
    }

    /// Reads a key written as a JSON object: `{"fields": ..., "resolvable": false}`
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        let Some(fields) = value.as_object().and_then(|object| object.get("fields")) else {
            return Err(ConfigurationError::UnsupportedKeyShape(value.to_string()));
        };

        let resolvable = match value.get("resolvable") {
            None => true,
            Some(Value::Bool(resolvable)) => *resolvable,
            Some(other) => return Err(ConfigurationError::InvalidResolvable(other.to_string())),
        };

        Ok(KeyDeclaration {
            fields: KeyFields::from_json(fields)?,
            resolvable,
        })
    }
}

impl From<&str> for KeyDeclaration {
    fn from(fields: &str) -> Self {
        KeyDeclaration::new(fields)
    }
}

impl From<KeyFields> for KeyDeclaration {
    fn from(fields: KeyFields) -> Self {
        KeyDeclaration::new(fields)
    }
}

/// A validated key: the declaration and its parsed field set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityKey {
    declaration: KeyDeclaration,
    field_set: FieldSet,
}

impl EntityKey {
    pub fn new(declaration: KeyDeclaration) -> Result<Self, ConfigurationError> {
        let field_set = declaration.fields.to_field_set()?;
        Ok(EntityKey { declaration, field_set })
    }

    pub fn declaration(&self) -> &KeyDeclaration {
        &self.declaration
    }

    pub fn fields(&self) -> &FieldSet {
        &self.field_set
    }

    pub fn is_resolvable(&self) -> bool {
        self.declaration.resolvable
    }
}
