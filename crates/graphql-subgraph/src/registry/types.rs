use std::sync::Arc;

use indexmap::IndexMap;

use super::{Deprecation, Fields, MetaField, MetaInputValue};
use crate::{
    entity::{EntityRefType, EntityType},
    BoxError,
};

/// A named type of the schema.
///
/// Entities are shared: the same instance may be registered in more than one schema.
#[derive(Debug)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Entity(Arc<EntityType>),
    EntityRef(Arc<EntityRefType>),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(scalar) => &scalar.name,
            MetaType::Object(object) => &object.name,
            MetaType::Entity(entity) => entity.name(),
            MetaType::EntityRef(entity) => entity.name(),
            MetaType::Interface(interface) => &interface.name,
            MetaType::Union(union) => &union.name,
            MetaType::Enum(enum_type) => &enum_type.name,
            MetaType::InputObject(input) => &input.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MetaType::Scalar(scalar) => scalar.description.as_deref(),
            MetaType::Object(object) => object.description.as_deref(),
            MetaType::Entity(entity) => entity.description(),
            MetaType::EntityRef(entity) => entity.description(),
            MetaType::Interface(interface) => interface.description.as_deref(),
            MetaType::Union(union) => union.description.as_deref(),
            MetaType::Enum(enum_type) => enum_type.description.as_deref(),
            MetaType::InputObject(input) => input.description.as_deref(),
        }
    }

    /// A short name for the kind of type, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            MetaType::Scalar(_) => "scalar",
            MetaType::Object(_) => "object",
            MetaType::Entity(_) => "entity",
            MetaType::EntityRef(_) => "entity reference",
            MetaType::Interface(_) => "interface",
            MetaType::Union(_) => "union",
            MetaType::Enum(_) => "enum",
            MetaType::InputObject(_) => "input object",
        }
    }

    /// The raw fields of object-like types
    pub fn fields_definition(&self) -> Option<&Fields> {
        match self {
            MetaType::Object(object) => Some(&object.fields),
            MetaType::Entity(entity) => Some(entity.fields_definition()),
            MetaType::EntityRef(entity) => Some(entity.fields_definition()),
            MetaType::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        self.fields_definition().map(Fields::fields)
    }

    pub fn try_fields(&self) -> Result<Option<&IndexMap<String, MetaField>>, BoxError> {
        self.fields_definition().map(Fields::try_fields).transpose()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn interfaces(&self) -> &[String] {
        match self {
            MetaType::Object(object) => &object.interfaces,
            MetaType::Entity(entity) => entity.interfaces(),
            MetaType::EntityRef(entity) => entity.interfaces(),
            MetaType::Interface(interface) => &interface.interfaces,
            _ => &[],
        }
    }

    /// The entity behind this type, for owned entities and references alike
    pub fn as_entity(&self) -> Option<&EntityType> {
        match self {
            MetaType::Entity(entity) => Some(entity.as_ref()),
            MetaType::EntityRef(entity) => Some(entity.as_entity()),
            _ => None,
        }
    }

    pub fn is_entity(&self) -> bool {
        self.as_entity().is_some()
    }

    /// Types whose values can be selected into
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            MetaType::Object(_)
                | MetaType::Entity(_)
                | MetaType::EntityRef(_)
                | MetaType::Interface(_)
                | MetaType::Union(_)
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_))
    }

    /// Whether a value of this type can be a member of a union
    pub fn is_object_like(&self) -> bool {
        matches!(self, MetaType::Object(_) | MetaType::Entity(_) | MetaType::EntityRef(_))
    }

    /// Whether both values are the same registration of a type
    pub(crate) fn is_same_instance(&self, other: &MetaType) -> bool {
        match (self, other) {
            (MetaType::Entity(lhs), MetaType::Entity(rhs)) => Arc::ptr_eq(lhs, rhs),
            (MetaType::EntityRef(lhs), MetaType::EntityRef(rhs)) => Arc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
}

impl ScalarType {
    pub fn new(name: impl Into<String>) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
            specified_by_url: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_specified_by_url(self, url: impl Into<String>) -> Self {
        Self {
            specified_by_url: Some(url.into()),
            ..self
        }
    }
}

#[derive(Debug, Default)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Fields,
    pub interfaces: Vec<String>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: Fields::new(fields),
            interfaces: vec![],
        }
    }

    /// An object whose fields are only produced when first needed
    pub fn lazy<F>(name: impl Into<String>, thunk: F) -> Self
    where
        F: Fn() -> Result<Vec<MetaField>, BoxError> + Send + Sync + 'static,
    {
        ObjectType {
            name: name.into(),
            description: None,
            fields: Fields::lazy(thunk),
            interfaces: vec![],
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Fields,
    pub interfaces: Vec<String>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = MetaField>) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: Fields::new(fields),
            interfaces: vec![],
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<String>,
}

impl UnionType {
    pub fn new(name: impl Into<String>, possible_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        UnionType {
            name: name.into(),
            description: None,
            possible_types: possible_types.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub enum_values: IndexMap<String, MetaEnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = MetaEnumValue>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            enum_values: values.into_iter().map(|value| (value.name.clone(), value)).collect(),
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Deprecation,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        MetaEnumValue {
            name: name.into(),
            description: None,
            deprecation: Deprecation::NoDeprecated,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn deprecated(self, reason: Option<&str>) -> Self {
        Self {
            deprecation: Deprecation::Deprecated {
                reason: reason.map(str::to_string),
            },
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub input_fields: IndexMap<String, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>, input_fields: impl IntoIterator<Item = MetaInputValue>) -> Self {
        InputObjectType {
            name: name.into(),
            description: None,
            input_fields: input_fields.into_iter().map(|field| (field.name.clone(), field)).collect(),
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }
}

impl From<ScalarType> for MetaType {
    fn from(scalar: ScalarType) -> Self {
        MetaType::Scalar(scalar)
    }
}

impl From<ObjectType> for MetaType {
    fn from(object: ObjectType) -> Self {
        MetaType::Object(object)
    }
}

impl From<EntityType> for MetaType {
    fn from(entity: EntityType) -> Self {
        MetaType::Entity(Arc::new(entity))
    }
}

impl From<Arc<EntityType>> for MetaType {
    fn from(entity: Arc<EntityType>) -> Self {
        MetaType::Entity(entity)
    }
}

impl From<EntityRefType> for MetaType {
    fn from(entity: EntityRefType) -> Self {
        MetaType::EntityRef(Arc::new(entity))
    }
}

impl From<Arc<EntityRefType>> for MetaType {
    fn from(entity: Arc<EntityRefType>) -> Self {
        MetaType::EntityRef(entity)
    }
}

impl From<InterfaceType> for MetaType {
    fn from(interface: InterfaceType) -> Self {
        MetaType::Interface(interface)
    }
}

impl From<UnionType> for MetaType {
    fn from(union: UnionType) -> Self {
        MetaType::Union(union)
    }
}

impl From<EnumType> for MetaType {
    fn from(enum_type: EnumType) -> Self {
        MetaType::Enum(enum_type)
    }
}

impl From<InputObjectType> for MetaType {
    fn from(input: InputObjectType) -> Self {
        MetaType::InputObject(input)
    }
}
