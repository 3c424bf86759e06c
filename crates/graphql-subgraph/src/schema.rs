//! Federated schemas: a query type augmented with `_service` and `_entities`

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::{
    config::FederationConfig,
    directives::DirectiveSet,
    entity::{EntityType, ReferenceValidation},
    field_set::{FieldSet, Selection},
    link::Link,
    registry::{
        field_resolver, reachable_types, Data, FieldResolver, Fields, MetaDirective, MetaField, MetaInputValue,
        MetaType, ObjectType, Registry, ResolverContext, ScalarType, TypeRef, UnionType,
    },
    resolve_entities::{entities_resolver, ReferenceDispatcher},
    sdl::{FederatedSdlPrinter, PrintOptions, SchemaPrinter, SdlPrinter},
    BoxError, ConfigurationError, Error,
};

pub const SERVICE_FIELD: &str = "_service";
pub const ENTITIES_FIELD: &str = "_entities";
pub const SERVICE_TYPE: &str = "_Service";
pub const ANY_SCALAR: &str = "_Any";
pub const ENTITY_UNION: &str = "_Entity";

pub struct FederatedSchemaBuilder {
    query: ObjectType,
    mutation: Option<ObjectType>,
    types: Vec<MetaType>,
    directives: Vec<MetaDirective>,
    directive_set: DirectiveSet,
    entity_types: Option<Vec<MetaType>>,
    entities_resolver: Option<FieldResolver>,
    links: Vec<Link>,
    validation: Option<ReferenceValidation>,
    print_options: PrintOptions,
}

impl FederatedSchemaBuilder {
    pub fn new(query: ObjectType) -> Self {
        FederatedSchemaBuilder {
            query,
            mutation: None,
            types: vec![],
            directives: vec![],
            directive_set: DirectiveSet::federation(),
            entity_types: None,
            entities_resolver: None,
            links: vec![],
            validation: None,
            print_options: PrintOptions::default(),
        }
    }

    #[must_use]
    pub fn mutation(mut self, mutation: ObjectType) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Adds a type of the schema. Entities can be registered more than once as long as it's the same `Arc`.
    #[must_use]
    pub fn register(mut self, ty: impl Into<MetaType>) -> Self {
        self.types.push(ty.into());
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: MetaDirective) -> Self {
        self.directives.push(directive);
        self
    }

    /// The federation directives of the schema, all of them by default
    #[must_use]
    pub fn directives(mut self, directive_set: DirectiveSet) -> Self {
        self.directive_set = directive_set;
        self
    }

    /// Uses these entities instead of looking for them in the types reachable from the query type
    #[must_use]
    pub fn entity_types<I>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<MetaType>,
    {
        self.entity_types = Some(entity_types.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the reference dispatcher as the resolver of `_entities`
    #[must_use]
    pub fn entities_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(ResolverContext<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.entities_resolver = Some(field_resolver(resolver));
        self
    }

    #[must_use]
    pub fn link(mut self, link: Link) -> Self {
        self.links.push(link);
        self
    }

    /// Checks every reference resolved through `_entities` with this policy
    #[must_use]
    pub fn reference_validation(mut self, validation: ReferenceValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Options of the SDL returned by `_service`
    #[must_use]
    pub fn print_options(mut self, options: PrintOptions) -> Self {
        self.print_options = options;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: FederationConfig) -> Self {
        let FederationConfig {
            directives,
            reference_validation,
            print,
            links,
        } = config;

        if let Some(directives) = directives {
            self.directive_set = DirectiveSet::only(directives);
        }
        if reference_validation.is_some() {
            self.validation = reference_validation;
        }
        if let Some(print) = print {
            self.print_options = print;
        }
        self.links.extend(links);
        self
    }

    pub fn finish(self) -> Result<FederatedSchema, Error> {
        let FederatedSchemaBuilder {
            query,
            mutation,
            types,
            directives,
            directive_set,
            entity_types,
            entities_resolver: entities_resolver_override,
            links,
            validation,
            print_options,
        } = self;

        let ObjectType {
            name: query_name,
            description: query_description,
            fields: query_fields,
            interfaces: query_interfaces,
        } = query;

        let query_fields = query_fields.into_map().map_err(Error::Resolver)?;
        for reserved in [SERVICE_FIELD, ENTITIES_FIELD] {
            if query_fields.contains_key(reserved) {
                return Err(ConfigurationError::ReservedField {
                    ty: query_name,
                    field: reserved.to_string(),
                }
                .into());
            }
        }

        let query_type = |fields: IndexMap<String, MetaField>| ObjectType {
            name: query_name.clone(),
            description: query_description.clone(),
            fields: Fields::from(fields),
            interfaces: query_interfaces.clone(),
        };

        let mut registry = Registry::new(query_name.clone());
        registry.mutation_type = mutation.as_ref().map(|mutation| mutation.name.clone());

        for link in &links {
            link.validate()?;
        }
        registry.links = links;

        directive_set.merge_into(&mut registry, directives)?;

        registry.insert_type(query_type(query_fields.clone()))?;
        if let Some(mutation) = mutation {
            registry.insert_type(mutation)?;
        }
        for ty in types {
            registry.insert_type(ty)?;
        }

        let entity_names = match entity_types {
            Some(entity_types) => register_entity_types(&mut registry, entity_types)?,
            None => extract_entity_types(&registry)?,
        };

        registry.insert_type(ObjectType::new(
            SERVICE_TYPE,
            [MetaField::new("sdl", TypeRef::STRING)],
        ))?;

        if !entity_names.is_empty() {
            registry.insert_type(ScalarType::new(ANY_SCALAR))?;
            registry.insert_type(UnionType::new(ENTITY_UNION, entity_names.iter().cloned()))?;
        }

        registry.check()?;
        check_keys(&registry)?;
        check_field_sets(&registry)?;

        let sdl = FederatedSdlPrinter::new(print_options).print(&registry)?;

        let dispatcher = match validation {
            Some(validation) => ReferenceDispatcher::with_validation(validation),
            None => ReferenceDispatcher::new(),
        };

        let mut fields = query_fields;
        let service_sdl = sdl.clone();
        fields.insert(
            SERVICE_FIELD.to_string(),
            MetaField::new(SERVICE_FIELD, TypeRef::named_nn(SERVICE_TYPE))
                .with_resolver(move |_| Ok(json!({ "sdl": service_sdl }))),
        );

        if !entity_names.is_empty() {
            let mut entities = MetaField::new(ENTITIES_FIELD, TypeRef::named_list(ENTITY_UNION)).with_arg(
                MetaInputValue::new("representations", TypeRef::named_nn_list_nn(ANY_SCALAR)),
            );
            entities.resolver = Some(entities_resolver_override.unwrap_or_else(|| entities_resolver(dispatcher)));
            fields.insert(ENTITIES_FIELD.to_string(), entities);
        }

        registry
            .types
            .insert(query_name.clone(), MetaType::Object(query_type(fields)));

        tracing::debug!(
            query = %query_name,
            types = registry.types.len(),
            entities = entity_names.len(),
            "built federated schema"
        );

        Ok(FederatedSchema(Arc::new(SchemaInner {
            registry,
            entity_names,
            directive_set,
            dispatcher,
            sdl,
        })))
    }
}

/// Names of the entities reachable from the query type, ordered by name
fn extract_entity_types(registry: &Registry) -> Result<Vec<String>, Error> {
    let mut names = reachable_types(registry, &registry.query_type)?
        .into_iter()
        .filter(|name| registry.lookup(name).is_some_and(MetaType::is_entity))
        .collect::<Vec<_>>();
    names.sort();

    tracing::debug!(count = names.len(), entities = ?names, "extracted entity types");

    Ok(names)
}

fn register_entity_types(registry: &mut Registry, entity_types: Vec<MetaType>) -> Result<Vec<String>, Error> {
    let mut names = Vec::with_capacity(entity_types.len());

    for ty in entity_types {
        if !ty.is_entity() {
            return Err(ConfigurationError::UnexpectedKind {
                ty: ty.name().to_string(),
                kind: ty.kind(),
                expected: "entity",
            }
            .into());
        }
        names.push(ty.name().to_string());
        registry.insert_type(ty)?;
    }

    names.sort();
    names.dedup();

    Ok(names)
}

/// Every key must select existing fields, with a selection set for composite ones only
fn check_keys(registry: &Registry) -> Result<(), ConfigurationError> {
    for entity in registry.entities() {
        for key in entity.keys() {
            check_key_selections(registry, entity.name(), entity.fields(), &key.fields().0)?;
        }
    }
    Ok(())
}

fn check_key_selections(
    registry: &Registry,
    ty: &str,
    fields: &IndexMap<String, MetaField>,
    selections: &[Selection],
) -> Result<(), ConfigurationError> {
    for selection in selections {
        let field = fields
            .get(&selection.field)
            .ok_or_else(|| ConfigurationError::UnknownKeyField {
                ty: ty.to_string(),
                field: selection.field.clone(),
            })?;

        let target = registry
            .lookup(field.ty.named_type())
            .ok_or_else(|| ConfigurationError::UnknownType {
                ty: field.ty.named_type().to_string(),
                referenced_by: format!("{ty}.{}", field.name),
            })?;

        if selection.selections.is_empty() {
            if target.is_composite() {
                return Err(ConfigurationError::KeyFieldNeedsSelection {
                    ty: ty.to_string(),
                    field: field.name.clone(),
                    field_ty: field.ty.to_string(),
                });
            }
            continue;
        }

        let Some(target_fields) = target.fields() else {
            return Err(ConfigurationError::KeyFieldIsLeaf {
                ty: ty.to_string(),
                field: field.name.clone(),
                field_ty: field.ty.to_string(),
            });
        };

        check_key_selections(registry, target.name(), target_fields, &selection.selections)?;
    }

    Ok(())
}

/// `provides` and `requires` must be valid field sets
fn check_field_sets(registry: &Registry) -> Result<(), ConfigurationError> {
    let federated_fields = registry
        .types
        .values()
        .filter_map(MetaType::fields)
        .flat_map(IndexMap::values)
        .filter_map(|field| field.federation.as_deref());

    for federation in federated_fields {
        for fields in [&federation.provides, &federation.requires].into_iter().flatten() {
            FieldSet::parse(fields)?;
        }
    }

    Ok(())
}

struct SchemaInner {
    registry: Registry,
    entity_names: Vec<String>,
    directive_set: DirectiveSet,
    dispatcher: ReferenceDispatcher,
    sdl: String,
}

/// A subgraph schema. Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct FederatedSchema(Arc<SchemaInner>);

impl FederatedSchema {
    pub fn build(query: ObjectType) -> FederatedSchemaBuilder {
        FederatedSchemaBuilder::new(query)
    }

    /// The entities of the schema, ordered by name
    pub fn entity_types(&self) -> impl Iterator<Item = &EntityType> {
        self.0
            .entity_names
            .iter()
            .filter_map(|name| self.0.registry.lookup(name).and_then(MetaType::as_entity))
    }

    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        if !self.0.entity_names.iter().any(|entity| entity == name) {
            return None;
        }
        self.0.registry.lookup(name).and_then(MetaType::as_entity)
    }

    pub fn has_entity_types(&self) -> bool {
        !self.0.entity_names.is_empty()
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    pub fn directives(&self) -> &DirectiveSet {
        &self.0.directive_set
    }

    /// Runs the resolver bound to `type_name.field_name`
    pub fn resolve_field(
        &self,
        type_name: &str,
        field_name: &str,
        parent: &Value,
        args: &Map<String, Value>,
        data: &Data,
    ) -> Result<Value, Error> {
        self.0.registry.resolve_field(type_name, field_name, parent, args, data)
    }

    /// Resolves references with the reference dispatcher, bypassing any `_entities` resolver override
    pub fn resolve_entities(&self, representations: Vec<Value>, data: &Data) -> Result<Vec<Value>, Error> {
        self.0.dispatcher.resolve(&self.0.registry, representations, data)
    }

    /// The SDL returned by `_service { sdl }`
    pub fn service_sdl(&self) -> &str {
        &self.0.sdl
    }

    pub fn print_sdl(&self, options: PrintOptions) -> Result<String, Error> {
        FederatedSdlPrinter::new(options).print(&self.0.registry)
    }

    /// Every type and directive, federation ones included
    pub fn print_full_sdl(&self) -> Result<String, Error> {
        SchemaPrinter::default().print(&self.0.registry)
    }
}

impl fmt::Debug for FederatedSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedSchema")
            .field("query", &self.0.registry.query_type)
            .field("entity_types", &self.0.entity_names)
            .finish_non_exhaustive()
    }
}
