//! Federation subgraph schemas.
//!
//! Entities declared with [`EntityType`] are discovered from the query type of a
//! [`FederatedSchema`], which gains the `_service` and `_entities` fields a federation gateway
//! relies on. References sent through `_entities` are dispatched to the reference resolver of
//! their entity, and `_service { sdl }` returns the schema as printed by [`FederatedSdlPrinter`].

mod config;
pub mod directives;
mod entity;
mod error;
mod field_set;
mod key;
mod link;
pub mod registry;
mod resolve_entities;
mod schema;
pub mod sdl;

pub use self::{
    config::FederationConfig,
    directives::{DirectiveSet, FederationDirective},
    entity::{EntityRefType, EntityType, EntityTypeBuilder, ReferenceResolver, ReferenceValidation},
    error::{BoxError, ConfigurationError, Error, InvariantError, ValidationError},
    field_set::{FieldSet, Selection},
    key::{EntityKey, KeyDeclaration, KeyFields},
    link::{Link, LinkImport},
    resolve_entities::{representations, ReferenceDispatcher},
    schema::{
        FederatedSchema, FederatedSchemaBuilder, ANY_SCALAR, ENTITIES_FIELD, ENTITY_UNION, SERVICE_FIELD,
        SERVICE_TYPE,
    },
    sdl::{FederatedSdlPrinter, PrintOptions, SchemaPrinter, SdlPrinter},
};
