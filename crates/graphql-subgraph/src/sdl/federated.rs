use std::fmt::Write;

use super::{display_utils::quoted, schema_definition, ObjectHeader, PrintOptions, SdlPrinter, INDENT};
use crate::{
    directives::{FederationDirective, LINK_IMPORT_SCALAR},
    entity::EntityType,
    field_set::FieldSet,
    registry::{MetaDirective, MetaField, MetaType, ObjectType, Registry, BUILTIN_DIRECTIVES, BUILTIN_SCALARS},
    schema::{ENTITIES_FIELD, SERVICE_FIELD},
    Error,
};

/// Types that only exist to execute the federation meta-fields
pub const FEDERATION_TYPES: &[&str] = &["_Any", "_Service", "_Entity", LINK_IMPORT_SCALAR];

/// Prints the SDL a subgraph publishes to the gateway, the value of `_service { sdl }`.
///
/// Federation directive definitions and meta types are left out. Keys and field metadata are
/// printed as directives, root types and stubs as extensions.
#[derive(Clone, Copy, Debug, Default)]
pub struct FederatedSdlPrinter {
    options: PrintOptions,
}

impl FederatedSdlPrinter {
    pub fn new(options: PrintOptions) -> Self {
        FederatedSdlPrinter { options }
    }
}

impl SdlPrinter for FederatedSdlPrinter {
    fn options(&self) -> PrintOptions {
        self.options
    }

    fn include_directive(&self, directive: &MetaDirective) -> bool {
        !BUILTIN_DIRECTIVES.contains(&directive.name.as_str())
            && !FederationDirective::is_federation_directive(&directive.name)
    }

    fn include_type(&self, ty: &MetaType) -> bool {
        let name = ty.name();
        !name.starts_with("__") && !BUILTIN_SCALARS.contains(&name) && !FEDERATION_TYPES.contains(&name)
    }

    fn include_field(&self, registry: &Registry, type_name: &str, field: &MetaField) -> bool {
        if field.name.starts_with("__") {
            return false;
        }
        type_name != registry.query_type || (field.name != SERVICE_FIELD && field.name != ENTITIES_FIELD)
    }

    /// `extend schema @link(...)` followed by the root operations, if they need to be spelled out
    fn print_schema_definition(&self, registry: &Registry) -> Result<String, Error> {
        let links = match registry.links.as_slice() {
            [] => String::new(),
            [link] => format!("extend schema {link}"),
            links => {
                let mut sdl = String::from("extend schema");
                for link in links {
                    write!(sdl, "\n{INDENT}{link}")?;
                }
                sdl
            }
        };

        let definition = schema_definition(registry);

        Ok(match (links.is_empty(), definition.is_empty()) {
            (_, true) => links,
            (true, false) => definition,
            (false, false) => format!("{links}\n\n{definition}"),
        })
    }

    fn print_object(&self, registry: &Registry, object: &ObjectType) -> Result<String, Error> {
        let fields = object.fields.fields();
        if !fields
            .values()
            .any(|field| self.include_field(registry, &object.name, field))
        {
            return Ok(String::new());
        }

        let header = ObjectHeader {
            extend: registry.is_root_type(&object.name),
            keyword: "type",
            name: &object.name,
            description: object.description.as_deref(),
            interfaces: &object.interfaces,
            directives: String::new(),
        };
        self.print_object_like(registry, header, fields)
    }

    fn print_entity(&self, registry: &Registry, entity: &EntityType, is_stub: bool) -> Result<String, Error> {
        let mut directives = String::new();
        for key in entity.keys() {
            write!(directives, " @key(fields: {}", quoted(&key.fields().to_string()))?;
            if !key.is_resolvable() {
                directives.push_str(", resolvable: false");
            }
            directives.push(')');
        }

        let header = ObjectHeader {
            extend: is_stub,
            keyword: "type",
            name: entity.name(),
            description: entity.description(),
            interfaces: entity.interfaces(),
            directives,
        };
        self.print_object_like(registry, header, entity.fields())
    }

    fn print_field_directives(&self, field: &MetaField) -> Result<String, Error> {
        let Some(federation) = &field.federation else {
            return Ok(String::new());
        };

        let mut directives = Vec::new();
        if federation.external {
            directives.push("@external".to_string());
        }
        if let Some(provides) = &federation.provides {
            let fields = FieldSet::parse(provides)?;
            directives.push(format!("@provides(fields: {})", quoted(&fields.to_string())));
        }
        if let Some(requires) = &federation.requires {
            let fields = FieldSet::parse(requires)?;
            directives.push(format!("@requires(fields: {})", quoted(&fields.to_string())));
        }
        if federation.shareable {
            directives.push("@shareable".to_string());
        }
        if federation.inaccessible {
            directives.push("@inaccessible".to_string());
        }
        if let Some(from) = &federation.r#override {
            directives.push(format!("@override(from: {})", quoted(from)));
        }

        Ok(directives.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        directives::DirectiveSet,
        key::{KeyDeclaration, KeyFields},
        link::Link,
        registry::{DirectiveLocation, MetaInputValue, ScalarType, TypeRef},
        sdl::SchemaPrinter,
    };

    fn registry() -> Registry {
        let mut registry = Registry::new("Query");
        DirectiveSet::federation()
            .merge_into(
                &mut registry,
                vec![MetaDirective::new("cacheControl", [DirectiveLocation::FieldDefinition])
                    .with_arg(MetaInputValue::new("maxAge", TypeRef::INT))],
            )
            .unwrap();
        registry.links.push(Link::new(Link::FEDERATION_V2).import("@key").import("@external"));

        let character = EntityType::builder("Character")
            .field(MetaField::new("id", TypeRef::named_nn(TypeRef::ID)).external())
            .field(MetaField::new("name", TypeRef::STRING).external())
            .key(KeyDeclaration::unresolvable("id"))
            .build_ref()
            .unwrap();

        let episode = EntityType::builder("Episode")
            .description("A film of the saga")
            .field(MetaField::new("id", TypeRef::named_nn(TypeRef::INT)))
            .field(MetaField::new("title", TypeRef::named_nn(TypeRef::STRING)))
            .field(MetaField::new("characters", TypeRef::named_nn_list_nn("Character")).provides("name"))
            .key("id")
            .build()
            .unwrap();

        let location = EntityType::builder("Location")
            .field(MetaField::new("id", TypeRef::named_nn(TypeRef::ID)))
            .field(MetaField::new("planet", TypeRef::named_nn("Planet")).shareable())
            .field(
                MetaField::new("distance", TypeRef::FLOAT)
                    .requires("planet{name}")
                    .override_from("legacy"),
            )
            .key("id")
            .key(KeyFields::nested("planet", vec!["name"]))
            .build()
            .unwrap();

        registry.insert_type(Arc::new(character)).unwrap();
        registry.insert_type(Arc::new(episode)).unwrap();
        registry.insert_type(Arc::new(location)).unwrap();
        registry
            .insert_type(ObjectType::new(
                "Planet",
                [
                    MetaField::new("name", TypeRef::named_nn(TypeRef::STRING)),
                    MetaField::new("climate", TypeRef::STRING).inaccessible(),
                ],
            ))
            .unwrap();
        registry.insert_type(ObjectType::new("Empty", [])).unwrap();
        registry
            .insert_type(ObjectType::new(
                "Query",
                [
                    MetaField::new("episodes", TypeRef::named_nn_list_nn("Episode")),
                    MetaField::new(SERVICE_FIELD, TypeRef::named_nn("_Service")),
                ],
            ))
            .unwrap();
        registry
            .insert_type(ObjectType::new(
                "_Service",
                [MetaField::new("sdl", TypeRef::STRING)],
            ))
            .unwrap();
        registry.insert_type(ScalarType::new("_Any")).unwrap();
        registry
    }

    #[test]
    fn federated_sdl() {
        let sdl = FederatedSdlPrinter::default().print(&registry()).unwrap();

        insta::assert_snapshot!(sdl, @r###"
        extend schema @link(url: "https://specs.apollo.dev/federation/v2.0", import: ["@key", "@external"])

        directive @cacheControl(maxAge: Int) on FIELD_DEFINITION

        extend type Character @key(fields: "id", resolvable: false) {
          id: ID! @external
          name: String @external
        }

        """A film of the saga"""
        type Episode @key(fields: "id") {
          id: Int!
          title: String!
          characters: [Character!]! @provides(fields: "name")
        }

        type Location @key(fields: "id") @key(fields: "planet { name }") {
          id: ID!
          planet: Planet! @shareable
          distance: Float @requires(fields: "planet { name }") @override(from: "legacy")
        }

        type Planet {
          name: String!
          climate: String @inaccessible
        }

        extend type Query {
          episodes: [Episode!]!
        }
        "###);
    }

    #[test]
    fn query_with_only_meta_fields_is_omitted() {
        let mut registry = Registry::new("Query");
        registry
            .insert_type(ObjectType::new(
                "Query",
                [
                    MetaField::new(SERVICE_FIELD, TypeRef::named_nn("_Service")),
                    MetaField::new(ENTITIES_FIELD, TypeRef::named_list("_Entity")),
                ],
            ))
            .unwrap();

        assert_eq!(FederatedSdlPrinter::default().print(&registry).unwrap(), "\n");
    }

    #[test]
    fn several_links_and_unusual_roots() {
        let mut registry = Registry::new("RootQuery");
        registry.links = vec![
            Link::new(Link::FEDERATION_V2).import("@key"),
            Link::new("https://specs.example.com/cache/v1.0"),
        ];
        registry
            .insert_type(ObjectType::new("RootQuery", [MetaField::new("ping", TypeRef::STRING)]))
            .unwrap();

        let sdl = FederatedSdlPrinter::default().print(&registry).unwrap();

        assert_eq!(
            sdl,
            indoc! {r#"
                extend schema
                  @link(url: "https://specs.apollo.dev/federation/v2.0", import: ["@key"])
                  @link(url: "https://specs.example.com/cache/v1.0")

                schema {
                  query: RootQuery
                }

                extend type RootQuery {
                  ping: String
                }
            "#}
        );
    }

    #[test]
    fn the_full_schema_keeps_federation_definitions() {
        let sdl = SchemaPrinter::default().print(&registry()).unwrap();

        assert!(sdl.contains("directive @key(fields: String!, resolvable: Boolean = true) repeatable on OBJECT | INTERFACE"));
        assert!(sdl.contains("scalar _Any"));
        assert!(sdl.contains("type Empty"));
        assert!(sdl.contains("directive @external on FIELD_DEFINITION"));
        assert!(!sdl.contains("ID! @external"));
    }

    #[test]
    fn malformed_provides_is_an_error() {
        let field = MetaField::new("characters", "Character").provides("name {");

        let error = FederatedSdlPrinter::default().print_field_directives(&field).unwrap_err();
        assert!(error.is_configuration());
    }
}
