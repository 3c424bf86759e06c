use graphql_subgraph::{
    registry::{Data, MetaField, MetaType, ObjectType, TypeRef},
    representations, EntityType, FederatedSchema, FederatedSchemaBuilder, InvariantError, KeyDeclaration,
    PrintOptions, ENTITIES_FIELD, SERVICE_FIELD,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

struct StarWars {
    episodes: Vec<Value>,
    characters: Vec<Value>,
    locations: Vec<Value>,
}

impl StarWars {
    fn new() -> Self {
        StarWars {
            episodes: vec![
                json!({"id": 1, "title": "A New Hope", "characters": [1, 2, 3]}),
                json!({"id": 2, "title": "The Empire Strikes Back", "characters": [1, 2, 3]}),
                json!({"id": 3, "title": "Return of the Jedi", "characters": [1, 2, 3]}),
            ],
            characters: vec![
                json!({"id": 1, "name": "Luke Skywalker", "locations": [1, 2, 3]}),
                json!({"id": 2, "name": "Han Solo", "locations": [1, 2]}),
                json!({"id": 3, "name": "Leia Skywalker", "locations": [3]}),
            ],
            locations: vec![
                json!({"id": 1, "name": "Tatooine"}),
                json!({"id": 2, "name": "Endor"}),
                json!({"id": 3, "name": "Hoth"}),
            ],
        }
    }

    fn episode(&self, id: &Value) -> Option<Value> {
        self.episodes.iter().find(|episode| &episode["id"] == id).cloned()
    }
}

/// The items of `items` whose id is listed in `ids`
fn by_ids(items: &[Value], ids: &Value) -> Value {
    let ids = ids.as_array().cloned().unwrap_or_default();
    items.iter().filter(|item| ids.contains(&item["id"])).cloned().collect()
}

fn data() -> Data {
    Data::new().with(StarWars::new())
}

fn star_wars(ctx_data: &Data) -> &StarWars {
    ctx_data.get::<StarWars>().unwrap()
}

fn episodes_schema() -> FederatedSchemaBuilder {
    let episode = EntityType::builder("Episode")
        .description("A film in the Star Wars Trilogy")
        .field(MetaField::new("id", TypeRef::named_nn(TypeRef::INT)))
        .field(MetaField::new("title", TypeRef::named_nn(TypeRef::STRING)))
        .field(
            MetaField::new("characters", TypeRef::named_nn_list_nn("Character"))
                .provides("name")
                .with_resolver(|ctx| Ok(by_ids(&star_wars(ctx.data).characters, &ctx.parent["characters"]))),
        )
        .key("id")
        .resolve_reference(|reference, data| {
            let mut episode = star_wars(data)
                .episode(&reference["id"])
                .ok_or_else(|| format!("no episode with id {}", reference["id"]))?;
            episode["__typename"] = json!("Episode");
            Ok(episode)
        })
        .build()
        .unwrap();

    let character = EntityType::builder("Character")
        .description("A character in the Star Wars Trilogy")
        .field(MetaField::new("id", TypeRef::named_nn(TypeRef::INT)).external())
        .field(MetaField::new("name", TypeRef::named_nn(TypeRef::STRING)).external())
        .field(
            MetaField::new("locations", TypeRef::named_list("Location").non_null())
                .requires("name")
                .with_resolver(|ctx| Ok(by_ids(&star_wars(ctx.data).locations, &ctx.parent["locations"]))),
        )
        .key(KeyDeclaration::unresolvable("id"))
        .build_ref()
        .unwrap();

    let location = EntityType::builder("Location")
        .description("A location in the Star Wars Trilogy")
        .field(MetaField::new("id", TypeRef::named_nn(TypeRef::INT)).external())
        .field(MetaField::new("name", TypeRef::named_nn(TypeRef::STRING)).external())
        .key(KeyDeclaration::unresolvable("id"))
        .build_ref()
        .unwrap();

    let query = ObjectType::new(
        "Query",
        [
            MetaField::new("episodes", TypeRef::named_nn_list_nn("Episode"))
                .with_resolver(|ctx| Ok(Value::Array(star_wars(ctx.data).episodes.clone()))),
            MetaField::new("deprecatedEpisodes", TypeRef::named_nn_list_nn("Episode"))
                .deprecated(Some("Because you should use the other one.")),
        ],
    );

    FederatedSchema::build(query)
        .register(episode)
        .register(character)
        .register(location)
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn entity_types() {
    let schema = episodes_schema().finish().unwrap();

    assert!(schema.has_entity_types());
    let names = schema.entity_types().map(EntityType::name).collect::<Vec<_>>();
    assert_eq!(names, ["Character", "Episode", "Location"]);
}

#[test]
fn meta_types() {
    let schema = episodes_schema().finish().unwrap();
    let registry = schema.registry();

    assert!(matches!(registry.lookup("_Any"), Some(MetaType::Scalar(_))));
    assert!(matches!(
        registry.lookup("_Entity"),
        Some(MetaType::Union(entities)) if entities.possible_types == ["Character", "Episode", "Location"]
    ));

    let query = registry.query().and_then(MetaType::fields).unwrap();
    assert_eq!(query[SERVICE_FIELD].ty.to_string(), "_Service!");
    assert_eq!(query[ENTITIES_FIELD].ty.to_string(), "[_Entity]");
    assert_eq!(
        query[ENTITIES_FIELD].args["representations"].ty.to_string(),
        "[_Any!]!"
    );
}

#[test]
fn directives() {
    let schema = episodes_schema().finish().unwrap();
    let directives = &schema.registry().directives;

    for name in ["key", "external", "provides", "requires", "include", "skip", "deprecated"] {
        assert!(directives.contains_key(name), "missing @{name}");
    }
}

#[test]
fn running_queries() {
    let schema = episodes_schema().finish().unwrap();
    let data = data();

    let episodes = schema
        .resolve_field("Query", "episodes", &Value::Null, &Map::new(), &data)
        .unwrap();
    let first = &episodes[0];
    assert_eq!(first["title"], "A New Hope");

    let characters = schema
        .resolve_field("Episode", "characters", first, &Map::new(), &data)
        .unwrap();
    let names = characters
        .as_array()
        .unwrap()
        .iter()
        .map(|character| schema.resolve_field("Character", "name", character, &Map::new(), &data))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(names, ["Luke Skywalker", "Han Solo", "Leia Skywalker"]);

    let locations = schema
        .resolve_field("Character", "locations", &characters[2], &Map::new(), &data)
        .unwrap();
    assert_eq!(locations, json!([{"id": 3, "name": "Hoth"}]));
}

#[test]
fn service_sdl() {
    let schema = episodes_schema().finish().unwrap();
    let data = data();

    let service = schema
        .resolve_field("Query", SERVICE_FIELD, &Value::Null, &Map::new(), &data)
        .unwrap();
    let sdl = schema
        .resolve_field("_Service", "sdl", &service, &Map::new(), &data)
        .unwrap();

    assert_eq!(sdl.as_str(), Some(schema.service_sdl()));

    insta::assert_snapshot!(schema.service_sdl(), @r###"
    """A character in the Star Wars Trilogy"""
    extend type Character @key(fields: "id", resolvable: false) {
      id: Int! @external
      name: String! @external
      locations: [Location]! @requires(fields: "name")
    }

    """A film in the Star Wars Trilogy"""
    type Episode @key(fields: "id") {
      id: Int!
      title: String!
      characters: [Character!]! @provides(fields: "name")
    }

    """A location in the Star Wars Trilogy"""
    extend type Location @key(fields: "id", resolvable: false) {
      id: Int! @external
      name: String! @external
    }

    extend type Query {
      episodes: [Episode!]!
      deprecatedEpisodes: [Episode!]! @deprecated(reason: "Because you should use the other one.")
    }
    "###);
}

#[test]
fn printing_is_deterministic() {
    let schema = episodes_schema().finish().unwrap();
    let options = PrintOptions {
        sort_fields: true,
        comment_descriptions: true,
    };

    assert_eq!(schema.print_sdl(PrintOptions::default()).unwrap(), schema.service_sdl());
    assert_eq!(schema.print_sdl(options).unwrap(), schema.print_sdl(options).unwrap());
    assert_eq!(
        episodes_schema().finish().unwrap().service_sdl(),
        schema.service_sdl()
    );
}

#[test]
fn federation_directives_are_only_used_never_declared() {
    let sdl = episodes_schema().finish().unwrap().service_sdl().to_string();

    for directive in ["key", "external", "provides", "requires", "link", "shareable"] {
        assert!(!sdl.contains(&format!("directive @{directive}")), "@{directive} is declared");
    }
    assert!(sdl.contains("type Episode @key(fields: \"id\")"));
    assert!(!sdl.contains("_service"));
    assert!(!sdl.contains("_entities"));
    assert!(!sdl.contains("_Any"));
}

#[test]
fn full_schema_sdl() {
    let sdl = episodes_schema().finish().unwrap().print_full_sdl().unwrap();

    assert!(sdl.contains("directive @key(fields: String!, resolvable: Boolean = true) repeatable on OBJECT | INTERFACE"));
    assert!(sdl.contains(
        "directive @link(url: String!, as: String, for: String, import: [link_Import!]) repeatable on SCHEMA"
    ));
    assert!(sdl.contains("scalar _Any"));
    assert!(sdl.contains("union _Entity = Character | Episode | Location"));
    assert!(sdl.contains("  _entities(representations: [_Any!]!): [_Entity]"));
    assert!(sdl.contains("  _service: _Service!"));
}

#[test]
fn resolving_entity_references() {
    let schema = episodes_schema().finish().unwrap();
    let args = args(json!({"representations": [{"__typename": "Episode", "id": 1}]}));

    let entities = schema
        .resolve_field("Query", ENTITIES_FIELD, &Value::Null, &args, &data())
        .unwrap();

    assert_eq!(
        entities,
        json!([{"__typename": "Episode", "id": 1, "title": "A New Hope", "characters": [1, 2, 3]}])
    );
}

#[test]
fn stubs_are_passed_through() {
    let schema = episodes_schema().finish().unwrap();
    let reference = json!({"__typename": "Character", "id": 2});

    let entities = schema.resolve_entities(vec![reference.clone()], &data()).unwrap();

    assert_eq!(entities, [reference]);
}

#[test]
fn unknown_references_fail() {
    let schema = episodes_schema().finish().unwrap();
    let args = args(json!({"representations": [{"__typename": "Starship", "id": 1}]}));

    let error = schema
        .resolve_field("Query", ENTITIES_FIELD, &Value::Null, &args, &data())
        .unwrap_err();

    assert!(error.is_invariant());
    assert!(matches!(
        error,
        graphql_subgraph::Error::Invariant(InvariantError::UnknownEntityType(name)) if name == "Starship"
    ));
}

#[test]
fn reference_resolver_errors_are_not_translated() {
    let schema = episodes_schema().finish().unwrap();

    let error = schema
        .resolve_entities(vec![json!({"__typename": "Episode", "id": 7})], &data())
        .unwrap_err();

    assert_eq!(
        error.resolver_error().map(ToString::to_string).as_deref(),
        Some("no episode with id 7")
    );
}

#[test]
fn override_schema_resolver() {
    let schema = episodes_schema()
        .entities_resolver(|ctx| {
            let resolved = representations(ctx.args)?
                .into_iter()
                .map(|mut reference| -> Result<Value, graphql_subgraph::BoxError> {
                    let entity = reference["__typename"]
                        .as_str()
                        .and_then(|typename| ctx.registry.lookup(typename))
                        .and_then(MetaType::as_entity)
                        .ok_or("not an entity")?;
                    reference["id"] = json!(reference["id"].as_i64().unwrap_or_default() + 1);
                    Ok(entity.resolve_reference(reference, ctx.data)?)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(resolved))
        })
        .finish()
        .unwrap();
    let args = args(json!({"representations": [{"__typename": "Episode", "id": 1}]}));

    let entities = schema
        .resolve_field("Query", ENTITIES_FIELD, &Value::Null, &args, &data())
        .unwrap();

    assert_eq!(entities[0]["id"], 2);
    assert_eq!(entities[0]["title"], "The Empire Strikes Back");

    // The dispatcher is still reachable directly
    let entities = schema
        .resolve_entities(vec![json!({"__typename": "Episode", "id": 1})], &data())
        .unwrap();
    assert_eq!(entities[0]["title"], "A New Hope");
}
