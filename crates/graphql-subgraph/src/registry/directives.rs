use indexmap::IndexMap;

use super::{MetaInputValue, TypeRef};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaDirective {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, MetaInputValue>,
    pub is_repeatable: bool,
}

impl MetaDirective {
    pub fn new(name: impl Into<String>, locations: impl IntoIterator<Item = DirectiveLocation>) -> Self {
        MetaDirective {
            name: name.into(),
            description: None,
            locations: locations.into_iter().collect(),
            args: IndexMap::new(),
            is_repeatable: false,
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
    pub fn with_arg(mut self, arg: MetaInputValue) -> Self {
        self.args.insert(arg.name.clone(), arg);
        self
    }

    #[must_use]
    pub fn repeatable(self) -> Self {
        Self {
            is_repeatable: true,
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

/// Names of the directives every GraphQL service supports
pub const BUILTIN_DIRECTIVES: &[&str] = &["skip", "include", "deprecated", "specifiedBy"];

pub fn builtin_directives() -> Vec<MetaDirective> {
    use DirectiveLocation::*;

    vec![
        MetaDirective::new("skip", [Field, FragmentSpread, InlineFragment])
            .with_description("Directs the executor to skip this field or fragment when the `if` argument is true.")
            .with_arg(
                MetaInputValue::new("if", TypeRef::named_nn(TypeRef::BOOLEAN)).with_description("Skipped when true."),
            ),
        MetaDirective::new("include", [Field, FragmentSpread, InlineFragment])
            .with_description(
                "Directs the executor to include this field or fragment only when the `if` argument is true.",
            )
            .with_arg(
                MetaInputValue::new("if", TypeRef::named_nn(TypeRef::BOOLEAN)).with_description("Included when true."),
            ),
        MetaDirective::new("deprecated", [FieldDefinition, EnumValue, ArgumentDefinition, InputFieldDefinition])
            .with_description("Marks an element of a GraphQL schema as no longer supported.")
            .with_arg(MetaInputValue::new("reason", TypeRef::named(TypeRef::STRING)).with_default("\"No longer supported\"")),
        MetaDirective::new("specifiedBy", [Scalar])
            .with_description("Exposes a URL that specifies the behaviour of this scalar.")
            .with_arg(MetaInputValue::new("url", TypeRef::named_nn(TypeRef::STRING))),
    ]
}
