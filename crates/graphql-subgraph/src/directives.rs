//! The federation directives and how they are merged with the directives of a schema

use indexmap::IndexMap;
use strum::IntoEnumIterator;

use crate::{
    registry::{DirectiveLocation, MetaDirective, MetaInputValue, Registry, ScalarType, TypeRef, BUILTIN_DIRECTIVES},
    ConfigurationError,
};

/// Scalar accepted by the `import` argument of `@link`
pub const LINK_IMPORT_SCALAR: &str = "link_Import";

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
    serde::Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum FederationDirective {
    Key,
    External,
    Inaccessible,
    Link,
    Override,
    Provides,
    Requires,
    Shareable,
}

impl FederationDirective {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether a directive with this name belongs to federation, whichever definition it has
    pub fn is_federation_directive(name: &str) -> bool {
        name.parse::<FederationDirective>().is_ok()
    }

    pub fn definition(self) -> MetaDirective {
        use DirectiveLocation::*;

        let fields = || MetaInputValue::new("fields", TypeRef::named_nn(TypeRef::STRING));

        match self {
            FederationDirective::Key => MetaDirective::new("key", [Object, Interface])
                .with_arg(fields())
                .with_arg(MetaInputValue::new("resolvable", TypeRef::BOOLEAN).with_default("true"))
                .repeatable(),
            FederationDirective::External => MetaDirective::new("external", [FieldDefinition]),
            FederationDirective::Inaccessible => {
                MetaDirective::new("inaccessible", [FieldDefinition, Interface, Object, Union])
            }
            FederationDirective::Link => MetaDirective::new("link", [Schema])
                .with_arg(MetaInputValue::new("url", TypeRef::named_nn(TypeRef::STRING)))
                .with_arg(MetaInputValue::new("as", TypeRef::STRING))
                .with_arg(MetaInputValue::new("for", TypeRef::STRING))
                .with_arg(MetaInputValue::new("import", TypeRef::named_nn(LINK_IMPORT_SCALAR).list()))
                .repeatable(),
            FederationDirective::Override => MetaDirective::new("override", [FieldDefinition])
                .with_arg(MetaInputValue::new("from", TypeRef::named_nn(TypeRef::STRING))),
            FederationDirective::Provides => MetaDirective::new("provides", [FieldDefinition]).with_arg(fields()),
            FederationDirective::Requires => MetaDirective::new("requires", [FieldDefinition]).with_arg(fields()),
            FederationDirective::Shareable => MetaDirective::new("shareable", [FieldDefinition, Object]),
        }
    }
}

/// The federation directives a schema declares.
///
/// Built by the caller and handed to the schema builder. A definition can be swapped for another
/// one, directives are always identified by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveSet {
    definitions: IndexMap<FederationDirective, MetaDirective>,
}

impl DirectiveSet {
    /// Every federation directive
    pub fn federation() -> Self {
        Self::only(FederationDirective::iter())
    }

    pub fn only(directives: impl IntoIterator<Item = FederationDirective>) -> Self {
        DirectiveSet {
            definitions: directives
                .into_iter()
                .map(|directive| (directive, directive.definition()))
                .collect(),
        }
    }

    /// Uses another definition for one of the directives
    #[must_use]
    pub fn with_definition(mut self, directive: FederationDirective, definition: MetaDirective) -> Self {
        self.definitions.insert(directive, definition);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.values().any(|definition| definition.name == name)
    }

    pub fn directives(&self) -> impl Iterator<Item = FederationDirective> + '_ {
        self.definitions.keys().copied()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MetaDirective> {
        self.definitions.values()
    }

    /// Adds the caller's directives and this set to the registry, which already has the built-in ones.
    ///
    /// A caller directive named like one of the set is replaced by the set's definition.
    pub fn merge_into(&self, registry: &mut Registry, directives: Vec<MetaDirective>) -> Result<(), ConfigurationError> {
        for directive in directives {
            if BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
                return Err(ConfigurationError::BuiltinDirectiveCollision(directive.name));
            }

            if self.contains(&directive.name) {
                tracing::warn!(directive = %directive.name, "replacing directive with its federation definition");
                continue;
            }

            registry.insert_directive(directive);
        }

        for definition in self.definitions() {
            registry.insert_directive(definition.clone());
        }

        if self.definitions.contains_key(&FederationDirective::Link) {
            registry.insert_type(ScalarType::new(LINK_IMPORT_SCALAR))?;
        }

        Ok(())
    }
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self::federation()
    }
}
