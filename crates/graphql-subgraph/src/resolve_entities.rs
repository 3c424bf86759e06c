//! Resolution of the entity references sent by the gateway through `_entities`

use serde_json::{Map, Value};

use crate::{
    entity::ReferenceValidation,
    registry::{field_resolver, Data, FieldResolver, MetaType, Registry},
    Error, InvariantError, ValidationError,
};

/// Dispatches each reference of a batch to the entity type it names.
///
/// References of entities without a reference resolver are returned as they are. The first
/// failure aborts the whole batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceDispatcher {
    validation: Option<ReferenceValidation>,
}

impl ReferenceDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks every reference against this policy on top of the entity's own one
    pub fn with_validation(validation: ReferenceValidation) -> Self {
        ReferenceDispatcher {
            validation: Some(validation),
        }
    }

    /// One result per reference, in order
    pub fn resolve(&self, registry: &Registry, representations: Vec<Value>, data: &Data) -> Result<Vec<Value>, Error> {
        let span = tracing::info_span!("federation_resolver", representations = representations.len());
        let _guard = span.enter();

        representations
            .into_iter()
            .enumerate()
            .map(|(index, representation)| {
                self.resolve_one(registry, representation, data).map_err(|err| {
                    tracing::debug!(index, %err, "reference resolution failed");
                    err
                })
            })
            .collect()
    }

    fn resolve_one(&self, registry: &Registry, representation: Value, data: &Data) -> Result<Value, Error> {
        let typename = representation
            .get("__typename")
            .and_then(Value::as_str)
            .ok_or(InvariantError::MissingTypename)?
            .to_string();

        tracing::trace!(%typename, "resolving reference");

        let entity = registry
            .lookup(&typename)
            .and_then(MetaType::as_entity)
            .ok_or_else(|| InvariantError::UnknownEntityType(typename.clone()))?;

        let matching_key_required = self.validation == Some(ReferenceValidation::MatchingKey)
            || entity.reference_validation() == ReferenceValidation::MatchingKey;
        if matching_key_required && entity.matching_key(&representation).is_none() {
            return Err(ValidationError::NoMatchingKey(typename).into());
        }

        if !entity.has_reference_resolver() {
            return Ok(representation);
        }

        let resolved = entity.resolve_reference(representation, data)?;

        Ok(with_typename(resolved, typename))
    }
}

/// Adds `__typename` to a resolved object that doesn't have one, so that the `_Entity` member can be told apart
fn with_typename(value: Value, typename: String) -> Value {
    match value {
        Value::Object(mut object) => {
            object
                .entry("__typename")
                .or_insert_with(|| Value::String(typename));
            Value::Object(object)
        }
        other => other,
    }
}

/// The `representations` argument of `_entities`
pub fn representations(args: &Map<String, Value>) -> Result<Vec<Value>, ValidationError> {
    match args.get("representations") {
        Some(Value::Array(representations)) => Ok(representations.clone()),
        _ => Err(ValidationError::InvalidRepresentations),
    }
}

/// The resolver bound to `_entities` unless the caller supplies their own
pub(crate) fn entities_resolver(dispatcher: ReferenceDispatcher) -> FieldResolver {
    field_resolver(move |ctx| {
        let representations = representations(ctx.args)?;
        let resolved = dispatcher.resolve(ctx.registry, representations, ctx.data)?;
        Ok(Value::Array(resolved))
    })
}
