use std::{
    fmt,
    sync::{Mutex, OnceLock, PoisonError},
};

use indexmap::IndexMap;
use serde_json::Value;

use super::{FieldResolver, ResolverContext, TypeRef};
use crate::{BoxError, ConfigurationError};

/// Produces the fields of a type on first access
pub type FieldsThunk = Box<dyn Fn() -> Result<Vec<MetaField>, BoxError> + Send + Sync>;

#[derive(Clone)]
pub struct MetaField {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, MetaInputValue>,
    pub ty: TypeRef,
    pub deprecation: Deprecation,
    pub federation: Option<Box<FederationProperties>>,
    pub resolver: Option<FieldResolver>,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> MetaField {
        MetaField {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            ty: ty.into(),
            deprecation: Deprecation::NoDeprecated,
            federation: None,
            resolver: None,
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
    pub fn deprecated(self, reason: Option<&str>) -> Self {
        Self {
            deprecation: Deprecation::Deprecated {
                reason: reason.map(str::to_string),
            },
            ..self
        }
    }

    #[must_use]
    pub fn with_resolver<F>(self, resolver: F) -> Self
    where
        F: Fn(ResolverContext<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            resolver: Some(std::sync::Arc::new(resolver)),
            ..self
        }
    }

    #[must_use]
    pub fn with_federation(self, federation: FederationProperties) -> Self {
        Self {
            federation: Some(Box::new(federation)),
            ..self
        }
    }

    /// Marks the field as owned by another subgraph
    #[must_use]
    pub fn external(self) -> Self {
        self.update_federation(|federation| federation.external = true)
    }

    #[must_use]
    pub fn provides(self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.update_federation(|federation| federation.provides = Some(fields))
    }

    #[must_use]
    pub fn requires(self, fields: impl Into<String>) -> Self {
        let fields = fields.into();
        self.update_federation(|federation| federation.requires = Some(fields))
    }

    #[must_use]
    pub fn shareable(self) -> Self {
        self.update_federation(|federation| federation.shareable = true)
    }

    #[must_use]
    pub fn inaccessible(self) -> Self {
        self.update_federation(|federation| federation.inaccessible = true)
    }

    #[must_use]
    pub fn override_from(self, subgraph: impl Into<String>) -> Self {
        let subgraph = subgraph.into();
        self.update_federation(|federation| federation.r#override = Some(subgraph))
    }

    fn update_federation(mut self, update: impl FnOnce(&mut FederationProperties)) -> Self {
        update(self.federation.get_or_insert_with(Default::default));
        self
    }

    pub fn is_external(&self) -> bool {
        self.federation.as_ref().is_some_and(|federation| federation.external)
    }
}

impl fmt::Debug for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaField")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("args", &self.args)
            .field("ty", &self.ty)
            .field("deprecation", &self.deprecation)
            .field("federation", &self.federation)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaInputValue {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// The default value, as GraphQL literal syntax
    pub default_value: Option<String>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
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
    pub fn with_default(self, default_value: impl Into<String>) -> Self {
        Self {
            default_value: Some(default_value.into()),
            ..self
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, Default)]
pub enum Deprecation {
    #[default]
    NoDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

impl Deprecation {
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::NoDeprecated => None,
            Deprecation::Deprecated { reason } => reason.as_deref(),
        }
    }
}

/// Federation metadata attached to a single field
#[derive(Clone, Default, Debug, serde::Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FederationProperties {
    #[serde(default, alias = "isExternal")]
    pub external: bool,
    #[serde(default)]
    pub provides: Option<String>,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub shareable: bool,
    #[serde(default)]
    pub inaccessible: bool,
    #[serde(default)]
    pub r#override: Option<String>,
}

impl FederationProperties {
    /// Reads field metadata written as a JSON object, e.g. `{"isExternal": true, "requires": "name"}`
    pub fn from_json(value: &Value) -> Result<Self, ConfigurationError> {
        serde_json::from_value(value.clone())
            .map_err(|err| ConfigurationError::InvalidFieldMetadata(format!("{value}: {err}")))
    }
}

/// The fields of an object or interface type.
///
/// Either known upfront or produced by a thunk that's evaluated once, on first access.
pub struct Fields(FieldsInner);

enum FieldsInner {
    Eager(IndexMap<String, MetaField>),
    Lazy {
        thunk: FieldsThunk,
        resolved: OnceLock<IndexMap<String, MetaField>>,
        /// Held while the thunk runs
        init: Mutex<()>,
    },
}

impl Fields {
    pub fn new(fields: impl IntoIterator<Item = MetaField>) -> Self {
        Fields(FieldsInner::Eager(into_map(fields)))
    }

    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> Result<Vec<MetaField>, BoxError> + Send + Sync + 'static,
    {
        Fields(FieldsInner::Lazy {
            thunk: Box::new(thunk),
            resolved: OnceLock::new(),
            init: Mutex::new(()),
        })
    }

    /// Evaluates the thunk if that hasn't happened yet
    pub fn try_fields(&self) -> Result<&IndexMap<String, MetaField>, BoxError> {
        match &self.0 {
            FieldsInner::Eager(fields) => Ok(fields),
            FieldsInner::Lazy { thunk, resolved, init } => {
                if let Some(fields) = resolved.get() {
                    return Ok(fields);
                }

                let _guard = init.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(fields) = resolved.get() {
                    return Ok(fields);
                }

                let fields = into_map(thunk()?);
                Ok(resolved.get_or_init(|| fields))
            }
        }
    }

    /// The fields, or nothing for a thunk that was never evaluated.
    ///
    /// Every thunk of a built registry has been evaluated.
    pub fn fields(&self) -> &IndexMap<String, MetaField> {
        static EMPTY: OnceLock<IndexMap<String, MetaField>> = OnceLock::new();

        match &self.0 {
            FieldsInner::Eager(fields) => fields,
            FieldsInner::Lazy { resolved, .. } => resolved.get().unwrap_or_else(|| EMPTY.get_or_init(IndexMap::new)),
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.0, FieldsInner::Lazy { .. })
    }

    /// Turns these into an eager map, evaluating the thunk if needed
    pub fn into_map(self) -> Result<IndexMap<String, MetaField>, BoxError> {
        match self.0 {
            FieldsInner::Eager(fields) => Ok(fields),
            FieldsInner::Lazy { thunk, resolved, .. } => match resolved.into_inner() {
                Some(fields) => Ok(fields),
                None => Ok(into_map(thunk()?)),
            },
        }
    }
}

impl Default for Fields {
    fn default() -> Self {
        Fields(FieldsInner::Eager(IndexMap::new()))
    }
}

impl From<IndexMap<String, MetaField>> for Fields {
    fn from(fields: IndexMap<String, MetaField>) -> Self {
        Fields(FieldsInner::Eager(fields))
    }
}

impl From<Vec<MetaField>> for Fields {
    fn from(fields: Vec<MetaField>) -> Self {
        Fields::new(fields)
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            FieldsInner::Eager(fields) => f.debug_tuple("Eager").field(fields).finish(),
            FieldsInner::Lazy { resolved, .. } => f.debug_tuple("Lazy").field(&resolved.get()).finish(),
        }
    }
}

fn into_map(fields: impl IntoIterator<Item = MetaField>) -> IndexMap<String, MetaField> {
    fields.into_iter().map(|field| (field.name.clone(), field)).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    };

    use serde_json::json;

    use super::*;

    #[test]
    fn thunks_are_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fields = Fields::lazy({
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![MetaField::new("id", TypeRef::named_nn(TypeRef::INT))])
            }
        });

        assert!(fields.fields().is_empty());
        assert_eq!(fields.try_fields().unwrap().len(), 1);
        assert_eq!(fields.try_fields().unwrap().len(), 1);
        assert_eq!(fields.fields().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_accesses_share_one_evaluation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fields = Fields::lazy({
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(50));
                Ok(vec![MetaField::new("id", TypeRef::named_nn(TypeRef::INT))])
            }
        });
        let barrier = Barrier::new(2);

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    barrier.wait();
                    assert_eq!(fields.try_fields().unwrap().len(), 1);
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn thunk_errors_are_returned_untouched() {
        let fields = Fields::lazy(|| Err("boom".into()));

        assert_eq!(fields.try_fields().unwrap_err().to_string(), "boom");
        assert_eq!(fields.into_map().unwrap_err().to_string(), "boom");
    }

    #[test]
    fn field_metadata_from_json() {
        let federation = FederationProperties::from_json(&json!({"isExternal": true, "requires": "name"})).unwrap();
        assert!(federation.external);
        assert_eq!(federation.requires.as_deref(), Some("name"));

        let error = FederationProperties::from_json(&json!({"isExternal": "yes"})).unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidFieldMetadata(_)));

        let error = FederationProperties::from_json(&json!({"provides": 1})).unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidFieldMetadata(_)));
    }
}
