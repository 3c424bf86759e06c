/// Errors produced by caller supplied callbacks (resolvers, field thunks).
///
/// They are carried through the crate untouched so the embedding executor can
/// decide what the client sees.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by every fallible operation of this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Invariant(#[from] InvariantError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A caller supplied callback failed
    #[error(transparent)]
    Resolver(BoxError),
    #[error("could not write SDL: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }

    /// The error returned by a caller supplied callback, if this is one.
    pub fn resolver_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Resolver(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Construction time errors. These are fatal and never retried.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Entity type '{ty}' must declare at least one @key")]
    MissingKeys { ty: String },
    #[error("Key field '{field}' does not exist on type '{ty}'")]
    UnknownKeyField { ty: String, field: String },
    #[error("Key field '{field}' of '{ty}' is a {field_ty}, it needs a selection set")]
    KeyFieldNeedsSelection { ty: String, field: String, field_ty: String },
    #[error("Key field '{field}' of '{ty}' is a leaf of type {field_ty}, it cannot have a selection set")]
    KeyFieldIsLeaf { ty: String, field: String, field_ty: String },
    #[error("Entity type '{ty}' uses both `keys` and the legacy `key_fields` configuration")]
    ConflictingKeyConfiguration { ty: String },
    #[error(
        "There is invalid config of EntityRef '{ty}'. Referenced entity must have exactly one directive @key, found {count}."
    )]
    StubKeyCount { ty: String, count: usize },
    #[error(
        "There is invalid config of EntityRef '{ty}'. Referenced entity directive @key must have argument \"resolvable\" with value `false`."
    )]
    StubResolvable { ty: String },
    #[error("EntityRef '{ty}' is owned by another service and cannot have a reference resolver")]
    StubWithResolver { ty: String },
    #[error("Unsupported key field set shape: {0}")]
    UnsupportedKeyShape(String),
    #[error("The `resolvable` argument of a @key must be a boolean, found {0}")]
    InvalidResolvable(String),
    #[error("Invalid federation metadata for a field: {0}")]
    InvalidFieldMetadata(String),
    #[error("Could not parse field set \"{input}\": {reason}")]
    InvalidFieldSet { input: String, reason: String },
    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("Unknown type '{ty}' referenced by '{referenced_by}'")]
    UnknownType { ty: String, referenced_by: String },
    #[error("Type '{ty}' is a {kind}, expected {expected}")]
    UnexpectedKind {
        ty: String,
        kind: &'static str,
        expected: &'static str,
    },
    #[error("Field '{field}' is reserved for federation and cannot be declared on '{ty}'")]
    ReservedField { ty: String, field: String },
    #[error("Directive @{0} collides with a built-in directive")]
    BuiltinDirectiveCollision(String),
    #[error("Invalid link import: {0}")]
    InvalidLinkImport(String),
}

/// Errors detected while resolving entity references
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvariantError {
    #[error("Type name must be provided in the reference.")]
    MissingTypename,
    #[error(
        "The _entities resolver tried to load an entity for type \"{0}\", but no object type of that name was found in the schema"
    )]
    UnknownEntityType(String),
    #[error("No reference resolver was set in the configuration of '{0}'.")]
    MissingReferenceResolver(String),
    #[error("Type '{ty}' has no field '{field}'")]
    UnknownField { ty: String, field: String },
}

/// Errors about the shape of values handed to the resolution functions
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Type name must be provided in the reference.")]
    MissingTypename,
    #[error("A reference must be an object, found {0}")]
    NotAnObject(String),
    #[error("Reference of type '{found}' was given to entity '{expected}'")]
    TypenameMismatch { expected: String, found: String },
    #[error("Reference to '{0}' does not contain the fields of any of its keys")]
    NoMatchingKey(String),
    #[error("The `representations` argument must be a list")]
    InvalidRepresentations,
}
