use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use serde_json::{Map, Value};

use super::Registry;
use crate::BoxError;

/// Resolves the value of a single field.
pub type FieldResolver = Arc<dyn Fn(ResolverContext<'_>) -> Result<Value, BoxError> + Send + Sync>;

/// Caller owned values made available to every resolver.
///
/// State that resolvers need to share across calls belongs here rather than in
/// globals.
#[derive(Default)]
pub struct Data(HashMap<TypeId, Box<dyn Any + Send + Sync>>);

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same type
    pub fn insert<D: Any + Send + Sync>(&mut self, data: D) {
        self.0.insert(TypeId::of::<D>(), Box::new(data));
    }

    #[must_use]
    pub fn with<D: Any + Send + Sync>(mut self, data: D) -> Self {
        self.insert(data);
        self
    }

    pub fn get<D: Any + Send + Sync>(&self) -> Option<&D> {
        self.0.get(&TypeId::of::<D>()).and_then(|data| data.downcast_ref::<D>())
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Data").field("len", &self.0.len()).finish_non_exhaustive()
    }
}

/// Everything a field resolver gets to look at
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    pub registry: &'a Registry,
    pub parent: &'a Value,
    pub args: &'a Map<String, Value>,
    pub data: &'a Data,
}

impl<'a> ResolverContext<'a> {
    pub fn arg(&self, name: &str) -> Option<&'a Value> {
        self.args.get(name)
    }

    pub fn data<D: Any + Send + Sync>(&self) -> Option<&'a D> {
        self.data.get::<D>()
    }
}

/// Builds a [`FieldResolver`] from a closure.
pub fn field_resolver<F>(f: F) -> FieldResolver
where
    F: Fn(ResolverContext<'_>) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_is_keyed_by_type() {
        let data = Data::new().with(42_u32).with(String::from("buffer"));

        assert_eq!(data.get::<u32>(), Some(&42));
        assert_eq!(data.get::<String>().map(String::as_str), Some("buffer"));
        assert_eq!(data.get::<i64>(), None);
    }
}
