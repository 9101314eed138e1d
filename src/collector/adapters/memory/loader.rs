//! In-memory loader and adapter resolver.

use std::collections::HashMap;

use crate::collector::{
    domain::{AdapterDefinition, ModelDefinition},
    ports::{AdapterResolver, LoaderError, LoaderResult, ModelLoader},
};

/// Model loader serving definitions registered under fixed locations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModelLoader {
    locations: HashMap<String, Vec<ModelDefinition>>,
}

impl InMemoryModelLoader {
    /// Creates a loader with no locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the definitions served for `location`.
    #[must_use]
    pub fn with_location(
        mut self,
        location: impl Into<String>,
        models: impl IntoIterator<Item = ModelDefinition>,
    ) -> Self {
        self.locations
            .insert(location.into(), models.into_iter().collect());
        self
    }
}

impl ModelLoader for InMemoryModelLoader {
    fn load(&self, location: &str) -> LoaderResult<Vec<ModelDefinition>> {
        self.locations
            .get(location)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(location.to_owned()))
    }
}

/// Adapter resolver backed by a fixed table of modules.
#[derive(Debug, Clone, Default)]
pub struct StaticAdapterResolver {
    modules: HashMap<String, AdapterDefinition>,
}

impl StaticAdapterResolver {
    /// Creates a resolver with no modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the definition returned for `module`.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>, definition: AdapterDefinition) -> Self {
        self.modules.insert(module.into(), definition);
        self
    }
}

impl AdapterResolver for StaticAdapterResolver {
    fn resolve(&self, module: &str) -> LoaderResult<AdapterDefinition> {
        self.modules
            .get(module)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(module.to_owned()))
    }
}
