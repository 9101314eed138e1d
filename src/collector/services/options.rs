//! Plugin options and their resolution into fragments.

use crate::collector::{
    domain::{
        AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, Fragment,
        ModelDefaults, ModelDefinition, StructuredFragment, unique_keys,
    },
    ports::{AdapterResolver, LoaderError, ModelLoader},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Where a plugin's model definitions come from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ModelsSource {
    /// A location handed to the [`ModelLoader`], such as a file path.
    Location(String),
    /// Inline definitions.
    Many(Vec<ModelDefinition>),
    /// A single inline definition.
    One(ModelDefinition),
}

/// How an adapter is supplied in plugin options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AdapterSource {
    /// A module name handed to the [`AdapterResolver`].
    Module(String),
    /// An inline definition.
    Inline(AdapterDefinition),
}

/// Options a plugin registers with.
///
/// Mirrors [`StructuredFragment`], except that models may be given by
/// location and adapters by module name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginOptions {
    models: Option<ModelsSource>,
    #[serde(deserialize_with = "unique_keys")]
    adapters: BTreeMap<AdapterName, AdapterSource>,
    #[serde(deserialize_with = "unique_keys")]
    connections: BTreeMap<ConnectionName, ConnectionDescriptor>,
    defaults: Option<ModelDefaults>,
    teardown_policy: Option<bool>,
}

/// Error returned when plugin options cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("bad plugin options: {0}")]
pub struct OptionsError(pub String);

impl PluginOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] when the text is not valid options, for
    /// example when `models` is neither a location nor definitions.
    pub fn from_json_str(raw: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(raw).map_err(|err| OptionsError(err.to_string()))
    }

    /// Parses options from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] when the value is not valid options.
    pub fn from_value(value: serde_json::Value) -> Result<Self, OptionsError> {
        serde_json::from_value(value).map_err(|err| OptionsError(err.to_string()))
    }

    /// Loads models from `location` through the [`ModelLoader`].
    #[must_use]
    pub fn with_models_location(mut self, location: impl Into<String>) -> Self {
        self.models = Some(ModelsSource::Location(location.into()));
        self
    }

    /// Uses inline model definitions.
    #[must_use]
    pub fn with_models(mut self, models: impl IntoIterator<Item = ModelDefinition>) -> Self {
        self.models = Some(ModelsSource::Many(models.into_iter().collect()));
        self
    }

    /// Adds an adapter.
    #[must_use]
    pub fn with_adapter(mut self, name: AdapterName, source: AdapterSource) -> Self {
        self.adapters.insert(name, source);
        self
    }

    /// Adds a connection.
    #[must_use]
    pub fn with_connection(mut self, name: ConnectionName, descriptor: ConnectionDescriptor) -> Self {
        self.connections.insert(name, descriptor);
        self
    }

    /// Sets tree-wide model defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: ModelDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Sets the tree-wide teardown policy.
    #[must_use]
    pub const fn with_teardown_policy(mut self, teardown_on_stop: bool) -> Self {
        self.teardown_policy = Some(teardown_on_stop);
        self
    }

    /// Returns where models come from, if configured.
    #[must_use]
    pub const fn models(&self) -> Option<&ModelsSource> {
        self.models.as_ref()
    }
}

/// Errors raised while resolving plugin options into a fragment.
#[derive(Debug, Clone, Error)]
pub enum FragmentResolveError {
    /// Models could not be loaded from their location.
    #[error("failed to load models from {location}: {source}")]
    Models {
        /// Location handed to the loader.
        location: String,
        /// Loader failure.
        source: LoaderError,
    },

    /// An adapter module could not be resolved.
    #[error("failed to resolve adapter {adapter}: {source}")]
    Adapter {
        /// Adapter being resolved.
        adapter: AdapterName,
        /// Resolver failure.
        source: LoaderError,
    },
}

/// Turns [`PluginOptions`] into a structured [`Fragment`].
pub struct FragmentResolver<L, A>
where
    L: ModelLoader,
    A: AdapterResolver,
{
    loader: Arc<L>,
    adapters: Arc<A>,
}

impl<L, A> FragmentResolver<L, A>
where
    L: ModelLoader,
    A: AdapterResolver,
{
    /// Creates a resolver over the given loader ports.
    #[must_use]
    pub const fn new(loader: Arc<L>, adapters: Arc<A>) -> Self {
        Self { loader, adapters }
    }

    /// Resolves model locations and adapter modules.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentResolveError`] when a loader port fails.
    pub fn resolve(&self, options: PluginOptions) -> Result<Fragment, FragmentResolveError> {
        let PluginOptions {
            models,
            adapters,
            connections,
            defaults,
            teardown_policy,
        } = options;

        let model_definitions = match models {
            None => Vec::new(),
            Some(ModelsSource::Many(definitions)) => definitions,
            Some(ModelsSource::One(definition)) => vec![definition],
            Some(ModelsSource::Location(location)) => self
                .loader
                .load(&location)
                .map_err(|source| FragmentResolveError::Models { location, source })?,
        };

        let mut fragment = StructuredFragment::new().with_models(model_definitions);
        for (name, source) in adapters {
            let definition = match source {
                AdapterSource::Inline(definition) => definition,
                AdapterSource::Module(module) => {
                    self.adapters
                        .resolve(&module)
                        .map_err(|err| FragmentResolveError::Adapter {
                            adapter: name.clone(),
                            source: err,
                        })?
                }
            };
            fragment = fragment.with_adapter(name, definition);
        }
        for (name, descriptor) in connections {
            fragment = fragment.with_connection(name, descriptor);
        }
        if let Some(model_defaults) = defaults {
            fragment = fragment.with_defaults(model_defaults);
        }
        if let Some(teardown_on_stop) = teardown_policy {
            fragment = fragment.with_teardown_policy(teardown_on_stop);
        }
        Ok(Fragment::Structured(fragment))
    }
}
