//! Definition blobs stored in the registry.
//!
//! The registry treats these as opaque configuration. Only the fields needed
//! for keying (`identity`, `connection`, `adapter`) are typed; everything else
//! is carried through as JSON for the materializer.

use super::{AdapterName, ConnectionName, ContributionError, ModelIdentity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which defaults name the connection for models without one.
const CONNECTION_KEY: &str = "connection";

/// Key holding a model's identity.
const IDENTITY_KEY: &str = "identity";

/// A model definition contributed by a scope.
///
/// Serialized as a single flat object: `identity`, optional `connection`, and
/// any further properties such as `attributes` or `migrate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefinition {
    identity: ModelIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection: Option<ConnectionName>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl ModelDefinition {
    /// Creates a definition with only an identity.
    #[must_use]
    pub fn new(identity: ModelIdentity) -> Self {
        Self {
            identity,
            connection: None,
            properties: Map::new(),
        }
    }

    /// Sets the connection the model is stored through.
    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionName) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Sets an arbitrary property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Returns the model identity.
    #[must_use]
    pub const fn identity(&self) -> &ModelIdentity {
        &self.identity
    }

    /// Returns the connection name, if declared.
    #[must_use]
    pub const fn connection(&self) -> Option<&ConnectionName> {
        self.connection.as_ref()
    }

    /// Returns a property by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns all untyped properties.
    #[must_use]
    pub const fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Returns a copy with every top-level key the definition lacks taken
    /// from `defaults`.
    ///
    /// Keys the definition already declares always win. A `connection`
    /// default fills in a missing connection; the identity is never
    /// overridden. Defaults accepted by the registry have already passed
    /// [`ModelDefaults::connection`].
    #[must_use]
    pub fn with_defaults(&self, defaults: &ModelDefaults) -> Self {
        let mut merged = self.clone();
        for (key, value) in defaults.entries() {
            match key.as_str() {
                IDENTITY_KEY => {}
                CONNECTION_KEY => {
                    if merged.connection.is_none() {
                        merged.connection = connection_default(value).ok().flatten();
                    }
                }
                _ => {
                    merged
                        .properties
                        .entry(key.clone())
                        .or_insert_with(|| value.clone());
                }
            }
        }
        merged
    }
}

/// Opaque definition of a storage adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterDefinition(Map<String, Value>);

impl AdapterDefinition {
    /// Creates an empty adapter definition.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a setting on the definition.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Returns a setting by key.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns all settings.
    #[must_use]
    pub const fn settings(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Connection descriptor referencing an adapter by name.
///
/// The adapter reference is not checked against the registry; resolving it
/// is the materializer's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    adapter: AdapterName,
    #[serde(flatten)]
    settings: Map<String, Value>,
}

impl ConnectionDescriptor {
    /// Creates a descriptor for the given adapter.
    #[must_use]
    pub fn new(adapter: AdapterName) -> Self {
        Self {
            adapter,
            settings: Map::new(),
        }
    }

    /// Sets a connection setting.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Returns the referenced adapter name.
    #[must_use]
    pub const fn adapter(&self) -> &AdapterName {
        &self.adapter
    }

    /// Returns the connection settings.
    #[must_use]
    pub const fn settings(&self) -> &Map<String, Value> {
        &self.settings
    }
}

/// Tree-wide defaults applied to every model at materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelDefaults(Map<String, Value>);

impl ModelDefaults {
    /// Creates an empty set of defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a default value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Returns a default value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the default connection, if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`ContributionError::InvalidDefaults`] when the `connection`
    /// default is not a non-blank string.
    pub fn connection(&self) -> Result<Option<ConnectionName>, ContributionError> {
        self.0.get(CONNECTION_KEY).map_or(Ok(None), connection_default)
    }

    /// Iterates over all defaults.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns `true` when no default is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn connection_default(value: &Value) -> Result<Option<ConnectionName>, ContributionError> {
    let raw = value.as_str().ok_or_else(|| {
        ContributionError::InvalidDefaults(format!(
            "{CONNECTION_KEY} must be a string, got {value}"
        ))
    })?;
    ConnectionName::new(raw)
        .map(Some)
        .map_err(|err| ContributionError::InvalidDefaults(err.to_string()))
}
