//! Contributed configuration fragments.

use super::{
    AdapterDefinition, AdapterName, ConnectionDescriptor, ConnectionName, ContributionError,
    ModelDefaults, ModelDefinition,
};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::marker::PhantomData;

/// Keys that mark a JSON object as a structured fragment.
const STRUCTURED_KEYS: [&str; 5] = [
    "adapters",
    "connections",
    "models",
    "defaults",
    "teardown_policy",
];

/// A unit of configuration submitted in one contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A single model definition.
    SingleModel(ModelDefinition),
    /// A bare list of model definitions.
    ModelList(Vec<ModelDefinition>),
    /// Adapters, connections, models and tree-wide settings.
    Structured(StructuredFragment),
}

impl Fragment {
    /// Normalizes the fragment into its structured form.
    ///
    /// Model-only variants become a structured fragment with only `models`
    /// set; every other field is empty.
    #[must_use]
    pub fn into_structured(self) -> StructuredFragment {
        match self {
            Self::SingleModel(model) => StructuredFragment::new().with_model(model),
            Self::ModelList(models) => StructuredFragment::new().with_models(models),
            Self::Structured(fragment) => fragment,
        }
    }
}

impl From<ModelDefinition> for Fragment {
    fn from(model: ModelDefinition) -> Self {
        Self::SingleModel(model)
    }
}

impl From<Vec<ModelDefinition>> for Fragment {
    fn from(models: Vec<ModelDefinition>) -> Self {
        Self::ModelList(models)
    }
}

impl From<StructuredFragment> for Fragment {
    fn from(fragment: StructuredFragment) -> Self {
        Self::Structured(fragment)
    }
}

impl TryFrom<Value> for Fragment {
    type Error = ContributionError;

    /// Decides the variant from the JSON shape.
    ///
    /// Arrays are model lists. Objects carrying `identity` are single models
    /// unless they also carry a structured key, which is ambiguous and
    /// rejected. Other objects must be structured fragments.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(Self::ModelList)
                .map_err(invalid_shape),
            Value::Object(ref object) => {
                let has_identity = object.contains_key("identity");
                let has_structured_key = STRUCTURED_KEYS.iter().any(|key| object.contains_key(*key));
                match (has_identity, has_structured_key) {
                    (true, true) => Err(ContributionError::InvalidFragmentShape(
                        "object mixes a model identity with structured fragment keys".to_owned(),
                    )),
                    (true, false) => serde_json::from_value(value)
                        .map(Self::SingleModel)
                        .map_err(invalid_shape),
                    (false, _) => serde_json::from_value(value)
                        .map(Self::Structured)
                        .map_err(invalid_shape),
                }
            }
            other => Err(ContributionError::InvalidFragmentShape(format!(
                "expected an object or an array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn invalid_shape(err: serde_json::Error) -> ContributionError {
    ContributionError::InvalidFragmentShape(err.to_string())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fragment with every contributable field. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuredFragment {
    #[serde(deserialize_with = "unique_keys")]
    pub(super) adapters: BTreeMap<AdapterName, AdapterDefinition>,
    #[serde(deserialize_with = "unique_keys")]
    pub(super) connections: BTreeMap<ConnectionName, ConnectionDescriptor>,
    #[serde(deserialize_with = "one_or_many")]
    pub(super) models: Vec<ModelDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) defaults: Option<ModelDefaults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) teardown_policy: Option<bool>,
}

impl StructuredFragment {
    /// Creates an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an adapter definition.
    ///
    /// A second adapter under the same name replaces the first within this
    /// fragment. Deserialized fragments reject such repeats instead.
    #[must_use]
    pub fn with_adapter(mut self, name: AdapterName, definition: AdapterDefinition) -> Self {
        self.adapters.insert(name, definition);
        self
    }

    /// Adds a connection descriptor.
    ///
    /// Same replacement rule as [`StructuredFragment::with_adapter`].
    #[must_use]
    pub fn with_connection(mut self, name: ConnectionName, descriptor: ConnectionDescriptor) -> Self {
        self.connections.insert(name, descriptor);
        self
    }

    /// Appends a model definition.
    #[must_use]
    pub fn with_model(mut self, model: ModelDefinition) -> Self {
        self.models.push(model);
        self
    }

    /// Appends several model definitions in order.
    #[must_use]
    pub fn with_models(mut self, models: impl IntoIterator<Item = ModelDefinition>) -> Self {
        self.models.extend(models);
        self
    }

    /// Sets the tree-wide model defaults.
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

    /// Returns the adapters in this fragment.
    #[must_use]
    pub const fn adapters(&self) -> &BTreeMap<AdapterName, AdapterDefinition> {
        &self.adapters
    }

    /// Returns the connections in this fragment.
    #[must_use]
    pub const fn connections(&self) -> &BTreeMap<ConnectionName, ConnectionDescriptor> {
        &self.connections
    }

    /// Returns the models in contribution order.
    #[must_use]
    pub fn models(&self) -> &[ModelDefinition] {
        &self.models
    }

    /// Returns the defaults, if this fragment sets them.
    #[must_use]
    pub const fn defaults(&self) -> Option<&ModelDefaults> {
        self.defaults.as_ref()
    }

    /// Returns the teardown policy, if this fragment sets it.
    #[must_use]
    pub const fn teardown_policy(&self) -> Option<bool> {
        self.teardown_policy
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accepts either a single value or a list of values.
pub(crate) fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(values) => values,
        OneOrMany::One(value) => vec![value],
    })
}

struct UniqueKeys<K, V>(PhantomData<(K, V)>);

impl<'de, K, V> Visitor<'de> for UniqueKeys<K, V>
where
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    type Value = BTreeMap<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map with distinct names")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<K, V>()? {
            match entries.entry(key) {
                Entry::Occupied(taken) => {
                    return Err(de::Error::custom(format!("duplicate name: {}", taken.key())));
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
        Ok(entries)
    }
}

/// Deserializes a map whose keys must stay distinct once validated.
///
/// Names are trimmed on input, so `"disk"` and `" disk"` collide here
/// instead of one silently replacing the other.
pub(crate) fn unique_keys<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    deserializer.deserialize_map(UniqueKeys(PhantomData))
}
