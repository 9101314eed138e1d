//! Validated names for registry entries.
//!
//! Adapters and connections are keyed by name and models by identity. All
//! three are trimmed and must be non-empty; uniqueness is enforced by the
//! registry, not here.

use super::NameError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! registry_name {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a validated ", $kind, " name.")]
            ///
            /// The input is trimmed before validation.
            ///
            /// # Errors
            ///
            /// Returns [`NameError::Empty`] when the value is empty after
            /// trimming.
            pub fn new(value: impl Into<String>) -> Result<Self, NameError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(NameError::Empty { kind: $kind });
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = NameError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

registry_name!(
    /// Name under which a storage adapter is registered (e.g. `disk`).
    AdapterName,
    "adapter"
);

registry_name!(
    /// Name under which a connection descriptor is registered.
    ConnectionName,
    "connection"
);

registry_name!(
    /// Identity of a model definition, unique across the whole tree.
    ModelIdentity,
    "model"
);
