//! Loader ports resolving model locations and adapter modules.

use crate::collector::domain::{AdapterDefinition, ModelDefinition};
use std::sync::Arc;
use thiserror::Error;

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Resolves a model location (for example a file path) into definitions.
#[cfg_attr(test, mockall::automock)]
pub trait ModelLoader: Send + Sync {
    /// Loads every model definition stored at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NotFound`] when nothing exists at the location,
    /// or [`LoaderError::Io`] / [`LoaderError::Parse`] when it cannot be read.
    fn load(&self, location: &str) -> LoaderResult<Vec<ModelDefinition>>;
}

/// Resolves an adapter given by module name into its definition.
#[cfg_attr(test, mockall::automock)]
pub trait AdapterResolver: Send + Sync {
    /// Resolves the adapter module `module`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NotFound`] when the module is unknown.
    fn resolve(&self, module: &str) -> LoaderResult<AdapterDefinition>;
}

/// Errors returned by loader adapters.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// Nothing is registered or stored under the location.
    #[error("nothing found at {0}")]
    NotFound(String),

    /// The location could not be read.
    #[error("failed to read {location}: {source}")]
    Io {
        /// Location being read.
        location: String,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// The content is not a model definition or a list of them.
    #[error("failed to parse {location}: {source}")]
    Parse {
        /// Location being parsed.
        location: String,
        /// Underlying decoding failure.
        source: Arc<serde_json::Error>,
    },
}

impl LoaderError {
    /// Wraps an I/O error for `location`.
    pub fn io(location: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            location: location.into(),
            source: Arc::new(err),
        }
    }

    /// Wraps a decoding error for `location`.
    pub fn parse(location: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Parse {
            location: location.into(),
            source: Arc::new(err),
        }
    }
}
