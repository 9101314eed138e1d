//! Error types for registry contribution and scope lookups.

use super::{AdapterName, ConnectionName, ModelIdentity, ScopeId};
use thiserror::Error;

/// Errors returned while constructing registry names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty after trimming.
    #[error("{kind} name must not be empty")]
    Empty {
        /// Which kind of name was being constructed.
        kind: &'static str,
    },
}

/// Errors returned by scope tree lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// The scope does not belong to this tree.
    #[error("unknown scope: {0}")]
    UnknownScope(ScopeId),
}

/// Errors returned when a fragment cannot be merged into the registry.
///
/// Every variant is fatal to the contribution that raised it. The registry
/// and the scope tree are left exactly as they were before the call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContributionError {
    /// An adapter with the same name was already contributed.
    #[error("duplicate adapter: {0}")]
    DuplicateAdapter(AdapterName),

    /// A connection with the same name was already contributed.
    #[error("duplicate connection: {0}")]
    DuplicateConnection(ConnectionName),

    /// A model with the same identity was already contributed, or appears
    /// twice in the same fragment.
    #[error("duplicate model: {0}")]
    DuplicateModel(ModelIdentity),

    /// Model defaults were already set somewhere in the tree.
    #[error("model defaults may only be set once")]
    DuplicateDefaults,

    /// The teardown policy was already set somewhere in the tree.
    #[error("teardown policy may only be set once")]
    DuplicateTeardownPolicy,

    /// The fragment is neither a model, a model list, nor a structured
    /// fragment.
    #[error("invalid fragment shape: {0}")]
    InvalidFragmentShape(String),

    /// Model defaults carry a value the registry cannot apply.
    #[error("invalid model defaults: {0}")]
    InvalidDefaults(String),

    /// The contributing scope does not belong to this tree.
    #[error("unknown contributing scope: {0}")]
    UnknownScope(ScopeId),
}

impl From<ScopeError> for ContributionError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::UnknownScope(id) => Self::UnknownScope(id),
        }
    }
}
