//! Domain model for hierarchical model registration.
//!
//! Scopes contribute fragments into one [`Registry`], which enforces
//! tree-wide uniqueness while the [`ScopeTree`] records which scope owns
//! which model. Scoped views are resolved from that ownership once the
//! registry has been materialized. No I/O happens inside the domain.

mod definition;
mod error;
mod fragment;
mod names;
mod registry;
mod scope;
mod snapshot;
pub mod view;

pub use definition::{AdapterDefinition, ConnectionDescriptor, ModelDefaults, ModelDefinition};
pub use error::{ContributionError, NameError, ScopeError};
pub(crate) use fragment::{one_or_many, unique_keys};
pub use fragment::{Fragment, StructuredFragment};
pub use names::{AdapterName, ConnectionName, ModelIdentity};
pub use registry::{ContributionSummary, Registry};
pub use scope::{ScopeId, ScopeTree};
pub use snapshot::RegistrySnapshot;
pub use view::resolve_view;
