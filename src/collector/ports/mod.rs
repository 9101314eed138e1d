//! Port contracts for the collector's external collaborators.
//!
//! Loaders resolve configuration references into concrete definitions before
//! contribution; the materializer turns the finalized registry into live
//! handles afterwards.

pub mod loader;
pub mod materializer;

pub use loader::{AdapterResolver, LoaderError, LoaderResult, ModelLoader};
#[cfg(test)]
pub use loader::{MockAdapterResolver, MockModelLoader};
pub use materializer::{
    AdapterRuntime, LiveConnection, Materialization, Materializer, MaterializerError,
    MaterializerResult,
};
