//! Application services for plugin registration and scoped lookup.

mod collector;
mod options;
mod teardown;

pub use collector::{CollectorService, CollectorServiceError, CollectorServiceResult};
pub use options::{
    AdapterSource, FragmentResolveError, FragmentResolver, ModelsSource, OptionsError,
    PluginOptions,
};
pub use teardown::{Teardown, TeardownReport};
