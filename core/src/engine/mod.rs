//! Generation engine contract and the adapter the dispatcher drives it through.
//!
//! Concrete engines live in `sitegen-plugins`; providers are tried in order by
//! [`EngineSelector`] and the winner is held by an [`EngineAdapter`] for the
//! rest of the task.
mod adapter;
mod defaults;
pub mod files;
mod hooks;
pub mod layout;
mod selector;
mod traits;

pub use adapter::EngineAdapter;
pub use defaults::engine_default_config;
pub use hooks::{EngineLifecycle, TracingLifecycle};
pub use layout::{slugize, SiteLayout};
pub use selector::EngineSelector;
pub use traits::{EngineContext, EngineProvider, GenerationEngine};

#[cfg(test)]
pub(crate) mod testing;
