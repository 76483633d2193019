//! Persistent configuration registry.
//!
//! Settings are declared by category modules, resolved from the environment,
//! a side-car file, or a default, cached in memory, and mirrored to a shared
//! key/value store under dotted paths. The [`registry::Registry`] discovers
//! the modules and exposes lookup, update, refresh, summary and category
//! views.

pub mod categories;
pub mod cli;
pub mod config;
pub mod convert;
pub mod entry;
pub mod env;
pub mod error;
pub mod logging;
pub mod module;
pub mod projection;
pub mod registry;
pub mod store;
pub mod types;

pub use entry::ConfigEntry;
pub use error::{ConfigError, ConfigResult, ErrorCode};
pub use module::{CategoryModule, ModuleContext, ModuleDefinition};
pub use projection::ProjectionBuilder;
pub use registry::Registry;
pub use store::ValueStore;
pub use types::{DataType, Record, Variant};
