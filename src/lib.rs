//! Magpie plugins - pick the active implementations of each extension point
//!
//! For every capability the resolver consults, in order: the process
//! environment, a TOML config file, implementations provided in the
//! [`Catalog`], and finally a `Default<Name>Impl`. The outcome is computed
//! once and cached for the life of the resolver.

pub mod config;
pub mod export;
pub mod plugin;
pub mod types;

pub use config::{ConfigSource, ConfigSourceKind, Settings, SourceBinding};
pub use export::{Export, LogRecord};
pub use plugin::{Capability, Catalog, Origin, Plugin, PluginResolver, ResolvedSet};
pub use types::PluginError;
