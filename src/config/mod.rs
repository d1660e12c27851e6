//! Configuration sources for plugin resolution
//!
//! Two origins, consulted in a fixed order:
//! 1. System (process environment)
//! 2. File (TOML config file, loaded on first use)

mod file;
mod settings;
mod source;
mod system;

pub use file::FileSource;
pub use settings::{
    Settings, SourceBinding, CONFIG_PATH_ENV, DEFAULT_IMPL_PACKAGE, PLUGIN_PROPERTY_MULTI_DEFAULT_SEPARATOR,
    PLUGIN_PROPERTY_PREFIX,
};
pub use source::{ConfigSource, ConfigSourceKind, PropertyMap, RESOLUTION_ORDER};
pub use system::SystemSource;
