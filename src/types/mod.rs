//! Shared types

mod errors;

pub use errors::{BoxError, PluginError, Result};
