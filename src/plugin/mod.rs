//! Plugin catalog, discovery and resolution

mod capability;
mod catalog;
mod discovery;
pub mod global;
pub mod parser;
mod resolver;

pub use capability::{Capability, Origin, Plugin, ResolvedSet};
pub use catalog::Catalog;
pub use discovery::Discoverer;
pub use resolver::{FileLoader, PluginResolver, PluginResolverBuilder};
