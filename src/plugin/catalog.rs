//! Registry of constructible plugin implementations
//!
//! Maps an implementation identifier to a typed constructor. Identifiers
//! that are also *provided* for a capability are what discovery returns
//! when no configuration names an implementation.

use crate::plugin::{Capability, Plugin};
use crate::types::{BoxError, PluginError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type Factory<C> = Arc<dyn Fn() -> std::result::Result<Arc<C>, BoxError> + Send + Sync>;

struct Entry {
    capability: TypeId,
    capability_name: &'static str,
    // Always a `Factory<C>` for the capability named above.
    factory: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct Catalog {
    entries: HashMap<String, Entry>,
    provided: HashMap<TypeId, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the implementations shipped with this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        crate::export::register_builtins(&mut catalog);
        catalog
    }

    /// Make `identifier` constructible as a `C`. A second registration
    /// under the same identifier replaces the first.
    pub fn register<C, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        C: Capability + ?Sized,
        F: Fn() -> std::result::Result<Arc<C>, BoxError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        let factory: Factory<C> = Arc::new(factory);
        let entry = Entry {
            capability: TypeId::of::<C>(),
            capability_name: C::NAME,
            factory: Box::new(factory),
        };

        if let Some(previous) = self.entries.insert(identifier.clone(), entry) {
            warn!(
                "Replacing {} implementation registered as {}",
                previous.capability_name, identifier
            );
            if previous.capability != TypeId::of::<C>() {
                if let Some(ids) = self.provided.get_mut(&previous.capability) {
                    ids.retain(|id| id != &identifier);
                }
            }
        }

        debug!("Registered {} implementation: {}", C::NAME, identifier);
        self
    }

    /// Register `identifier` and make it discoverable for `C`.
    pub fn provide<C, F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        C: Capability + ?Sized,
        F: Fn() -> std::result::Result<Arc<C>, BoxError> + Send + Sync + 'static,
    {
        let identifier = identifier.into();
        self.register::<C, F>(identifier.clone(), factory);

        let ids = self.provided.entry(TypeId::of::<C>()).or_default();
        if !ids.contains(&identifier) {
            ids.push(identifier);
        }
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Identifiers provided for `C`, in provision order.
    pub fn provided<C: Capability + ?Sized>(&self) -> &[String] {
        self.provided
            .get(&TypeId::of::<C>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Construct a fresh instance of `identifier` as a `C`.
    pub fn instantiate<C: Capability + ?Sized>(&self, identifier: &str) -> Result<Plugin<C>> {
        let entry = self
            .entries
            .get(identifier)
            .ok_or_else(|| PluginError::ImplementationNotFound {
                capability: C::NAME.to_string(),
                identifier: identifier.to_string(),
            })?;

        let mismatch = || PluginError::ImplementationTypeMismatch {
            capability: C::NAME.to_string(),
            identifier: identifier.to_string(),
            actual: entry.capability_name.to_string(),
        };

        // Check the entry was registered for this capability
        if entry.capability != TypeId::of::<C>() {
            return Err(mismatch());
        }

        let factory = entry.factory.downcast_ref::<Factory<C>>().ok_or_else(mismatch)?;

        let instance = factory().map_err(|source| PluginError::ConstructionFailed {
            capability: C::NAME.to_string(),
            identifier: identifier.to_string(),
            source,
        })?;

        Ok(Plugin::new(identifier, instance))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut identifiers: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(id, entry)| (id.as_str(), entry.capability_name))
            .collect();
        identifiers.sort();
        f.debug_struct("Catalog")
            .field("entries", &identifiers)
            .finish()
    }
}
