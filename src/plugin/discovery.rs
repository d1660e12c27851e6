//! Discovery fallback: provided implementations, then the default

use crate::config::Settings;
use crate::plugin::{Capability, Catalog, Origin, Plugin};
use crate::types::{PluginError, Result};
use tracing::info;

pub struct Discoverer<'a> {
    catalog: &'a Catalog,
    settings: &'a Settings,
}

impl<'a> Discoverer<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a Settings) -> Self {
        Self { catalog, settings }
    }

    /// Every implementation provided for `C`, or the single
    /// `Default<Name>Impl` when nothing is provided.
    pub fn discover<C: Capability + ?Sized>(&self) -> Result<(Origin, Vec<Plugin<C>>)> {
        let mut plugins = Vec::new();
        for identifier in self.catalog.provided::<C>() {
            let plugin = self.catalog.instantiate::<C>(identifier)?;
            info!("Find plugin {} by discovery, implementation: {}", C::NAME, identifier);
            plugins.push(plugin);
        }

        if !plugins.is_empty() {
            return Ok((Origin::Discovery, plugins));
        }

        // Nothing provided, fall back to Default<Name>Impl
        let identifier = self.settings.default_implementation(C::NAME);
        let plugin = self
            .catalog
            .instantiate::<C>(&identifier)
            .map_err(|err| match err {
                PluginError::ImplementationNotFound { capability, identifier } => {
                    PluginError::DefaultImplementationMissing {
                        capability,
                        identifier,
                    }
                }
                other => other,
            })?;
        info!("Find plugin {} by default, implementation: {}", C::NAME, identifier);

        Ok((Origin::Default, vec![plugin]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Sink: Send + Sync {}

    impl Capability for dyn Sink {
        const NAME: &'static str = "Sink";
    }

    struct Null;

    impl Sink for Null {}

    #[test]
    fn test_provided_take_precedence_over_default() {
        let mut catalog = Catalog::new();
        catalog
            .provide::<dyn Sink, _>("ext.First", || Ok(Arc::new(Null) as Arc<dyn Sink>))
            .provide::<dyn Sink, _>("ext.Second", || Ok(Arc::new(Null) as Arc<dyn Sink>))
            .register::<dyn Sink, _>("magpie.plugins.DefaultSinkImpl", || {
                Ok(Arc::new(Null) as Arc<dyn Sink>)
            });
        let settings = Settings::default();

        let (origin, plugins) = Discoverer::new(&catalog, &settings).discover::<dyn Sink>().unwrap();
        assert_eq!(origin, Origin::Discovery);
        let ids: Vec<&str> = plugins.iter().map(|p| p.identifier()).collect();
        assert_eq!(ids, ["ext.First", "ext.Second"]);
    }

    #[test]
    fn test_default_when_nothing_provided() {
        let mut catalog = Catalog::new();
        catalog.register::<dyn Sink, _>("magpie.plugins.DefaultSinkImpl", || {
            Ok(Arc::new(Null) as Arc<dyn Sink>)
        });
        let settings = Settings::default();

        let (origin, plugins) = Discoverer::new(&catalog, &settings).discover::<dyn Sink>().unwrap();
        assert_eq!(origin, Origin::Default);
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].identifier(), "magpie.plugins.DefaultSinkImpl");
    }

    #[test]
    fn test_missing_default_is_fatal() {
        let catalog = Catalog::new();
        let settings = Settings::default();

        let err = Discoverer::new(&catalog, &settings)
            .discover::<dyn Sink>()
            .unwrap_err();
        assert!(matches!(err, PluginError::DefaultImplementationMissing { .. }));
    }
}
