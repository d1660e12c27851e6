//! Resolver settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of every plugin configuration key.
pub const PLUGIN_PROPERTY_PREFIX: &str = "magpie.plugin";

/// Separator between identifiers in a multi-valued entry.
pub const PLUGIN_PROPERTY_MULTI_DEFAULT_SEPARATOR: char = ',';

/// Namespace of the synthesized `Default<Name>Impl` identifiers.
pub const DEFAULT_IMPL_PACKAGE: &str = "magpie.plugins";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MAGPIE_CONFIG";

/// Whether a System miss for one capability affects the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceBinding {
    /// Every capability walks the full `[System, File]` order.
    #[default]
    PerCapability,
    /// Once System misses, all later resolutions start at File.
    Sticky,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub property_prefix: String,
    pub delimiter: char,
    pub default_package: String,
    pub binding: SourceBinding,
    pub config_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            property_prefix: PLUGIN_PROPERTY_PREFIX.to_string(),
            delimiter: PLUGIN_PROPERTY_MULTI_DEFAULT_SEPARATOR,
            default_package: DEFAULT_IMPL_PACKAGE.to_string(),
            binding: SourceBinding::default(),
            config_file: None,
        }
    }
}

impl Settings {
    /// `<prefix>.<name-lowercased>.implementation`
    pub fn implementation_key(&self, capability_name: &str) -> String {
        format!(
            "{}.{}.implementation",
            self.property_prefix,
            capability_name.to_lowercase()
        )
    }

    /// `<default-package>.Default<Name>Impl`
    pub fn default_implementation(&self, capability_name: &str) -> String {
        format!("{}.Default{}Impl", self.default_package, capability_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implementation_key() {
        let settings = Settings::default();
        assert_eq!(
            settings.implementation_key("Export"),
            "magpie.plugin.export.implementation"
        );
    }

    #[test]
    fn test_default_implementation_name() {
        let settings = Settings::default();
        assert_eq!(
            settings.default_implementation("Export"),
            "magpie.plugins.DefaultExportImpl"
        );
    }

    #[test]
    fn test_partial_settings_from_toml() {
        let settings: Settings = toml::from_str(
            r#"
            property_prefix = "acme.plugin"
            binding = "sticky"
            "#,
        )
        .unwrap();

        assert_eq!(settings.property_prefix, "acme.plugin");
        assert_eq!(settings.binding, SourceBinding::Sticky);
        assert_eq!(settings.delimiter, ',');
        assert_eq!(settings.default_package, DEFAULT_IMPL_PACKAGE);
    }
}
