//! Configuration file as a configuration source
//!
//! Lookup order for the file (first existing wins):
//! 1. `Settings::config_file` (must exist when given)
//! 2. `$MAGPIE_CONFIG`
//! 3. `./magpie.toml` (project-specific)
//! 4. `~/.config/magpie/magpie.toml` (user-global)

use crate::config::{ConfigSource, PropertyMap, Settings, CONFIG_PATH_ENV};
use crate::types::{PluginError, Result};
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, info, warn};

/// Properties loaded from a TOML file, flattened to dotted keys.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    path: Option<PathBuf>,
    properties: PropertyMap,
}

impl FileSource {
    /// Locate and load the config file named by `settings`, or an empty
    /// source when no candidate exists.
    pub fn load(settings: &Settings) -> Result<Self> {
        if let Some(path) = &settings.config_file {
            if !path.exists() {
                return Err(PluginError::ConfigError(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Self::from_path(path, settings.delimiter);
        }

        for path in Self::candidates() {
            if path.exists() {
                return Self::from_path(&path, settings.delimiter);
            }
        }

        debug!("No plugin config file found");
        Ok(Self::default())
    }

    pub fn from_path(path: &Path, delimiter: char) -> Result<Self> {
        debug!("Loading plugin config from: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            PluginError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let properties = Self::parse(&content, delimiter).map_err(|source| PluginError::Toml {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            "Loaded {} plugin properties from {}",
            properties.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            properties,
        })
    }

    /// Parse TOML text into a flat property table.
    pub fn parse(content: &str, delimiter: char) -> std::result::Result<PropertyMap, toml::de::Error> {
        let table: Table = content.parse()?;
        let mut properties = PropertyMap::new();
        flatten("", &table, delimiter, &mut properties);
        Ok(properties)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
            candidates.push(PathBuf::from(config_path));
        }

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join("magpie.toml"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("magpie").join("magpie.toml"));
        }

        candidates
    }
}

impl ConfigSource for FileSource {
    fn get_string(&self, key: &str) -> Option<String> {
        self.properties.get_string(key)
    }
}

fn flatten(prefix: &str, table: &Table, delimiter: char, out: &mut PropertyMap) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::String(s) => out.insert(full_key, s.clone()),
            Value::Table(nested) => flatten(&full_key, nested, delimiter, out),
            Value::Array(items) => {
                let strings: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if strings.len() != items.len() {
                    debug!("Ignoring non-string array at {}", full_key);
                } else if strings.iter().any(|s| s.contains(delimiter)) {
                    // Joining would split the element into several identifiers
                    warn!(
                        "Ignoring array at {}: an element contains the delimiter '{}'",
                        full_key, delimiter
                    );
                } else {
                    out.insert(full_key, strings.join(&delimiter.to_string()));
                }
            }
            _ => debug!("Ignoring non-string value at {}", full_key),
        }
    }
}
