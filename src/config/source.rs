//! Key/value configuration sources

use std::collections::HashMap;
use std::fmt;

/// Read-only lookup backing one configuration origin.
pub trait ConfigSource: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Where a configuration value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ConfigSourceKind {
    System = 0,
    File = 1,
}

/// Fixed lookup order; not configurable.
pub const RESOLUTION_ORDER: [ConfigSourceKind; 2] = [ConfigSourceKind::System, ConfigSourceKind::File];

impl ConfigSourceKind {
    pub fn description(self) -> &'static str {
        match self {
            ConfigSourceKind::System => "Load configuration from system property",
            ConfigSourceKind::File => "Load configuration from file",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ConfigSourceKind::System,
            _ => ConfigSourceKind::File,
        }
    }
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSourceKind::System => write!(f, "system property"),
            ConfigSourceKind::File => write!(f, "file property"),
        }
    }
}

/// In-memory property table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: HashMap<String, String>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for PropertyMap {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_is_system_first() {
        assert_eq!(RESOLUTION_ORDER[0], ConfigSourceKind::System);
        assert_eq!(RESOLUTION_ORDER[1], ConfigSourceKind::File);
        assert!(ConfigSourceKind::System < ConfigSourceKind::File);
    }

    #[test]
    fn test_kind_round_trips_through_u8() {
        for kind in RESOLUTION_ORDER {
            assert_eq!(ConfigSourceKind::from_u8(kind as u8), kind);
        }
    }

    #[test]
    fn test_property_map_lookup() {
        let map: PropertyMap = [("a.b", "x")].into_iter().collect();
        assert_eq!(map.get_string("a.b").as_deref(), Some("x"));
        assert_eq!(map.get_string("a.c"), None);
        assert_eq!(map.len(), 1);
    }
}
