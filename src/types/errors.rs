use std::path::PathBuf;
use thiserror::Error;

/// Error returned by a plugin constructor.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("{capability} implementation class not found: {identifier}")]
    ImplementationNotFound {
        capability: String,
        identifier: String,
    },

    #[error("{capability} implementation not able to be instantiated: {identifier}: {source}")]
    ConstructionFailed {
        capability: String,
        identifier: String,
        #[source]
        source: BoxError,
    },

    #[error("{capability} implementation is not an instance of {capability}: {identifier} (registered for {actual})")]
    ImplementationTypeMismatch {
        capability: String,
        identifier: String,
        actual: String,
    },

    #[error("Default implementation {identifier} for {capability} not found")]
    DefaultImplementationMissing {
        capability: String,
        identifier: String,
    },

    #[error("Cyclic resolution of {capability}: already being resolved on this thread")]
    CyclicResolution { capability: String },

    #[error("Another {capability} was already registered")]
    DuplicateRegistration { capability: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to parse config file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// True for the failures that mean an identifier could not be turned
    /// into a live instance.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            PluginError::ImplementationNotFound { .. } | PluginError::ConstructionFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_grouping() {
        let not_found = PluginError::ImplementationNotFound {
            capability: "Export".to_string(),
            identifier: "com.example.Missing".to_string(),
        };
        assert!(not_found.is_load_failure());

        let duplicate = PluginError::DuplicateRegistration {
            capability: "Export".to_string(),
        };
        assert!(!duplicate.is_load_failure());
        assert_eq!(duplicate.to_string(), "Another Export was already registered");
    }

    #[test]
    fn test_cyclic_resolution_message() {
        let err = PluginError::CyclicResolution {
            capability: "Export".to_string(),
        };
        assert!(!err.is_load_failure());
        assert_eq!(
            err.to_string(),
            "Cyclic resolution of Export: already being resolved on this thread"
        );
    }

    #[test]
    fn test_construction_failure_keeps_source() {
        let err = PluginError::ConstructionFailed {
            capability: "Export".to_string(),
            identifier: "com.example.Broken".to_string(),
            source: "disk full".into(),
        };
        assert!(err.is_load_failure());
        assert!(err.to_string().contains("disk full"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
