//! Process environment as a configuration source

use crate::config::ConfigSource;
use std::env::VarError;
use tracing::{debug, warn};

/// Reads keys from the process environment.
///
/// A key is looked up verbatim first, then in its environment-variable
/// spelling: `magpie.plugin.export.implementation` also matches
/// `MAGPIE_PLUGIN_EXPORT_IMPLEMENTATION`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSource;

impl SystemSource {
    pub fn new() -> Self {
        SystemSource
    }

    pub fn env_key(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }
}

fn read_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => Some(value),
        Err(VarError::NotPresent) => None,
        Err(VarError::NotUnicode(_)) => {
            warn!("Ignoring environment variable {}: value is not valid UTF-8", name);
            None
        }
    }
}

impl ConfigSource for SystemSource {
    fn get_string(&self, key: &str) -> Option<String> {
        // Verbatim key first
        if let Some(value) = read_var(key) {
            return Some(value);
        }

        let env_key = Self::env_key(key);
        let value = read_var(&env_key)?;
        debug!("Read {} from environment variable {}", key, env_key);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_spelling() {
        assert_eq!(
            SystemSource::env_key("magpie.plugin.export.implementation"),
            "MAGPIE_PLUGIN_EXPORT_IMPLEMENTATION"
        );
        assert_eq!(SystemSource::env_key("a-b.c"), "A_B_C");
    }

    #[test]
    fn test_reads_env_spelling() {
        std::env::set_var("MAGPIE_SYSTEM_TEST_ONLY_IMPLEMENTATION", "com.example.FooImpl");
        let source = SystemSource::new();
        assert_eq!(
            source
                .get_string("magpie.system_test_only.implementation")
                .as_deref(),
            Some("com.example.FooImpl")
        );
        std::env::remove_var("MAGPIE_SYSTEM_TEST_ONLY_IMPLEMENTATION");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_value_counts_as_absent() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var(
            "MAGPIE_NON_UNICODE_TEST_IMPLEMENTATION",
            OsStr::from_bytes(b"com.example.\xff"),
        );
        let source = SystemSource::new();
        assert_eq!(source.get_string("magpie.non_unicode_test.implementation"), None);
        std::env::remove_var("MAGPIE_NON_UNICODE_TEST_IMPLEMENTATION");
    }

    #[test]
    fn test_missing_key() {
        let source = SystemSource::new();
        assert_eq!(source.get_string("magpie.never.set.anywhere"), None);
    }
}
