//! Process-wide resolver
//!
//! Prefer passing a [`PluginResolver`] down from `main`; this is for code
//! that cannot be handed one.

use crate::plugin::{Catalog, PluginResolver};
use std::sync::OnceLock;

static RESOLVER: OnceLock<PluginResolver> = OnceLock::new();

/// The process-wide resolver, created from [`Catalog::builtin`] on first
/// access unless [`install`] ran earlier.
pub fn resolver() -> &'static PluginResolver {
    RESOLVER.get_or_init(|| PluginResolver::new(Catalog::builtin()))
}

/// Make `resolver` the process-wide instance. Hands it back if one is
/// already in place.
pub fn install(resolver: PluginResolver) -> Result<&'static PluginResolver, PluginResolver> {
    RESOLVER.set(resolver)?;
    Ok(self::resolver())
}

pub fn get() -> Option<&'static PluginResolver> {
    RESOLVER.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_single_instance_under_concurrent_access() {
        let addrs: Vec<usize> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| resolver() as *const PluginResolver as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(std::ptr::eq(get().unwrap(), resolver()));
        assert!(install(PluginResolver::new(Catalog::new())).is_err());
    }
}
