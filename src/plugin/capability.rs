//! Capabilities and resolved implementation sets

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// An extension point, implemented on the trait object type:
///
/// ```ignore
/// pub trait Export: Send + Sync { /* ... */ }
///
/// impl Capability for dyn Export {
///     const NAME: &'static str = "Export";
/// }
/// ```
pub trait Capability: Send + Sync + 'static {
    /// Stable name used for config keys and the default identifier.
    const NAME: &'static str;
}

/// One constructed implementation and the identifier it was built from.
pub struct Plugin<C: Capability + ?Sized> {
    identifier: String,
    instance: Arc<C>,
}

impl<C: Capability + ?Sized> Plugin<C> {
    pub fn new(identifier: impl Into<String>, instance: Arc<C>) -> Self {
        Self {
            identifier: identifier.into(),
            instance,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn instance(&self) -> &Arc<C> {
        &self.instance
    }
}

impl<C: Capability + ?Sized> Clone for Plugin<C> {
    fn clone(&self) -> Self {
        Self {
            identifier: self.identifier.clone(),
            instance: Arc::clone(&self.instance),
        }
    }
}

impl<C: Capability + ?Sized> Deref for Plugin<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.instance
    }
}

impl<C: Capability + ?Sized> fmt::Debug for Plugin<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("capability", &C::NAME)
            .field("identifier", &self.identifier)
            .finish()
    }
}

/// Which step of the chain produced a [`ResolvedSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    System,
    File,
    Discovery,
    Default,
    Registered,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Origin::System => "system",
            Origin::File => "file",
            Origin::Discovery => "discovery",
            Origin::Default => "default",
            Origin::Registered => "registered",
        };
        f.write_str(s)
    }
}

/// The immutable outcome of resolving a capability.
pub struct ResolvedSet<C: Capability + ?Sized> {
    origin: Origin,
    plugins: Vec<Plugin<C>>,
}

impl<C: Capability + ?Sized> ResolvedSet<C> {
    pub fn new(origin: Origin, plugins: Vec<Plugin<C>>) -> Self {
        Self { origin, plugins }
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn plugins(&self) -> &[Plugin<C>] {
        &self.plugins
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.plugins.iter().map(Plugin::identifier).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<C>> {
        self.plugins.iter().map(Plugin::instance)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<C: Capability + ?Sized> fmt::Debug for ResolvedSet<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSet")
            .field("capability", &C::NAME)
            .field("origin", &self.origin)
            .field("implementations", &self.identifiers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    impl Capability for dyn Greeter {
        const NAME: &'static str = "Greeter";
    }

    struct Hello;

    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_plugin_derefs_to_capability() {
        let plugin: Plugin<dyn Greeter> = Plugin::new("test.Hello", Arc::new(Hello) as Arc<dyn Greeter>);
        assert_eq!(plugin.greet(), "hello");
        assert_eq!(plugin.identifier(), "test.Hello");
    }

    #[test]
    fn test_resolved_set_debug_lists_identifiers() {
        let set = ResolvedSet::<dyn Greeter>::new(
            Origin::Registered,
            vec![Plugin::new("test.Hello", Arc::new(Hello) as Arc<dyn Greeter>)],
        );
        let debug = format!("{:?}", set);
        assert!(debug.contains("Greeter"));
        assert!(debug.contains("test.Hello"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.origin().to_string(), "registered");
    }
}
