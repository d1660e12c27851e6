//! Plugin resolution with a fixed fallback chain
//!
//! Priority order (highest to lowest):
//! 1. System configuration (process environment)
//! 2. File configuration (loaded on first use)
//! 3. Discovery (implementations provided in the catalog)
//! 4. The synthesized `Default<Name>Impl`
//!
//! The first step that yields a non-empty list wins. The result is cached
//! per capability and never replaced.

use crate::config::{
    ConfigSource, ConfigSourceKind, FileSource, Settings, SourceBinding, SystemSource, RESOLUTION_ORDER,
};
use crate::plugin::{parser, Capability, Catalog, Discoverer, Origin, Plugin, ResolvedSet};
use crate::types::{PluginError, Result};
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Builds the file-scope source on first use.
pub type FileLoader = Box<dyn Fn(&Settings) -> Result<Arc<dyn ConfigSource>> + Send + Sync>;

/// Per-capability cache cell.
struct Slot<C: Capability + ?Sized> {
    resolved: OnceLock<Arc<ResolvedSet<C>>>,
    /// Serializes the fallback chain so it runs at most once.
    init: Mutex<()>,
}

impl<C: Capability + ?Sized> Slot<C> {
    fn new() -> Self {
        Self {
            resolved: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

impl From<ConfigSourceKind> for Origin {
    fn from(kind: ConfigSourceKind) -> Self {
        match kind {
            ConfigSourceKind::System => Origin::System,
            ConfigSourceKind::File => Origin::File,
        }
    }
}

thread_local! {
    /// (resolver address, capability) pairs whose chain runs on this thread.
    static IN_FLIGHT: RefCell<HashSet<(usize, TypeId)>> = RefCell::new(HashSet::new());
}

/// Marks a capability as being resolved on the current thread until dropped.
struct InFlight {
    key: (usize, TypeId),
}

impl InFlight {
    /// `None` if the same resolver is already resolving `C` on this thread.
    fn enter<C: Capability + ?Sized>(resolver: &PluginResolver) -> Option<Self> {
        let key = (resolver as *const PluginResolver as usize, TypeId::of::<C>());
        let inserted = IN_FLIGHT.with(|set| set.borrow_mut().insert(key));
        inserted.then_some(Self { key })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        IN_FLIGHT.with(|set| {
            set.borrow_mut().remove(&self.key);
        });
    }
}

/// Resolves and caches the active implementations of each capability.
///
/// Plugin constructors may resolve other capabilities. A constructor that
/// leads back to a capability still being resolved on the same thread gets
/// [`PluginError::CyclicResolution`]. Constructors must not resolve a
/// capability that another thread may be resolving at the same time, since
/// the two init locks would wait on each other.
pub struct PluginResolver {
    /// Constructible implementations
    catalog: Arc<Catalog>,

    /// Key prefix, delimiter, default package, binding
    settings: Settings,

    /// System-scope source (process environment unless replaced)
    system: Arc<dyn ConfigSource>,

    /// File-scope source, loaded on first use
    file: OnceLock<Arc<dyn ConfigSource>>,
    file_init: Mutex<()>,
    file_loader: FileLoader,

    /// Current `ConfigSourceKind`, written once System -> File
    bound: AtomicU8,

    /// Per-capability slots (TypeId -> `Slot<C>`)
    slots: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl PluginResolver {
    /// Resolver reading the process environment and the default config file.
    pub fn new(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self::builder(catalog).build()
    }

    pub fn builder(catalog: impl Into<Arc<Catalog>>) -> PluginResolverBuilder {
        PluginResolverBuilder {
            catalog: catalog.into(),
            settings: Settings::default(),
            system: None,
            file_loader: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The config source resolution currently starts from.
    pub fn bound_source(&self) -> ConfigSourceKind {
        ConfigSourceKind::from_u8(self.bound.load(Ordering::Acquire))
    }

    /// Resolve `C`, running the fallback chain only on first use.
    pub fn resolve<C: Capability + ?Sized>(&self) -> Result<Arc<ResolvedSet<C>>> {
        let slot = self.slot::<C>();

        // Check if already resolved or registered
        if let Some(set) = slot.resolved.get() {
            return Ok(Arc::clone(set));
        }

        // A constructor further down this thread's stack is resolving C
        let Some(_in_flight) = InFlight::enter::<C>(self) else {
            return Err(PluginError::CyclicResolution {
                capability: C::NAME.to_string(),
            });
        };

        let _guard = slot.init.lock();
        if let Some(set) = slot.resolved.get() {
            debug!("{} resolved by another caller", C::NAME);
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(self.run_chain::<C>()?);

        // A concurrent register() may have landed while the chain ran
        let installed = slot.resolved.get_or_init(|| Arc::clone(&set));
        if !Arc::ptr_eq(installed, &set) {
            debug!("Discarding resolved {} set, another was registered first", C::NAME);
        }

        Ok(Arc::clone(installed))
    }

    /// The cached set for `C`, without resolving.
    pub fn resolved<C: Capability + ?Sized>(&self) -> Option<Arc<ResolvedSet<C>>> {
        self.slot::<C>().resolved.get().cloned()
    }

    /// Install `plugins` as the set for `C`, bypassing the chain.
    ///
    /// Fails with [`PluginError::DuplicateRegistration`] if `C` was already
    /// resolved or registered; the existing set is left untouched.
    pub fn register<C: Capability + ?Sized>(&self, plugins: Vec<Plugin<C>>) -> Result<Arc<ResolvedSet<C>>> {
        let set = Arc::new(ResolvedSet::new(Origin::Registered, plugins));
        self.slot::<C>()
            .resolved
            .set(Arc::clone(&set))
            .map_err(|_| PluginError::DuplicateRegistration {
                capability: C::NAME.to_string(),
            })?;

        info!(
            "Registered plugin {}, implementations: {:?}",
            C::NAME,
            set.identifiers()
        );
        Ok(set)
    }

    fn run_chain<C: Capability + ?Sized>(&self) -> Result<ResolvedSet<C>> {
        let key = self.settings.implementation_key(C::NAME);

        for kind in RESOLUTION_ORDER {
            if self.settings.binding == SourceBinding::Sticky && kind < self.bound_source() {
                debug!("Skipping {} for {}, resolver is bound to {}", kind, C::NAME, self.bound_source());
                continue;
            }

            // Missing or malformed entries yield an empty list
            let source = self.source(kind)?;
            let plugins = match source.get_string(&key) {
                Some(raw) => parser::instantiate_list::<C>(&self.catalog, &raw, self.settings.delimiter)?,
                None => Vec::new(),
            };

            let identifiers: Vec<&str> = plugins.iter().map(Plugin::identifier).collect();
            info!(
                "Find plugin {} by {}, implementations: {:?}",
                C::NAME,
                kind,
                identifiers
            );

            if !plugins.is_empty() {
                return Ok(ResolvedSet::new(kind.into(), plugins));
            }

            // System missed: File backs this and later resolutions
            if kind == ConfigSourceKind::System {
                self.bind_to_file();
            }
        }

        // Neither source named an implementation
        let (origin, plugins) = Discoverer::new(&self.catalog, &self.settings).discover::<C>()?;
        Ok(ResolvedSet::new(origin, plugins))
    }

    fn bind_to_file(&self) {
        let switched = self
            .bound
            .compare_exchange(
                ConfigSourceKind::System as u8,
                ConfigSourceKind::File as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();

        if switched {
            info!("Plugin configuration source bound to {}", ConfigSourceKind::File.description());
        }
    }

    fn source(&self, kind: ConfigSourceKind) -> Result<Arc<dyn ConfigSource>> {
        match kind {
            ConfigSourceKind::System => Ok(Arc::clone(&self.system)),
            ConfigSourceKind::File => {
                if let Some(file) = self.file.get() {
                    return Ok(Arc::clone(file));
                }

                let _guard = self.file_init.lock();
                if let Some(file) = self.file.get() {
                    return Ok(Arc::clone(file));
                }

                // Load failures are not cached; the next miss retries
                let loaded = (self.file_loader)(&self.settings)?;
                Ok(Arc::clone(self.file.get_or_init(|| loaded)))
            }
        }
    }

    fn slot<C: Capability + ?Sized>(&self) -> Arc<Slot<C>> {
        let id = TypeId::of::<C>();
        // Fast path under the read lock, then insert-if-absent under the write lock
        let existing = self.slots.read().get(&id).cloned();

        let erased = match existing {
            Some(slot) => slot,
            None => {
                let mut slots = self.slots.write();
                Arc::clone(
                    slots
                        .entry(id)
                        .or_insert_with(|| Arc::new(Slot::<C>::new()) as Arc<dyn Any + Send + Sync>),
                )
            }
        };

        match erased.downcast::<Slot<C>>() {
            Ok(slot) => slot,
            Err(_) => unreachable!("capability slots are keyed by TypeId"),
        }
    }
}

impl fmt::Debug for PluginResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginResolver")
            .field("settings", &self.settings)
            .field("bound_source", &self.bound_source())
            .field("file_loaded", &self.file.get().is_some())
            .field("capabilities", &self.slots.read().len())
            .finish()
    }
}

pub struct PluginResolverBuilder {
    catalog: Arc<Catalog>,
    settings: Settings,
    system: Option<Arc<dyn ConfigSource>>,
    file_loader: Option<FileLoader>,
}

impl PluginResolverBuilder {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the process environment as the system-scope source.
    pub fn system_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.system = Some(Arc::new(source));
        self
    }

    /// Use an already loaded file-scope source.
    pub fn file_source(self, source: impl ConfigSource + 'static) -> Self {
        let source: Arc<dyn ConfigSource> = Arc::new(source);
        self.file_loader(move |_| Ok(Arc::clone(&source)))
    }

    /// Build the file-scope source on first use with `loader`.
    pub fn file_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Settings) -> Result<Arc<dyn ConfigSource>> + Send + Sync + 'static,
    {
        self.file_loader = Some(Box::new(loader));
        self
    }

    pub fn build(self) -> PluginResolver {
        let system = self
            .system
            .unwrap_or_else(|| Arc::new(SystemSource::new()) as Arc<dyn ConfigSource>);
        let file_loader: FileLoader = match self.file_loader {
            Some(loader) => loader,
            None => Box::new(|settings: &Settings| -> Result<Arc<dyn ConfigSource>> {
                Ok(Arc::new(FileSource::load(settings)?))
            }),
        };

        PluginResolver {
            catalog: self.catalog,
            settings: self.settings,
            system,
            file: OnceLock::new(),
            file_init: Mutex::new(()),
            file_loader,
            bound: AtomicU8::new(ConfigSourceKind::System as u8),
            slots: RwLock::new(HashMap::new()),
        }
    }
}
