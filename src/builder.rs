//! Resolution façade: validate, locate, consult the cache, and generate or
//! activate bindings as needed.

use std::path::Path;
use std::sync::Arc;

use nbind_config::{BindingConfig, SearchConfig};
use nbind_loader::{LibraryResolver, PlatformLoader, SystemLoader};
use nbind_symbol::InterfaceDescription;
use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::blueprint::Blueprint;
use crate::cache::BindingCache;
use crate::error::BindingError;
use crate::identifier::Identifier;
use crate::instance::BindingInstance;
use crate::interface::NativeInterface;
use crate::validate::validate;

/// Produces bindings of interfaces against native libraries.
///
/// Resolving the same interface, library and configuration twice returns the
/// same instance until it is released. Releasing is cache-wide: callers must
/// not use an instance once any thread has released its identifier, and
/// threads sharing an instance coordinate its release among themselves.
pub struct NativeBinder<L: PlatformLoader = SystemLoader> {
    loader: Arc<L>,
    resolver: LibraryResolver,
    cache: Arc<BindingCache<L>>,
}

static GLOBAL: Lazy<NativeBinder> = Lazy::new(NativeBinder::new);

impl NativeBinder<SystemLoader> {
    /// OS loader with the search configuration taken from the environment.
    pub fn new() -> Self {
        Self::with_loader(SystemLoader::new(), SearchConfig::from_env())
    }

    /// Process-wide default binder.
    pub fn global() -> &'static NativeBinder {
        &GLOBAL
    }
}

impl Default for NativeBinder<SystemLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PlatformLoader> NativeBinder<L> {
    pub fn with_loader(loader: L, search: SearchConfig) -> Self {
        Self::with_cache(Arc::new(loader), search, Arc::new(BindingCache::new()))
    }

    /// Share `cache` (and therefore its instances) with other binders.
    pub fn with_cache(loader: Arc<L>, search: SearchConfig, cache: Arc<BindingCache<L>>) -> Self {
        Self {
            loader,
            resolver: LibraryResolver::new(search),
            cache,
        }
    }

    pub fn loader(&self) -> &Arc<L> {
        &self.loader
    }

    pub fn resolver(&self) -> &LibraryResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<BindingCache<L>> {
        &self.cache
    }

    /// Bind `interface` against the library found for `path`.
    pub fn resolve(
        &self,
        interface: &InterfaceDescription,
        path: impl AsRef<Path>,
        config: &BindingConfig,
    ) -> Result<Arc<BindingInstance<L>>, BindingError> {
        validate(interface, config)?;
        let library = self.resolver.resolve(path.as_ref())?;
        let identifier = Identifier::new(interface.id().clone(), library, config.clone());

        if let Some(instance) = self.cache.active(&identifier) {
            trace!(%identifier, "binding cache hit");
            self.cache.record_hit();
            return Ok(instance);
        }

        let _guard = self.cache.lock(&identifier);
        if let Some(instance) = self.cache.active(&identifier) {
            trace!(%identifier, "binding activated while waiting");
            self.cache.record_hit();
            return Ok(instance);
        }

        // A blueprint is only cached once an instance built from it succeeds.
        let (blueprint, generated) = match self.cache.blueprint(&identifier) {
            Some(blueprint) => {
                debug!(%identifier, "reactivating binding from cached blueprint");
                (blueprint, false)
            }
            None => {
                let blueprint = Blueprint::generate(interface, config)?;
                self.cache.record_generation();
                (Arc::new(blueprint), true)
            }
        };

        let instance = BindingInstance::construct(
            identifier.clone(),
            Arc::clone(&blueprint),
            Arc::clone(&self.loader),
        )
        .map_err(BindingError::construction)?;
        self.cache
            .insert(identifier, generated.then_some(blueprint), Arc::clone(&instance));
        Ok(instance)
    }

    /// Resolve a typed interface declared with [`native_interface!`](crate::native_interface).
    pub fn resolve_interface<T>(
        &self,
        path: impl AsRef<Path>,
        config: &BindingConfig,
    ) -> Result<T, BindingError>
    where
        T: NativeInterface<L>,
    {
        let instance = self.resolve(&T::describe(), path, config)?;
        Ok(T::from_instance(instance))
    }

    /// Dispose the active instance of `identifier`, keeping its blueprint.
    /// Returns `false` if nothing was active.
    pub fn release(&self, identifier: &Identifier) -> bool {
        self.cache.release(identifier)
    }

    pub fn release_all(&self) -> usize {
        self.cache.release_all()
    }
}
