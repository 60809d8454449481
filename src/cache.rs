//! Identifier-keyed binding cache.
//!
//! Two maps share one key space: blueprints, generated once and kept for the
//! life of the cache, and instance slots, which move between absent, active
//! and released. Mutations for one identifier are serialized by a striped
//! lock table so unrelated identifiers rarely wait on each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::{AHashMap, RandomState};
use nbind_loader::PlatformLoader;
use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::debug;

use crate::blueprint::Blueprint;
use crate::identifier::Identifier;
use crate::instance::BindingInstance;

const DEFAULT_STRIPES: usize = 64;

/// Instance-cache entry. Absence from the map is the third state.
pub enum InstanceSlot<L: PlatformLoader> {
    Active(Arc<BindingInstance<L>>),
    /// The blueprint exists but its last instance was released.
    Released,
}

/// Observable state of one identifier in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Active,
    Released,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub generations: u64,
    pub constructions: u64,
    pub hits: u64,
    pub releases: u64,
}

struct LockTable {
    stripes: Box<[Mutex<()>]>,
    hasher: RandomState,
}

impl LockTable {
    fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
            hasher: RandomState::new(),
        }
    }

    fn lock(&self, identifier: &Identifier) -> MutexGuard<'_, ()> {
        let index = self.hasher.hash_one(identifier) as usize % self.stripes.len();
        self.stripes[index].lock()
    }
}

pub struct BindingCache<L: PlatformLoader> {
    blueprints: RwLock<AHashMap<Identifier, Arc<Blueprint>>>,
    instances: RwLock<AHashMap<Identifier, InstanceSlot<L>>>,
    locks: LockTable,
    generations: AtomicU64,
    constructions: AtomicU64,
    hits: AtomicU64,
    releases: AtomicU64,
}

impl<L: PlatformLoader> Default for BindingCache<L> {
    fn default() -> Self {
        Self::with_stripes(DEFAULT_STRIPES)
    }
}

impl<L: PlatformLoader> BindingCache<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache whose generation lock table has `stripes` entries. One stripe
    /// reproduces a single process-wide generation lock.
    pub fn with_stripes(stripes: usize) -> Self {
        Self {
            blueprints: RwLock::new(AHashMap::new()),
            instances: RwLock::new(AHashMap::new()),
            locks: LockTable::new(stripes),
            generations: AtomicU64::new(0),
            constructions: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    pub fn blueprint(&self, identifier: &Identifier) -> Option<Arc<Blueprint>> {
        self.blueprints.read().get(identifier).cloned()
    }

    /// The cached instance, unless it is absent, released or disposed.
    pub fn active(&self, identifier: &Identifier) -> Option<Arc<BindingInstance<L>>> {
        match self.instances.read().get(identifier) {
            Some(InstanceSlot::Active(instance)) if !instance.is_disposed() => {
                Some(Arc::clone(instance))
            }
            _ => None,
        }
    }

    pub fn state(&self, identifier: &Identifier) -> EntryState {
        match self.instances.read().get(identifier) {
            None => EntryState::Absent,
            Some(InstanceSlot::Active(instance)) if !instance.is_disposed() => EntryState::Active,
            Some(_) => EntryState::Released,
        }
    }

    pub fn blueprint_count(&self) -> usize {
        self.blueprints.read().len()
    }

    pub fn active_count(&self) -> usize {
        self.instances
            .read()
            .values()
            .filter(|slot| matches!(slot, InstanceSlot::Active(instance) if !instance.is_disposed()))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            generations: self.generations.load(Ordering::SeqCst),
            constructions: self.constructions.load(Ordering::SeqCst),
            hits: self.hits.load(Ordering::SeqCst),
            releases: self.releases.load(Ordering::SeqCst),
        }
    }

    /// Dispose the active instance of `identifier` and leave a released
    /// marker behind. Returns `false`, without counting a release, when
    /// nothing live was active.
    pub fn release(&self, identifier: &Identifier) -> bool {
        let _guard = self.locks.lock(identifier);
        let taken = {
            let mut instances = self.instances.write();
            match instances.get_mut(identifier) {
                Some(slot @ InstanceSlot::Active(_)) => {
                    match std::mem::replace(slot, InstanceSlot::Released) {
                        InstanceSlot::Active(instance) => Some(instance),
                        InstanceSlot::Released => None,
                    }
                }
                _ => None,
            }
        };

        // An instance disposed directly still leaves a released marker, but
        // only a dispose performed here counts as a release.
        if !taken.is_some_and(|instance| instance.dispose()) {
            return false;
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
        debug!(%identifier, "released binding");
        true
    }

    /// Release every active entry; returns how many were released.
    pub fn release_all(&self) -> usize {
        let identifiers: Vec<Identifier> = self
            .instances
            .read()
            .iter()
            .filter(|(_, slot)| matches!(slot, InstanceSlot::Active(_)))
            .map(|(identifier, _)| identifier.clone())
            .collect();
        identifiers
            .iter()
            .filter(|identifier| self.release(identifier))
            .count()
    }

    pub(crate) fn lock(&self, identifier: &Identifier) -> MutexGuard<'_, ()> {
        self.locks.lock(identifier)
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_generation(&self) {
        self.generations.fetch_add(1, Ordering::SeqCst);
    }

    /// Store a freshly generated blueprint together with its first instance.
    /// Must be called with the identifier's stripe lock held.
    pub(crate) fn insert(
        &self,
        identifier: Identifier,
        blueprint: Option<Arc<Blueprint>>,
        instance: Arc<BindingInstance<L>>,
    ) {
        if let Some(blueprint) = blueprint {
            self.blueprints
                .write()
                .entry(identifier.clone())
                .or_insert(blueprint);
        }
        self.instances
            .write()
            .insert(identifier, InstanceSlot::Active(instance));
        self.constructions.fetch_add(1, Ordering::SeqCst);
    }
}
