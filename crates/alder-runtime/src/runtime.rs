//! Runtime construction and the delegating facade.

use std::sync::Arc;

use tracing::debug;

use alder_collections::{CollectionManager, WeakMapStore, WeakSetStore};
use alder_objects::{
    KindDefinition, KindFactory, VirtualInstance, VirtualObjectManager, VomConfig,
    WorkingSetStats,
};
use alder_reach::ReachabilityIndex;
use alder_store::{InMemoryStateStore, StateStore};
use alder_types::{Presence, Vref};

use crate::error::RuntimeError;

/// Construction-time configuration for the runtime.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Maximum resident working-set size for virtual-object state.
    pub cache_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { cache_size: 100 }
    }
}

/// The virtualization layer of one runtime instance.
///
/// Owns the reachability index, the virtual object manager, and the
/// collection manager; all three share the backing store passed at
/// construction. Initialized empty and never torn down mid-run; eviction
/// is the only release mechanism, and it only removes cache residency,
/// not identity.
pub struct Runtime {
    store: Arc<dyn StateStore>,
    reach: Arc<ReachabilityIndex>,
    objects: VirtualObjectManager,
    collections: CollectionManager,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, store: Arc<dyn StateStore>) -> Result<Self, RuntimeError> {
        let reach = Arc::new(ReachabilityIndex::new());
        let objects = VirtualObjectManager::new(
            VomConfig {
                cache_size: config.cache_size,
            },
            Arc::clone(&store),
            Arc::clone(&reach),
        )?;
        let collections = CollectionManager::new(Arc::clone(&store), Arc::clone(&reach));
        debug!(cache_size = config.cache_size, "runtime constructed");
        Ok(Self {
            store,
            reach,
            objects,
            collections,
        })
    }

    /// Construct over a fresh in-memory store.
    pub fn in_memory(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        Self::new(config, Arc::new(InMemoryStateStore::new()))
    }

    // ---- virtual objects ----

    pub fn define_kind(&self, def: KindDefinition) -> Result<KindFactory, RuntimeError> {
        Ok(self.objects.define_kind(def)?)
    }

    pub fn instance(&self, vref: &Vref) -> Result<VirtualInstance, RuntimeError> {
        Ok(self.objects.instance(vref)?)
    }

    /// Persist all dirty resident object state.
    pub async fn flush(&self) -> Result<usize, RuntimeError> {
        Ok(self.objects.flush().await?)
    }

    pub async fn working_set_stats(&self) -> WorkingSetStats {
        self.objects.working_set_stats().await
    }

    // ---- presences and reachability ----

    /// Install a presence as locally known. Does not anchor it.
    pub fn register_entry(&self, vref: &Vref, presence: Presence) -> Result<(), RuntimeError> {
        Ok(self.objects.register_entry(vref, presence)?)
    }

    pub fn presence(&self, vref: &Vref) -> Option<Presence> {
        self.objects.presence(vref)
    }

    /// Is this presence still reachable from local state?
    pub fn is_presence_reachable(&self, vref: &Vref) -> bool {
        self.reach.is_reachable(vref)
    }

    /// Mark or unmark a vref as externally rooted (exported, or held by
    /// host state outside this layer's view).
    pub fn set_rooted(&self, vref: &Vref, rooted: bool) {
        self.reach.set_rooted(vref, rooted);
    }

    /// Drain imports that lost their last anchor, for the upstream drop
    /// protocol.
    pub fn take_droppable(&self) -> Vec<Vref> {
        self.reach.take_droppable()
    }

    // ---- collections ----

    pub async fn make_weak_map(
        &self,
        label: impl Into<String>,
    ) -> Result<WeakMapStore, RuntimeError> {
        Ok(self.collections.make_weak_map(label).await?)
    }

    pub async fn make_weak_set(
        &self,
        label: impl Into<String>,
    ) -> Result<WeakSetStore, RuntimeError> {
        Ok(self.collections.make_weak_set(label).await?)
    }

    // ---- subsystem access ----

    pub fn objects(&self) -> &VirtualObjectManager {
        &self.objects
    }

    pub fn collections(&self) -> &CollectionManager {
        &self.collections
    }

    pub fn reach(&self) -> &Arc<ReachabilityIndex> {
        &self.reach
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}
