//! The virtual object manager and instance facades.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use alder_codec::{decode_state, encode_state};
use alder_reach::ReachabilityIndex;
use alder_store::StateStore;
use alder_types::{CapValue, Presence, Vref};

use crate::cache::{ResidentState, WorkingSet, WorkingSetStats};
use crate::error::ObjectError;
use crate::kind::{KindDefinition, KindRegistry};

/// Construction-time configuration.
#[derive(Clone, Debug)]
pub struct VomConfig {
    /// Maximum resident working-set size.
    pub cache_size: usize,
}

impl Default for VomConfig {
    fn default() -> Self {
        Self { cache_size: 100 }
    }
}

impl VomConfig {
    pub fn validate(&self) -> Result<(), ObjectError> {
        if self.cache_size == 0 {
            return Err(ObjectError::InvalidCacheSize);
        }
        Ok(())
    }
}

struct VomShared {
    store: Arc<dyn StateStore>,
    reach: Arc<ReachabilityIndex>,
    kinds: RwLock<KindRegistry>,
    /// Presences registered as locally known, by import vref.
    imports: Mutex<HashMap<Vref, Presence>>,
    /// Next instance index per kind tag.
    counters: Mutex<HashMap<String, u64>>,
    /// The resident working set. An async mutex: operations hold it across
    /// store awaits, which under the cooperative execution model makes each
    /// VOM operation atomic from its caller's point of view.
    cache: AsyncMutex<WorkingSet>,
}

/// Creates and manages virtual-object instances.
///
/// Cloning is cheap and shares the same working set, kind registry, and
/// import table.
#[derive(Clone)]
pub struct VirtualObjectManager {
    shared: Arc<VomShared>,
}

impl VirtualObjectManager {
    pub fn new(
        config: VomConfig,
        store: Arc<dyn StateStore>,
        reach: Arc<ReachabilityIndex>,
    ) -> Result<Self, ObjectError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(VomShared {
                store,
                reach,
                kinds: RwLock::new(KindRegistry::new()),
                imports: Mutex::new(HashMap::new()),
                counters: Mutex::new(HashMap::new()),
                cache: AsyncMutex::new(WorkingSet::new(config.cache_size)),
            }),
        })
    }

    /// Register a new kind, returning the factory that mints its instances.
    pub fn define_kind(&self, def: KindDefinition) -> Result<KindFactory, ObjectError> {
        let kind = self
            .shared
            .kinds
            .write()
            .expect("kind registry lock poisoned")
            .define(def)?;
        debug!(tag = kind.tag(), "kind defined");
        Ok(KindFactory {
            shared: Arc::clone(&self.shared),
            kind,
        })
    }

    /// Install a presence as locally known, creating its reachability
    /// record. Registration alone does not make the presence reachable.
    /// Idempotent for the same vref/presence pair.
    pub fn register_entry(&self, vref: &Vref, presence: Presence) -> Result<(), ObjectError> {
        if presence.vref() != vref {
            return Err(ObjectError::RegistrationMismatch {
                vref: vref.clone(),
                presence: presence.vref().clone(),
            });
        }
        self.shared
            .imports
            .lock()
            .expect("import table lock poisoned")
            .entry(vref.clone())
            .or_insert(presence);
        self.shared.reach.register(vref);
        Ok(())
    }

    /// Look up a registered presence.
    pub fn presence(&self, vref: &Vref) -> Option<Presence> {
        self.shared
            .imports
            .lock()
            .expect("import table lock poisoned")
            .get(vref)
            .cloned()
    }

    /// Re-attach a facade to an existing instance by vref.
    pub fn instance(&self, vref: &Vref) -> Result<VirtualInstance, ObjectError> {
        let Vref::Virtual { kind: tag, index } = vref else {
            return Err(ObjectError::UnknownVref(vref.clone()));
        };
        let kind = self
            .shared
            .kinds
            .read()
            .expect("kind registry lock poisoned")
            .lookup(tag)
            .ok_or_else(|| ObjectError::UnknownVref(vref.clone()))?;
        let minted = self
            .shared
            .counters
            .lock()
            .expect("counter lock poisoned")
            .get(tag)
            .copied()
            .unwrap_or(0);
        if *index >= minted {
            return Err(ObjectError::UnknownVref(vref.clone()));
        }
        Ok(VirtualInstance {
            shared: Arc::clone(&self.shared),
            kind,
            vref: vref.clone(),
        })
    }

    /// Persist every dirty resident record without evicting anything.
    /// Returns the number of records written.
    pub async fn flush(&self) -> Result<usize, ObjectError> {
        let mut cache = self.shared.cache.lock().await;
        let dirty = cache.dirty_vrefs();
        let mut flushed = 0;
        for vref in dirty {
            let payload = match cache.get(&vref) {
                Some(entry) => encode_state(&entry.state).map_err(|e| {
                    ObjectError::Unserializable {
                        vref: vref.clone(),
                        reason: e.to_string(),
                    }
                })?,
                None => continue,
            };
            self.shared.store.put(&vref, payload.bytes).await?;
            if let Some(entry) = cache.get_mut(&vref) {
                entry.dirty = false;
            }
            flushed += 1;
        }
        if flushed > 0 {
            debug!(flushed, "flushed dirty state");
        }
        Ok(flushed)
    }

    /// Whether an instance's state is currently resident.
    pub async fn is_resident(&self, vref: &Vref) -> bool {
        self.shared.cache.lock().await.contains(vref)
    }

    /// Resident vrefs, least recently used first.
    pub async fn resident_vrefs(&self) -> Vec<Vref> {
        self.shared.cache.lock().await.vrefs()
    }

    pub async fn working_set_stats(&self) -> WorkingSetStats {
        self.shared.cache.lock().await.stats()
    }

    /// The reachability index this manager reports into.
    pub fn reach(&self) -> &Arc<ReachabilityIndex> {
        &self.shared.reach
    }
}

impl std::fmt::Debug for VirtualObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualObjectManager").finish_non_exhaustive()
    }
}

impl VomShared {
    fn allocate_vref(&self, tag: &str) -> Vref {
        let mut counters = self.counters.lock().expect("counter lock poisoned");
        let counter = counters.entry(tag.to_string()).or_insert(0);
        let index = *counter;
        *counter += 1;
        Vref::Virtual {
            kind: tag.to_string(),
            index,
        }
    }

    /// Make the instance resident: promote if cached, otherwise load,
    /// decode, and insert (evicting first if the set is full).
    async fn ensure_resident(
        &self,
        cache: &mut WorkingSet,
        vref: &Vref,
    ) -> Result<(), ObjectError> {
        if cache.contains(vref) {
            cache.touch(vref);
            return Ok(());
        }
        let bytes = self
            .store
            .get(vref)
            .await?
            .ok_or_else(|| ObjectError::CorruptState {
                vref: vref.clone(),
                reason: "no stored state".to_string(),
            })?;
        let (state, refs) = decode_state(&bytes).map_err(|e| ObjectError::CorruptState {
            vref: vref.clone(),
            reason: e.to_string(),
        })?;
        self.reach.update_container(vref, refs);
        self.make_room(cache).await?;
        cache.insert(
            vref.clone(),
            ResidentState {
                state,
                dirty: false,
            },
        );
        debug!(vref = %vref, "rematerialized");
        Ok(())
    }

    /// Evict least-recently-used residents until there is room for one
    /// more. The store write happens before the resident copy is dropped,
    /// so a failing store leaves the working set untouched.
    async fn make_room(&self, cache: &mut WorkingSet) -> Result<(), ObjectError> {
        while cache.len() >= cache.capacity() {
            let (victim, payload) = match cache.lru_entry() {
                Some((vref, entry)) => {
                    let payload = if entry.dirty {
                        Some(encode_state(&entry.state).map_err(|e| {
                            ObjectError::Unserializable {
                                vref: vref.clone(),
                                reason: e.to_string(),
                            }
                        })?)
                    } else {
                        // clean residents are already current in the store
                        None
                    };
                    (vref.clone(), payload)
                }
                None => break,
            };
            if let Some(payload) = payload {
                self.store.put(&victim, payload.bytes).await?;
            }
            cache.remove(&victim);
            debug!(vref = %victim, "evicted");
        }
        Ok(())
    }

    /// Rediff a resident record's embedded refs after a mutation.
    fn commit_mutation(&self, cache: &mut WorkingSet, vref: &Vref) {
        if let Some(entry) = cache.get_mut(vref) {
            entry.dirty = true;
            let refs = entry.state.embedded_refs();
            self.reach.update_container(vref, refs);
        }
    }
}

/// Mints instances of one registered kind.
#[derive(Clone)]
pub struct KindFactory {
    shared: Arc<VomShared>,
    kind: Arc<KindDefinition>,
}

impl KindFactory {
    pub fn tag(&self) -> &str {
        self.kind.tag()
    }

    /// Allocate a vref, run the initializer, persist the initial state,
    /// report its embedded refs, and insert it resident.
    pub async fn create(&self, args: &[CapValue]) -> Result<VirtualInstance, ObjectError> {
        let state = self.kind.init_state(args);
        let refs = state.embedded_refs();
        let vref = self.shared.allocate_vref(self.kind.tag());
        let payload =
            encode_state(&state).map_err(|e| ObjectError::Unserializable {
                vref: vref.clone(),
                reason: e.to_string(),
            })?;
        self.shared.store.put(&vref, payload.bytes).await?;
        self.shared.reach.update_container(&vref, refs);

        let mut cache = self.shared.cache.lock().await;
        self.shared.make_room(&mut cache).await?;
        cache.insert(
            vref.clone(),
            ResidentState {
                state,
                dirty: false,
            },
        );
        debug!(vref = %vref, "instance created");

        Ok(VirtualInstance {
            shared: Arc::clone(&self.shared),
            kind: Arc::clone(&self.kind),
            vref,
        })
    }
}

impl std::fmt::Debug for KindFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindFactory")
            .field("tag", &self.kind.tag())
            .finish()
    }
}

/// The facade application code holds for one virtual-object instance.
///
/// Every access ensures the instance is resident first: promoted if cached,
/// rematerialized from the store if swapped out.
#[derive(Clone)]
pub struct VirtualInstance {
    shared: Arc<VomShared>,
    kind: Arc<KindDefinition>,
    vref: Vref,
}

impl VirtualInstance {
    pub fn vref(&self) -> &Vref {
        &self.vref
    }

    pub fn kind_tag(&self) -> &str {
        self.kind.tag()
    }

    /// This instance as a storable value, for embedding in other state.
    pub fn as_value(&self) -> CapValue {
        CapValue::Ref(self.vref.clone())
    }

    /// Invoke a method from the kind's method table.
    pub async fn invoke(&self, method: &str, args: &[CapValue]) -> Result<CapValue, ObjectError> {
        let method_fn =
            self.kind
                .method(method)
                .ok_or_else(|| ObjectError::UnknownMethod {
                    kind: self.kind.tag().to_string(),
                    method: method.to_string(),
                })?;
        let mut cache = self.shared.cache.lock().await;
        self.shared.ensure_resident(&mut cache, &self.vref).await?;
        let result = {
            let entry = cache
                .get_mut(&self.vref)
                .ok_or_else(|| ObjectError::CorruptState {
                    vref: self.vref.clone(),
                    reason: "resident state vanished".to_string(),
                })?;
            method_fn(&mut entry.state, args)?
        };
        self.shared.commit_mutation(&mut cache, &self.vref);
        Ok(result)
    }

    /// Read one state field directly.
    pub async fn get_field(&self, field: &str) -> Result<Option<CapValue>, ObjectError> {
        let mut cache = self.shared.cache.lock().await;
        self.shared.ensure_resident(&mut cache, &self.vref).await?;
        Ok(cache
            .get(&self.vref)
            .and_then(|entry| entry.state.get(field).cloned()))
    }

    /// Write one state field directly.
    pub async fn set_field(&self, field: &str, value: CapValue) -> Result<(), ObjectError> {
        let mut cache = self.shared.cache.lock().await;
        self.shared.ensure_resident(&mut cache, &self.vref).await?;
        if let Some(entry) = cache.get_mut(&self.vref) {
            entry.state.set(field, value);
        }
        self.shared.commit_mutation(&mut cache, &self.vref);
        Ok(())
    }
}

impl std::fmt::Debug for VirtualInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualInstance")
            .field("vref", &self.vref)
            .field("kind", &self.kind.tag())
            .finish()
    }
}
