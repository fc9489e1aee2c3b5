//! Collection construction and the map/set store types.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use alder_codec::encode_value;
use alder_reach::ReachabilityIndex;
use alder_store::StateStore;
use alder_types::{CapValue, ScalarKey, Vref};

use crate::error::CollectionError;

struct CollectionShared {
    store: Arc<dyn StateStore>,
    reach: Arc<ReachabilityIndex>,
    next_id: Mutex<u64>,
}

impl CollectionShared {
    fn allocate_vref(&self) -> Vref {
        let mut next = self.next_id.lock().expect("collection counter poisoned");
        let id = *next;
        *next += 1;
        Vref::Collection(id)
    }

    /// Persist a snapshot, then report the collection's anchor set.
    /// The store write comes first so a failure leaves the previous
    /// snapshot and anchor set in place.
    async fn persist(
        &self,
        vref: &Vref,
        snapshot: CapValue,
        anchor_refs: BTreeSet<Vref>,
    ) -> Result<(), CollectionError> {
        let payload = encode_value(&snapshot).map_err(|e| CollectionError::Unserializable {
            vref: vref.clone(),
            reason: e.to_string(),
        })?;
        self.store.put(vref, payload.bytes).await?;
        self.reach.update_container(vref, anchor_refs);
        Ok(())
    }
}

/// Mints durable collections backed by one store and one reachability
/// index.
#[derive(Clone)]
pub struct CollectionManager {
    shared: Arc<CollectionShared>,
}

impl CollectionManager {
    pub fn new(store: Arc<dyn StateStore>, reach: Arc<ReachabilityIndex>) -> Self {
        Self {
            shared: Arc::new(CollectionShared {
                store,
                reach,
                next_id: Mutex::new(0),
            }),
        }
    }

    /// Create an empty weak map store and persist its initial snapshot.
    pub async fn make_weak_map(
        &self,
        label: impl Into<String>,
    ) -> Result<WeakMapStore, CollectionError> {
        let label = label.into();
        let vref = self.shared.allocate_vref();
        self.shared
            .persist(&vref, CapValue::List(Vec::new()), BTreeSet::new())
            .await?;
        debug!(vref = %vref, label = %label, "weak map store created");
        Ok(WeakMapStore {
            shared: Arc::clone(&self.shared),
            label,
            vref,
            entries: AsyncMutex::new(BTreeMap::new()),
        })
    }

    /// Create an empty weak set store and persist its initial snapshot.
    pub async fn make_weak_set(
        &self,
        label: impl Into<String>,
    ) -> Result<WeakSetStore, CollectionError> {
        let label = label.into();
        let vref = self.shared.allocate_vref();
        self.shared
            .persist(&vref, CapValue::List(Vec::new()), BTreeSet::new())
            .await?;
        debug!(vref = %vref, label = %label, "weak set store created");
        Ok(WeakSetStore {
            shared: Arc::clone(&self.shared),
            label,
            vref,
            members: AsyncMutex::new(BTreeSet::new()),
        })
    }
}

impl std::fmt::Debug for CollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager").finish_non_exhaustive()
    }
}

/// A durable map whose keys are weak and whose values anchor.
pub struct WeakMapStore {
    shared: Arc<CollectionShared>,
    label: String,
    vref: Vref,
    entries: AsyncMutex<BTreeMap<ScalarKey, CapValue>>,
}

impl WeakMapStore {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vref(&self) -> &Vref {
        &self.vref
    }

    /// Install a value under a fresh key.
    pub async fn init(&self, key: ScalarKey, value: CapValue) -> Result<(), CollectionError> {
        let mut entries = self.entries.lock().await;
        if entries.contains_key(&key) {
            return Err(CollectionError::DuplicateKey {
                label: self.label.clone(),
                key,
            });
        }
        let mut candidate = entries.clone();
        candidate.insert(key, value);
        self.commit(&mut entries, candidate).await
    }

    /// Replace the value under an existing key.
    pub async fn set(&self, key: ScalarKey, value: CapValue) -> Result<(), CollectionError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(&key) {
            return Err(CollectionError::MissingKey {
                label: self.label.clone(),
                key,
            });
        }
        let mut candidate = entries.clone();
        candidate.insert(key, value);
        self.commit(&mut entries, candidate).await
    }

    /// Remove an existing key and its value.
    pub async fn delete(&self, key: &ScalarKey) -> Result<(), CollectionError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Err(CollectionError::MissingKey {
                label: self.label.clone(),
                key: key.clone(),
            });
        }
        let mut candidate = entries.clone();
        candidate.remove(key);
        self.commit(&mut entries, candidate).await
    }

    pub async fn get(&self, key: &ScalarKey) -> Option<CapValue> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn has(&self, key: &ScalarKey) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Persist the candidate entry table, report anchors, and commit it.
    async fn commit(
        &self,
        entries: &mut BTreeMap<ScalarKey, CapValue>,
        candidate: BTreeMap<ScalarKey, CapValue>,
    ) -> Result<(), CollectionError> {
        let snapshot = CapValue::List(
            candidate
                .iter()
                .map(|(k, v)| CapValue::List(vec![k.to_value(), v.clone()]))
                .collect(),
        );
        // values anchor; keys are the weak side
        let mut anchor_refs = BTreeSet::new();
        for value in candidate.values() {
            value.collect_refs(&mut anchor_refs);
        }
        self.shared.persist(&self.vref, snapshot, anchor_refs).await?;
        *entries = candidate;
        debug!(vref = %self.vref, entries = entries.len(), "weak map committed");
        Ok(())
    }
}

impl std::fmt::Debug for WeakMapStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakMapStore")
            .field("label", &self.label)
            .field("vref", &self.vref)
            .finish_non_exhaustive()
    }
}

/// A durable set whose members anchor the references they embed.
pub struct WeakSetStore {
    shared: Arc<CollectionShared>,
    label: String,
    vref: Vref,
    members: AsyncMutex<BTreeSet<ScalarKey>>,
}

impl WeakSetStore {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vref(&self) -> &Vref {
        &self.vref
    }

    /// Add a member. Adding a present member is an error, mirroring
    /// `init` on the map store.
    pub async fn add(&self, member: ScalarKey) -> Result<(), CollectionError> {
        let mut members = self.members.lock().await;
        if members.contains(&member) {
            return Err(CollectionError::DuplicateKey {
                label: self.label.clone(),
                key: member,
            });
        }
        let mut candidate = members.clone();
        candidate.insert(member);
        self.commit(&mut members, candidate).await
    }

    /// Remove an existing member.
    pub async fn delete(&self, member: &ScalarKey) -> Result<(), CollectionError> {
        let mut members = self.members.lock().await;
        if !members.contains(member) {
            return Err(CollectionError::MissingKey {
                label: self.label.clone(),
                key: member.clone(),
            });
        }
        let mut candidate = members.clone();
        candidate.remove(member);
        self.commit(&mut members, candidate).await
    }

    pub async fn has(&self, member: &ScalarKey) -> bool {
        self.members.lock().await.contains(member)
    }

    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }

    async fn commit(
        &self,
        members: &mut BTreeSet<ScalarKey>,
        candidate: BTreeSet<ScalarKey>,
    ) -> Result<(), CollectionError> {
        let snapshot =
            CapValue::List(candidate.iter().map(|member| member.to_value()).collect());
        let mut anchor_refs = BTreeSet::new();
        for member in &candidate {
            member.to_value().collect_refs(&mut anchor_refs);
        }
        self.shared.persist(&self.vref, snapshot, anchor_refs).await?;
        *members = candidate;
        debug!(vref = %self.vref, members = members.len(), "weak set committed");
        Ok(())
    }
}

impl std::fmt::Debug for WeakSetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSetStore")
            .field("label", &self.label)
            .field("vref", &self.vref)
            .finish_non_exhaustive()
    }
}
