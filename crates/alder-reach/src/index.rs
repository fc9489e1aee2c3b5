//! The reachability record table and anchor bookkeeping.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use tracing::{debug, warn};

use alder_types::Vref;

/// One tracked vref's derived liveness fact.
#[derive(Debug, Default)]
struct ReachRecord {
    /// Number of container sites whose current content references this vref.
    anchors: usize,
    /// Externally-rooted flag: exported, or held by ordinary host state the
    /// surrounding runtime tracks on its own.
    rooted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Vref, ReachRecord>,
    /// Retained per-container embedded-ref sets. Kept independent of
    /// residency so swapped-out containers still contribute anchors.
    container_refs: HashMap<Vref, BTreeSet<Vref>>,
    /// Imports whose records were retired, awaiting pickup by the upstream
    /// drop protocol.
    droppable: Vec<Vref>,
}

/// Counters for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexStats {
    pub tracked_records: usize,
    pub tracked_containers: usize,
    pub pending_drops: usize,
}

/// The reachability record table.
///
/// All operations are synchronous and lock-internally, so an anchor update
/// is applied atomically with the mutation that caused it: a query issued
/// immediately after a mutating call observes that mutation's effect.
#[derive(Debug, Default)]
pub struct ReachabilityIndex {
    inner: Mutex<Inner>,
}

impl ReachabilityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a vref as locally known, without anchoring it.
    ///
    /// Idempotent: registering an already-tracked vref changes nothing.
    pub fn register(&self, vref: &Vref) {
        let mut inner = self.lock();
        if inner.records.contains_key(vref) {
            return;
        }
        inner.records.insert(vref.clone(), ReachRecord::default());
        debug!(vref = %vref, "registered reference");
    }

    /// Whether a vref currently has a reachability record.
    pub fn is_tracked(&self, vref: &Vref) -> bool {
        self.lock().records.contains_key(vref)
    }

    /// Set or clear the externally-rooted flag.
    ///
    /// Clearing the flag on a record with no remaining anchors retires it.
    pub fn set_rooted(&self, vref: &Vref, rooted: bool) {
        let mut inner = self.lock();
        if !rooted && !inner.records.contains_key(vref) {
            return;
        }
        let record = inner.records.entry(vref.clone()).or_default();
        if record.rooted == rooted {
            return;
        }
        record.rooted = rooted;
        debug!(vref = %vref, rooted, "root flag changed");
        if !rooted && record.anchors == 0 {
            inner.retire(vref);
        }
    }

    /// The central query: is this vref reachable from local state?
    ///
    /// Never an error: a vref that was never registered (or whose record
    /// was retired) cannot be anchored, so the answer is simply `false`.
    pub fn is_reachable(&self, vref: &Vref) -> bool {
        self.lock()
            .records
            .get(vref)
            .map(|record| record.anchors > 0 || record.rooted)
            .unwrap_or(false)
    }

    /// Report the new embedded-ref set for a container (a virtual object's
    /// state or a durable collection), diffing against the retained set and
    /// adjusting anchor counts for every added or removed reference.
    pub fn update_container(&self, container: &Vref, new_refs: BTreeSet<Vref>) {
        let mut inner = self.lock();
        let old_refs = inner.container_refs.remove(container).unwrap_or_default();
        if old_refs == new_refs {
            if !new_refs.is_empty() {
                inner.container_refs.insert(container.clone(), new_refs);
            }
            return;
        }
        for added in new_refs.difference(&old_refs) {
            inner.anchor(added);
        }
        // collect first: unanchoring may retire records and mutate tables
        let removed: Vec<Vref> = old_refs.difference(&new_refs).cloned().collect();
        for vref in &removed {
            inner.unanchor(vref);
        }
        debug!(
            container = %container,
            refs = new_refs.len(),
            "container refs updated"
        );
        if !new_refs.is_empty() {
            inner.container_refs.insert(container.clone(), new_refs);
        }
    }

    /// Forget a container entirely, releasing every anchor it contributed.
    pub fn retire_container(&self, container: &Vref) {
        self.update_container(container, BTreeSet::new());
    }

    /// The retained embedded-ref set for a container.
    pub fn refs_of(&self, container: &Vref) -> BTreeSet<Vref> {
        self.lock()
            .container_refs
            .get(container)
            .cloned()
            .unwrap_or_default()
    }

    /// Drain the imports whose records were retired since the last call.
    /// This feeds the cross-boundary drop protocol.
    pub fn take_droppable(&self) -> Vec<Vref> {
        std::mem::take(&mut self.lock().droppable)
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.lock();
        IndexStats {
            tracked_records: inner.records.len(),
            tracked_containers: inner.container_refs.len(),
            pending_drops: inner.droppable.len(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("reachability index lock poisoned")
    }
}

impl Inner {
    fn anchor(&mut self, vref: &Vref) {
        let record = self.records.entry(vref.clone()).or_default();
        record.anchors += 1;
        debug!(vref = %vref, anchors = record.anchors, "anchor added");
    }

    fn unanchor(&mut self, vref: &Vref) {
        let Some(record) = self.records.get_mut(vref) else {
            // anchors are only removed by diffs that previously added them
            warn!(vref = %vref, "unanchor for untracked reference ignored");
            return;
        };
        if record.anchors == 0 {
            warn!(vref = %vref, "unanchor below zero ignored");
            return;
        }
        record.anchors -= 1;
        debug!(vref = %vref, anchors = record.anchors, "anchor removed");
        if record.anchors == 0 && !record.rooted {
            self.retire(vref);
        }
    }

    fn retire(&mut self, vref: &Vref) {
        self.records.remove(vref);
        if vref.is_import() {
            self.droppable.push(vref.clone());
            debug!(vref = %vref, "import retired, queued for drop");
        } else {
            debug!(vref = %vref, "record retired");
        }
    }
}
