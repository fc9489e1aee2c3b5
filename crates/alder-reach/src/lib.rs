//! # Alder Reach - Incremental Reachability Index
//!
//! Tracks, per vref, whether any local anchor still references it: a value
//! slot in a durable collection, a field of virtual-object state (resident
//! or swapped out), or an externally-rooted flag maintained by the
//! surrounding runtime.
//!
//! The index never walks an object graph to answer a query. Every mutation
//! that can add or remove an embedded reference reports a diff here at the
//! moment it happens, so [`ReachabilityIndex::is_reachable`] is a
//! constant-time table lookup. Under-reporting liveness would let a remote
//! GC protocol retire a reference still in use, so anchor accounting errs
//! on the side of keeping: an anchor is released only by an explicit diff
//! that removes it.

mod index;

pub use index::{IndexStats, ReachabilityIndex};
