//! # Alder Collections - Durable Weak Map and Weak Set Stores
//!
//! Key/value collections whose contents persist through the backing store
//! and whose reachability contribution is computed explicitly: holding a
//! value here does not keep its referent alive through any host-GC weak
//! primitive. Instead, every mutation reports the collection's current
//! embedded-reference set to the reachability index.
//!
//! Weak-map semantics: *values* anchor the references they embed; *keys*
//! are the weak side and never anchor. A weak set's members are its values,
//! so members anchor.

mod error;
mod stores;

pub use error::CollectionError;
pub use stores::{CollectionManager, WeakMapStore, WeakSetStore};
