//! # Alder Objects - Virtual Object Manager
//!
//! Durable object "kinds" whose instances live behind stable vrefs and swap
//! between a bounded in-memory working set and the backing store.
//!
//! ## Overview
//!
//! - [`KindDefinition`]: a state initializer plus a method table, immutable
//!   once registered
//! - [`VirtualObjectManager`]: owns the kind registry, the LRU working set,
//!   and the import registration table
//! - [`KindFactory`]: mints new instances of one kind
//! - [`VirtualInstance`]: the facade application code holds; every access
//!   transparently ensures the instance's state is resident
//!
//! Swapping is invisible to method semantics (a method always observes a
//! live state record) but never invisible to reachability: each time a
//! state record is created, mutated, or rematerialized, its embedded-ref
//! set is reported to the reachability index, so swapped-out state keeps
//! anchoring the references it holds.

mod cache;
mod error;
mod kind;
mod manager;

pub use cache::WorkingSetStats;
pub use error::ObjectError;
pub use kind::{KindDefinition, KindRegistry};
pub use manager::{KindFactory, VirtualInstance, VirtualObjectManager, VomConfig};
