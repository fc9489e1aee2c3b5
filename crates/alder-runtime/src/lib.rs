//! # Alder Runtime - Top-Level Wiring
//!
//! Constructs and owns the pieces of the virtualization layer: the
//! reachability index, the virtual object manager, and the collection
//! manager, all sharing one backing store. Nothing here is ambient: every
//! subsystem is an explicit, passed-around object whose lifetime is tied to
//! the [`Runtime`] that built it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use alder_runtime::{Runtime, RuntimeConfig};
//! use alder_types::{CapValue, Presence, StateRecord, Vref};
//! use alder_objects::KindDefinition;
//!
//! # async fn example() {
//! let runtime = Runtime::in_memory(RuntimeConfig { cache_size: 3 }).unwrap();
//!
//! // a presence arrives from another trust domain
//! let vref = Vref::Import(1001);
//! let presence = Presence::new(vref.clone(), "issuer");
//! runtime.register_entry(&vref, presence.clone()).unwrap();
//! assert!(!runtime.is_presence_reachable(&vref));
//!
//! // storing it in durable object state anchors it
//! let make_holder = runtime
//!     .define_kind(KindDefinition::new("holder", |args| {
//!         StateRecord::from_fields([(
//!             "held",
//!             args.first().cloned().unwrap_or(CapValue::Null),
//!         )])
//!     }))
//!     .unwrap();
//! make_holder.create(&[CapValue::from(&presence)]).await.unwrap();
//! assert!(runtime.is_presence_reachable(&vref));
//! # }
//! ```

mod error;
mod runtime;

pub use error::RuntimeError;
pub use runtime::{Runtime, RuntimeConfig};

pub use alder_codec::{
    decode_state, decode_value, encode_state, encode_value, CodecError, EncodedPayload,
};
pub use alder_collections::{CollectionManager, WeakMapStore, WeakSetStore};
pub use alder_objects::{
    KindDefinition, KindFactory, VirtualInstance, VirtualObjectManager, WorkingSetStats,
};
pub use alder_reach::ReachabilityIndex;
pub use alder_store::{InMemoryStateStore, StateStore};
pub use alder_types::{CapValue, Presence, ScalarKey, StateRecord, Vref};
