//! Storage trait definition.
//!
//! Defines the interface for the durable key-value store that serialized
//! object state and collection snapshots land in.

use async_trait::async_trait;

use alder_types::Vref;

use crate::error::StoreError;

/// Trait for backing-store backends.
///
/// Keys are vrefs; values are opaque serialized payloads produced by the
/// codec. Absence is a normal answer (`get` returns `None`), not an error;
/// deciding whether absence is corruption is the caller's concern.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Store the payload for a vref, replacing any previous payload.
    async fn put(&self, vref: &Vref, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Load the payload for a vref.
    async fn get(&self, vref: &Vref) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove the payload for a vref. Removing an absent entry is a no-op.
    async fn delete(&self, vref: &Vref) -> Result<(), StoreError>;

    /// Check whether a payload exists for a vref.
    async fn contains(&self, vref: &Vref) -> Result<bool, StoreError> {
        Ok(self.get(vref).await?.is_some())
    }
}
