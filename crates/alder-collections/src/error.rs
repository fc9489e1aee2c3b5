use alder_store::StoreError;
use alder_types::{ScalarKey, Vref};
use thiserror::Error;

/// Errors from durable collection stores.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("collection {label:?} already has key {key}")]
    DuplicateKey { label: String, key: ScalarKey },

    #[error("collection {label:?} has no key {key}")]
    MissingKey { label: String, key: ScalarKey },

    #[error("snapshot for collection {vref} cannot be serialized: {reason}")]
    Unserializable { vref: Vref, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}
