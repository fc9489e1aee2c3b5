use alder_collections::CollectionError;
use alder_objects::ObjectError;
use alder_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the top-level runtime facade.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
