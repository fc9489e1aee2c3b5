use alder_types::Vref;
use thiserror::Error;

/// Errors from a backing-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store rejected operation on {vref}: {reason}")]
    Backend { vref: Vref, reason: String },

    #[error("backing store unavailable: {0}")]
    Unavailable(String),
}
