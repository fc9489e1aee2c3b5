use alder_types::VrefError;
use thiserror::Error;

/// Errors from encoding or decoding a storable payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("reference marker points at missing slot {0}")]
    BadSlot(u64),

    #[error("record field name {0:?} is reserved")]
    ReservedField(String),

    #[error("non-finite float cannot be stored")]
    NonFiniteFloat,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Vref(#[from] VrefError),
}
