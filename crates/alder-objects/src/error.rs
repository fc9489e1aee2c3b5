use alder_store::StoreError;
use alder_types::Vref;
use thiserror::Error;

/// Errors from the virtual object manager.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("kind {0:?} is already defined")]
    DuplicateKind(String),

    #[error("invalid kind tag {0:?}: tags must be non-empty and must not contain '/'")]
    InvalidKindTag(String),

    #[error("working set capacity must be positive")]
    InvalidCacheSize,

    #[error("{0} does not name an object created by this manager")]
    UnknownVref(Vref),

    #[error("kind {kind:?} has no method {method:?}")]
    UnknownMethod { kind: String, method: String },

    #[error("stored state for {vref} is missing or unreadable: {reason}")]
    CorruptState { vref: Vref, reason: String },

    #[error("state for {vref} cannot be serialized: {reason}")]
    Unserializable { vref: Vref, reason: String },

    #[error("presence {presence} registered under mismatched vref {vref}")]
    RegistrationMismatch { vref: Vref, presence: Vref },

    #[error("method rejected arguments: {0}")]
    BadArguments(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
