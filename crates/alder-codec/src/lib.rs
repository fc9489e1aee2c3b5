//! # Alder Codec - Serialization Bridge
//!
//! Converts state records and storable values to and from backing-store
//! payloads, and reports the set of references embedded in whatever it
//! converts. That report is what lets the reachability index account for
//! swapped-out state without rematerializing it.
//!
//! ## Wire shape
//!
//! A payload is a JSON object `{ "body": …, "slots": [ "o-12", … ] }`.
//! Inside the body, a reference is the marker object `{ "@ref": n }` where
//! `n` indexes into `slots`; `slots` holds canonical vref strings, first
//! occurrence order, deduplicated. Everything else in the body is plain
//! JSON. Record fields named `@ref` are rejected at encode time so a body
//! can never be mis-decoded.

mod error;
mod payload;

pub use error::CodecError;
pub use payload::{
    decode_state, decode_value, encode_state, encode_value, EncodedPayload,
};
