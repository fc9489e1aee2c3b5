//! # Alder Types - Reference Identifiers and the Storable Value Model
//!
//! Shared vocabulary for the Alder runtime crates:
//!
//! - [`Vref`]: durable reference identifiers for imported, exported,
//!   virtual-object, and collection references
//! - [`Presence`]: immutable local proxies for remotely-owned objects
//! - [`CapValue`]: the storable value tree with explicit reference tagging
//! - [`ScalarKey`]: the totally ordered key domain for durable collections
//! - [`StateRecord`]: the named-field state unit a virtual object swaps
//!
//! Every value that enters the runtime's ownership is classified up front as
//! plain data or as a tagged reference ([`CapValue::Ref`]); nothing downstream
//! inspects host-level object identity to decide what travels by reference.

mod key;
mod presence;
mod state;
mod value;
mod vref;

pub use key::ScalarKey;
pub use presence::Presence;
pub use state::StateRecord;
pub use value::CapValue;
pub use vref::{Vref, VrefError};
