//! Local proxies for remotely-owned objects.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::vref::Vref;

/// A local proxy standing for an object owned by another trust domain.
///
/// Presences are immutable and compared by identity: two presences are the
/// same object exactly when their vrefs are equal. The alleged name is a
/// diagnostic label claimed by the exporting side, never trusted for
/// identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Presence {
    vref: Vref,
    alleged_name: String,
}

impl Presence {
    pub fn new(vref: Vref, alleged_name: impl Into<String>) -> Self {
        Self {
            vref,
            alleged_name: alleged_name.into(),
        }
    }

    pub fn vref(&self) -> &Vref {
        &self.vref
    }

    pub fn alleged_name(&self) -> &str {
        &self.alleged_name
    }
}

impl PartialEq for Presence {
    fn eq(&self, other: &Self) -> bool {
        self.vref == other.vref
    }
}

impl Eq for Presence {}

impl Hash for Presence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vref.hash(state);
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alleged: {} ({})", self.alleged_name, self.vref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_vref_only() {
        let a = Presence::new(Vref::Import(1001), "ledger");
        let b = Presence::new(Vref::Import(1001), "something else entirely");
        let c = Presence::new(Vref::Import(1002), "ledger");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_carries_alleged_name() {
        let p = Presence::new(Vref::Import(7), "quote-issuer");
        assert_eq!(p.to_string(), "Alleged: quote-issuer (o-7)");
    }
}
