//! Durable reference identifiers.
//!
//! A vref names one object for the lifetime of the runtime, across swap-out
//! and across process restarts. The canonical string form is what lands in
//! backing-store keys and serialized state, so parsing and formatting must
//! round-trip exactly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a vref's canonical string form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VrefError {
    #[error("malformed vref {0:?}")]
    Malformed(String),

    #[error("vref {0:?} has a non-numeric index")]
    BadIndex(String),

    #[error("vref {0:?} has an empty kind tag")]
    EmptyKindTag(String),
}

/// A durable reference identifier.
///
/// Canonical forms:
///
/// - `o-12`: imported reference (a [`Presence`](crate::Presence) stands for it)
/// - `o+12`: plain exported reference
/// - `o+counter/3`: instance 3 of the locally defined kind `counter`
/// - `c+4`: durable collection 4
///
/// Kind tags are embedded in the virtual form, so a tag may not be empty and
/// may not contain `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Vref {
    /// A reference imported from another trust domain.
    Import(u64),
    /// A reference exported at top level by this trust domain.
    Export(u64),
    /// An instance of a locally defined durable kind.
    Virtual { kind: String, index: u64 },
    /// A durable collection.
    Collection(u64),
}

impl Vref {
    /// Whether this vref names an imported reference.
    pub fn is_import(&self) -> bool {
        matches!(self, Vref::Import(_))
    }

    /// Whether this vref names a virtual-object instance.
    pub fn is_virtual(&self) -> bool {
        matches!(self, Vref::Virtual { .. })
    }

    /// Whether this vref names a durable collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Vref::Collection(_))
    }

    /// The kind tag, for virtual-object vrefs.
    pub fn kind_tag(&self) -> Option<&str> {
        match self {
            Vref::Virtual { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for Vref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vref::Import(n) => write!(f, "o-{n}"),
            Vref::Export(n) => write!(f, "o+{n}"),
            Vref::Virtual { kind, index } => write!(f, "o+{kind}/{index}"),
            Vref::Collection(n) => write!(f, "c+{n}"),
        }
    }
}

impl FromStr for Vref {
    type Err = VrefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_index = |digits: &str| -> Result<u64, VrefError> {
            digits
                .parse::<u64>()
                .map_err(|_| VrefError::BadIndex(s.to_string()))
        };

        if let Some(rest) = s.strip_prefix("o-") {
            return Ok(Vref::Import(parse_index(rest)?));
        }
        if let Some(rest) = s.strip_prefix("c+") {
            return Ok(Vref::Collection(parse_index(rest)?));
        }
        if let Some(rest) = s.strip_prefix("o+") {
            return match rest.split_once('/') {
                Some((kind, index)) => {
                    if kind.is_empty() {
                        return Err(VrefError::EmptyKindTag(s.to_string()));
                    }
                    Ok(Vref::Virtual {
                        kind: kind.to_string(),
                        index: parse_index(index)?,
                    })
                }
                None => Ok(Vref::Export(parse_index(rest)?)),
            };
        }
        Err(VrefError::Malformed(s.to_string()))
    }
}

impl From<Vref> for String {
    fn from(vref: Vref) -> Self {
        vref.to_string()
    }
}

impl TryFrom<String> for Vref {
    type Error = VrefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_forms_round_trip() {
        for repr in ["o-12", "o+12", "o+counter/3", "c+4"] {
            let vref: Vref = repr.parse().unwrap();
            assert_eq!(vref.to_string(), repr);
        }
    }

    #[test]
    fn flavors_are_distinguished() {
        assert!("o-7".parse::<Vref>().unwrap().is_import());
        assert!(!"o+7".parse::<Vref>().unwrap().is_import());
        let holder: Vref = "o+holder/0".parse().unwrap();
        assert!(holder.is_virtual());
        assert_eq!(holder.kind_tag(), Some("holder"));
        assert!("c+0".parse::<Vref>().unwrap().is_collection());
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert_eq!(
            "x-1".parse::<Vref>(),
            Err(VrefError::Malformed("x-1".to_string()))
        );
        assert_eq!(
            "o-abc".parse::<Vref>(),
            Err(VrefError::BadIndex("o-abc".to_string()))
        );
        assert_eq!(
            "o+/3".parse::<Vref>(),
            Err(VrefError::EmptyKindTag("o+/3".to_string()))
        );
    }

    #[test]
    fn serde_uses_canonical_string() {
        let vref = Vref::Virtual {
            kind: "holder".to_string(),
            index: 2,
        };
        let json = serde_json::to_string(&vref).unwrap();
        assert_eq!(json, "\"o+holder/2\"");
        let back: Vref = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vref);
    }

    fn arb_vref() -> impl Strategy<Value = Vref> {
        prop_oneof![
            any::<u64>().prop_map(Vref::Import),
            any::<u64>().prop_map(Vref::Export),
            any::<u64>().prop_map(Vref::Collection),
            ("[a-z][a-z0-9_]{0,15}", any::<u64>())
                .prop_map(|(kind, index)| Vref::Virtual { kind, index }),
        ]
    }

    proptest! {
        #[test]
        fn display_parse_round_trip(vref in arb_vref()) {
            let reparsed: Vref = vref.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, vref);
        }
    }
}
