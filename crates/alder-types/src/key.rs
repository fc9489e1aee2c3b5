//! Ordered scalar keys for durable collections.

use std::fmt;

use crate::value::CapValue;
use crate::vref::Vref;

/// A collection key: a scalar with a total order, so durable collections can
/// iterate deterministically and snapshot stably.
///
/// Object references are legal keys (keyed-by-object is the common shape for
/// weak maps); compound values are not.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKey {
    Bool(bool),
    Int(i64),
    Str(String),
    Ref(Vref),
}

impl ScalarKey {
    /// The key as a storable value, for snapshot encoding.
    pub fn to_value(&self) -> CapValue {
        match self {
            ScalarKey::Bool(b) => CapValue::Bool(*b),
            ScalarKey::Int(n) => CapValue::Int(*n),
            ScalarKey::Str(s) => CapValue::Str(s.clone()),
            ScalarKey::Ref(vref) => CapValue::Ref(vref.clone()),
        }
    }

    /// Recover a key from a snapshot value. `None` for non-scalar values.
    pub fn from_value(value: &CapValue) -> Option<Self> {
        match value {
            CapValue::Bool(b) => Some(ScalarKey::Bool(*b)),
            CapValue::Int(n) => Some(ScalarKey::Int(*n)),
            CapValue::Str(s) => Some(ScalarKey::Str(s.clone())),
            CapValue::Ref(vref) => Some(ScalarKey::Ref(vref.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKey::Bool(b) => write!(f, "{b}"),
            ScalarKey::Int(n) => write!(f, "{n}"),
            ScalarKey::Str(s) => write!(f, "{s:?}"),
            ScalarKey::Ref(vref) => write!(f, "{vref}"),
        }
    }
}

impl From<bool> for ScalarKey {
    fn from(b: bool) -> Self {
        ScalarKey::Bool(b)
    }
}

impl From<i64> for ScalarKey {
    fn from(n: i64) -> Self {
        ScalarKey::Int(n)
    }
}

impl From<&str> for ScalarKey {
    fn from(s: &str) -> Self {
        ScalarKey::Str(s.to_string())
    }
}

impl From<Vref> for ScalarKey {
    fn from(vref: Vref) -> Self {
        ScalarKey::Ref(vref)
    }
}
