//! The storable value model.
//!
//! Everything a virtual object's state or a durable collection can hold is a
//! [`CapValue`]. References are an explicit variant, so the reachability
//! index and the codec never have to guess whether a value travels by copy
//! or by reference.

use std::collections::{BTreeMap, BTreeSet};

use crate::presence::Presence;
use crate::vref::Vref;

/// A storable value: plain data, or a tagged reference.
#[derive(Clone, Debug, PartialEq)]
pub enum CapValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<CapValue>),
    Record(BTreeMap<String, CapValue>),
    Ref(Vref),
}

impl CapValue {
    /// Every vref embedded anywhere in this value tree.
    pub fn embedded_refs(&self) -> BTreeSet<Vref> {
        let mut out = BTreeSet::new();
        self.collect_refs(&mut out);
        out
    }

    /// Accumulate embedded vrefs into `out`.
    pub fn collect_refs(&self, out: &mut BTreeSet<Vref>) {
        match self {
            CapValue::Ref(vref) => {
                out.insert(vref.clone());
            }
            CapValue::List(items) => {
                for item in items {
                    item.collect_refs(out);
                }
            }
            CapValue::Record(fields) => {
                for value in fields.values() {
                    value.collect_refs(out);
                }
            }
            _ => {}
        }
    }

    pub fn is_ref(&self) -> bool {
        matches!(self, CapValue::Ref(_))
    }

    /// The referenced vref, if this value is a reference.
    pub fn as_vref(&self) -> Option<&Vref> {
        match self {
            CapValue::Ref(vref) => Some(vref),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CapValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CapValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Build a record value from field pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, CapValue)>,
        K: Into<String>,
    {
        CapValue::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }
}

impl From<bool> for CapValue {
    fn from(b: bool) -> Self {
        CapValue::Bool(b)
    }
}

impl From<i64> for CapValue {
    fn from(n: i64) -> Self {
        CapValue::Int(n)
    }
}

impl From<f64> for CapValue {
    fn from(x: f64) -> Self {
        CapValue::Float(x)
    }
}

impl From<&str> for CapValue {
    fn from(s: &str) -> Self {
        CapValue::Str(s.to_string())
    }
}

impl From<String> for CapValue {
    fn from(s: String) -> Self {
        CapValue::Str(s)
    }
}

impl From<Vref> for CapValue {
    fn from(vref: Vref) -> Self {
        CapValue::Ref(vref)
    }
}

impl From<&Presence> for CapValue {
    fn from(presence: &Presence) -> Self {
        CapValue::Ref(presence.vref().clone())
    }
}
