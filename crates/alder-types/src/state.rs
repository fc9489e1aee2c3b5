//! Virtual-object state records.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use crate::value::CapValue;
use crate::vref::Vref;

/// The named-field state of one virtual-object instance.
///
/// This is the unit the object manager swaps: resident records are mutated
/// in place by kind methods, serialized on eviction, and rebuilt on
/// rematerialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateRecord {
    fields: BTreeMap<String, CapValue>,
}

impl StateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from field pairs, for kind initializers.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, CapValue)>,
        K: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&CapValue> {
        self.fields.get(field)
    }

    /// Set a field, returning the previous value if any.
    pub fn set(&mut self, field: impl Into<String>, value: CapValue) -> Option<CapValue> {
        self.fields.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<CapValue> {
        self.fields.remove(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> btree_map::Iter<'_, String, CapValue> {
        self.fields.iter()
    }

    /// Every vref embedded anywhere in this record's fields.
    pub fn embedded_refs(&self) -> BTreeSet<Vref> {
        let mut out = BTreeSet::new();
        for value in self.fields.values() {
            value.collect_refs(&mut out);
        }
        out
    }
}
