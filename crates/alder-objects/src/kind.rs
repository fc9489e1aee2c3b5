//! Kind definitions and the kind registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alder_types::{CapValue, StateRecord};

use crate::error::ObjectError;

/// A kind's state initializer: constructor arguments in, fresh state out.
pub type InitFn = dyn Fn(&[CapValue]) -> StateRecord + Send + Sync;

/// A kind method: mutable access to the resident state record plus call
/// arguments. The record is guaranteed resident for the duration of the
/// call.
pub type MethodFn =
    dyn Fn(&mut StateRecord, &[CapValue]) -> Result<CapValue, ObjectError> + Send + Sync;

/// A durable object class: a tag, a state initializer, and a method table.
///
/// Definitions are immutable once registered: the registry hands out
/// `Arc<KindDefinition>` and never replaces one.
pub struct KindDefinition {
    tag: String,
    init: Box<InitFn>,
    methods: HashMap<String, Box<MethodFn>>,
}

impl KindDefinition {
    pub fn new(
        tag: impl Into<String>,
        init: impl Fn(&[CapValue]) -> StateRecord + Send + Sync + 'static,
    ) -> Self {
        Self {
            tag: tag.into(),
            init: Box::new(init),
            methods: HashMap::new(),
        }
    }

    /// Add a named method. Builder-style; only usable before registration.
    pub fn with_method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&mut StateRecord, &[CapValue]) -> Result<CapValue, ObjectError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Box::new(method));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub(crate) fn init_state(&self, args: &[CapValue]) -> StateRecord {
        (self.init)(args)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name).map(|boxed| boxed.as_ref())
    }
}

impl fmt::Debug for KindDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("KindDefinition")
            .field("tag", &self.tag)
            .field("methods", &names)
            .finish()
    }
}

/// Maps kind tags to their immutable definitions.
#[derive(Debug, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Arc<KindDefinition>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. The tag must be unique among currently
    /// defined kinds, non-empty, and free of `/` (tags are embedded in
    /// vref strings).
    pub fn define(&mut self, def: KindDefinition) -> Result<Arc<KindDefinition>, ObjectError> {
        let tag = def.tag().to_string();
        if tag.is_empty() || tag.contains('/') {
            return Err(ObjectError::InvalidKindTag(tag));
        }
        if self.kinds.contains_key(&tag) {
            return Err(ObjectError::DuplicateKind(tag));
        }
        let def = Arc::new(def);
        self.kinds.insert(tag, Arc::clone(&def));
        Ok(def)
    }

    pub fn lookup(&self, tag: &str) -> Option<Arc<KindDefinition>> {
        self.kinds.get(tag).cloned()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_kind(tag: &str) -> KindDefinition {
        KindDefinition::new(tag, |_args| StateRecord::new())
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let mut registry = KindRegistry::new();
        registry.define(empty_kind("key")).unwrap();
        assert!(matches!(
            registry.define(empty_kind("key")),
            Err(ObjectError::DuplicateKind(tag)) if tag == "key"
        ));
    }

    #[test]
    fn malformed_tags_are_rejected() {
        let mut registry = KindRegistry::new();
        assert!(matches!(
            registry.define(empty_kind("")),
            Err(ObjectError::InvalidKindTag(_))
        ));
        assert!(matches!(
            registry.define(empty_kind("a/b")),
            Err(ObjectError::InvalidKindTag(_))
        ));
    }

    #[test]
    fn methods_dispatch_by_name() {
        let def = KindDefinition::new("counter", |_args| {
            StateRecord::from_fields([("n", CapValue::from(0i64))])
        })
        .with_method("bump", |state, _args| {
            let n = state.get("n").and_then(CapValue::as_int).unwrap_or(0);
            state.set("n", CapValue::from(n + 1));
            Ok(CapValue::from(n + 1))
        });

        let mut state = def.init_state(&[]);
        let bump = def.method("bump").unwrap();
        assert_eq!(bump(&mut state, &[]).unwrap(), CapValue::from(1i64));
        assert!(def.method("missing").is_none());
    }
}
