// ABOUTME: Local attachment store composing predetermined and runtime entries.
// ABOUTME: Lookup is strictly local - never traverses to parent or children.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::AttachmentKey;

/// Values are shared so a predetermined set can be cloned into many units.
pub type AttachmentValue = Arc<dyn Any + Send + Sync>;

/// Per-unit attachment store.
///
/// Two sources compose: an immutable predetermined map supplied when the
/// unit is created, and a mutable map populated by deployers at runtime.
/// Runtime entries shadow predetermined entries of the same name.
#[derive(Clone, Default)]
pub struct Attachments {
    predetermined: BTreeMap<AttachmentKey, AttachmentValue>,
    runtime: BTreeMap<AttachmentKey, AttachmentValue>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predetermined(predetermined: BTreeMap<AttachmentKey, AttachmentValue>) -> Self {
        Self {
            predetermined,
            runtime: BTreeMap::new(),
        }
    }

    /// Attach a runtime value under `name`, replacing any previous runtime
    /// value and shadowing a predetermined one.
    pub fn put<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.runtime.insert(name.to_string(), Arc::new(value));
    }

    pub fn put_value(&mut self, name: &str, value: AttachmentValue) {
        self.runtime.insert(name.to_string(), value);
    }

    /// Remove a runtime attachment. Predetermined attachments cannot be
    /// removed; removing a shadowing runtime value re-exposes them.
    pub fn remove(&mut self, name: &str) -> Option<AttachmentValue> {
        self.runtime.remove(name)
    }

    /// Typed lookup by name.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.get_any(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Untyped lookup by name; runtime shadows predetermined.
    pub fn get_any(&self, name: &str) -> Option<&AttachmentValue> {
        self.runtime.get(name).or_else(|| self.predetermined.get(name))
    }

    /// First attachment of type `T`, scanning runtime then predetermined
    /// entries in key order.
    pub fn find_by_type<T: Any + Send + Sync>(&self) -> Option<(&str, &T)> {
        self.runtime
            .iter()
            .chain(self.predetermined.iter())
            .find_map(|(k, v)| v.downcast_ref::<T>().map(|t| (k.as_str(), t)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.runtime.contains_key(name) || self.predetermined.contains_key(name)
    }

    pub fn has_all<'a, I: IntoIterator<Item = &'a AttachmentKey>>(&self, names: I) -> bool {
        names.into_iter().all(|n| self.has(n))
    }

    /// All visible attachment names, runtime and predetermined, deduplicated.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .runtime
            .keys()
            .chain(self.predetermined.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.predetermined.is_empty()
    }
}

impl std::fmt::Debug for Attachments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachments")
            .field("predetermined", &self.predetermined.keys().collect::<Vec<_>>())
            .field("runtime", &self.runtime.keys().collect::<Vec<_>>())
            .finish()
    }
}
