//! The environment: shared-immutable reader bindings.

use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// An ordered mapping of reader keys to values.
///
/// The map is shared behind an `Arc` and never mutated in place:
/// [`with`](Env::with) produces an extended copy, so a `Local` scope can
/// layer bindings over a parent environment and drop back to the parent
/// by restoring the old handle. Cloning an `Env` is a pointer copy.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Arc<BTreeMap<String, Value>>,
}

impl Env {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a binding.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }

    /// True if the key is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// A new environment with `delta` layered over this one.
    pub fn with<K, V>(&self, delta: impl IntoIterator<Item = (K, V)>) -> Env
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bindings = (*self.bindings).clone();
        for (k, v) in delta {
            bindings.insert(k.into(), v.into());
        }
        Env {
            bindings: Arc::new(bindings),
        }
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True if no keys are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Env {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Env::new().with(iter)
    }
}
