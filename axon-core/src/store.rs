//! The store: task-visible mutable state.

use crate::error::VmError;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reserved key holding the ordered writer log.
pub const LOG_KEY: &str = "__log__";

/// Reserved key holding the final clock reading of a simulated run.
pub const CLOCK_KEY: &str = "__clock__";

/// Reserved key for collaborator graph-tracking tooling. The engine
/// never writes it; the name is reserved so user programs stay clear.
pub const GRAPH_KEY: &str = "__graph__";

/// Reserved namespace for memoized lazy reader bindings.
pub const MEMO_PREFIX: &str = "__memo__/";

/// How a spawned child sees the parent's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePolicy {
    /// The child writes the same cells the parent reads.
    #[default]
    Shared,
    /// The child gets a private copy taken at spawn time.
    Snapshot,
}

/// A handle to a mutable key-value store.
///
/// Cloning the handle shares the cells ([`StorePolicy::Shared`]);
/// [`snapshot`](Store::snapshot) copies them ([`StorePolicy::Snapshot`]).
/// The lock protects map integrity only — the engine is cooperative and
/// single-threaded, so user programs never observe partial updates, and
/// interleaving of concurrent writers under a parallel driver is the
/// program's own concern.
///
/// Store mutations performed before an error are retained. The engine
/// provides failure isolation, not transactions.
#[derive(Debug, Clone, Default)]
pub struct Store {
    cells: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl Store {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cells.lock().get(key).cloned()
    }

    /// Write a key. Creates or overwrites.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.cells.lock().insert(key.into(), value);
    }

    /// Update a key with a pure function, as one logical transition.
    /// Reading a key that was never written is an error.
    pub fn update(
        &self,
        key: &str,
        f: impl FnOnce(Value) -> Result<Value, VmError>,
    ) -> Result<Value, VmError> {
        let mut cells = self.cells.lock();
        let old = cells
            .get(key)
            .cloned()
            .ok_or_else(|| VmError::MissingKey(key.to_string()))?;
        let new = f(old)?;
        cells.insert(key.to_string(), new.clone());
        Ok(new)
    }

    /// A private copy of the cells under a fresh handle.
    pub fn snapshot(&self) -> Store {
        Store {
            cells: Arc::new(Mutex::new(self.cells.lock().clone())),
        }
    }

    /// The full cell map, for run reports.
    pub fn export(&self) -> BTreeMap<String, Value> {
        self.cells.lock().clone()
    }

    /// True if the two handles share cells.
    pub fn shares_cells_with(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }

    // ── writer log ────────────────────────────────────────────────

    /// Append an entry to the writer log.
    pub fn append_log(&self, entry: Value) {
        let mut cells = self.cells.lock();
        match cells.get_mut(LOG_KEY) {
            Some(Value::List(entries)) => entries.push(entry),
            _ => {
                cells.insert(LOG_KEY.to_string(), Value::List(vec![entry]));
            }
        }
    }

    /// Current length of the writer log.
    pub fn log_len(&self) -> usize {
        match self.cells.lock().get(LOG_KEY) {
            Some(Value::List(entries)) => entries.len(),
            _ => 0,
        }
    }

    /// Writer entries appended at or after `mark`.
    pub fn log_since(&self, mark: usize) -> Vec<Value> {
        match self.cells.lock().get(LOG_KEY) {
            Some(Value::List(entries)) => entries.iter().skip(mark).cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// The memoization cell name for a lazy reader binding.
    pub fn memo_key(key: &str) -> String {
        format!("{MEMO_PREFIX}{key}")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Store {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let store = Store::new();
        {
            let mut cells = store.cells.lock();
            for (k, v) in iter {
                cells.insert(k.into(), v.into());
            }
        }
        store
    }
}
