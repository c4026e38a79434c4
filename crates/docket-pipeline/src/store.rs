//! # Pipeline Store
//!
//! In-memory persistence for cases, routing decisions, gate results and
//! document batches, keyed by case.
//!
//! All operations are synchronous. The lock is `parking_lot`, never held
//! across an `.await`, and non-poisoning: a panicking writer does not
//! corrupt the store. Stage guards use [`Store::try_update`] so that the
//! read-validate-write of a phase transition happens under one write lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use docket_core::CaseId;
use docket_routing::{GateResult, RoutingDecision};
use docket_state::{Case, JobBatch};

/// Thread-safe, cloneable key-value store.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Update a record in place. Returns the updated record, or `None` if
    /// not found.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(key)?;
        f(entry);
        Some(entry.clone())
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`. The closure runs under the write lock.
    pub fn try_update<R, E>(
        &self,
        key: &K,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(key).map(f)
    }

    /// Update the record, inserting `V::default()` first when absent.
    pub fn upsert(&self, key: K, f: impl FnOnce(&mut V)) -> V
    where
        V: Default,
    {
        let mut guard = self.data.write();
        let entry = guard.entry(key).or_default();
        f(entry);
        entry.clone()
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every table the pipeline reads and writes.
#[derive(Debug, Clone, Default)]
pub struct PipelineStore {
    pub cases: Store<CaseId, Case>,
    /// At most one decision per case, for the current generation attempt.
    pub decisions: Store<CaseId, RoutingDecision>,
    /// Gate result computed for the stored decision.
    pub gates: Store<CaseId, GateResult>,
    /// The latest batch per case. Replaced wholesale on every run.
    pub batches: Store<CaseId, JobBatch>,
}

impl PipelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything derived from a previous generation attempt.
    pub fn clear_derived(&self, case_id: &CaseId) {
        self.decisions.remove(case_id);
        self.gates.remove(case_id);
        self.batches.remove(case_id);
    }
}
