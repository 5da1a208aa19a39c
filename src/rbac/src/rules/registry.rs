//! Rule registry: executor name -> executor

use super::executor::Executor;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Thread-safe lookup from executor name to executor
///
/// Cloning is cheap and shares the underlying map, so executors registered
/// through one handle are visible to every manager holding a clone.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    executors: Arc<DashMap<String, Arc<dyn Executor>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own name; last write wins
    pub fn register<E: Executor + 'static>(&self, executor: E) {
        self.register_arc(Arc::new(executor));
    }

    /// Register a shared executor under its own name; last write wins
    pub fn register_arc(&self, executor: Arc<dyn Executor>) {
        let name = executor.name().to_string();
        if self.executors.insert(name.clone(), executor).is_some() {
            debug!("Replaced executor '{}'", name);
        }
    }

    /// Look up an executor by name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Executor>> {
        self.executors.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.executors.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Registered executor names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("executors", &self.names())
            .finish()
    }
}
