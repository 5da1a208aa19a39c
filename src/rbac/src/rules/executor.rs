//! Executor trait and closure adapter

use crate::types::{Item, Params, UserId};
use std::fmt;

/// Boolean predicate bound to a rule by name
pub trait Executor: Send + Sync {
    /// Name the executor is registered under
    fn name(&self) -> &str;

    /// Decide whether `user_id` may pass through `item`
    fn execute(&self, user_id: &UserId, item: &Item, params: &Params) -> bool;
}

/// Executor backed by a closure
pub struct FnExecutor<F> {
    name: String,
    predicate: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&UserId, &Item, &Params) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(&UserId, &Item, &Params) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, user_id: &UserId, item: &Item, params: &Params) -> bool {
        (self.predicate)(user_id, item, params)
    }
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").field("name", &self.name).finish()
    }
}
