//! Pluggable rule executors
//!
//! An [`Item`](crate::types::Item) names a [`Rule`](crate::types::Rule); the rule
//! names an [`Executor`]. Executors are supplied by the embedding application and
//! looked up through a [`RuleRegistry`] injected into the manager at construction.
//!
//! # Example
//!
//! ```rust
//! use cretoai_rbac::rules::{FnExecutor, RuleRegistry};
//!
//! let registry = RuleRegistry::new();
//! registry.register(FnExecutor::new("always", |_, _, _| true));
//!
//! assert!(registry.resolve("always").is_some());
//! assert!(registry.resolve("missing").is_none());
//! ```

mod executor;
mod registry;

pub use executor::{Executor, FnExecutor};
pub use registry::RuleRegistry;
