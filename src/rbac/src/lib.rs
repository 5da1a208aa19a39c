//! # CretoAI RBAC Engine
//!
//! Role-based access control over a hierarchy of roles and permissions.
//!
//! ## Features
//!
//! - **Item hierarchy** of roles and permissions with loop and type checks on every edge
//! - **Rule-gated items** evaluated through executors injected at construction
//! - **Snapshot cache** of the whole graph, swapped atomically after mutations
//! - **Bounded assignment memo** (LRU + TTL) per user
//! - **Default roles** granted to every user without an assignment
//! - **Pluggable storage** behind the [`Repository`] trait
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rbac::{InMemoryRepository, Params, RbacManager, RuleRegistry, UserId};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = RbacManager::new(Arc::new(InMemoryRepository::new()), RuleRegistry::new());
//!
//!     manager.add_item(&manager.create_role("admin"))?;
//!     manager.add_item(&manager.create_role("editor"))?;
//!     manager.add_item(&manager.create_permission("viewer"))?;
//!     manager.add_child("admin", "editor")?;
//!     manager.add_child("editor", "viewer")?;
//!
//!     let alice = UserId::from("alice");
//!     manager.assign("admin", &alice)?;
//!
//!     if manager.check_access(&alice, "viewer", &Params::new()) {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod assignments;
pub mod config;
pub mod error;
pub mod graph;
pub mod manager;
pub mod rules;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use assignments::{AssignmentMap, MemoStats};
pub use config::{ManagerConfig, MemoConfig, RefreshPolicy};
pub use error::{RbacError, Result};
pub use manager::RbacManager;
pub use rules::{Executor, FnExecutor, RuleRegistry};
pub use store::{InMemoryRepository, Repository};
pub use types::{merge_permissions, Assignment, Item, ItemChild, ItemType, Params, Rule, UserId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
