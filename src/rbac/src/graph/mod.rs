//! Item hierarchy: in-memory snapshot cache and access traversal
//!
//! # Features
//!
//! - **Snapshot Cache**: Items, rules and a child -> parents adjacency loaded
//!   wholesale from the repository and swapped in atomically
//! - **Generation Guard**: A snapshot built before an invalidation is never installed
//! - **Unified Traversal**: One DFS over a [`GraphSource`], backed either by the
//!   snapshot or by per-hop repository queries
//! - **Bounded Walk**: Explicit stack, visited set and depth cap

pub mod cache;
pub mod traversal;

pub use cache::{GraphSnapshot, ItemGraphCache};
pub use traversal::{find_grant, GraphSource, RepositorySource};
