//! Item graph cache
//!
//! Mirrors every item, rule and edge of the repository. Mutations invalidate
//! the whole mirror; the next access check reloads it lazily.

use crate::error::Result;
use crate::store::Repository;
use crate::types::{Item, Rule};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Immutable view of the hierarchy at one point in time
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    /// All items (name -> item)
    items: HashMap<String, Item>,
    /// All rules (name -> rule)
    rules: HashMap<String, Rule>,
    /// child name -> parent names
    parents: HashMap<String, Vec<String>>,
}

impl GraphSnapshot {
    /// Load the full hierarchy from a repository
    ///
    /// Edges whose child is not a known item are skipped.
    pub fn load(repository: &dyn Repository) -> Result<Self> {
        let rules = repository
            .get_rules()?
            .into_iter()
            .map(|rule| (rule.name.clone(), rule))
            .collect();

        let items: HashMap<String, Item> = repository
            .find_all_items()?
            .into_iter()
            .map(|item| (item.name.clone(), item))
            .collect();

        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        for edge in repository.find_all_children()? {
            if items.contains_key(&edge.child) {
                parents.entry(edge.child).or_default().push(edge.parent);
            }
        }

        Ok(Self {
            items,
            rules,
            parents,
        })
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Parent names of `name` (empty for roots and unknown names)
    pub fn parents(&self, name: &str) -> &[String] {
        self.parents.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }
}

/// Optional in-memory mirror of the hierarchy
///
/// When disabled, no snapshot is ever built and every lookup goes to the
/// repository. When enabled, readers clone an `Arc` of the current snapshot
/// and never observe a partially rebuilt one.
#[derive(Debug)]
pub struct ItemGraphCache {
    enabled: bool,
    snapshot: RwLock<Option<Arc<GraphSnapshot>>>,
    /// Bumped on every invalidation
    generation: AtomicU64,
}

impl ItemGraphCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current snapshot, if one is loaded
    pub fn current(&self) -> Option<Arc<GraphSnapshot>> {
        self.snapshot.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Drop the current snapshot
    pub fn invalidate(&self) {
        if !self.enabled {
            return;
        }
        let mut snapshot = self.snapshot.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *snapshot = None;
        debug!("Item graph cache invalidated");
    }

    /// Rebuild the snapshot from the repository
    ///
    /// The new snapshot is built without holding the lock and installed only if
    /// no invalidation happened in the meantime. Returns `Ok(None)` when the
    /// cache is disabled.
    pub fn refresh(&self, repository: &dyn Repository) -> Result<Option<Arc<GraphSnapshot>>> {
        if !self.enabled {
            return Ok(None);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let snapshot = Arc::new(GraphSnapshot::load(repository)?);

        let mut current = self.snapshot.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *current = Some(Arc::clone(&snapshot));
            info!(
                "Item graph cache loaded: items={}, rules={}, edges={}",
                snapshot.item_count(),
                snapshot.rule_count(),
                snapshot.edge_count()
            );
        } else {
            debug!("Discarding item graph snapshot built before an invalidation");
        }

        Ok(Some(snapshot))
    }

    /// Current snapshot, loading one first if needed
    ///
    /// A failed load is logged and reported as `None` so the caller can fall
    /// back to querying the repository directly.
    pub fn ensure_loaded(&self, repository: &dyn Repository) -> Option<Arc<GraphSnapshot>> {
        if !self.enabled {
            return None;
        }
        if let Some(snapshot) = self.current() {
            return Some(snapshot);
        }
        match self.refresh(repository) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to load item graph cache: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRepository;
    use crate::types::ItemChild;

    fn repository() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.add_rule(&Rule::new("owner", "owner_check")).unwrap();
        repo.add_item(&Item::role("admin")).unwrap();
        repo.add_item(&Item::role("editor")).unwrap();
        repo.add_item(&Item::permission("viewer").with_rule("owner")).unwrap();
        repo.add_item_child(&ItemChild::new("admin", "viewer")).unwrap();
        repo.add_item_child(&ItemChild::new("editor", "viewer")).unwrap();
        repo
    }

    #[test]
    fn test_snapshot_builds_parent_index() {
        let snapshot = GraphSnapshot::load(&repository()).unwrap();

        let mut parents = snapshot.parents("viewer").to_vec();
        parents.sort();
        assert_eq!(parents, vec!["admin".to_string(), "editor".to_string()]);
        assert!(snapshot.parents("admin").is_empty());
        assert_eq!(snapshot.item_count(), 3);
        assert_eq!(snapshot.rule_count(), 1);
        assert_eq!(snapshot.edge_count(), 2);
        assert!(snapshot.rule("owner").is_some());
    }

    #[test]
    fn test_disabled_cache_never_loads() {
        let cache = ItemGraphCache::new(false);
        let repo = repository();

        assert!(cache.refresh(&repo).unwrap().is_none());
        assert!(cache.ensure_loaded(&repo).is_none());
        assert!(!cache.is_loaded());
    }

    #[test]
    fn test_lazy_reload_after_invalidate() {
        let cache = ItemGraphCache::new(true);
        let repo = repository();

        assert!(!cache.is_loaded());
        let first = cache.ensure_loaded(&repo).unwrap();
        assert!(cache.is_loaded());

        let again = cache.ensure_loaded(&repo).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        repo.add_item(&Item::permission("audit")).unwrap();
        cache.invalidate();
        assert!(!cache.is_loaded());

        let reloaded = cache.ensure_loaded(&repo).unwrap();
        assert!(reloaded.item("audit").is_some());
        assert!(first.item("audit").is_none());
    }
}
