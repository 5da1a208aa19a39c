//! RBAC manager
//!
//! Orchestrates the repository, the item graph cache, the assignment memo and
//! the rule registry.
//!
//! # Architecture
//!
//! ```text
//! check_access → AssignmentMemo → ItemGraphCache ─┐
//!                                                 ├→ find_grant → RuleRegistry
//!                                  Repository ────┘
//!
//! add_child / add_item / ... → Repository → invalidate cache
//! assign / revoke            → Repository → invalidate memo entry
//! ```

mod access;
mod assignment;
mod hierarchy;

use crate::assignments::AssignmentMemo;
use crate::config::ManagerConfig;
use crate::error::{RbacError, Result};
use crate::graph::ItemGraphCache;
use crate::rules::RuleRegistry;
use crate::store::Repository;
use crate::types::{Item, ItemType, Rule};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Role/permission manager and access resolver
///
/// # Thread Safety
///
/// The manager is `Send + Sync` and meant to be shared behind an `Arc`.
/// Access checks run concurrently; the graph cache is replaced atomically and
/// the assignment memo is guarded by a mutex.
pub struct RbacManager {
    /// Storage backend
    repository: Arc<dyn Repository>,

    /// Executor lookup for item rules
    registry: RuleRegistry,

    /// In-memory mirror of items, rules and edges
    cache: ItemGraphCache,

    /// user -> direct assignments
    memo: AssignmentMemo,

    /// Roles every user holds implicitly
    default_roles: RwLock<Arc<HashSet<String>>>,

    config: ManagerConfig,
}

impl RbacManager {
    /// Create a manager with the default configuration
    pub fn new(repository: Arc<dyn Repository>, registry: RuleRegistry) -> Self {
        Self::build(repository, registry, ManagerConfig::default())
    }

    /// Create a manager with a validated configuration
    pub fn with_config(
        repository: Arc<dyn Repository>,
        registry: RuleRegistry,
        config: ManagerConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(repository, registry, config))
    }

    fn build(repository: Arc<dyn Repository>, registry: RuleRegistry, config: ManagerConfig) -> Self {
        info!(
            "RbacManager initialized with cache={}, refresh={:?}, memo_capacity={}",
            config.enable_cache, config.refresh_policy, config.assignment_memo.capacity
        );

        Self {
            repository,
            registry,
            cache: ItemGraphCache::new(config.enable_cache),
            memo: AssignmentMemo::new(&config.assignment_memo),
            default_roles: RwLock::new(Arc::new(HashSet::new())),
            config,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// Whether the item graph cache currently holds a snapshot
    pub fn cache_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Rebuild the item graph cache now instead of on the next access check
    pub fn refresh_cache(&self) -> Result<()> {
        self.cache.refresh(self.repository.as_ref())?;
        Ok(())
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    // ---------------------------------------------------------------
    // Items
    // ---------------------------------------------------------------

    /// Build an unsaved role
    pub fn create_role(&self, name: impl Into<String>) -> Item {
        Item::role(name)
    }

    /// Build an unsaved permission
    pub fn create_permission(&self, name: impl Into<String>) -> Item {
        Item::permission(name)
    }

    /// Look up an item by name (through the cache when loaded)
    pub fn get_item(&self, name: &str) -> Result<Option<Item>> {
        if name.is_empty() {
            return Ok(None);
        }
        match self.cache.current() {
            Some(snapshot) => Ok(snapshot.item(name).cloned()),
            None => self.repository.get_item(name),
        }
    }

    /// Look up a role; `None` if absent or a permission
    pub fn get_role(&self, name: &str) -> Result<Option<Item>> {
        Ok(self.get_item(name)?.filter(Item::is_role))
    }

    /// Look up a permission; `None` if absent or a role
    pub fn get_permission(&self, name: &str) -> Result<Option<Item>> {
        Ok(self.get_item(name)?.filter(Item::is_permission))
    }

    pub fn get_roles(&self) -> Result<Vec<Item>> {
        self.repository.get_items(ItemType::Role)
    }

    pub fn get_permissions(&self) -> Result<Vec<Item>> {
        self.repository.get_items(ItemType::Permission)
    }

    /// Store a new item, creating an unbound rule for an unknown rule name
    pub fn add_item(&self, item: &Item) -> Result<()> {
        self.ensure_rule_exists(item)?;
        self.repository.add_item(item)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Replace (and possibly rename) the item stored under `name`
    ///
    /// Changing the variant is rejected while an existing edge would then pair
    /// a permission parent with a role child.
    pub fn update_item(&self, name: &str, item: &Item) -> Result<()> {
        self.check_variant_change(name, item)?;
        self.ensure_rule_exists(item)?;
        self.repository.update_item(name, item)?;
        self.cache.invalidate();
        if name != item.name {
            self.memo.clear();
        }
        Ok(())
    }

    /// Remove an item with its edges and assignments
    pub fn remove_item(&self, name: &str) -> Result<()> {
        self.repository.remove_item(name)?;
        self.cache.invalidate();
        self.memo.clear();
        Ok(())
    }

    fn check_variant_change(&self, name: &str, item: &Item) -> Result<()> {
        let existing = self.require_item(name)?;
        if existing.item_type == item.item_type {
            return Ok(());
        }

        for child in self.repository.find_children(name)? {
            if !item.item_type.can_contain(child.item_type) {
                debug!("Rejected turning '{}' into a {}: child role '{}'", name, item.item_type, child.name);
                return Err(RbacError::PermissionContainsRole {
                    parent: item.name.clone(),
                    child: child.name,
                });
            }
        }

        for parent in self.repository.find_parents(name)? {
            let Some(parent_item) = self.repository.get_item(&parent)? else {
                continue;
            };
            if !parent_item.item_type.can_contain(item.item_type) {
                debug!("Rejected turning '{}' into a {}: parent permission '{}'", name, item.item_type, parent);
                return Err(RbacError::PermissionContainsRole {
                    parent,
                    child: item.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn ensure_rule_exists(&self, item: &Item) -> Result<()> {
        let Some(rule_name) = item.rule() else {
            return Ok(());
        };
        if self.get_rule(rule_name)?.is_none() {
            info!("Creating unbound rule '{}' for item '{}'", rule_name, item.name);
            self.add_rule(&Rule::new(rule_name, ""))?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Rules
    // ---------------------------------------------------------------

    /// Look up a rule by name (through the cache when loaded)
    pub fn get_rule(&self, name: &str) -> Result<Option<Rule>> {
        match self.cache.current() {
            Some(snapshot) => Ok(snapshot.rule(name).cloned()),
            None => self.repository.get_rule(name),
        }
    }

    pub fn get_rules(&self) -> Result<Vec<Rule>> {
        match self.cache.current() {
            Some(snapshot) => {
                let mut rules: Vec<Rule> = snapshot.rules().cloned().collect();
                rules.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(rules)
            }
            None => self.repository.get_rules(),
        }
    }

    pub fn add_rule(&self, rule: &Rule) -> Result<()> {
        self.repository.add_rule(rule)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Replace (and possibly rename) the rule stored under `name`
    pub fn update_rule(&self, name: &str, rule: &Rule) -> Result<()> {
        self.repository.update_rule(name, rule)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Remove a rule; items referencing it become ungated
    pub fn remove_rule(&self, name: &str) -> Result<()> {
        self.repository.remove_rule(name)?;
        self.cache.invalidate();
        Ok(())
    }

    // ---------------------------------------------------------------
    // Bulk removal
    // ---------------------------------------------------------------

    /// Remove every item, edge, rule and assignment
    pub fn remove_all(&self) -> Result<()> {
        self.repository.remove_all()?;
        self.cache.invalidate();
        self.memo.clear();
        Ok(())
    }

    /// Remove every role with its edges and assignments
    pub fn remove_all_roles(&self) -> Result<()> {
        self.remove_all_items(ItemType::Role)
    }

    /// Remove every permission with its edges and assignments
    pub fn remove_all_permissions(&self) -> Result<()> {
        self.remove_all_items(ItemType::Permission)
    }

    fn remove_all_items(&self, item_type: ItemType) -> Result<()> {
        self.repository.remove_items_by_type(item_type)?;
        self.cache.invalidate();
        self.memo.clear();
        Ok(())
    }

    /// Remove every rule; all items become ungated
    pub fn remove_all_rules(&self) -> Result<()> {
        self.repository.remove_all_rules()?;
        self.cache.invalidate();
        Ok(())
    }

    /// Resolve an item that must exist
    fn require_item(&self, name: &str) -> Result<Item> {
        self.repository
            .get_item(name)?
            .ok_or_else(|| RbacError::ItemNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for RbacManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacManager")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("cache_loaded", &self.cache.is_loaded())
            .finish()
    }
}
