//! Shared fixtures for integration tests

#![allow(dead_code)]

use cretoai_rbac::{
    Assignment, FnExecutor, InMemoryRepository, Item, ItemChild, ItemType, ManagerConfig, Params,
    RbacError, RbacManager, Repository, Result, Rule, RuleRegistry, UserId,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Repository that fails selected operations on demand
#[derive(Default)]
pub struct FlakyRepository {
    inner: InMemoryRepository,
    failing: Mutex<HashSet<&'static str>>,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` return a storage error until [`heal`](Self::heal)
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().insert(operation);
    }

    pub fn heal(&self) {
        self.failing.lock().clear();
    }

    fn gate(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().contains(operation) {
            Err(RbacError::Storage(format!("{} unavailable", operation)))
        } else {
            Ok(())
        }
    }
}

impl Repository for FlakyRepository {
    fn get_item(&self, name: &str) -> Result<Option<Item>> {
        self.gate("get_item")?;
        self.inner.get_item(name)
    }

    fn get_items(&self, item_type: ItemType) -> Result<Vec<Item>> {
        self.gate("get_items")?;
        self.inner.get_items(item_type)
    }

    fn get_items_by_names(&self, item_type: ItemType, names: &[String]) -> Result<Vec<Item>> {
        self.gate("get_items_by_names")?;
        self.inner.get_items_by_names(item_type, names)
    }

    fn find_all_items(&self) -> Result<Vec<Item>> {
        self.gate("find_all_items")?;
        self.inner.find_all_items()
    }

    fn add_item(&self, item: &Item) -> Result<()> {
        self.gate("add_item")?;
        self.inner.add_item(item)
    }

    fn update_item(&self, name: &str, item: &Item) -> Result<()> {
        self.gate("update_item")?;
        self.inner.update_item(name, item)
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        self.gate("remove_item")?;
        self.inner.remove_item(name)
    }

    fn remove_items_by_type(&self, item_type: ItemType) -> Result<()> {
        self.gate("remove_items_by_type")?;
        self.inner.remove_items_by_type(item_type)
    }

    fn get_rule(&self, name: &str) -> Result<Option<Rule>> {
        self.gate("get_rule")?;
        self.inner.get_rule(name)
    }

    fn get_rules(&self) -> Result<Vec<Rule>> {
        self.gate("get_rules")?;
        self.inner.get_rules()
    }

    fn add_rule(&self, rule: &Rule) -> Result<()> {
        self.gate("add_rule")?;
        self.inner.add_rule(rule)
    }

    fn update_rule(&self, name: &str, rule: &Rule) -> Result<()> {
        self.gate("update_rule")?;
        self.inner.update_rule(name, rule)
    }

    fn remove_rule(&self, name: &str) -> Result<()> {
        self.gate("remove_rule")?;
        self.inner.remove_rule(name)
    }

    fn remove_all_rules(&self) -> Result<()> {
        self.gate("remove_all_rules")?;
        self.inner.remove_all_rules()
    }

    fn add_item_child(&self, edge: &ItemChild) -> Result<()> {
        self.gate("add_item_child")?;
        self.inner.add_item_child(edge)
    }

    fn remove_child(&self, parent: &str, child: &str) -> Result<()> {
        self.gate("remove_child")?;
        self.inner.remove_child(parent, child)
    }

    fn remove_children(&self, parent: &str) -> Result<()> {
        self.gate("remove_children")?;
        self.inner.remove_children(parent)
    }

    fn has_child(&self, parent: &str, child: &str) -> Result<bool> {
        self.gate("has_child")?;
        self.inner.has_child(parent, child)
    }

    fn find_children(&self, name: &str) -> Result<Vec<Item>> {
        self.gate("find_children")?;
        self.inner.find_children(name)
    }

    fn find_parents(&self, name: &str) -> Result<Vec<String>> {
        self.gate("find_parents")?;
        self.inner.find_parents(name)
    }

    fn find_all_children(&self) -> Result<Vec<ItemChild>> {
        self.gate("find_all_children")?;
        self.inner.find_all_children()
    }

    fn assign(&self, assignment: &Assignment) -> Result<()> {
        self.gate("assign")?;
        self.inner.assign(assignment)
    }

    fn remove_assignment(&self, user_id: &UserId, item_name: &str) -> Result<()> {
        self.gate("remove_assignment")?;
        self.inner.remove_assignment(user_id, item_name)
    }

    fn remove_all_assignments_by_user(&self, user_id: &UserId) -> Result<()> {
        self.gate("remove_all_assignments_by_user")?;
        self.inner.remove_all_assignments_by_user(user_id)
    }

    fn remove_all_assignments(&self) -> Result<()> {
        self.gate("remove_all_assignments")?;
        self.inner.remove_all_assignments()
    }

    fn get_assignment(&self, user_id: &UserId, item_name: &str) -> Result<Option<Assignment>> {
        self.gate("get_assignment")?;
        self.inner.get_assignment(user_id, item_name)
    }

    fn get_assignments(&self, user_id: &UserId) -> Result<Vec<Assignment>> {
        self.gate("get_assignments")?;
        self.inner.get_assignments(user_id)
    }

    fn get_assignments_by_item(&self, item_name: &str) -> Result<Vec<Assignment>> {
        self.gate("get_assignments_by_item")?;
        self.inner.get_assignments_by_item(item_name)
    }

    fn find_items_by_user(&self, user_id: &UserId, item_type: ItemType) -> Result<Vec<Item>> {
        self.gate("find_items_by_user")?;
        self.inner.find_items_by_user(user_id, item_type)
    }

    fn remove_all(&self) -> Result<()> {
        self.gate("remove_all")?;
        self.inner.remove_all()
    }
}

/// Both cache modes, for tests that must hold either way
pub fn configs() -> Vec<ManagerConfig> {
    vec![
        ManagerConfig::default(),
        ManagerConfig {
            enable_cache: false,
            ..Default::default()
        },
    ]
}

/// Registry with `business_hours` (always closed) and `owner` (params["owner"] == user)
pub fn registry() -> RuleRegistry {
    let registry = RuleRegistry::new();
    registry.register(FnExecutor::new(
        "business_hours",
        |_: &UserId, _: &Item, _: &Params| false,
    ));
    registry.register(FnExecutor::new(
        "owner",
        |user: &UserId, _: &Item, params: &Params| {
            params.get("owner").and_then(|v| v.as_str()) == Some(user.to_string().as_str())
        },
    ));
    registry
}

pub fn manager_with(config: ManagerConfig) -> RbacManager {
    RbacManager::with_config(Arc::new(InMemoryRepository::new()), registry(), config)
        .expect("valid config")
}

/// admin -> editor -> viewer(permission)
pub fn publishing_manager(config: ManagerConfig) -> RbacManager {
    let manager = manager_with(config);
    manager.add_item(&Item::role("admin")).unwrap();
    manager.add_item(&Item::role("editor")).unwrap();
    manager.add_item(&Item::permission("viewer")).unwrap();
    manager.add_item(&Item::permission("unrelated")).unwrap();
    manager.add_child("admin", "editor").unwrap();
    manager.add_child("editor", "viewer").unwrap();
    manager
}

/// Route engine logs to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn no_params() -> Params {
    Params::new()
}
