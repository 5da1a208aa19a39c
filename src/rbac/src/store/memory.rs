//! In-memory repository implementation

use super::Repository;
use crate::error::{RbacError, Result};
use crate::types::{Assignment, Item, ItemChild, ItemType, Rule, UserId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<String, Item>,
    rules: BTreeMap<String, Rule>,
    edges: BTreeSet<ItemChild>,
    assignments: BTreeMap<(UserId, String), Assignment>,
}

impl State {
    fn detach_items(&mut self, names: &BTreeSet<String>) {
        self.edges
            .retain(|edge| !names.contains(&edge.parent) && !names.contains(&edge.child));
        self.assignments
            .retain(|(_, item_name), _| !names.contains(item_name));
        self.items.retain(|name, _| !names.contains(name));
    }
}

/// In-memory repository
///
/// Keeps every relation in ordered maps so listings are deterministic.
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for InMemoryRepository {
    fn get_item(&self, name: &str) -> Result<Option<Item>> {
        Ok(self.state.read().items.get(name).cloned())
    }

    fn get_items(&self, item_type: ItemType) -> Result<Vec<Item>> {
        let state = self.state.read();
        Ok(state
            .items
            .values()
            .filter(|item| item.item_type == item_type)
            .cloned()
            .collect())
    }

    fn get_items_by_names(&self, item_type: ItemType, names: &[String]) -> Result<Vec<Item>> {
        let state = self.state.read();
        let wanted: BTreeSet<&str> = names.iter().map(String::as_str).collect();
        Ok(state
            .items
            .values()
            .filter(|item| item.item_type == item_type && wanted.contains(item.name.as_str()))
            .cloned()
            .collect())
    }

    fn find_all_items(&self) -> Result<Vec<Item>> {
        Ok(self.state.read().items.values().cloned().collect())
    }

    fn add_item(&self, item: &Item) -> Result<()> {
        if item.name.is_empty() {
            return Err(RbacError::InvalidInput("Item name cannot be empty".to_string()));
        }

        let mut state = self.state.write();
        if state.items.contains_key(&item.name) {
            return Err(RbacError::AlreadyExists(item.name.clone()));
        }
        state.items.insert(item.name.clone(), item.clone());
        Ok(())
    }

    fn update_item(&self, name: &str, item: &Item) -> Result<()> {
        if item.name.is_empty() {
            return Err(RbacError::InvalidInput("Item name cannot be empty".to_string()));
        }

        let mut state = self.state.write();
        let existing = state
            .items
            .get(name)
            .cloned()
            .ok_or_else(|| RbacError::ItemNotFound(name.to_string()))?;

        if name != item.name && state.items.contains_key(&item.name) {
            return Err(RbacError::AlreadyExists(item.name.clone()));
        }

        if existing.item_type != item.item_type {
            for edge in state.edges.iter() {
                let (parent_type, child_type) = if edge.parent == name {
                    match state.items.get(&edge.child) {
                        Some(child) => (item.item_type, child.item_type),
                        None => continue,
                    }
                } else if edge.child == name {
                    match state.items.get(&edge.parent) {
                        Some(parent) => (parent.item_type, item.item_type),
                        None => continue,
                    }
                } else {
                    continue;
                };
                if !parent_type.can_contain(child_type) {
                    return Err(RbacError::PermissionContainsRole {
                        parent: edge.parent.clone(),
                        child: edge.child.clone(),
                    });
                }
            }
        }

        let mut updated = item.clone();
        updated.created_at = existing.created_at;

        if name != item.name {
            let edges: Vec<ItemChild> = std::mem::take(&mut state.edges).into_iter().collect();
            state.edges = edges
                .into_iter()
                .map(|mut edge| {
                    if edge.parent == name {
                        edge.parent = item.name.clone();
                    }
                    if edge.child == name {
                        edge.child = item.name.clone();
                    }
                    edge
                })
                .collect();

            let renamed: Vec<(UserId, String)> = state
                .assignments
                .keys()
                .filter(|(_, item_name)| item_name == name)
                .cloned()
                .collect();
            for key in renamed {
                if let Some(mut assignment) = state.assignments.remove(&key) {
                    assignment.item_name = item.name.clone();
                    state
                        .assignments
                        .insert((key.0, item.name.clone()), assignment);
                }
            }

            state.items.remove(name);
        }

        state.items.insert(updated.name.clone(), updated);
        Ok(())
    }

    fn remove_item(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        let names = BTreeSet::from([name.to_string()]);
        state.detach_items(&names);
        Ok(())
    }

    fn remove_items_by_type(&self, item_type: ItemType) -> Result<()> {
        let mut state = self.state.write();
        let names: BTreeSet<String> = state
            .items
            .values()
            .filter(|item| item.item_type == item_type)
            .map(|item| item.name.clone())
            .collect();
        state.detach_items(&names);
        Ok(())
    }

    fn get_rule(&self, name: &str) -> Result<Option<Rule>> {
        Ok(self.state.read().rules.get(name).cloned())
    }

    fn get_rules(&self) -> Result<Vec<Rule>> {
        Ok(self.state.read().rules.values().cloned().collect())
    }

    fn add_rule(&self, rule: &Rule) -> Result<()> {
        if rule.name.is_empty() {
            return Err(RbacError::InvalidInput("Rule name cannot be empty".to_string()));
        }

        let mut state = self.state.write();
        if state.rules.contains_key(&rule.name) {
            return Err(RbacError::AlreadyExists(rule.name.clone()));
        }
        state.rules.insert(rule.name.clone(), rule.clone());
        Ok(())
    }

    fn update_rule(&self, name: &str, rule: &Rule) -> Result<()> {
        let mut state = self.state.write();
        let existing = state
            .rules
            .get(name)
            .cloned()
            .ok_or_else(|| RbacError::RuleNotFound(name.to_string()))?;

        if name != rule.name {
            if state.rules.contains_key(&rule.name) {
                return Err(RbacError::AlreadyExists(rule.name.clone()));
            }
            for item in state.items.values_mut() {
                if item.rule_name.as_deref() == Some(name) {
                    item.rule_name = Some(rule.name.clone());
                }
            }
            state.rules.remove(name);
        }

        let mut updated = rule.clone();
        updated.created_at = existing.created_at;
        state.rules.insert(updated.name.clone(), updated);
        Ok(())
    }

    fn remove_rule(&self, name: &str) -> Result<()> {
        let mut state = self.state.write();
        for item in state.items.values_mut() {
            if item.rule_name.as_deref() == Some(name) {
                item.rule_name = None;
            }
        }
        state.rules.remove(name);
        Ok(())
    }

    fn remove_all_rules(&self) -> Result<()> {
        let mut state = self.state.write();
        for item in state.items.values_mut() {
            item.rule_name = None;
        }
        state.rules.clear();
        Ok(())
    }

    fn add_item_child(&self, edge: &ItemChild) -> Result<()> {
        let mut state = self.state.write();
        for name in [&edge.parent, &edge.child] {
            if !state.items.contains_key(name) {
                return Err(RbacError::ItemNotFound(name.clone()));
            }
        }
        if !state.edges.insert(edge.clone()) {
            return Err(RbacError::AlreadyExists(format!(
                "{} -> {}",
                edge.parent, edge.child
            )));
        }
        Ok(())
    }

    fn remove_child(&self, parent: &str, child: &str) -> Result<()> {
        self.state
            .write()
            .edges
            .remove(&ItemChild::new(parent, child));
        Ok(())
    }

    fn remove_children(&self, parent: &str) -> Result<()> {
        self.state.write().edges.retain(|edge| edge.parent != parent);
        Ok(())
    }

    fn has_child(&self, parent: &str, child: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .edges
            .contains(&ItemChild::new(parent, child)))
    }

    fn find_children(&self, name: &str) -> Result<Vec<Item>> {
        let state = self.state.read();
        Ok(state
            .edges
            .iter()
            .filter(|edge| edge.parent == name)
            .filter_map(|edge| state.items.get(&edge.child).cloned())
            .collect())
    }

    fn find_parents(&self, name: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        Ok(state
            .edges
            .iter()
            .filter(|edge| edge.child == name)
            .map(|edge| edge.parent.clone())
            .collect())
    }

    fn find_all_children(&self) -> Result<Vec<ItemChild>> {
        Ok(self.state.read().edges.iter().cloned().collect())
    }

    fn assign(&self, assignment: &Assignment) -> Result<()> {
        let mut state = self.state.write();
        if !state.items.contains_key(&assignment.item_name) {
            return Err(RbacError::ItemNotFound(assignment.item_name.clone()));
        }

        let key = (assignment.user_id.clone(), assignment.item_name.clone());
        if state.assignments.contains_key(&key) {
            return Err(RbacError::AlreadyExists(format!(
                "{} assigned to {}",
                assignment.item_name, assignment.user_id
            )));
        }
        state.assignments.insert(key, assignment.clone());
        Ok(())
    }

    fn remove_assignment(&self, user_id: &UserId, item_name: &str) -> Result<()> {
        self.state
            .write()
            .assignments
            .remove(&(user_id.clone(), item_name.to_string()));
        Ok(())
    }

    fn remove_all_assignments_by_user(&self, user_id: &UserId) -> Result<()> {
        self.state
            .write()
            .assignments
            .retain(|(user, _), _| user != user_id);
        Ok(())
    }

    fn remove_all_assignments(&self) -> Result<()> {
        self.state.write().assignments.clear();
        Ok(())
    }

    fn get_assignment(&self, user_id: &UserId, item_name: &str) -> Result<Option<Assignment>> {
        Ok(self
            .state
            .read()
            .assignments
            .get(&(user_id.clone(), item_name.to_string()))
            .cloned())
    }

    fn get_assignments(&self, user_id: &UserId) -> Result<Vec<Assignment>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|(_, assignment)| assignment.clone())
            .collect())
    }

    fn get_assignments_by_item(&self, item_name: &str) -> Result<Vec<Assignment>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .values()
            .filter(|assignment| assignment.item_name == item_name)
            .cloned()
            .collect())
    }

    fn find_items_by_user(&self, user_id: &UserId, item_type: ItemType) -> Result<Vec<Item>> {
        let state = self.state.read();
        Ok(state
            .assignments
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .filter_map(|((_, item_name), _)| state.items.get(item_name))
            .filter(|item| item.item_type == item_type)
            .cloned()
            .collect())
    }

    fn remove_all(&self) -> Result<()> {
        let mut state = self.state.write();
        *state = State::default();
        Ok(())
    }
}
