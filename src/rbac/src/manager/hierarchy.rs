//! Hierarchy mutation and descendant queries

use super::RbacManager;
use crate::error::{RbacError, Result};
use crate::types::{Item, ItemChild, ItemType};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

impl RbacManager {
    /// Whether `parent -> child` could be added without closing a loop
    ///
    /// Fails closed: a repository error while walking the hierarchy reports
    /// `false`.
    pub fn can_add_child(&self, parent: &str, child: &str) -> bool {
        match self.detect_loop(parent, child) {
            Ok(has_loop) => !has_loop,
            Err(e) => {
                warn!("Loop detection for '{}' -> '{}' failed: {}", parent, child, e);
                false
            }
        }
    }

    /// Add the edge `parent -> child`
    ///
    /// Checks, in order: self-loop, both items exist, a permission may not
    /// contain a role, and `parent` must not already be reachable below
    /// `child`. The hierarchy is unchanged on any error.
    pub fn add_child(&self, parent: &str, child: &str) -> Result<()> {
        if parent == child {
            debug!("Rejected self-loop on '{}'", parent);
            return Err(RbacError::SelfLoop(parent.to_string()));
        }

        let parent_item = self.require_item(parent)?;
        let child_item = self.require_item(child)?;

        if !parent_item.item_type.can_contain(child_item.item_type) {
            debug!("Rejected role '{}' under permission '{}'", child, parent);
            return Err(RbacError::PermissionContainsRole {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        if self.detect_loop(parent, child)? {
            debug!("Rejected '{}' -> '{}': loop detected", parent, child);
            return Err(RbacError::CycleDetected {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }

        self.repository.add_item_child(&ItemChild::new(parent, child))?;
        self.cache.invalidate();
        Ok(())
    }

    /// Remove the edge `parent -> child`; a missing edge is a no-op
    pub fn remove_child(&self, parent: &str, child: &str) -> Result<()> {
        self.repository.remove_child(parent, child)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Remove every outgoing edge of `parent`
    pub fn remove_children(&self, parent: &str) -> Result<()> {
        self.repository.remove_children(parent)?;
        self.cache.invalidate();
        Ok(())
    }

    pub fn has_child(&self, parent: &str, child: &str) -> Result<bool> {
        self.repository.has_child(parent, child)
    }

    /// Direct children of `name`
    pub fn get_children(&self, name: &str) -> Result<Vec<Item>> {
        self.repository.find_children(name)
    }

    /// The role itself followed by every role reachable below it
    ///
    /// Empty when `role` is unknown or is a permission.
    pub fn get_child_roles(&self, role: &str) -> Result<Vec<Item>> {
        let Some(root) = self.repository.get_item(role)?.filter(Item::is_role) else {
            debug!("Role '{}' not found", role);
            return Ok(Vec::new());
        };

        let names = self.descendants([role])?;
        let mut roles = vec![root];
        roles.extend(self.items_of_type(ItemType::Role, names)?);
        Ok(roles)
    }

    /// Every permission reachable below `role`
    pub fn get_permissions_by_role(&self, role: &str) -> Result<Vec<Item>> {
        let names = self.descendants([role])?;
        self.items_of_type(ItemType::Permission, names)
    }

    /// True when `parent` is `child` or lies in the subtree below `child`
    fn detect_loop(&self, parent: &str, child: &str) -> Result<bool> {
        let mut stack = vec![child.to_string()];
        let mut visited = HashSet::new();

        while let Some(name) = stack.pop() {
            if name == parent {
                return Ok(true);
            }
            if !visited.insert(name.clone()) {
                continue;
            }
            for item in self.repository.find_children(&name)? {
                if !visited.contains(&item.name) {
                    stack.push(item.name);
                }
            }
        }

        Ok(false)
    }

    /// Names strictly below the given roots, from a single edge scan
    pub(super) fn descendants<'a, I>(&self, roots: I) -> Result<HashSet<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for edge in self.repository.find_all_children()? {
            children.entry(edge.parent).or_default().push(edge.child);
        }

        let mut found = HashSet::new();
        let mut stack: Vec<String> = roots.into_iter().map(str::to_string).collect();
        while let Some(name) = stack.pop() {
            for child in children.get(&name).into_iter().flatten() {
                if found.insert(child.clone()) {
                    stack.push(child.clone());
                }
            }
        }

        Ok(found)
    }

    pub(super) fn items_of_type(
        &self,
        item_type: ItemType,
        names: HashSet<String>,
    ) -> Result<Vec<Item>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        self.repository.get_items_by_names(item_type, &names)
    }
}
