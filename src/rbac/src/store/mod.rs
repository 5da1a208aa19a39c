//! Repository abstraction for items, rules, edges and assignments
//!
//! The engine never owns persistent state. Everything is read from and written
//! through a [`Repository`]; "not found" is reported as `Ok(None)` (or an empty
//! list), never as an error, so that callers can tell it apart from storage
//! failures.

mod memory;

pub use memory::InMemoryRepository;

use crate::error::Result;
use crate::types::{Assignment, Item, ItemChild, ItemType, Rule, UserId};

/// Storage backend consumed by [`RbacManager`](crate::manager::RbacManager)
///
/// Implementations are responsible for referential cleanup: removing an item
/// removes its edges and assignments, renaming an item or rule renames every
/// reference to it, and removing a rule detaches it from the items using it.
pub trait Repository: Send + Sync {
    // Items

    /// Get an item by name
    fn get_item(&self, name: &str) -> Result<Option<Item>>;

    /// List all items of one variant
    fn get_items(&self, item_type: ItemType) -> Result<Vec<Item>>;

    /// List the items of one variant whose names are in `names`
    fn get_items_by_names(&self, item_type: ItemType, names: &[String]) -> Result<Vec<Item>>;

    /// List every item
    fn find_all_items(&self) -> Result<Vec<Item>>;

    /// Store a new item; names are unique across variants
    fn add_item(&self, item: &Item) -> Result<()>;

    /// Replace the item stored under `name` (possibly renaming it)
    fn update_item(&self, name: &str, item: &Item) -> Result<()>;

    /// Remove an item together with its edges and assignments
    fn remove_item(&self, name: &str) -> Result<()>;

    /// Remove every item of one variant together with its edges and assignments
    fn remove_items_by_type(&self, item_type: ItemType) -> Result<()>;

    // Rules

    fn get_rule(&self, name: &str) -> Result<Option<Rule>>;

    fn get_rules(&self) -> Result<Vec<Rule>>;

    fn add_rule(&self, rule: &Rule) -> Result<()>;

    /// Replace the rule stored under `name` (possibly renaming it)
    fn update_rule(&self, name: &str, rule: &Rule) -> Result<()>;

    /// Remove a rule and clear it from every item referencing it
    fn remove_rule(&self, name: &str) -> Result<()>;

    fn remove_all_rules(&self) -> Result<()>;

    // Edges

    fn add_item_child(&self, edge: &ItemChild) -> Result<()>;

    /// Remove one edge; a missing edge is not an error
    fn remove_child(&self, parent: &str, child: &str) -> Result<()>;

    /// Remove every outgoing edge of `parent`
    fn remove_children(&self, parent: &str) -> Result<()>;

    fn has_child(&self, parent: &str, child: &str) -> Result<bool>;

    /// Direct children of `name`
    fn find_children(&self, name: &str) -> Result<Vec<Item>>;

    /// Names of the direct parents of `name`
    fn find_parents(&self, name: &str) -> Result<Vec<String>>;

    /// Every edge in the hierarchy
    fn find_all_children(&self) -> Result<Vec<ItemChild>>;

    // Assignments

    fn assign(&self, assignment: &Assignment) -> Result<()>;

    /// Remove one assignment; a missing assignment is not an error
    fn remove_assignment(&self, user_id: &UserId, item_name: &str) -> Result<()>;

    fn remove_all_assignments_by_user(&self, user_id: &UserId) -> Result<()>;

    fn remove_all_assignments(&self) -> Result<()>;

    fn get_assignment(&self, user_id: &UserId, item_name: &str) -> Result<Option<Assignment>>;

    fn get_assignments(&self, user_id: &UserId) -> Result<Vec<Assignment>>;

    fn get_assignments_by_item(&self, item_name: &str) -> Result<Vec<Assignment>>;

    /// Items of one variant directly assigned to `user_id`
    fn find_items_by_user(&self, user_id: &UserId, item_type: ItemType) -> Result<Vec<Item>>;

    // Bulk

    /// Remove every item, edge, rule and assignment
    fn remove_all(&self) -> Result<()>;
}
