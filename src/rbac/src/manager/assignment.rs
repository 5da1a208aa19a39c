//! User assignment operations

use super::RbacManager;
use crate::assignments::{AssignmentMap, MemoStats};
use crate::error::{RbacError, Result};
use crate::types::{merge_permissions, Assignment, Item, ItemType, UserId};
use std::sync::Arc;
use tracing::debug;

impl RbacManager {
    /// Grant `item_name` directly to `user_id`
    pub fn assign(&self, item_name: &str, user_id: &UserId) -> Result<Assignment> {
        if item_name.is_empty() {
            return Err(RbacError::InvalidInput("item name must not be empty".to_string()));
        }

        let assignment = Assignment::new(user_id.clone(), item_name);
        self.repository.assign(&assignment)?;
        self.memo.invalidate(user_id);

        debug!("Assigned '{}' to user {}", item_name, user_id);
        Ok(assignment)
    }

    /// Remove one direct grant; a missing assignment is a no-op
    pub fn revoke(&self, item_name: &str, user_id: &UserId) -> Result<()> {
        self.repository.remove_assignment(user_id, item_name)?;
        self.memo.invalidate(user_id);
        Ok(())
    }

    /// Remove every direct grant held by `user_id`
    pub fn revoke_all(&self, user_id: &UserId) -> Result<()> {
        self.repository.remove_all_assignments_by_user(user_id)?;
        self.memo.invalidate(user_id);
        Ok(())
    }

    /// Remove every assignment of every user
    pub fn remove_all_assignments(&self) -> Result<()> {
        self.repository.remove_all_assignments()?;
        self.memo.clear();
        Ok(())
    }

    pub fn get_assignment(&self, item_name: &str, user_id: &UserId) -> Result<Option<Assignment>> {
        self.repository.get_assignment(user_id, item_name)
    }

    /// Direct assignments of `user_id`, keyed by item name
    pub fn get_assignments(&self, user_id: &UserId) -> Result<AssignmentMap> {
        Ok(self.load_assignments(user_id)?.as_ref().clone())
    }

    /// Roles directly assigned to `user_id`
    pub fn get_roles_by_user(&self, user_id: &UserId) -> Result<Vec<Item>> {
        self.repository.find_items_by_user(user_id, ItemType::Role)
    }

    /// Direct permissions of `user_id` plus those inherited through any assigned item
    pub fn get_permissions_by_user(&self, user_id: &UserId) -> Result<Vec<Item>> {
        let direct = self.repository.find_items_by_user(user_id, ItemType::Permission)?;

        let assignments = self.repository.get_assignments(user_id)?;
        let names = self.descendants(assignments.iter().map(|a| a.item_name.as_str()))?;
        let inherited = self.items_of_type(ItemType::Permission, names)?;

        Ok(merge_permissions(direct, inherited))
    }

    /// Users holding a direct assignment of `item_name`
    pub fn get_user_ids_by_role(&self, item_name: &str) -> Result<Vec<UserId>> {
        Ok(self
            .repository
            .get_assignments_by_item(item_name)?
            .into_iter()
            .map(|assignment| assignment.user_id)
            .collect())
    }

    pub fn memo_stats(&self) -> MemoStats {
        self.memo.stats()
    }

    pub(super) fn load_assignments(&self, user_id: &UserId) -> Result<Arc<AssignmentMap>> {
        self.memo.get_or_load(user_id, || {
            Ok(self
                .repository
                .get_assignments(user_id)?
                .into_iter()
                .map(|assignment| (assignment.item_name.clone(), assignment))
                .collect())
        })
    }
}
