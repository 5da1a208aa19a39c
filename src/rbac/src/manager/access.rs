//! Access resolution and rule evaluation

use super::RbacManager;
use crate::assignments::AssignmentMap;
use crate::config::RefreshPolicy;
use crate::graph::{find_grant, GraphSnapshot, GraphSource, RepositorySource};
use crate::types::{Item, Params, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

impl RbacManager {
    /// Decide whether `user_id` holds `permission`
    ///
    /// Walks upward from `permission` through its parents. Every visited item's
    /// rule must pass; access is granted at the first item the user holds,
    /// either by direct assignment or as a default role. Unknown items,
    /// rejected rules and repository failures all deny.
    pub fn check_access(&self, user_id: &UserId, permission: &str, params: &Params) -> bool {
        let assignments = match self.load_assignments(user_id) {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!("Failed to load assignments for user {}: {}", user_id, e);
                Arc::new(AssignmentMap::new())
            }
        };
        let defaults = self.default_roles();

        if assignments.is_empty() && defaults.is_empty() {
            debug!("User {} has no assignments", user_id);
            return false;
        }

        let is_granted =
            |name: &str| assignments.contains_key(name) || defaults.contains(name);

        let granted = match self.snapshot_for_check() {
            Some(snapshot) => self.resolve(snapshot.as_ref(), user_id, permission, params, is_granted),
            None => {
                let source = RepositorySource::new(self.repository.as_ref());
                self.resolve(&source, user_id, permission, params, is_granted)
            }
        };

        debug!(
            "check_access(user={}, permission='{}') = {}",
            user_id, permission, granted
        );
        granted
    }

    /// Replace the set of roles every user holds implicitly
    pub fn set_default_roles<I, S>(&self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: HashSet<String> = roles.into_iter().map(Into::into).collect();
        debug!("Default roles set to {:?}", roles);
        *self.default_roles.write() = Arc::new(roles);
    }

    pub fn default_roles(&self) -> Arc<HashSet<String>> {
        Arc::clone(&self.default_roles.read())
    }

    fn snapshot_for_check(&self) -> Option<Arc<GraphSnapshot>> {
        if !self.cache.is_enabled() {
            return None;
        }
        match self.config.refresh_policy {
            RefreshPolicy::OnInvalidate => self.cache.ensure_loaded(self.repository.as_ref()),
            RefreshPolicy::EveryCheck => match self.cache.refresh(self.repository.as_ref()) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Failed to reload item graph cache: {}", e);
                    None
                }
            },
        }
    }

    fn resolve<S, G>(
        &self,
        source: &S,
        user_id: &UserId,
        permission: &str,
        params: &Params,
        is_granted: G,
    ) -> bool
    where
        S: GraphSource + ?Sized,
        G: Fn(&str) -> bool,
    {
        find_grant(
            source,
            permission,
            self.config.max_traversal_depth,
            |item| self.execute_rule(source, user_id, item, params),
            is_granted,
        )
    }

    /// Evaluate the rule gating `item`; an ungated item passes
    fn execute_rule<S>(&self, source: &S, user_id: &UserId, item: &Item, params: &Params) -> bool
    where
        S: GraphSource + ?Sized,
    {
        let Some(rule_name) = item.rule() else {
            return true;
        };

        let Some(rule) = source.rule(rule_name) else {
            warn!("Rule '{}' of item '{}' not found", rule_name, item.name);
            return false;
        };

        let Some(executor) = self.registry.resolve(&rule.executor_name) else {
            warn!(
                "No executor '{}' registered for rule '{}'",
                rule.executor_name, rule_name
            );
            return false;
        };

        executor.execute(user_id, item, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ManagerConfig;
    use crate::rules::{FnExecutor, RuleRegistry};
    use crate::store::InMemoryRepository;
    use crate::types::Rule;

    fn manager(enable_cache: bool) -> RbacManager {
        let registry = RuleRegistry::new();
        registry.register(FnExecutor::new("deny", |_: &UserId, _: &Item, _: &Params| false));
        registry.register(FnExecutor::new("flag", |_: &UserId, _: &Item, params: &Params| {
            params.get("allow").and_then(|v| v.as_bool()).unwrap_or(false)
        }));

        let config = ManagerConfig {
            enable_cache,
            ..Default::default()
        };
        let mgr =
            RbacManager::with_config(Arc::new(InMemoryRepository::new()), registry, config).unwrap();

        mgr.add_rule(&Rule::new("closed", "deny")).unwrap();
        mgr.add_rule(&Rule::new("flagged", "flag")).unwrap();
        mgr.add_item(&Item::role("admin")).unwrap();
        mgr.add_item(&Item::role("editor")).unwrap();
        mgr.add_item(&Item::permission("viewer")).unwrap();
        mgr.add_child("admin", "editor").unwrap();
        mgr.add_child("editor", "viewer").unwrap();
        mgr
    }

    #[test]
    fn test_inherited_access_both_modes() {
        for cached in [true, false] {
            let mgr = manager(cached);
            let user = UserId::Int(1);
            mgr.assign("admin", &user).unwrap();

            assert!(mgr.check_access(&user, "viewer", &Params::new()));
            assert!(!mgr.check_access(&user, "unrelated", &Params::new()));
            assert_eq!(mgr.cache_loaded(), cached);
        }
    }

    #[test]
    fn test_rule_uses_params() {
        let mgr = manager(true);
        let user = UserId::Int(1);
        mgr.add_item(&Item::permission("export").with_rule("flagged")).unwrap();
        mgr.assign("export", &user).unwrap();

        let mut params = Params::new();
        assert!(!mgr.check_access(&user, "export", &params));

        params.insert("allow".to_string(), serde_json::json!(true));
        assert!(mgr.check_access(&user, "export", &params));
    }

    #[test]
    fn test_unbound_rule_denies() {
        let mgr = manager(false);
        let user = UserId::Int(1);
        mgr.add_item(&Item::permission("audit").with_rule("not_bound")).unwrap();
        mgr.assign("audit", &user).unwrap();

        assert!(!mgr.check_access(&user, "audit", &Params::new()));
    }

    #[test]
    fn test_default_roles_replace() {
        let mgr = manager(true);
        let user = UserId::from("guest");

        mgr.set_default_roles(["editor"]);
        assert!(mgr.check_access(&user, "viewer", &Params::new()));

        mgr.set_default_roles(Vec::<String>::new());
        assert!(mgr.default_roles().is_empty());
        assert!(!mgr.check_access(&user, "viewer", &Params::new()));
    }

    #[test]
    fn test_rejecting_rule_blocks_ancestors() {
        let mgr = manager(true);
        let user = UserId::Int(1);
        mgr.assign("admin", &user).unwrap();
        mgr.update_item("editor", &Item::role("editor").with_rule("closed"))
            .unwrap();

        assert!(!mgr.check_access(&user, "viewer", &Params::new()));
    }
}
