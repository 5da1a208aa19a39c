//! Manager configuration

use crate::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When the item graph cache is rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Rebuild lazily on the first access check after a mutation
    #[default]
    OnInvalidate,
    /// Rebuild the entire graph before every access check
    EveryCheck,
}

/// Assignment memo bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Maximum number of users kept (least recently used are evicted)
    pub capacity: usize,

    /// Entry lifetime in seconds; `None` keeps entries until evicted or invalidated
    pub ttl_secs: Option<u64>,
}

impl MemoConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl_secs: Some(300),
        }
    }
}

/// RBAC manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Mirror the hierarchy in memory
    pub enable_cache: bool,

    /// Cache rebuild strategy
    pub refresh_policy: RefreshPolicy,

    /// Maximum parent hops walked by an access check
    pub max_traversal_depth: usize,

    /// Per-user assignment memo
    pub assignment_memo: MemoConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            refresh_policy: RefreshPolicy::OnInvalidate,
            max_traversal_depth: 256,
            assignment_memo: MemoConfig::default(),
        }
    }
}

impl ManagerConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)
            .map_err(|e| RbacError::InvalidInput(format!("Invalid manager config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_traversal_depth == 0 {
            return Err(RbacError::InvalidInput(
                "max_traversal_depth must be greater than zero".to_string(),
            ));
        }
        if self.assignment_memo.capacity == 0 {
            return Err(RbacError::InvalidInput(
                "assignment_memo.capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert!(config.enable_cache);
        assert_eq!(config.refresh_policy, RefreshPolicy::OnInvalidate);
        assert_eq!(config.assignment_memo.ttl(), Some(Duration::from_secs(300)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ManagerConfig::from_toml_str(
            r#"
            enable_cache = false
            refresh_policy = "every_check"

            [assignment_memo]
            capacity = 64
            "#,
        )
        .unwrap();

        assert!(!config.enable_cache);
        assert_eq!(config.refresh_policy, RefreshPolicy::EveryCheck);
        assert_eq!(config.max_traversal_depth, 256);
        assert_eq!(config.assignment_memo.capacity, 64);
        assert_eq!(config.assignment_memo.ttl_secs, Some(300));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = ManagerConfig::from_toml_str("max_traversal_depth = 0");
        assert!(matches!(result, Err(RbacError::InvalidInput(_))));

        let result = ManagerConfig::from_toml_str("refresh_policy = \"sometimes\"");
        assert!(matches!(result, Err(RbacError::InvalidInput(_))));
    }
}
