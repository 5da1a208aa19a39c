//! Error types for the RBAC engine

use thiserror::Error;

/// RBAC engine errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RbacError {
    /// An item was proposed as its own child
    #[error("Cannot add '{0}' as a child of itself")]
    SelfLoop(String),

    /// A permission was proposed as the parent of a role
    #[error("Cannot add role '{child}' as a child of permission '{parent}'")]
    PermissionContainsRole { parent: String, child: String },

    /// The proposed edge would close a loop in the hierarchy
    #[error("Cannot add '{child}' as a child of '{parent}': a loop has been detected")]
    CycleDetected { parent: String, child: String },

    /// Item not found
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Rule not found
    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// Unique key already taken
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Repository failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl RbacError {
    /// True for the errors `add_child` raises while validating an edge
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SelfLoop(_) | Self::PermissionContainsRole { .. } | Self::CycleDetected { .. }
        )
    }
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(RbacError::SelfLoop("admin".to_string()).is_validation());
        assert!(RbacError::CycleDetected {
            parent: "a".to_string(),
            child: "b".to_string(),
        }
        .is_validation());
        assert!(!RbacError::Storage("down".to_string()).is_validation());
        assert!(!RbacError::ItemNotFound("x".to_string()).is_validation());
    }

    #[test]
    fn test_cycle_message_names_both_items() {
        let err = RbacError::CycleDetected {
            parent: "viewer".to_string(),
            child: "admin".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("viewer") && msg.contains("admin"));
        assert!(msg.contains("loop"));
    }
}
