//! Core RBAC types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Call-scoped parameters handed to rule executors
pub type Params = HashMap<String, serde_json::Value>;

/// Opaque user identifier (numeric or string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// Numeric identifier (e.g., a database primary key)
    Int(i64),
    /// String identifier (e.g., "user:alice@example.com")
    Str(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::Int(id as i64)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Item variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Parent-capable item: may contain roles and permissions
    Role,
    /// Terminal capability: may only contain other permissions
    Permission,
}

impl ItemType {
    /// Whether an item of this variant may contain an item of `child` variant
    pub fn can_contain(self, child: ItemType) -> bool {
        !matches!((self, child), (ItemType::Permission, ItemType::Role))
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role => f.write_str("role"),
            Self::Permission => f.write_str("permission"),
        }
    }
}

/// A named node in the hierarchy: either a role or a permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Variant tag
    #[serde(rename = "type")]
    pub item_type: ItemType,

    /// Unique name across roles and permissions
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Rule gating this item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,

    /// Business hook name for the embedding application
    ///
    /// Stored and returned unchanged. Access checks never read it; rule
    /// evaluation goes through `rule_name` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create an item with the current timestamp
    pub fn new(item_type: ItemType, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            item_type,
            name: name.into(),
            description: String::new(),
            rule_name: None,
            executor_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a role
    pub fn role(name: impl Into<String>) -> Self {
        Self::new(ItemType::Role, name)
    }

    /// Create a permission
    pub fn permission(name: impl Into<String>) -> Self {
        Self::new(ItemType::Permission, name)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Gate this item behind a rule
    pub fn with_rule(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = Some(rule_name.into());
        self
    }

    /// Attach an opaque business hook name, see [`Item::executor_name`]
    pub fn with_executor(mut self, executor_name: impl Into<String>) -> Self {
        self.executor_name = Some(executor_name.into());
        self
    }

    pub fn is_role(&self) -> bool {
        self.item_type == ItemType::Role
    }

    pub fn is_permission(&self) -> bool {
        self.item_type == ItemType::Permission
    }

    /// Rule name, treating an empty string as no rule
    pub fn rule(&self) -> Option<&str> {
        self.rule_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Named reference to an executor, resolved at evaluation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule name
    pub name: String,

    /// Name of the executor bound to this rule (may be empty when unbound)
    #[serde(default)]
    pub executor_name: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    /// Create a rule bound to the given executor
    pub fn new(name: impl Into<String>, executor_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            executor_name: executor_name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Directed edge: `parent` contains `child`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemChild {
    pub parent: String,
    pub child: String,
}

impl ItemChild {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

/// Direct grant of an item to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub user_id: UserId,
    pub item_name: String,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Create an assignment with the current timestamp
    pub fn new(user_id: UserId, item_name: impl Into<String>) -> Self {
        Self {
            user_id,
            item_name: item_name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Merge two permission lists, keeping one entry per item name
///
/// Order follows first appearance: `direct` first, then new names from `inherited`.
pub fn merge_permissions(direct: Vec<Item>, inherited: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    direct
        .into_iter()
        .chain(inherited)
        .filter(|item| seen.insert(item.name.clone()))
        .collect()
}
