//! Per-user assignment memo
//!
//! Memoizes a user's direct assignments for access checks. Entries are bounded
//! by an LRU capacity and an optional TTL, and are dropped whenever that user's
//! assignments change.

use crate::config::MemoConfig;
use crate::error::Result;
use crate::types::{Assignment, UserId};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A user's direct assignments keyed by item name
pub type AssignmentMap = HashMap<String, Assignment>;

#[derive(Debug, Clone)]
struct MemoEntry {
    assignments: Arc<AssignmentMap>,
    cached_at: Instant,
}

impl MemoEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.cached_at.elapsed() > ttl)
    }
}

/// Memo statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    /// Users currently memoized
    pub entries: usize,
    pub capacity: usize,
}

impl MemoStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded memo of user -> assignments
pub struct AssignmentMemo {
    entries: Mutex<LruCache<UserId, MemoEntry>>,
    ttl: Option<Duration>,
    /// Bumped on every invalidation so in-flight loads don't store stale data
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl AssignmentMemo {
    pub fn new(config: &MemoConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl(),
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Memoized assignments for `user_id`, computing them with `load` on a miss
    ///
    /// A failed load is returned as-is and nothing is memoized.
    pub fn get_or_load<F>(&self, user_id: &UserId, load: F) -> Result<Arc<AssignmentMap>>
    where
        F: FnOnce() -> Result<AssignmentMap>,
    {
        {
            let mut entries = self.entries.lock();
            let cached = entries
                .get(user_id)
                .map(|entry| (entry.is_expired(self.ttl), Arc::clone(&entry.assignments)));
            match cached {
                Some((false, assignments)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(assignments);
                }
                Some((true, _)) => {
                    entries.pop(user_id);
                    self.expirations.fetch_add(1, Ordering::Relaxed);
                }
                None => {}
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let epoch = self.epoch.load(Ordering::Acquire);
        let assignments = Arc::new(load()?);

        let mut entries = self.entries.lock();
        if self.epoch.load(Ordering::Acquire) == epoch {
            entries.put(
                user_id.clone(),
                MemoEntry {
                    assignments: Arc::clone(&assignments),
                    cached_at: Instant::now(),
                },
            );
        }

        Ok(assignments)
    }

    /// Forget one user's assignments
    pub fn invalidate(&self, user_id: &UserId) {
        let mut entries = self.entries.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        entries.pop(user_id);
    }

    /// Forget every user's assignments
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        self.epoch.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.entries.lock().contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MemoStats {
        let entries = self.entries.lock();
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}

impl std::fmt::Debug for AssignmentMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentMemo")
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RbacError;

    fn memo(capacity: usize, ttl_secs: Option<u64>) -> AssignmentMemo {
        AssignmentMemo::new(&MemoConfig { capacity, ttl_secs })
    }

    fn single(user: &UserId, item: &str) -> AssignmentMap {
        let mut map = AssignmentMap::new();
        map.insert(item.to_string(), Assignment::new(user.clone(), item));
        map
    }

    #[test]
    fn test_load_once_then_hit() {
        let memo = memo(8, None);
        let user = UserId::from(1);
        let mut loads = 0;

        for _ in 0..3 {
            let assignments = memo
                .get_or_load(&user, || {
                    loads += 1;
                    Ok(single(&user, "admin"))
                })
                .unwrap();
            assert!(assignments.contains_key("admin"));
        }

        assert_eq!(loads, 1);
        let stats = memo.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!(stats.hit_rate() > 0.6);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let memo = memo(8, None);
        let user = UserId::from(1);

        memo.get_or_load(&user, || Ok(single(&user, "admin"))).unwrap();
        memo.invalidate(&user);
        assert!(!memo.contains(&user));

        let reloaded = memo.get_or_load(&user, || Ok(AssignmentMap::new())).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_failed_load_not_memoized() {
        let memo = memo(8, None);
        let user = UserId::from(1);

        let result = memo.get_or_load(&user, || Err(RbacError::Storage("down".to_string())));
        assert!(result.is_err());
        assert!(memo.is_empty());
    }

    #[test]
    fn test_lru_bound() {
        let memo = memo(2, None);
        for id in 0..5i64 {
            let user = UserId::from(id);
            memo.get_or_load(&user, || Ok(AssignmentMap::new())).unwrap();
        }

        assert_eq!(memo.len(), 2);
        assert!(memo.contains(&UserId::from(4)));
        assert!(!memo.contains(&UserId::from(0)));
    }

    #[test]
    fn test_zero_ttl_expires() {
        let memo = memo(8, Some(0));
        let user = UserId::from(1);

        memo.get_or_load(&user, || Ok(AssignmentMap::new())).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        memo.get_or_load(&user, || Ok(AssignmentMap::new())).unwrap();

        let stats = memo.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
    }
}
