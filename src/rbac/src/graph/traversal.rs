//! Upward walk from a permission toward granted items
//!
//! Both access-check modes share [`find_grant`]; they differ only in the
//! [`GraphSource`] that answers "what is this item, which rule gates it, and who
//! are its parents".

use super::cache::GraphSnapshot;
use crate::store::Repository;
use crate::types::{Item, Rule};
use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Adjacency and lookup capability for the access traversal
pub trait GraphSource {
    fn item(&self, name: &str) -> Option<Cow<'_, Item>>;

    fn rule(&self, name: &str) -> Option<Cow<'_, Rule>>;

    /// Parent names of `name`
    fn parents(&self, name: &str) -> Cow<'_, [String]>;
}

impl GraphSource for GraphSnapshot {
    fn item(&self, name: &str) -> Option<Cow<'_, Item>> {
        GraphSnapshot::item(self, name).map(Cow::Borrowed)
    }

    fn rule(&self, name: &str) -> Option<Cow<'_, Rule>> {
        GraphSnapshot::rule(self, name).map(Cow::Borrowed)
    }

    fn parents(&self, name: &str) -> Cow<'_, [String]> {
        Cow::Borrowed(GraphSnapshot::parents(self, name))
    }
}

/// Per-hop repository queries
///
/// Read failures are logged and reported as "not found", so a broken link
/// denies at that node instead of aborting the whole check.
pub struct RepositorySource<'a> {
    repository: &'a dyn Repository,
}

impl<'a> RepositorySource<'a> {
    pub fn new(repository: &'a dyn Repository) -> Self {
        Self { repository }
    }
}

impl GraphSource for RepositorySource<'_> {
    fn item(&self, name: &str) -> Option<Cow<'_, Item>> {
        match self.repository.get_item(name) {
            Ok(item) => item.map(Cow::Owned),
            Err(e) => {
                warn!("Failed to load item '{}': {}", name, e);
                None
            }
        }
    }

    fn rule(&self, name: &str) -> Option<Cow<'_, Rule>> {
        match self.repository.get_rule(name) {
            Ok(rule) => rule.map(Cow::Owned),
            Err(e) => {
                warn!("Failed to load rule '{}': {}", name, e);
                None
            }
        }
    }

    fn parents(&self, name: &str) -> Cow<'_, [String]> {
        match self.repository.find_parents(name) {
            Ok(parents) => Cow::Owned(parents),
            Err(e) => {
                warn!("Failed to load parents of '{}': {}", name, e);
                Cow::Owned(Vec::new())
            }
        }
    }
}

/// Search upward from `start` for a granted item
///
/// A node passes when it is a known item and `rule_passes` accepts it. The
/// search succeeds at the first passing node for which `is_granted` holds;
/// otherwise it continues into that node's parents. A rejected node prunes
/// everything above it along that path.
///
/// Nodes are visited breadth-first, so each one is first reached at its
/// shortest distance from `start` and expanded at most once. Nodes more than
/// `max_depth` hops from `start` are skipped.
pub fn find_grant<S, R, G>(
    source: &S,
    start: &str,
    max_depth: usize,
    mut rule_passes: R,
    is_granted: G,
) -> bool
where
    S: GraphSource + ?Sized,
    R: FnMut(&Item) -> bool,
    G: Fn(&str) -> bool,
{
    let mut queue: VecDeque<(String, usize)> = VecDeque::from([(start.to_string(), 0)]);
    let mut visited: HashSet<String> = HashSet::from([start.to_string()]);

    while let Some((name, depth)) = queue.pop_front() {
        let Some(item) = source.item(&name) else {
            continue;
        };

        debug!("Checking {} '{}'", item.item_type, name);

        if !rule_passes(&*item) {
            debug!("Rule rejected '{}'", name);
            continue;
        }

        if is_granted(&name) {
            debug!("Access to '{}' granted via '{}'", start, name);
            return true;
        }

        let parents = source.parents(&name);
        if depth == max_depth {
            if !parents.is_empty() {
                warn!(
                    "Traversal from '{}' reached max depth {} at '{}'",
                    start, max_depth, name
                );
            }
            continue;
        }

        for parent in parents.iter() {
            if visited.insert(parent.clone()) {
                queue.push_back((parent.clone(), depth + 1));
            }
        }
    }

    false
}
