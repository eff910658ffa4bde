use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::info;

use crate::Rule;

/// Immutable view of the rule set handed to requests.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    /// Enabled rules, highest priority first.
    pub rules: Vec<Rule>,
}

impl RuleSnapshot {
    fn empty() -> Self {
        Self {
            version: 0,
            published_at: Utc::now(),
            rules: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == rule_id)
    }
}

/// Holder of the currently published rule set.
///
/// Every refresh publishes a fresh [`RuleSnapshot`]. Readers keep the `Arc`
/// they obtained, so a refresh never changes the rules of an in-flight request.
#[derive(Clone)]
pub struct RuleStore {
    current: Arc<RwLock<Arc<RuleSnapshot>>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(RuleSnapshot::empty()))),
        }
    }
}

impl RuleStore {
    /// Creates a store with an empty snapshot at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the provided rules.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let store = Self::new();
        store.replace_all(rules);
        store
    }

    /// The rule set currently published.
    pub fn snapshot(&self) -> Arc<RuleSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Publishes `rules` as the new active set and returns its version.
    ///
    /// Disabled rules are dropped; the rest are ordered by priority and id.
    pub fn replace_all(&self, mut rules: Vec<Rule>) -> u64 {
        rules.retain(Rule::is_enabled);
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        let mut current = self.current.write();
        let version = current.version + 1;
        *current = Arc::new(RuleSnapshot {
            version,
            published_at: Utc::now(),
            rules,
        });
        info!(version, rules = current.rules.len(), "published rule snapshot");
        version
    }
}
