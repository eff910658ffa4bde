use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::PageType;
use crate::effect::{effect_list, RuleEffect};

/// Declarative merchandising rule: a targeting scope plus ordered effects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule {
    /// Unique identifier. Used for reporting, tie-breaking and deduplication.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Precedence. Higher values apply first.
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "Rule::default_enabled")]
    pub enabled: bool,
    /// Start of the validity window, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    /// End of the validity window, exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default, deserialize_with = "effect_list")]
    pub effects: Vec<RuleEffect>,
}

impl Rule {
    pub fn new(id: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            description: None,
            priority,
            enabled: true,
            starts_at: None,
            ends_at: None,
            scope: RuleScope::default(),
            effects: Vec::new(),
        }
    }

    pub fn default_enabled() -> bool {
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_effect(mut self, effect: RuleEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Whether `at` falls inside the rule's validity window.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        let started = self.starts_at.map(|start| start <= at).unwrap_or(true);
        let not_ended = self.ends_at.map(|end| at < end).unwrap_or(true);
        started && not_ended
    }
}

/// Targeting dimensions. An empty or absent dimension is a wildcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleScope {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub site_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    /// Ancestor category tokens; matches the context path and all its descendants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_path: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub page_types: BTreeSet<PageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathScope>,
}

impl RuleScope {
    pub fn site(mut self, site_id: impl Into<String>) -> Self {
        self.site_ids.insert(site_id.into());
        self
    }

    pub fn catalog(mut self, catalog_id: impl Into<String>) -> Self {
        self.catalog_id = Some(catalog_id.into());
        self
    }

    pub fn category<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_path = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_type(mut self, page_type: PageType) -> Self {
        self.page_types.insert(page_type);
        self
    }

    pub fn path(mut self, path: PathScope) -> Self {
        self.path = Some(path);
        self
    }
}

/// Browse path scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathScope {
    Exact(String),
    /// Matches the path itself and anything below it, on segment boundaries.
    Prefix(String),
}

impl PathScope {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathScope::Exact(expected) => expected == path,
            PathScope::Prefix(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'),
                None => false,
            },
        }
    }
}
