use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::loader::load_rules;
use crate::{Rule, RuleError, RuleStore};

/// External provider of the authoritative rule set.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Short description used in logs.
    fn describe(&self) -> String;

    /// Fetches the complete current rule set.
    async fn fetch(&self) -> Result<Vec<Rule>, RuleError>;
}

/// Rules read from a file or a directory of rule files.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<Rule>, RuleError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_rules(path))
            .await
            .map_err(|err| {
                RuleError::parse_error(&self.path, format!("loader task failed: {err}"))
            })?
    }
}

/// Fixed rule set, mostly useful for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    rules: Vec<Rule>,
}

impl StaticRuleSource {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl RuleSource for StaticRuleSource {
    fn describe(&self) -> String {
        format!("static ({} rules)", self.rules.len())
    }

    async fn fetch(&self) -> Result<Vec<Rule>, RuleError> {
        Ok(self.rules.clone())
    }
}

/// Fetches once and publishes the result. The store is left untouched on failure.
pub async fn refresh_once(store: &RuleStore, source: &dyn RuleSource) -> Result<u64, RuleError> {
    let rules = source.fetch().await?;
    let count = rules.len();
    let version = store.replace_all(rules);
    debug!(source = %source.describe(), count, version, "refreshed rules");
    Ok(version)
}

/// Polls `source` every `interval` and publishes a new snapshot each time.
///
/// A failed fetch keeps the previous snapshot in place.
pub fn spawn_refresh(
    store: RuleStore,
    source: Arc<dyn RuleSource>,
    interval: Duration,
) -> JoinHandle<()> {
    info!(source = %source.describe(), ?interval, "starting rule refresh");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; callers load the initial set themselves.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(err) = refresh_once(&store, source.as_ref()).await {
                warn!(
                    source = %source.describe(),
                    error = %err,
                    "rule refresh failed, keeping previous snapshot"
                );
            }
        }
    })
}
