use merch_protocol::product::Product;
use serde::Serialize;
use tracing::debug;

use crate::applicator;
use crate::context::{RuleContext, RuleParams};
use crate::error::ConfigurationError;
use crate::outcome::ApplicationOutcome;
use crate::resolver;
use crate::store::RuleStore;

/// Result of running the rule manager for one request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleManagerResult {
    #[serde(flatten)]
    pub outcome: ApplicationOutcome,
    /// Snapshot the request was served from; absent when rules were disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_version: Option<u64>,
}

/// Per-request orchestration: context, resolution, application.
#[derive(Clone, Default)]
pub struct RuleManager {
    store: RuleStore,
}

impl RuleManager {
    pub fn new(store: RuleStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Builds the request context from raw parameters and processes the candidates.
    pub fn process(
        &self,
        params: &RuleParams,
        candidates: &[Product],
    ) -> Result<RuleManagerResult, ConfigurationError> {
        let context = RuleContext::from_params(params)?;
        Ok(self.process_context(&context, candidates))
    }

    pub fn process_context(
        &self,
        context: &RuleContext,
        candidates: &[Product],
    ) -> RuleManagerResult {
        if !context.rule_enabled() {
            debug!("rules disabled for request");
            return RuleManagerResult {
                outcome: ApplicationOutcome::passthrough(candidates),
                snapshot_version: None,
            };
        }

        // Held for the whole request; a concurrent refresh does not affect it.
        let snapshot = self.store.snapshot();
        let resolved = resolver::resolve(&snapshot.rules, context);
        debug!(
            snapshot = snapshot.version,
            matched = resolved.len(),
            candidates = candidates.len(),
            "resolved rules for request"
        );

        RuleManagerResult {
            outcome: applicator::apply(&resolved, context, candidates),
            snapshot_version: Some(snapshot.version),
        }
    }
}
