//! Merchandising rule engine for product search results.
//!
//! Rules are declarative YAML/JSON documents. Each one carries a targeting
//! scope (site, catalog, category, page type, browse path) and an ordered list
//! of effects (boost, block, force-rank, facet injection, redirect). For every
//! request the engine builds a [`RuleContext`] from the raw parameters,
//! resolves the rules whose scope matches it and applies their effects to the
//! candidate documents returned by the search index.

mod applicator;
mod context;
mod effect;
mod error;
mod loader;
mod manager;
mod outcome;
mod predicate;
mod resolver;
mod rule;
mod service;
mod source;
mod store;
mod target;

pub use applicator::apply;
pub use context::{PageType, RuleContext, RuleParams};
pub use effect::{FacetDescriptor, FacetSort, RuleEffect};
pub use error::{ConfigurationError, RuleEffectError, RuleError};
pub use loader::load_rules;
pub use manager::{RuleManager, RuleManagerResult};
pub use outcome::{ApplicationOutcome, EffectDiagnostic, RankedProduct};
pub use predicate::matches;
pub use resolver::resolve;
pub use rule::{PathScope, Rule, RuleScope};
pub use service::{ApplyRequest, ApplyResponse, RuleApiBuilder, RuleServiceConfig};
pub use source::{refresh_once, spawn_refresh, FileRuleSource, RuleSource, StaticRuleSource};
pub use store::{RuleSnapshot, RuleStore};
pub use target::ProductTarget;
