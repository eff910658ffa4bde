use merch_protocol::product::Product;
use serde::Serialize;

use crate::effect::FacetDescriptor;
use crate::error::RuleEffectError;

/// A surviving candidate with the rank the rules gave it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankedProduct {
    pub product: Product,
    /// `listRank` after boosts. Lower is more prominent.
    pub effective_rank: i64,
    /// 1-based position a force-rank effect pinned this product to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<usize>,
}

impl RankedProduct {
    pub fn unranked(product: Product) -> Self {
        let effective_rank = i64::from(product.list_rank());
        Self {
            product,
            effective_rank,
            pinned: None,
        }
    }

    pub fn id(&self) -> &str {
        self.product.id()
    }
}

/// Record of an effect that was skipped because it was malformed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EffectDiagnostic {
    pub rule_id: String,
    pub effect_index: usize,
    pub kind: &'static str,
    pub message: String,
}

impl EffectDiagnostic {
    pub fn new(effect_index: usize, kind: &'static str, error: &RuleEffectError) -> Self {
        Self {
            rule_id: error.rule_id().to_string(),
            effect_index,
            kind,
            message: error.to_string(),
        }
    }
}

/// Aggregated result of applying the resolved rules to a candidate set.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOutcome {
    pub products: Vec<RankedProduct>,
    pub facets: Vec<FacetDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub applied_rules: Vec<String>,
    pub diagnostics: Vec<EffectDiagnostic>,
}

impl ApplicationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates returned in their original order with no rule applied.
    pub fn passthrough(candidates: &[Product]) -> Self {
        Self {
            products: candidates.iter().cloned().map(RankedProduct::unranked).collect(),
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.products.iter().map(RankedProduct::id).collect()
    }

    /// Documents in final order, as catalog data.
    pub fn documents(&self) -> Vec<Product> {
        self.products
            .iter()
            .map(|ranked| ranked.product.clone())
            .collect()
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    pub fn record_rule(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.applied_rules.contains(&id) {
            self.applied_rules.push(id);
        }
    }

    /// Appends a facet unless one for the same field is already present.
    pub fn push_facet(&mut self, facet: FacetDescriptor) -> bool {
        if self.facets.iter().any(|existing| existing.field == facet.field) {
            return false;
        }
        self.facets.push(facet);
        true
    }

    pub fn push_diagnostic(&mut self, diagnostic: EffectDiagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
