use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::error::RuleEffectError;
use crate::target::ProductTarget;

/// Effects a rule applies to the candidate set once it matches the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleEffect {
    /// Lower `listRank` of matching products by `amount`. Negative amounts demote.
    Boost { amount: i32, target: ProductTarget },
    /// Remove matching products for the rest of the pass.
    Block { target: ProductTarget },
    /// Pin the best-ranked matching product to a 1-based position.
    ForceRank {
        target: ProductTarget,
        position: usize,
    },
    /// Append a facet descriptor to the response.
    InjectFacet { facet: FacetDescriptor },
    /// Send the caller somewhere else instead of returning results.
    Redirect { target: String },
    /// Effect of a known kind whose definition failed to parse.
    #[serde(skip_deserializing)]
    Malformed { kind: String, message: String },
    /// Effect kind this engine does not know about.
    #[serde(other)]
    Unknown,
}

impl RuleEffect {
    pub fn kind(&self) -> &'static str {
        match self {
            RuleEffect::Boost { .. } => "boost",
            RuleEffect::Block { .. } => "block",
            RuleEffect::ForceRank { .. } => "force_rank",
            RuleEffect::InjectFacet { .. } => "inject_facet",
            RuleEffect::Redirect { .. } => "redirect",
            RuleEffect::Unknown => "unknown",
            RuleEffect::Malformed { .. } => "malformed",
        }
    }

    /// Parses one effect definition. A definition that does not parse becomes
    /// [`RuleEffect::Malformed`] so the rest of the rule survives.
    pub fn from_value(value: serde_yaml::Value) -> Self {
        let kind = value
            .get("type")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        serde_yaml::from_value(value).unwrap_or_else(|err| RuleEffect::Malformed {
            kind,
            message: err.to_string(),
        })
    }

    /// Checks the effect is well formed before it touches the working set.
    pub fn validate(&self, rule_id: &str) -> Result<(), RuleEffectError> {
        match self {
            RuleEffect::Boost { target, .. } | RuleEffect::Block { target } => {
                target.validate(rule_id)
            }
            RuleEffect::ForceRank { target, position } => {
                if *position == 0 {
                    return Err(RuleEffectError::InvalidPosition {
                        rule_id: rule_id.to_string(),
                        position: *position,
                    });
                }
                target.validate(rule_id)
            }
            RuleEffect::InjectFacet { facet } => {
                if facet.field.trim().is_empty() {
                    Err(RuleEffectError::InvalidFacet {
                        rule_id: rule_id.to_string(),
                    })
                } else {
                    Ok(())
                }
            }
            RuleEffect::Redirect { target } => {
                if is_valid_redirect(target) {
                    Ok(())
                } else {
                    Err(RuleEffectError::InvalidRedirect {
                        rule_id: rule_id.to_string(),
                        target: target.clone(),
                    })
                }
            }
            RuleEffect::Unknown => Err(RuleEffectError::UnknownEffect {
                rule_id: rule_id.to_string(),
            }),
            RuleEffect::Malformed { kind, message } => Err(RuleEffectError::MalformedEffect {
                rule_id: rule_id.to_string(),
                kind: kind.clone(),
                message: message.clone(),
            }),
        }
    }
}

/// Deserializes a rule's effect list one entry at a time.
pub(crate) fn effect_list<'de, D>(deserializer: D) -> Result<Vec<RuleEffect>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(RuleEffect::from_value).collect())
}

fn is_valid_redirect(target: &str) -> bool {
    let target = target.trim();
    if target.starts_with('/') {
        return !target.starts_with("//");
    }
    Url::parse(target)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Facet the search layer should render for this request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FacetDescriptor {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, alias = "min_count", skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<FacetSort>,
}

impl FacetDescriptor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: None,
            limit: None,
            min_count: None,
            sort: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FacetSort {
    Count,
    Index,
}
