use merch_protocol::product::Product;
use serde::{Deserialize, Serialize};

use crate::context::RuleContext;
use crate::error::RuleEffectError;

/// Selects the products of the candidate set an effect applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductTarget {
    /// Every candidate.
    All,
    /// Products with one of the listed ids.
    Ids { ids: Vec<String> },
    /// Products in the category or one of its descendants.
    Category { path: String },
    /// Products of the given brand.
    Brand { brand_id: String },
    /// Products carrying the attribute or feature with the given value.
    Attribute { name: String, value: String },
    /// Products flagged out of stock.
    OutOfStock,
    /// Products with a free gift in the request's catalog.
    FreeGift,
    /// Any of the nested targets.
    AnyOf { targets: Vec<ProductTarget> },
    /// Target kind this engine does not know about. Never matches.
    #[serde(other)]
    Unknown,
}

impl ProductTarget {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProductTarget::Ids {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, product: &Product, context: &RuleContext) -> bool {
        match self {
            ProductTarget::All => true,
            ProductTarget::Ids { ids } => ids.iter().any(|id| id == product.id()),
            ProductTarget::Category { path } => product.in_category(path),
            ProductTarget::Brand { brand_id } => product
                .brand()
                .map(|brand| &brand.id == brand_id)
                .unwrap_or(false),
            ProductTarget::Attribute { name, value } => product
                .attributes()
                .iter()
                .chain(product.features().iter())
                .any(|attribute| &attribute.name == name && &attribute.value == value),
            ProductTarget::OutOfStock => product.is_out_of_stock(),
            ProductTarget::FreeGift => context
                .catalog_id()
                .map(|catalog| product.has_free_gift(catalog))
                .unwrap_or(false),
            ProductTarget::AnyOf { targets } => targets
                .iter()
                .any(|target| target.matches(product, context)),
            ProductTarget::Unknown => false,
        }
    }

    /// Rejects targets that can never select anything.
    pub(crate) fn validate(&self, rule_id: &str) -> Result<(), RuleEffectError> {
        let empty = |kind: &'static str| RuleEffectError::EmptyTarget {
            rule_id: rule_id.to_string(),
            kind,
        };
        match self {
            ProductTarget::Ids { ids } if ids.is_empty() => Err(empty("ids")),
            ProductTarget::Category { path } if path.trim().is_empty() => Err(empty("category")),
            ProductTarget::Brand { brand_id } if brand_id.trim().is_empty() => Err(empty("brand")),
            ProductTarget::Attribute { name, .. } if name.trim().is_empty() => {
                Err(empty("attribute"))
            }
            ProductTarget::Unknown => Err(RuleEffectError::UnknownTarget {
                rule_id: rule_id.to_string(),
            }),
            ProductTarget::AnyOf { targets } if targets.is_empty() => Err(empty("any_of")),
            ProductTarget::AnyOf { targets } => targets
                .iter()
                .try_for_each(|target| target.validate(rule_id)),
            _ => Ok(()),
        }
    }
}
