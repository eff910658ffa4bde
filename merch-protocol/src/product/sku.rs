use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::attribute::Image;
use super::document::Product;

/// Child variant of a product. Ranking fields left unset inherit from the parent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_retail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_rank: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_out_of_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_free_gift: Option<BTreeMap<String, bool>>,
}

impl Sku {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn effective_list_rank(&self, parent: &Product) -> i32 {
        self.list_rank.unwrap_or_else(|| parent.list_rank())
    }

    pub fn effective_out_of_stock(&self, parent: &Product) -> bool {
        self.is_out_of_stock.unwrap_or_else(|| parent.is_out_of_stock())
    }

    pub fn effective_free_gift(&self, parent: &Product, catalog_id: &str) -> bool {
        match &self.has_free_gift {
            Some(gifts) => gifts.get(catalog_id).copied().unwrap_or(false),
            None => parent.has_free_gift(catalog_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherits_ranking_fields_unless_overridden() {
        let parent = Product::builder("p1")
            .list_rank(4)
            .out_of_stock(true)
            .free_gift("outdoor", true)
            .build();

        let inherited = Sku::new("p1-a");
        assert_eq!(inherited.effective_list_rank(&parent), 4);
        assert!(inherited.effective_out_of_stock(&parent));
        assert!(inherited.effective_free_gift(&parent, "outdoor"));

        let overridden = Sku {
            list_rank: Some(1),
            is_out_of_stock: Some(false),
            has_free_gift: Some(BTreeMap::new()),
            ..Sku::new("p1-b")
        };
        assert_eq!(overridden.effective_list_rank(&parent), 1);
        assert!(!overridden.effective_out_of_stock(&parent));
        assert!(!overridden.effective_free_gift(&parent, "outdoor"));
    }
}
