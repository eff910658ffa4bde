use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::attribute::{Attribute, Brand, Image};
use super::review::CustomerReview;
use super::sku::Sku;

/// Separator between tokens of a category path (`men.shoes.running`).
pub const CATEGORY_SEPARATOR: char = '.';

/// Merchandisable item as handed over by the search layer.
///
/// Documents are populated once from catalog data and read-only afterwards.
/// Ranking decisions made by the rule engine are tracked beside the document,
/// never written back into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brand: Option<Brand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sizing_chart: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    detail_images: Vec<Image>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    bullet_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    features: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<Attribute>,
    #[serde(default)]
    list_rank: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    customer_reviews: Option<CustomerReview>,
    #[serde(default)]
    bayesian_review_average: f32,
    /// Free gift eligibility keyed by catalog id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    has_free_gift: BTreeMap<String, bool>,
    #[serde(default)]
    is_out_of_stock: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    categories: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    skus: Vec<Sku>,
}

impl Product {
    pub fn builder(id: impl Into<String>) -> ProductBuilder {
        ProductBuilder::new(id)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn short_description(&self) -> Option<&str> {
        self.short_description.as_deref()
    }

    pub fn brand(&self) -> Option<&Brand> {
        self.brand.as_ref()
    }

    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    pub fn sizing_chart(&self) -> Option<&str> {
        self.sizing_chart.as_deref()
    }

    pub fn detail_images(&self) -> &[Image] {
        &self.detail_images
    }

    pub fn bullet_points(&self) -> &[String] {
        &self.bullet_points
    }

    pub fn features(&self) -> &[Attribute] {
        &self.features
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Catalog-assigned rank. Lower is more prominent.
    pub fn list_rank(&self) -> i32 {
        self.list_rank
    }

    pub fn customer_reviews(&self) -> Option<&CustomerReview> {
        self.customer_reviews.as_ref()
    }

    pub fn bayesian_review_average(&self) -> f32 {
        self.bayesian_review_average
    }

    pub fn free_gifts(&self) -> &BTreeMap<String, bool> {
        &self.has_free_gift
    }

    /// Whether the product carries a free gift in the given catalog.
    pub fn has_free_gift(&self, catalog_id: &str) -> bool {
        self.has_free_gift.get(catalog_id).copied().unwrap_or(false)
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.is_out_of_stock
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// True when the product belongs to `path` or one of its descendants.
    pub fn in_category(&self, path: &str) -> bool {
        if self.categories.contains(path) {
            return true;
        }
        self.categories.iter().any(|category| {
            category
                .strip_prefix(path)
                .map(|rest| rest.starts_with(CATEGORY_SEPARATOR))
                .unwrap_or(false)
        })
    }

    pub fn skus(&self) -> &[Sku] {
        &self.skus
    }

    /// First value of the named attribute, features included.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .chain(self.features.iter())
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// Fluent builder mirroring how catalog feeds populate a product.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    product: Product,
}

impl ProductBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            product: Product {
                id: id.into(),
                ..Product::default()
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.product.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.product.description = Some(description.into());
        self
    }

    pub fn short_description(mut self, short_description: impl Into<String>) -> Self {
        self.product.short_description = Some(short_description.into());
        self
    }

    pub fn brand(mut self, brand: Brand) -> Self {
        self.product.brand = Some(brand);
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.product.gender = Some(gender.into());
        self
    }

    pub fn sizing_chart(mut self, sizing_chart: impl Into<String>) -> Self {
        self.product.sizing_chart = Some(sizing_chart.into());
        self
    }

    pub fn add_detail_image(mut self, image: Image) -> Self {
        self.product.detail_images.push(image);
        self
    }

    pub fn add_bullet_point(mut self, bullet_point: impl Into<String>) -> Self {
        self.product.bullet_points.push(bullet_point.into());
        self
    }

    pub fn add_feature(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.product.features.push(Attribute::new(name, value));
        self
    }

    pub fn add_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.product.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn list_rank(mut self, list_rank: i32) -> Self {
        self.product.list_rank = list_rank;
        self
    }

    pub fn customer_reviews(mut self, count: u32, average: f32) -> Self {
        self.product.customer_reviews = Some(CustomerReview::new(count, average));
        self
    }

    pub fn bayesian_review_average(mut self, average: f32) -> Self {
        self.product.bayesian_review_average = average;
        self
    }

    pub fn free_gift(mut self, catalog_id: impl Into<String>, has_free_gift: bool) -> Self {
        self.product
            .has_free_gift
            .insert(catalog_id.into(), has_free_gift);
        self
    }

    pub fn out_of_stock(mut self, is_out_of_stock: bool) -> Self {
        self.product.is_out_of_stock = is_out_of_stock;
        self
    }

    pub fn add_category(mut self, category: impl Into<String>) -> Self {
        self.product.categories.insert(category.into());
        self
    }

    pub fn add_sku(mut self, sku: Sku) -> Self {
        self.product.skus.push(sku);
        self
    }

    pub fn build(self) -> Product {
        self.product
    }
}
