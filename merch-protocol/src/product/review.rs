use serde::{Deserialize, Serialize};

/// Raw customer review statistics for a product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerReview {
    pub count: u32,
    pub average: f32,
}

impl CustomerReview {
    pub fn new(count: u32, average: f32) -> Self {
        Self { count, average }
    }
}
