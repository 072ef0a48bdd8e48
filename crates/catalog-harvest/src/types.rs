//! Core data types for harvested catalog products.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level product family assigned by the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Footwear,
    Accessories,
    Fragrance,
    Apparel,
}

impl Category {
    /// Label in the catalog's locale, as written to the export.
    pub fn label(self) -> &'static str {
        match self {
            Category::Footwear => "Chaussures",
            Category::Accessories => "Accessoires",
            Category::Fragrance => "Parfums",
            Category::Apparel => "Vêtements",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Apparel
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One distinct catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Site-provided id, empty when the fragment carries none.
    pub identifier: String,
    /// Longest plausible text fragment found in the item.
    pub raw_title: String,
    /// Single-line product-type label derived from `raw_title`.
    pub normalized_title: String,
    pub category: Category,
    pub sub_category: String,
    /// Verbatim matched price text, possibly empty.
    pub price_text: String,
    pub price_value: Option<f64>,
    pub currency: String,
    pub image_url: String,
    /// Absolute URL of the detail page, possibly empty.
    pub link: String,
    pub available: bool,
}

impl Product {
    /// Whether the product passes the retention rule of the final set.
    ///
    /// A product needs a title or a link, and its normalized title must be
    /// longer than three characters.
    pub fn is_retainable(&self) -> bool {
        let has_identity = !self.normalized_title.is_empty() || !self.link.is_empty();
        has_identity && self.normalized_title.chars().count() > 3
    }
}

/// Why an item fragment produced no product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither a usable title nor a usable link was found.
    Empty,
    /// The node handle failed while being read.
    NodeAccess(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => f.write_str("no usable title or link"),
            SkipReason::NodeAccess(msg) => write!(f, "node access failed: {msg}"),
        }
    }
}

/// Per-item extraction result. A skipped item never aborts the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Extracted(Product),
    Skipped(SkipReason),
}

impl ItemOutcome {
    /// The extracted product, if any.
    pub fn into_product(self) -> Option<Product> {
        match self {
            ItemOutcome::Extracted(product) => Some(product),
            ItemOutcome::Skipped(_) => None,
        }
    }
}

/// Errors that can occur while harvesting a catalog.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
