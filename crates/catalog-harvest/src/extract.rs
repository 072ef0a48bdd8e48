//! Per-item field extraction.
//!
//! Each field is chosen by an independent best-effort scan over the item
//! fragment's descendants, in document order:
//!
//! - **link**: first anchor whose href looks like a product path (`/p` or
//!   `product`), else the first anchor; root-relative hrefs are resolved
//!   against the catalog origin.
//! - **title**: longest text of a heading/paragraph/span/div strictly between
//!   5 and 150 characters that is neither purely numeric nor price-only.
//! - **price**: first pricing or text node showing a currency marker next to
//!   digits.
//! - **image**: first `<img>`, first non-empty of `src`, `data-src`,
//!   `data-lazy-src`.
//! - **identifier**: `data-productid`, else `id`.
//!
//! Extraction never fails the batch: a node error skips the item.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::config::HarvestConfig;
use crate::price::parse_price;
use crate::session::NodeHandle;
use crate::taxonomy::Taxonomy;
use crate::title::normalize_title;
use crate::types::{HarvestError, HarvestResult, ItemOutcome, Product, SkipReason};

const TITLE_SELECTOR: &str = "h2, h3, h4, p, span, div";
const PRICE_SELECTOR: &str = "[class*='price'], [class*='money'], .price-current, span, p";
const IMAGE_SOURCE_ATTRIBUTES: [&str; 3] = ["src", "data-src", "data-lazy-src"];
const TITLE_MIN_CHARS: usize = 5;
const TITLE_MAX_CHARS: usize = 150;

fn price_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\$|CAD|€)\s*\d+").expect("price marker regex is valid"))
}

fn price_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s,.$CAD€]+$").expect("price-only regex is valid"))
}

/// Whether a trimmed text is acceptable as a title candidate.
pub fn is_title_candidate(text: &str) -> bool {
    let len = text.chars().count();
    if len <= TITLE_MIN_CHARS || len >= TITLE_MAX_CHARS {
        return false;
    }
    let all_digits = text
        .chars()
        .filter(|c| *c != ' ')
        .all(|c| c.is_ascii_digit());
    !all_digits && !price_only_re().is_match(text)
}

/// Whether a trimmed text looks like a price label.
pub fn is_price_text(text: &str) -> bool {
    price_marker_re().is_match(text)
}

fn is_product_href(href: &str) -> bool {
    href.contains("/p") || href.to_lowercase().contains("product")
}

/// Raw field values read from one fragment, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFields {
    pub identifier: String,
    pub title: String,
    pub price_text: String,
    pub image_url: String,
    pub link: String,
}

/// Turns item fragments into products.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    origin: Url,
    currency: String,
    taxonomy: Taxonomy,
}

impl ItemExtractor {
    pub fn new(origin: &str, currency: &str, taxonomy: Taxonomy) -> HarvestResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| HarvestError::Config(format!("invalid origin '{origin}': {e}")))?;
        Ok(Self {
            origin,
            currency: currency.to_string(),
            taxonomy,
        })
    }

    pub fn from_config(config: &HarvestConfig, taxonomy: Taxonomy) -> HarvestResult<Self> {
        Self::new(&config.origin, &config.currency, taxonomy)
    }

    /// Extract one fragment. Never fails; problems become `Skipped`.
    pub async fn extract(&self, fragment: &dyn NodeHandle) -> ItemOutcome {
        match self.read_fields(fragment).await {
            Ok(fields) => match self.build_product(fields) {
                Some(product) => ItemOutcome::Extracted(product),
                None => ItemOutcome::Skipped(SkipReason::Empty),
            },
            Err(e) => ItemOutcome::Skipped(SkipReason::NodeAccess(e.to_string())),
        }
    }

    /// Read every raw field of a fragment.
    pub async fn read_fields(&self, fragment: &dyn NodeHandle) -> HarvestResult<RawFields> {
        Ok(RawFields {
            link: self.select_link(fragment).await?,
            title: select_title(fragment).await?,
            price_text: select_price_text(fragment).await?,
            image_url: select_image_url(fragment).await?,
            identifier: select_identifier(fragment).await?,
        })
    }

    /// Normalize, price and classify raw fields. `None` when the item has
    /// neither a title nor a link.
    pub fn build_product(&self, fields: RawFields) -> Option<Product> {
        let normalized_title = normalize_title(&fields.title);
        if normalized_title.is_empty() && fields.link.is_empty() {
            return None;
        }

        let (category, sub_category) = self.taxonomy.classify(&fields.title);
        let price_value = parse_price(&fields.price_text);

        Some(Product {
            identifier: fields.identifier,
            raw_title: fields.title,
            normalized_title,
            category,
            sub_category,
            price_text: fields.price_text,
            price_value,
            currency: self.currency.clone(),
            image_url: fields.image_url,
            link: fields.link,
            available: true,
        })
    }

    /// Resolve a root-relative href against the catalog origin. Other hrefs
    /// are kept verbatim.
    pub fn resolve_link(&self, href: &str) -> String {
        if !href.starts_with('/') {
            return href.to_string();
        }
        match self.origin.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => href.to_string(),
        }
    }

    async fn select_link(&self, fragment: &dyn NodeHandle) -> HarvestResult<String> {
        let anchors = fragment.query_all("a").await?;

        let mut first_href = None;
        for (idx, anchor) in anchors.iter().enumerate() {
            let href = anchor.attribute("href").await?;
            if idx == 0 {
                first_href = href.clone();
            }
            if let Some(href) = href.filter(|h| !h.is_empty() && is_product_href(h)) {
                return Ok(self.resolve_link(&href));
            }
        }

        Ok(first_href
            .filter(|h| !h.is_empty())
            .map(|h| self.resolve_link(&h))
            .unwrap_or_default())
    }
}

async fn select_title(fragment: &dyn NodeHandle) -> HarvestResult<String> {
    let mut best = String::new();
    for node in fragment.query_all(TITLE_SELECTOR).await? {
        let text = node.text().await?;
        let text = text.trim();
        if is_title_candidate(text) && text.chars().count() > best.chars().count() {
            best = text.to_string();
        }
    }
    Ok(best)
}

async fn select_price_text(fragment: &dyn NodeHandle) -> HarvestResult<String> {
    for node in fragment.query_all(PRICE_SELECTOR).await? {
        let text = node.text().await?;
        let text = text.trim();
        if is_price_text(text) {
            return Ok(text.to_string());
        }
    }
    Ok(String::new())
}

async fn select_image_url(fragment: &dyn NodeHandle) -> HarvestResult<String> {
    let Some(img) = fragment.query_single("img").await? else {
        return Ok(String::new());
    };
    for attr in IMAGE_SOURCE_ATTRIBUTES {
        if let Some(src) = img.attribute(attr).await?.filter(|s| !s.is_empty()) {
            return Ok(src);
        }
    }
    Ok(String::new())
}

async fn select_identifier(fragment: &dyn NodeHandle) -> HarvestResult<String> {
    for attr in ["data-productid", "id"] {
        if let Some(id) = fragment.attribute(attr).await?.filter(|s| !s.is_empty()) {
            return Ok(id);
        }
    }
    Ok(String::new())
}
