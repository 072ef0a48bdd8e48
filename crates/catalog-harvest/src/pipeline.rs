//! Harvest orchestration: scroll, re-enumerate, extract, filter, dedupe.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::extract::{ItemExtractor, RawFields};
use crate::scroll::{ScrollController, ScrollOutcome};
use crate::session::PageSession;
use crate::taxonomy::Taxonomy;
use crate::types::{HarvestResult, ItemOutcome, Product, SkipReason};

/// Anchors scanned when the product grid yields nothing.
const FALLBACK_ANCHOR_SELECTOR: &str = "a[href*='/p']";
const FALLBACK_ANCHOR_LIMIT: usize = 30;

/// Number of extracted products previewed in the log.
const PREVIEW_COUNT: usize = 3;

/// Result of one harvest pass.
#[derive(Debug, Clone)]
pub struct Harvest {
    /// Retained, deduplicated products in enumeration order.
    pub products: Vec<Product>,
    /// Scroll outcome, absent when the page was collected without scrolling.
    pub scroll: Option<ScrollOutcome>,
    /// Item fragments enumerated after scrolling, before the `max_items` cap.
    pub fragments_seen: usize,
    /// Fragments that produced no product.
    pub skipped: usize,
    /// Products extracted before filtering and deduplication.
    pub extracted: usize,
    pub used_anchor_fallback: bool,
}

/// Drop products failing the retention rule, then keep the first product of
/// every normalized title. Order-preserving and idempotent.
pub fn retain_and_dedupe(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(Product::is_retainable)
        .filter(|p| seen.insert(p.normalized_title.clone()))
        .collect()
}

/// Runs one harvest against a page session.
#[derive(Debug, Clone)]
pub struct HarvestPipeline {
    config: HarvestConfig,
    extractor: ItemExtractor,
}

impl HarvestPipeline {
    pub fn new(config: HarvestConfig, taxonomy: Taxonomy) -> HarvestResult<Self> {
        config.validate()?;
        let extractor = ItemExtractor::from_config(&config, taxonomy)?;
        Ok(Self { config, extractor })
    }

    /// Navigate to the target and dismiss the cookie banner if one shows.
    ///
    /// A missing consent button is normal. Navigation failures are fatal.
    pub async fn open_catalog(&self, session: &mut dyn PageSession) -> HarvestResult<()> {
        let timing = &self.config.timing;

        info!(url = %self.config.target_url, "loading catalog page");
        session
            .navigate(&self.config.target_url, timing.navigation_timeout_ms)
            .await?;
        session.wait(timing.page_load_wait_ms).await?;

        match session.click(&self.config.consent_selector).await {
            Ok(true) => {
                info!("cookie consent accepted");
                session.wait(timing.consent_wait_ms).await?;
            }
            Ok(false) => debug!("no cookie consent banner"),
            Err(e) => debug!("cookie consent dismissal failed: {e}"),
        }
        Ok(())
    }

    /// Scroll to a terminal state, then collect every item on the page.
    pub async fn harvest(&self, session: &mut dyn PageSession) -> HarvestResult<Harvest> {
        info!("starting infinite scroll");
        let controller =
            ScrollController::new(self.config.scroll.clone(), self.config.item_selector.clone());
        let outcome = controller.run(session).await?;
        info!(
            state = ?outcome.state,
            ticks = outcome.ticks,
            items = outcome.last_item_count(),
            "infinite scroll finished"
        );
        session.wait(outcome.final_settle_ms).await?;

        let mut harvest = self.collect(session).await?;
        harvest.scroll = Some(outcome);
        Ok(harvest)
    }

    /// Enumerate and extract the items currently on the page.
    pub async fn collect(&self, session: &mut dyn PageSession) -> HarvestResult<Harvest> {
        let mut fragments = session.query_all(&self.config.item_selector).await?;
        let fragments_seen = fragments.len();
        info!("found {fragments_seen} items in the grid");
        if let Some(max) = self.config.max_items {
            fragments.truncate(max);
        }

        let mut products = Vec::new();
        let mut skipped = 0;
        for (idx, fragment) in fragments.iter().enumerate() {
            match self.extractor.extract(fragment.as_ref()).await {
                ItemOutcome::Extracted(product) => {
                    if idx < PREVIEW_COUNT {
                        info!(
                            "item {}: {} | {} > {} | {:?} {}",
                            idx + 1,
                            product.normalized_title.chars().take(50).collect::<String>(),
                            product.category,
                            product.sub_category,
                            product.price_value,
                            product.currency
                        );
                    }
                    products.push(product);
                }
                ItemOutcome::Skipped(SkipReason::Empty) => skipped += 1,
                ItemOutcome::Skipped(reason) => {
                    warn!("skipping item {idx}: {reason}");
                    skipped += 1;
                }
            }
        }

        let mut used_anchor_fallback = false;
        if products.is_empty() {
            self.dump_debug_html(session).await;
            if self.config.anchor_fallback {
                products = self.collect_from_anchors(session).await?;
                used_anchor_fallback = true;
                info!("anchor fallback produced {} products", products.len());
            }
        }

        let extracted = products.len();
        info!("{extracted} products extracted before cleanup");
        let products = retain_and_dedupe(products);
        info!("{} products after cleanup", products.len());

        Ok(Harvest {
            products,
            scroll: None,
            fragments_seen,
            skipped,
            extracted,
            used_anchor_fallback,
        })
    }

    /// Build bare products from product-looking anchors, one per href.
    async fn collect_from_anchors(
        &self,
        session: &mut dyn PageSession,
    ) -> HarvestResult<Vec<Product>> {
        let anchors = session.query_all(FALLBACK_ANCHOR_SELECTOR).await?;
        let mut seen = HashSet::new();
        let mut products = Vec::new();

        for anchor in anchors.iter().take(FALLBACK_ANCHOR_LIMIT) {
            let Ok(Some(href)) = anchor.attribute("href").await else {
                continue;
            };
            if href.is_empty() || !seen.insert(href.clone()) {
                continue;
            }
            let Ok(text) = anchor.text().await else {
                continue;
            };
            let title = text.trim();
            if title.chars().count() <= 3 {
                continue;
            }

            let fields = RawFields {
                title: title.to_string(),
                link: self.extractor.resolve_link(&href),
                ..RawFields::default()
            };
            if let Some(product) = self.extractor.build_product(fields) {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn dump_debug_html(&self, session: &mut dyn PageSession) {
        let Some(path) = &self.config.debug_html_path else {
            return;
        };
        match session.content().await {
            Ok(html) => match std::fs::write(path, html) {
                Ok(()) => info!("page HTML saved to {path}"),
                Err(e) => warn!("could not save page HTML to {path}: {e}"),
            },
            Err(e) => warn!("could not read page HTML: {e}"),
        }
    }
}
