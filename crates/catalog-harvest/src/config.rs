//! Harvest configuration: target, selectors, and timing policy.
//!
//! Every field has a default matching the modeled catalog, so an empty JSON
//! object is a valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{HarvestError, HarvestResult};

pub const DEFAULT_TARGET_URL: &str = "https://www.zara.com/ca/fr/homme-tout-l7465.html";
pub const DEFAULT_ORIGIN: &str = "https://www.zara.com";
pub const DEFAULT_CURRENCY: &str = "CAD";
pub const DEFAULT_ITEM_SELECTOR: &str = "li.product-grid-product";
pub const DEFAULT_CONSENT_SELECTOR: &str = "button#onetrust-accept-btn-handler";

/// How the scroll controller advances the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrollMode {
    /// Scroll to the bottom until the content height stops growing.
    UntilConverged,
    /// Scroll to `(i + 1) * step_px` for a fixed number of steps.
    FixedSteps { steps: u32, step_px: u32 },
}

/// Timing policy of the scroll controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollPolicy {
    pub mode: ScrollMode,
    /// Pause after each scroll for asynchronous content to render.
    pub settle_delay_ms: u64,
    /// Consecutive no-growth ticks before the page counts as fully loaded.
    pub stagnation_threshold: u32,
    /// Safety cap on scroll ticks.
    pub max_ticks: u32,
    /// Pause after the last tick, before items are re-enumerated.
    pub final_settle_ms: u64,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            mode: ScrollMode::UntilConverged,
            settle_delay_ms: 2500,
            stagnation_threshold: 6,
            max_ticks: 150,
            final_settle_ms: 3000,
        }
    }
}

/// Fixed waits used while opening the catalog page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    pub navigation_timeout_ms: u64,
    pub page_load_wait_ms: u64,
    pub consent_wait_ms: u64,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 60_000,
            page_load_wait_ms: 4000,
            consent_wait_ms: 2000,
        }
    }
}

/// Complete harvest configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub target_url: String,
    /// Origin used to resolve root-relative links.
    pub origin: String,
    pub currency: String,
    pub item_selector: String,
    pub consent_selector: String,
    pub timing: SessionTiming,
    pub scroll: ScrollPolicy,
    /// Only the first `max_items` fragments are extracted when set.
    pub max_items: Option<usize>,
    /// Build products from product anchors when the grid yields nothing.
    pub anchor_fallback: bool,
    /// Where to dump the page HTML when nothing was extracted.
    pub debug_html_path: Option<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            item_selector: DEFAULT_ITEM_SELECTOR.to_string(),
            consent_selector: DEFAULT_CONSENT_SELECTOR.to_string(),
            timing: SessionTiming::default(),
            scroll: ScrollPolicy::default(),
            max_items: None,
            anchor_fallback: true,
            debug_html_path: None,
        }
    }
}

impl HarvestConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> HarvestResult<Self> {
        let config: HarvestConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject settings the harvester cannot run with.
    pub fn validate(&self) -> HarvestResult<()> {
        if url::Url::parse(&self.origin).is_err() {
            return Err(HarvestError::Config(format!(
                "origin is not an absolute URL: {}",
                self.origin
            )));
        }
        if self.item_selector.trim().is_empty() {
            return Err(HarvestError::Config("item_selector is empty".to_string()));
        }
        if self.scroll.stagnation_threshold == 0 {
            return Err(HarvestError::Config(
                "stagnation_threshold must be at least 1".to_string(),
            ));
        }
        if self.scroll.max_ticks == 0 {
            return Err(HarvestError::Config("max_ticks must be at least 1".to_string()));
        }
        Ok(())
    }
}
