//! Page automation abstraction.
//!
//! Defines the `PageSession` and `NodeHandle` traits that abstract over the
//! browser engine. The harvester only ever talks to a page through these.

use async_trait::async_trait;

use crate::types::HarvestResult;

/// A DOM element handle with scoped queries.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Rendered text of the element and its descendants.
    async fn text(&self) -> HarvestResult<String>;
    /// Attribute value, `None` when absent.
    async fn attribute(&self, name: &str) -> HarvestResult<Option<String>>;
    /// Descendants matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>>;

    /// First descendant matching `selector`.
    async fn query_single(&self, selector: &str) -> HarvestResult<Option<Box<dyn NodeHandle>>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }
}

/// A live page (one browser tab) driven by the harvester.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> HarvestResult<()>;
    /// Fixed-duration pause.
    async fn wait(&mut self, ms: u64) -> HarvestResult<()>;
    /// Execute JavaScript in the page and return its JSON result.
    async fn evaluate_script(&mut self, script: &str) -> HarvestResult<serde_json::Value>;
    /// All elements matching `selector`, in document order.
    async fn query_all(&mut self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>>;
    /// First element matching `selector`.
    async fn query_single(&mut self, selector: &str) -> HarvestResult<Option<Box<dyn NodeHandle>>>;
    /// Click the first element matching `selector`. Returns `false` when
    /// nothing matched.
    async fn click(&mut self, selector: &str) -> HarvestResult<bool>;
    /// Full serialized HTML of the page.
    async fn content(&mut self) -> HarvestResult<String>;
    /// Save a viewport screenshot to `path`.
    async fn screenshot(&mut self, path: &str) -> HarvestResult<()>;
    /// Close the page.
    async fn close(self: Box<Self>) -> HarvestResult<()>;
}
