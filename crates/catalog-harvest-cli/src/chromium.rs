//! Chromium-backed page session using chromiumoxide.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use catalog_harvest::{HarvestError, HarvestResult, NodeHandle, PageSession};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1080;
const LOCALE: &str = "fr-CA";

fn session_err(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Session(e.to_string())
}

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. CATALOG_HARVEST_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("CATALOG_HARVEST_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Chrome for Testing under the home directory
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".cache/chrome/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".cache/chrome/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else {
            vec![home.join(".cache/chrome/chrome-linux64/chrome")]
        };
        if let Some(found) = candidates.into_iter().find(|c| c.exists()) {
            return Some(found);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Browser launch settings.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Show the browser window instead of running headless.
    pub headed: bool,
    /// Explicit browser binary, overriding discovery.
    pub chromium_path: Option<PathBuf>,
}

/// One Chromium tab driven by the harvester.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl ChromiumSession {
    /// Launch Chromium and open a blank tab.
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let chrome_path = match &options.chromium_path {
            Some(path) => path.clone(),
            None => find_chromium().context(
                "Chromium not found. Install Chrome or set CATALOG_HARVEST_CHROMIUM_PATH.",
            )?,
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .arg(format!("--lang={LOCALE}"))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if options.headed {
            builder = builder.with_head();
        } else {
            builder = builder.arg("--headless=new");
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;
        page.set_user_agent(USER_AGENT)
            .await
            .context("failed to set user agent")?;

        Ok(Self {
            browser,
            handler,
            page,
        })
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> HarvestResult<()> {
        let start = Instant::now();
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.page.goto(url)).await;

        match result {
            Ok(Ok(_)) => {
                tracing::debug!(
                    "page loaded in {}ms",
                    start.elapsed().as_millis()
                );
                Ok(())
            }
            Ok(Err(e)) => Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(HarvestError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {timeout_ms}ms"),
            }),
        }
    }

    async fn wait(&mut self, ms: u64) -> HarvestResult<()> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }

    async fn evaluate_script(&mut self, script: &str) -> HarvestResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| HarvestError::Script(e.to_string()))?;
        // `undefined` results carry no value
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn query_all(&mut self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(session_err)?;
        Ok(wrap(elements))
    }

    async fn query_single(&mut self, selector: &str) -> HarvestResult<Option<Box<dyn NodeHandle>>> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn click(&mut self, selector: &str) -> HarvestResult<bool> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(session_err)?;
        match elements.first() {
            Some(element) => {
                element.click().await.map_err(session_err)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn content(&mut self) -> HarvestResult<String> {
        self.page.content().await.map_err(session_err)
    }

    async fn screenshot(&mut self, path: &str) -> HarvestResult<()> {
        let params = ScreenshotParams::builder().full_page(false).build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(session_err)?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> HarvestResult<()> {
        let ChromiumSession {
            mut browser,
            handler,
            page,
        } = *self;
        let _ = page.close().await;
        browser.close().await.map_err(session_err)?;
        let _ = browser.wait().await;
        handler.abort();
        Ok(())
    }
}

fn wrap(elements: Vec<Element>) -> Vec<Box<dyn NodeHandle>> {
    elements
        .into_iter()
        .map(|element| Box::new(ChromiumNode { element }) as Box<dyn NodeHandle>)
        .collect()
}

/// A live DOM element.
pub struct ChromiumNode {
    element: Element,
}

#[async_trait]
impl NodeHandle for ChromiumNode {
    async fn text(&self) -> HarvestResult<String> {
        Ok(self
            .element
            .inner_text()
            .await
            .map_err(session_err)?
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> HarvestResult<Option<String>> {
        self.element.attribute(name).await.map_err(session_err)
    }

    async fn query_all(&self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
        let elements = self
            .element
            .find_elements(selector)
            .await
            .map_err(session_err)?;
        Ok(wrap(elements))
    }
}
