//! Static HTML implementation of the session traits.
//!
//! `HtmlNode` is an owned snapshot of one element (its outer HTML), so it is
//! `Send` and can cross await points even though `scraper` documents cannot.
//! Every query re-parses the snapshot. `HtmlPage` serves a saved page for
//! offline extraction and has no script engine.

use async_trait::async_trait;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::session::{NodeHandle, PageSession};
use crate::types::{HarvestError, HarvestResult};

/// Elements rendered on their own line by `text()`.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p",
    "section", "table", "tr", "ul",
];

/// Elements whose content is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

fn parse_selector(selector: &str) -> HarvestResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| HarvestError::Session(format!("invalid selector '{selector}': {e}")))
}

/// Approximate the browser's `innerText`: block elements and `<br>` break
/// lines, whitespace runs collapse, blank lines are dropped.
pub fn inner_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                // newlines in source are layout, not content
                out.push_str(&text.replace('\n', " "));
            }
            Node::Element(element) => {
                let tag = element.name();
                if HIDDEN_TAGS.contains(&tag) {
                    continue;
                }
                if tag == "br" {
                    out.push('\n');
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    out.push('\n');
                }
                collect_text(child_el, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Owned snapshot of one element.
#[derive(Debug, Clone)]
pub struct HtmlNode {
    html: String,
}

impl HtmlNode {
    /// Wrap the outer HTML of a single element.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn with_element<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> HarvestResult<R> {
        let fragment = Html::parse_fragment(&self.html);
        let root = fragment
            .root_element()
            .children()
            .find_map(ElementRef::wrap)
            .ok_or_else(|| HarvestError::Session("node snapshot holds no element".to_string()))?;
        Ok(f(root))
    }
}

#[async_trait]
impl NodeHandle for HtmlNode {
    async fn text(&self) -> HarvestResult<String> {
        self.with_element(inner_text)
    }

    async fn attribute(&self, name: &str) -> HarvestResult<Option<String>> {
        self.with_element(|el| el.value().attr(name).map(str::to_string))
    }

    async fn query_all(&self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
        let sel = parse_selector(selector)?;
        self.with_element(|el| {
            el.select(&sel)
                .map(|found| Box::new(HtmlNode::new(found.html())) as Box<dyn NodeHandle>)
                .collect()
        })
    }
}

/// A saved page served without a browser.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    html: String,
}

impl HtmlPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn select(&self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
        let sel = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        Ok(document
            .select(&sel)
            .map(|el| Box::new(HtmlNode::new(el.html())) as Box<dyn NodeHandle>)
            .collect())
    }
}

#[async_trait]
impl PageSession for HtmlPage {
    async fn navigate(&mut self, _url: &str, _timeout_ms: u64) -> HarvestResult<()> {
        Ok(())
    }

    async fn wait(&mut self, _ms: u64) -> HarvestResult<()> {
        Ok(())
    }

    async fn evaluate_script(&mut self, _script: &str) -> HarvestResult<serde_json::Value> {
        Err(HarvestError::Script(
            "static HTML page has no script engine".to_string(),
        ))
    }

    async fn query_all(&mut self, selector: &str) -> HarvestResult<Vec<Box<dyn NodeHandle>>> {
        self.select(selector)
    }

    async fn query_single(&mut self, selector: &str) -> HarvestResult<Option<Box<dyn NodeHandle>>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    async fn click(&mut self, _selector: &str) -> HarvestResult<bool> {
        Ok(false)
    }

    async fn content(&mut self) -> HarvestResult<String> {
        Ok(self.html.clone())
    }

    async fn screenshot(&mut self, _path: &str) -> HarvestResult<()> {
        Err(HarvestError::Session(
            "screenshots need a browser session".to_string(),
        ))
    }

    async fn close(self: Box<Self>) -> HarvestResult<()> {
        Ok(())
    }
}
