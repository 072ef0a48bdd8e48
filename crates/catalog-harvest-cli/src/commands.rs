//! `catalog-harvest` commands: a live harvest and offline extraction.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catalog_harvest::{
    write_csv_file, ExportColumns, Harvest, HarvestConfig, HarvestPipeline, HtmlPage, PageSession,
    Taxonomy,
};

use crate::chromium::{ChromiumSession, LaunchOptions};
use crate::report::HarvestReport;

/// Options of a live harvest.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub config: HarvestConfig,
    pub taxonomy: Taxonomy,
    pub output: PathBuf,
    pub screenshot: Option<PathBuf>,
    pub launch: LaunchOptions,
    /// Print the report as JSON instead of text.
    pub json: bool,
}

/// Drive Chromium through the catalog, export the products, print the report.
pub async fn run_harvest(options: HarvestOptions) -> Result<()> {
    let pipeline = HarvestPipeline::new(options.config, options.taxonomy)?;

    tracing::info!("launching browser");
    let session = ChromiumSession::launch(&options.launch).await?;
    let mut session: Box<dyn PageSession> = Box::new(session);

    let result = harvest_page(&pipeline, session.as_mut(), options.screenshot.as_deref()).await;
    if let Err(e) = session.close().await {
        tracing::warn!("browser did not close cleanly: {e}");
    }
    let harvest = result?;

    finish(&harvest, &options.output, options.json)
}

async fn harvest_page(
    pipeline: &HarvestPipeline,
    session: &mut dyn PageSession,
    screenshot: Option<&Path>,
) -> Result<Harvest> {
    pipeline
        .open_catalog(session)
        .await
        .context("failed to open the catalog page")?;
    let harvest = pipeline.harvest(session).await?;

    if let Some(path) = screenshot {
        match session.screenshot(&path.display().to_string()).await {
            Ok(()) => tracing::info!("screenshot saved to {}", path.display()),
            Err(e) => tracing::warn!("screenshot not captured: {e}"),
        }
    }
    Ok(harvest)
}

/// Extract products from a saved catalog page without a browser.
pub async fn run_extract(
    pipeline: &HarvestPipeline,
    html_file: &Path,
    output: &Path,
    json: bool,
) -> Result<()> {
    let html = std::fs::read_to_string(html_file)
        .with_context(|| format!("failed to read {}", html_file.display()))?;
    let mut page = HtmlPage::new(html);
    let harvest = pipeline.collect(&mut page).await?;
    finish(&harvest, output, json)
}

/// Export and report a harvest. An empty harvest writes nothing.
/// Returns whether a file was written.
pub fn export_harvest(harvest: &Harvest, output: &Path) -> Result<bool> {
    if harvest.products.is_empty() {
        return Ok(false);
    }
    write_csv_file(&harvest.products, &ExportColumns::all(), output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(true)
}

fn finish(harvest: &Harvest, output: &Path, json: bool) -> Result<()> {
    let written = export_harvest(harvest, output)?;
    let report = HarvestReport::from_products(&harvest.products);

    if json {
        let value = serde_json::json!({
            "output": written.then(|| output.display().to_string()),
            "fragments_seen": harvest.fragments_seen,
            "extracted": harvest.extracted,
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!(
        "  {} products extracted, {} kept after cleanup",
        harvest.extracted,
        harvest.products.len()
    );
    if !written {
        println!("\nNo products found. Nothing was written.");
        return Ok(());
    }

    println!("\n{} products exported: {}\n", harvest.products.len(), output.display());
    println!("{report}");
    Ok(())
}
