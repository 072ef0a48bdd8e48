//! Edge case integration tests for catalog-harvest-cli.

use std::path::PathBuf;

use catalog_harvest::{Harvest, HarvestConfig, HarvestPipeline, Taxonomy};
use catalog_harvest_cli::commands::{export_harvest, run_extract};
use catalog_harvest_cli::{load_harvest_config, resolve_output_path, HarvestReport};

// ─────────────────────── helpers ───────────────────────

fn empty_harvest() -> Harvest {
    Harvest {
        products: Vec::new(),
        scroll: None,
        fragments_seen: 0,
        skipped: 0,
        extracted: 0,
        used_anchor_fallback: false,
    }
}

fn card(id: u32, href: &str, title: &str, price: &str) -> String {
    format!(
        r#"<li class="product-grid-product" data-productid="{id}">
            <a href="{href}"></a><h3>{title}</h3><span class="price">{price}</span>
        </li>"#
    )
}

// ─────────────────────── output resolution ───────────────────────

#[test]
fn test_output_env_then_default() {
    std::env::set_var("CATALOG_HARVEST_OUTPUT", "/tmp/harvest/env.csv");
    assert_eq!(resolve_output_path(None), PathBuf::from("/tmp/harvest/env.csv"));
    assert_eq!(
        resolve_output_path(Some("flag.csv")),
        PathBuf::from("flag.csv")
    );

    std::env::set_var("CATALOG_HARVEST_OUTPUT", "  ");
    assert_eq!(
        resolve_output_path(None),
        PathBuf::from("zara_homme_structure.csv")
    );

    std::env::remove_var("CATALOG_HARVEST_OUTPUT");
    assert_eq!(
        resolve_output_path(None),
        PathBuf::from("zara_homme_structure.csv")
    );
}

// ─────────────────────── configuration ───────────────────────

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harvest.json");
    std::fs::write(&path, r#"{"scroll": {"stagnation_threshold": 0}}"#).unwrap();

    let err = load_harvest_config(Some(&path), None).unwrap_err();
    assert!(format!("{err:#}").contains("invalid harvest configuration"));
}

// ─────────────────────── export ───────────────────────

#[test]
fn test_empty_harvest_writes_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("products.csv");
    assert!(!export_harvest(&empty_harvest(), &output).unwrap());
    assert!(!output.exists());
}

#[tokio::test]
async fn test_duplicate_titles_keep_first_row() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("catalog.html");
    let output = dir.path().join("nested").join("products.csv");
    let html = format!(
        "<ul>{}{}{}</ul>",
        card(1, "/ca/fr/product/pull-1.html", "Pull col rond", "$ 39,90"),
        card(2, "/ca/fr/product/pull-2.html", "Pull col rond", "$ 45,90"),
        card(3, "/ca/fr/product/polo-3.html", "Polo manches courtes", "$ 29,90"),
    );
    std::fs::write(&page, html).unwrap();

    let pipeline = HarvestPipeline::new(HarvestConfig::default(), Taxonomy::default()).unwrap();
    run_extract(&pipeline, &page, &output, false).await.unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    let rows: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("1,Pull col rond,"));
    assert!(rows[0].contains(",39.9,"));
    assert!(rows[1].starts_with("3,Polo manches courtes,"));
}

// ─────────────────────── report ───────────────────────

#[test]
fn test_report_without_prices() {
    let report = HarvestReport::from_products(&[]);
    let text = report.to_string();
    assert!(text.contains("  Products:       0"));
    assert!(text.contains("  Max price:      -"));
}
