//! Configuration loading and resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catalog_harvest::{HarvestConfig, Taxonomy, TaxonomyRules};

pub const DEFAULT_OUTPUT_FILE: &str = "zara_homme_structure.csv";
pub const DEFAULT_SCREENSHOT_FILE: &str = "zara_final.png";

/// Resolve the CSV output path: explicit flag, then `CATALOG_HARVEST_OUTPUT`,
/// then the working-directory default.
pub fn resolve_output_path(explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return PathBuf::from(path);
    }

    if let Ok(env_path) = std::env::var("CATALOG_HARVEST_OUTPUT") {
        if !env_path.trim().is_empty() {
            return PathBuf::from(env_path);
        }
    }

    PathBuf::from(DEFAULT_OUTPUT_FILE)
}

/// Load the harvest configuration, or the built-in defaults when no file is given.
/// A `--url` override replaces the configured target.
pub fn load_harvest_config(path: Option<&Path>, url: Option<&str>) -> Result<HarvestConfig> {
    let mut config = match path {
        Some(path) => HarvestConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };
    if let Some(url) = url {
        config.target_url = url.to_string();
    }
    config.validate().context("invalid harvest configuration")?;
    Ok(config)
}

/// Load taxonomy rules from JSON, or the built-in catalog rules.
pub fn load_taxonomy(path: Option<&Path>) -> Result<Taxonomy> {
    let rules = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read taxonomy {}", path.display()))?;
            TaxonomyRules::from_json(&json)
                .with_context(|| format!("invalid taxonomy {}", path.display()))?
        }
        None => TaxonomyRules::default(),
    };
    Ok(Taxonomy::new(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_harvest::Category;

    #[test]
    fn test_explicit_output_wins() {
        assert_eq!(
            resolve_output_path(Some("out/products.csv")),
            PathBuf::from("out/products.csv")
        );
    }

    #[test]
    fn test_default_config_with_url_override() {
        let config =
            load_harvest_config(None, Some("https://www.zara.com/ca/fr/femme-l1000.html")).unwrap();
        assert_eq!(config.target_url, "https://www.zara.com/ca/fr/femme-l1000.html");
        assert_eq!(config.item_selector, "li.product-grid-product");
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvest.json");
        std::fs::write(
            &path,
            r#"{"max_items": 50, "scroll": {"mode": {"type": "fixed_steps", "steps": 4, "step_px": 1000}}}"#,
        )
        .unwrap();

        let config = load_harvest_config(Some(&path), None).unwrap();
        assert_eq!(config.max_items, Some(50));
        assert_eq!(config.scroll.settle_delay_ms, 2500);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_harvest_config(Some(&dir.path().join("absent.json")), None).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config"));
    }

    #[test]
    fn test_taxonomy_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.json");
        std::fs::write(
            &path,
            r#"{
                "categories": [{"category": "Footwear", "keywords": ["SABOT"]}],
                "default_category": "Apparel",
                "ladders": [],
                "unclassified": "Divers"
            }"#,
        )
        .unwrap();

        let taxonomy = load_taxonomy(Some(&path)).unwrap();
        assert_eq!(
            taxonomy.classify("Sabot en cuir"),
            (Category::Footwear, "Divers".to_string())
        );
    }
}
