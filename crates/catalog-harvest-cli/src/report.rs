//! Summary statistics printed after a harvest.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use catalog_harvest::Product;
use serde::Serialize;

const PREVIEW_LEN: usize = 10;
const LINK_PREVIEW_CHARS: usize = 60;
const RULE: &str = "======================================================================";

/// Price statistics over a group of products. Products without a price are
/// counted but do not contribute to the price figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub count: usize,
    pub priced: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceStats {
    fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut count = 0;
        let mut prices = Vec::new();
        for product in products {
            count += 1;
            if let Some(price) = product.price_value {
                prices.push(price);
            }
        }

        let priced = prices.len();
        let mean = (priced > 0).then(|| prices.iter().sum::<f64>() / priced as f64);
        let min = prices.iter().copied().reduce(f64::min);
        let max = prices.iter().copied().reduce(f64::max);
        Self {
            count,
            priced,
            mean,
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category: String,
    pub stats: PriceStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCategoryRow {
    pub category: String,
    pub sub_category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub products: usize,
    pub categories: usize,
    pub sub_categories: usize,
    pub with_image: usize,
    pub prices: PriceStats,
}

/// Everything the summary shows, computed once from the exported products.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestReport {
    /// One row per category label, sorted by label.
    pub categories: Vec<CategoryRow>,
    /// Sorted by category label, then by descending count.
    pub sub_categories: Vec<SubCategoryRow>,
    pub preview: Vec<Product>,
    pub totals: Totals,
}

impl HarvestReport {
    pub fn from_products(products: &[Product]) -> Self {
        let mut by_category: BTreeMap<&str, Vec<&Product>> = BTreeMap::new();
        let mut by_sub: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for product in products {
            let label = product.category.label();
            by_category.entry(label).or_default().push(product);
            *by_sub.entry((label, product.sub_category.as_str())).or_default() += 1;
        }

        let categories = by_category
            .into_iter()
            .map(|(label, group)| CategoryRow {
                category: label.to_string(),
                stats: PriceStats::from_products(group),
            })
            .collect();

        let mut sub_categories: Vec<SubCategoryRow> = by_sub
            .into_iter()
            .map(|((category, sub_category), count)| SubCategoryRow {
                category: category.to_string(),
                sub_category: sub_category.to_string(),
                count,
            })
            .collect();
        // BTreeMap order already breaks count ties by sub-category; the sort is stable.
        sub_categories.sort_by(|a, b| a.category.cmp(&b.category).then(b.count.cmp(&a.count)));

        let distinct_categories: HashSet<_> = products.iter().map(|p| p.category).collect();
        let distinct_subs: HashSet<_> = products.iter().map(|p| p.sub_category.as_str()).collect();
        let totals = Totals {
            products: products.len(),
            categories: distinct_categories.len(),
            sub_categories: distinct_subs.len(),
            with_image: products.iter().filter(|p| !p.image_url.is_empty()).count(),
            prices: PriceStats::from_products(products),
        };

        Self {
            categories,
            sub_categories,
            preview: products.iter().take(PREVIEW_LEN).cloned().collect(),
            totals,
        }
    }
}

fn price(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics by category")?;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "  {:<14} {:>6} {:>10} {:>10} {:>10}",
            "category", "count", "mean", "min", "max"
        )?;
        for row in &self.categories {
            writeln!(
                f,
                "  {:<14} {:>6} {:>10} {:>10} {:>10}",
                row.category,
                row.stats.count,
                price(row.stats.mean),
                price(row.stats.min),
                price(row.stats.max)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Statistics by sub-category")?;
        writeln!(f, "{RULE}")?;
        for row in &self.sub_categories {
            writeln!(
                f,
                "  {:<14} {:<24} {:>6}",
                row.category, row.sub_category, row.count
            )?;
        }

        writeln!(f)?;
        writeln!(f, "First {} products", self.preview.len())?;
        writeln!(f, "{RULE}")?;
        for (idx, product) in self.preview.iter().enumerate() {
            writeln!(f, "{}. {}", idx + 1, product.normalized_title)?;
            writeln!(f, "   {} > {}", product.category, product.sub_category)?;
            if let Some(value) = product.price_value {
                writeln!(f, "   {value:.2} {}", product.currency)?;
            }
            if !product.link.is_empty() {
                let link: String = product.link.chars().take(LINK_PREVIEW_CHARS).collect();
                writeln!(f, "   {link}")?;
            }
        }

        let totals = &self.totals;
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Summary")?;
        writeln!(f, "  Products:       {}", totals.products)?;
        writeln!(f, "  Categories:     {}", totals.categories)?;
        writeln!(f, "  Sub-categories: {}", totals.sub_categories)?;
        writeln!(f, "  With price:     {}", totals.prices.priced)?;
        writeln!(f, "  Mean price:     {}", price(totals.prices.mean))?;
        writeln!(f, "  Min price:      {}", price(totals.prices.min))?;
        writeln!(f, "  Max price:      {}", price(totals.prices.max))?;
        write!(f, "  With image:     {}", totals.with_image)
    }
}
