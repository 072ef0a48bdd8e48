//! Flat CSV export of harvested products.

use std::io::Write;
use std::path::Path;

use crate::types::{HarvestResult, Product};

/// Exportable product columns, in their fixed output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Identifier,
    NormalizedTitle,
    RawTitle,
    Category,
    SubCategory,
    PriceValue,
    Currency,
    PriceText,
    Link,
    ImageUrl,
    Available,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Identifier,
        Column::NormalizedTitle,
        Column::RawTitle,
        Column::Category,
        Column::SubCategory,
        Column::PriceValue,
        Column::Currency,
        Column::PriceText,
        Column::Link,
        Column::ImageUrl,
        Column::Available,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Identifier => "identifier",
            Column::NormalizedTitle => "normalized_title",
            Column::RawTitle => "raw_title",
            Column::Category => "category",
            Column::SubCategory => "sub_category",
            Column::PriceValue => "price_value",
            Column::Currency => "currency",
            Column::PriceText => "price_text",
            Column::Link => "link",
            Column::ImageUrl => "image_url",
            Column::Available => "available",
        }
    }

    fn cell(self, product: &Product) -> String {
        match self {
            Column::Identifier => product.identifier.clone(),
            Column::NormalizedTitle => product.normalized_title.clone(),
            Column::RawTitle => product.raw_title.clone(),
            Column::Category => product.category.label().to_string(),
            Column::SubCategory => product.sub_category.clone(),
            // Debug keeps the fractional part: 219.0, 49.9
            Column::PriceValue => product
                .price_value
                .map(|v| format!("{v:?}"))
                .unwrap_or_default(),
            Column::Currency => product.currency.clone(),
            Column::PriceText => product.price_text.clone(),
            Column::Link => product.link.clone(),
            Column::ImageUrl => product.image_url.clone(),
            Column::Available => product.available.to_string(),
        }
    }
}

/// Projection of the fixed column order onto a subset of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportColumns {
    columns: Vec<Column>,
}

impl Default for ExportColumns {
    fn default() -> Self {
        Self::all()
    }
}

impl ExportColumns {
    pub fn all() -> Self {
        Self {
            columns: Column::ALL.to_vec(),
        }
    }

    /// Keep only `wanted`, in the fixed order, whatever order it lists them in.
    pub fn subset(wanted: &[Column]) -> Self {
        Self {
            columns: Column::ALL
                .iter()
                .copied()
                .filter(|c| wanted.contains(c))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    pub fn row(&self, product: &Product) -> Vec<String> {
        self.columns.iter().map(|c| c.cell(product)).collect()
    }
}

/// Write products as CSV (header row first) to any writer.
pub fn write_csv<W: Write>(
    products: &[Product],
    columns: &ExportColumns,
    writer: W,
) -> HarvestResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns.headers())?;
    for product in products {
        wtr.write_record(columns.row(product))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write products as a UTF-8 CSV file, creating parent directories.
pub fn write_csv_file(
    products: &[Product],
    columns: &ExportColumns,
    path: &Path,
) -> HarvestResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(products, columns, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn jean() -> Product {
        Product {
            identifier: "4815".to_string(),
            raw_title: "Jean slim\n+3 $ 49,90".to_string(),
            normalized_title: "Jean slim".to_string(),
            category: Category::Apparel,
            sub_category: "Pantalons".to_string(),
            price_text: "$ 49,90".to_string(),
            price_value: Some(49.9),
            currency: "CAD".to_string(),
            image_url: "https://static.zara.net/jean.jpg".to_string(),
            link: "https://www.zara.com/ca/fr/p/1".to_string(),
            available: true,
        }
    }

    fn render(products: &[Product], columns: &ExportColumns) -> String {
        let mut out = Vec::new();
        write_csv(products, columns, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_header_order() {
        assert_eq!(
            ExportColumns::all().headers(),
            vec![
                "identifier",
                "normalized_title",
                "raw_title",
                "category",
                "sub_category",
                "price_value",
                "currency",
                "price_text",
                "link",
                "image_url",
                "available",
            ]
        );
    }

    #[test]
    fn test_row_quotes_multiline_title() {
        let csv = render(&[jean()], &ExportColumns::all());
        let mut lines = csv.splitn(2, '\n');
        lines.next();
        assert_eq!(
            lines.next().unwrap(),
            "4815,Jean slim,\"Jean slim\n+3 $ 49,90\",Vêtements,Pantalons,49.9,CAD,\"$ 49,90\",\
             https://www.zara.com/ca/fr/p/1,https://static.zara.net/jean.jpg,true\n"
        );
    }

    #[test]
    fn test_subset_keeps_fixed_order() {
        let columns = ExportColumns::subset(&[Column::Link, Column::Identifier, Column::PriceValue]);
        assert_eq!(columns.headers(), vec!["identifier", "price_value", "link"]);

        let mut no_price = jean();
        no_price.price_value = None;
        let csv = render(&[no_price], &columns);
        assert_eq!(
            csv,
            "identifier,price_value,link\n4815,,https://www.zara.com/ca/fr/p/1\n"
        );
    }

    #[test]
    fn test_whole_price_keeps_fraction() {
        let mut product = jean();
        product.price_value = Some(219.0);
        assert_eq!(ExportColumns::subset(&[Column::PriceValue]).row(&product), vec!["219.0"]);
    }

    #[test]
    fn test_write_file_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("products.csv");
        write_csv_file(&[jean(), jean()], &ExportColumns::all(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("identifier,normalized_title"));
        assert_eq!(content.matches("4815,").count(), 2);
    }
}
