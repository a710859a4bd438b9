//! Product descriptors and the dataset grouping used for selection.

use std::collections::BTreeMap;

/// Group name for products the API lists under no dataset.
pub const UNCATEGORIZED_DATASET: &str = "Uncategorized";

const SIZE_UNITS: [&str; 7] = [" bytes", " KB", " MB", " GB", " TB", " PB", " EB"];

/// A downloadable product returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDescriptor {
    /// Stable product identifier (TNM `sourceId`, or the download URL).
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Direct download URL.
    pub download_url: String,
    /// Size in bytes as reported by the catalog (0 when unknown).
    pub size_bytes: u64,
    /// Format tag such as `GeoTIFF` or `LAS,LAZ` (empty when unknown).
    pub format: String,
    /// Names of the datasets this product belongs to.
    pub datasets: Vec<String>,
}

impl ProductDescriptor {
    /// Checklist label: `title | format | size`.
    #[must_use]
    pub fn label(&self) -> String {
        let size = human_size(self.size_bytes);
        if self.format.is_empty() {
            format!("{} | {size}", self.title)
        } else {
            format!("{} | {} | {size}", self.title, self.format)
        }
    }
}

/// All products listed under one dataset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetGroup {
    /// Dataset name as reported by the API.
    pub name: String,
    /// Products in catalog order.
    pub products: Vec<ProductDescriptor>,
}

impl DatasetGroup {
    /// Sum of the product sizes in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.products.iter().map(|p| p.size_bytes).sum()
    }

    /// Checklist label: `name | N items @ size`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} | {} items @ {}",
            self.name,
            self.products.len(),
            human_size(self.total_size())
        )
    }
}

/// Groups products by dataset name, sorted by name.
///
/// A product listed under several datasets appears in each of them.
#[must_use]
pub fn group_by_dataset(products: &[ProductDescriptor]) -> Vec<DatasetGroup> {
    let mut groups: BTreeMap<&str, Vec<ProductDescriptor>> = BTreeMap::new();
    for product in products {
        if product.datasets.is_empty() {
            groups
                .entry(UNCATEGORIZED_DATASET)
                .or_default()
                .push(product.clone());
            continue;
        }
        for dataset in &product.datasets {
            groups.entry(dataset.as_str()).or_default().push(product.clone());
        }
    }
    groups
        .into_iter()
        .map(|(name, products)| DatasetGroup {
            name: name.to_string(),
            products,
        })
        .collect()
}

/// Formats a byte count with binary units, truncating (e.g. `1536` -> `1 KB`).
#[must_use]
pub fn human_size(bytes: u64) -> String {
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1024 && unit < SIZE_UNITS.len() - 1 {
        value >>= 10;
        unit += 1;
    }
    format!("{value}{}", SIZE_UNITS[unit])
}
