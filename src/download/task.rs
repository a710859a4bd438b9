//! Turning selected products into download tasks with distinct destinations.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::filename::{derive_filename, sanitize_filename, split_extension};
use crate::catalog::{DatasetGroup, ProductDescriptor, UNCATEGORIZED_DATASET};

const MAX_ID_TAG_CHARS: usize = 64;

/// One product and the file it will be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// The product to fetch.
    pub product: ProductDescriptor,
    /// Final path of the downloaded file.
    pub destination: PathBuf,
}

/// Assigns destinations so no two tasks of one run share a path.
///
/// Files already on disk are not considered: re-running a download replaces
/// them.
#[derive(Debug, Default)]
pub struct TaskPlanner {
    taken: HashSet<PathBuf>,
}

impl TaskPlanner {
    /// Creates an empty planner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plans `product` into `dir`.
    ///
    /// The first product to claim a name gets it unchanged. Later ones become
    /// `<stem>_<id><ext>`, then `<stem>_<id>_<n><ext>`. Ids derived from the
    /// download URL are left out, giving `<stem>_<n><ext>`.
    pub fn plan(&mut self, product: ProductDescriptor, dir: &Path) -> DownloadTask {
        let filename = derive_filename(&product);
        let mut destination = dir.join(&filename);

        if self.taken.contains(&destination) {
            let (stem, ext) = split_extension(&filename);
            let base = match collision_tag(&product) {
                Some(tag) => format!("{stem}_{tag}"),
                None => stem.to_string(),
            };
            destination = dir.join(format!("{base}{ext}"));
            let mut n = 2;
            while self.taken.contains(&destination) {
                destination = dir.join(format!("{base}_{n}{ext}"));
                n += 1;
            }
            debug!(
                product_id = %product.id,
                destination = %destination.display(),
                "filename collision, disambiguated"
            );
        }

        self.taken.insert(destination.clone());
        DownloadTask {
            product,
            destination,
        }
    }
}

/// Sanitised id used to tell colliding files apart.
///
/// Ids that fell back to the download URL carry no information beyond the
/// name itself, so those collisions only get a numeric suffix.
fn collision_tag(product: &ProductDescriptor) -> Option<String> {
    if product.id == product.download_url {
        return None;
    }
    let tag: String = sanitize_filename(&product.id)
        .chars()
        .take(MAX_ID_TAG_CHARS)
        .collect();
    if tag.is_empty() { None } else { Some(tag) }
}

/// Plans every product directly into `output_dir`.
#[must_use]
pub fn plan_products(products: Vec<ProductDescriptor>, output_dir: &Path) -> Vec<DownloadTask> {
    let mut planner = TaskPlanner::new();
    products
        .into_iter()
        .map(|product| planner.plan(product, output_dir))
        .collect()
}

/// Plans each dataset's products into `output_dir/<dataset name>/`.
#[must_use]
pub fn plan_datasets(groups: Vec<DatasetGroup>, output_dir: &Path) -> Vec<DownloadTask> {
    let mut planner = TaskPlanner::new();
    let mut tasks = Vec::new();
    for group in groups {
        let dir = output_dir.join(dataset_dir_name(&group.name));
        for product in group.products {
            tasks.push(planner.plan(product, &dir));
        }
    }
    tasks
}

/// Directory name used for a dataset in dataset mode.
#[must_use]
pub fn dataset_dir_name(name: &str) -> String {
    let sanitized = sanitize_filename(name);
    if sanitized.trim_matches('_').is_empty() {
        UNCATEGORIZED_DATASET.to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, url: &str) -> ProductDescriptor {
        ProductDescriptor {
            id: id.to_string(),
            title: format!("title {id}"),
            download_url: url.to_string(),
            size_bytes: 1,
            format: "GeoTIFF".to_string(),
            datasets: vec!["NED".to_string()],
        }
    }

    #[test]
    fn test_distinct_names_kept() {
        let tasks = plan_products(
            vec![
                product("a", "https://x/1/a.tif"),
                product("b", "https://x/2/b.tif"),
            ],
            Path::new("/out"),
        );
        assert_eq!(tasks[0].destination, PathBuf::from("/out/a.tif"));
        assert_eq!(tasks[1].destination, PathBuf::from("/out/b.tif"));
    }

    #[test]
    fn test_colliding_names_get_id_suffix() {
        let tasks = plan_products(
            vec![
                product("first", "https://x/1/tile.tif"),
                product("second", "https://x/2/tile.tif"),
                product("second", "https://x/3/tile.tif"),
            ],
            Path::new("/out"),
        );
        assert_eq!(tasks[0].destination, PathBuf::from("/out/tile.tif"));
        assert_eq!(tasks[1].destination, PathBuf::from("/out/tile_second.tif"));
        assert_eq!(tasks[2].destination, PathBuf::from("/out/tile_second_2.tif"));
    }

    #[test]
    fn test_url_derived_ids_get_numeric_suffix() {
        let first = "https://host.example/x/1/tile.tif";
        let second = "https://host.example/x/2/tile.tif";
        let tasks = plan_products(
            vec![product(first, first), product(second, second)],
            Path::new("/out"),
        );
        assert_eq!(tasks[0].destination, PathBuf::from("/out/tile.tif"));
        assert_eq!(tasks[1].destination, PathBuf::from("/out/tile_2.tif"));
    }

    #[test]
    fn test_long_ids_are_truncated_in_suffix() {
        let long_id = "n".repeat(400);
        let tasks = plan_products(
            vec![
                product("a", "https://x/1/tile.tif"),
                product(&long_id, "https://x/2/tile.tif"),
            ],
            Path::new("/out"),
        );
        let name = tasks[1].destination.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, format!("tile_{}.tif", "n".repeat(MAX_ID_TAG_CHARS)));
        assert!(name.len() < 255);
    }

    #[test]
    fn test_dataset_mode_uses_subdirectories() {
        let groups = vec![
            DatasetGroup {
                name: "National Elevation Dataset (NED) 1/3 arc-second".to_string(),
                products: vec![product("a", "https://x/a.tif")],
            },
            DatasetGroup {
                name: "US Topo".to_string(),
                products: vec![product("b", "https://x/a.tif")],
            },
        ];
        let tasks = plan_datasets(groups, Path::new("/out"));
        assert_eq!(
            tasks[0].destination,
            PathBuf::from("/out/National Elevation Dataset (NED) 1_3 arc-second/a.tif")
        );
        assert_eq!(tasks[1].destination, PathBuf::from("/out/US Topo/a.tif"));
    }

    #[test]
    fn test_dataset_dir_name_falls_back() {
        assert_eq!(dataset_dir_name("//"), UNCATEGORIZED_DATASET);
        assert_eq!(dataset_dir_name("Lidar"), "Lidar");
    }
}
