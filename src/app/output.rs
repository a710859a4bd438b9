//! CLI output formatting and display helpers.
//!
//! User-facing text goes to stdout; problems reported by the API go to stderr.

use std::path::Path;

use tnm_core::catalog::human_size;
use tnm_core::{CatalogResult, DownloadReport};

/// Message when the query matched nothing.
pub const NO_PRODUCTS_MESSAGE: &str = "No products found in requested extent";

/// Message when the checklist was confirmed with nothing ticked.
pub const NOTHING_SELECTED_MESSAGE: &str = "Nothing selected, nothing to download";

/// Prints the API's informational messages and reported errors.
pub(crate) fn print_api_notes(result: &CatalogResult) {
    for message in &result.messages {
        println!("Message: {message}");
    }
    for error in &result.errors {
        eprintln!("API error: {error}");
    }
}

pub(crate) fn found_line(result: &CatalogResult) -> String {
    let bytes: u64 = result.products.iter().map(|p| p.size_bytes).sum();
    let noun = if result.products.len() == 1 { "product" } else { "products" };
    format!(
        "Found {} {noun} ({}) of {} reported",
        result.products.len(),
        human_size(bytes),
        result.total
    )
}

pub(crate) fn summary_lines(report: &DownloadReport, output_dir: &Path) -> Vec<String> {
    let total = report.outcomes().len();
    let mut lines = vec![format!(
        "Downloaded {} of {total} files ({}) to {}",
        report.completed(),
        human_size(report.bytes_downloaded()),
        output_dir.display()
    )];

    if report.has_failures() {
        lines.push(format!("{} failed:", report.failed()));
        for (task, error) in report.failures() {
            lines.push(format!("  {}: {error}", task.product.id));
        }
    }

    if report.interrupted() {
        lines.push(format!(
            "Interrupted: {} downloads not finished",
            report.abandoned()
        ));
    }
    lines
}

pub(crate) fn print_summary(report: &DownloadReport, output_dir: &Path) {
    for line in summary_lines(report, output_dir) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tnm_core::ProductDescriptor;

    fn product(id: &str, size: u64) -> ProductDescriptor {
        ProductDescriptor {
            id: id.to_string(),
            title: id.to_string(),
            download_url: format!("https://example.com/{id}.tif"),
            size_bytes: size,
            format: "GeoTIFF".to_string(),
            datasets: Vec::new(),
        }
    }

    #[test]
    fn test_found_line_counts_and_sizes() {
        let result = CatalogResult {
            products: vec![product("a", 1024), product("b", 1024)],
            total: 2,
            messages: Vec::new(),
            errors: Vec::new(),
        };
        assert_eq!(found_line(&result), "Found 2 products (2 KB) of 2 reported");
    }

    #[test]
    fn test_summary_for_empty_report() {
        let lines = summary_lines(&DownloadReport::default(), Path::new("out"));
        assert_eq!(lines, ["Downloaded 0 of 0 files (0 bytes) to out"]);
    }
}
