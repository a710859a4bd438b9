//! Progress UI (query spinner and download bar).

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while the catalog is queried; hidden when disabled.
pub(crate) fn query_spinner(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Querying The National Map...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Bar advancing once per finished download; hidden when disabled.
pub(crate) fn download_bar(enabled: bool, total: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} downloads ({elapsed})")
            .map(|style| style.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
