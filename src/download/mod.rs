//! HTTP download engine for streaming selected products to disk.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large elevation and lidar tiles)
//! - Writes to `<file>.part` and renames on success, so a failed re-run never
//!   truncates an earlier good file
//! - Bounded worker pool with per-task outcomes
//! - Optional retry of transient failures with exponential backoff
//! - Configurable timeouts (30s connect, 5min read by default)
//!
//! # Example
//!
//! ```no_run
//! use tnm_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let bytes = client
//!     .download("https://example.com/USGS_13_n40w106.tif", Path::new("./USGS_13_n40w106.tif"))
//!     .await?;
//! println!("Downloaded {bytes} bytes");
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod filename;
mod retry;
mod task;

pub use client::{HttpClient, partial_path};
pub use engine::{DownloadEngine, DownloadReport, EngineError, TaskOutcome, TaskStatus};
pub use error::DownloadError;
pub use filename::{derive_filename, sanitize_filename, split_extension};
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, MAX_RETRIES_LIMIT, RetryDecision, RetryPolicy,
    classify_error,
};
pub use task::{DownloadTask, TaskPlanner, dataset_dir_name, plan_datasets, plan_products};
