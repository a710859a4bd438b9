//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use tnm_core::download::constants::{DEFAULT_WORKERS, READ_TIMEOUT_SECS};
use tnm_core::download::{DEFAULT_MAX_RETRIES, MAX_RETRIES_LIMIT};
use tnm_core::{Extent, parse_extent};

/// Download USGS National Map products inside a bounding box.
///
/// Queries The National Map product catalog for everything intersecting the
/// extent, lets you tick the products (or whole datasets) you want, then
/// downloads them in parallel.
#[derive(Parser, Debug)]
#[command(name = "tnm-download")]
#[command(author, version, about)]
pub struct Args {
    /// Bounding box as "xmin,ymin,xmax,ymax" in WGS84 decimal degrees
    #[arg(short, long, value_parser = parse_extent, allow_hyphen_values = true)]
    pub extent: Extent,

    /// Directory to save downloads into (created if absent)
    #[arg(short, long = "output_dir", visible_alias = "output-dir")]
    pub output_dir: PathBuf,

    /// Number of parallel downloads (1-64)
    #[arg(short, long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub threads: u8,

    /// Only list products from this dataset (repeatable)
    #[arg(short = 'd', long = "dataset", value_name = "NAME")]
    pub datasets: Vec<String>,

    /// Only list products in this format, e.g. GeoTIFF (repeatable)
    #[arg(short = 'f', long = "format", value_name = "FMT")]
    pub formats: Vec<String>,

    /// Pick whole datasets instead of individual products
    #[arg(long)]
    pub by_dataset: bool,

    /// Download everything found without prompting
    #[arg(long)]
    pub all: bool,

    /// Retries for transient download failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_RETRIES_LIMIT)))]
    pub retries: u8,

    /// Per-download read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Product-search API endpoint
    #[arg(long, value_name = "URL", env = "TNM_API_URL")]
    pub api_url: Option<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}
