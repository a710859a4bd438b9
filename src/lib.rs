//! TNM Download Core Library
//!
//! Core functionality for `tnm-download`, which finds USGS National Map
//! products inside a geographic extent and downloads the ones the user picks.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`extent`] - Parsing and validating `xmin,ymin,xmax,ymax` bounding boxes
//! - [`catalog`] - Product-search API client and result grouping
//! - [`select`] - Interactive checklist and non-interactive selectors
//! - [`download`] - Bounded-concurrency download engine with streaming support

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod download;
pub mod extent;
pub mod select;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use catalog::{
    CatalogClient, CatalogError, CatalogQuery, CatalogResult, CatalogSettings, DatasetGroup,
    ProductDescriptor, group_by_dataset,
};
pub use download::{
    DownloadEngine, DownloadError, DownloadReport, DownloadTask, EngineError, HttpClient,
    RetryPolicy, TaskOutcome, TaskStatus,
};
pub use extent::{Extent, InvalidExtent, parse_extent};
pub use select::{SelectAll, SelectError, Selector, TerminalSelector, pick};
