//! Catalog queries against the USGS National Map product-search API.
//!
//! The API is an external, versioned contract: requests carry the extent as
//! `bbox=xmin,ymin,xmax,ymax` plus optional `datasets` / `prodFormats`
//! filters, and responses are JSON documents of the form
//!
//! ```text
//! { "total": 2, "items": [ { "title", "sourceId", "downloadURL",
//!   "sizeInBytes", "format", "datasets": [..] }, .. ],
//!   "messages": [..], "errors": [..] }
//! ```
//!
//! [`CatalogClient::search`] returns every page as one [`CatalogResult`].

mod client;
mod error;
mod product;

pub use client::{
    CatalogClient, CatalogQuery, CatalogResult, CatalogSettings, DEFAULT_API_CONNECT_TIMEOUT_SECS,
    DEFAULT_API_READ_TIMEOUT_SECS, DEFAULT_API_URL, DEFAULT_PAGE_SIZE,
};
pub use error::CatalogError;
pub use product::{
    DatasetGroup, ProductDescriptor, UNCATEGORIZED_DATASET, group_by_dataset, human_size,
};
