//! HTTP client for the TNM product-search endpoint.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::CatalogError;
use super::product::ProductDescriptor;
use crate::extent::Extent;
use crate::user_agent;

/// Default product-search endpoint.
pub const DEFAULT_API_URL: &str = "https://tnmaccess.nationalmap.gov/api/v1/products";

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default connect timeout for catalog requests.
pub const DEFAULT_API_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default overall timeout for a single catalog request.
pub const DEFAULT_API_READ_TIMEOUT_SECS: u64 = 60;

// ==================== TNM API Response Types ====================

/// Top-level product-search response.
#[derive(Debug, Deserialize)]
pub(crate) struct TnmResponse {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub items: Vec<TnmItem>,
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// One entry in the `items` array.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TnmItem {
    pub title: Option<String>,
    pub source_id: Option<String>,
    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
    pub size_in_bytes: Option<u64>,
    pub format: Option<String>,
    #[serde(default)]
    pub datasets: Vec<String>,
}

impl TnmItem {
    fn into_descriptor(self) -> Option<ProductDescriptor> {
        let download_url = self.download_url.filter(|u| !u.trim().is_empty())?;
        let id = self
            .source_id
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| download_url.clone());
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| id.clone());
        Some(ProductDescriptor {
            id,
            title,
            download_url,
            size_bytes: self.size_in_bytes.unwrap_or(0),
            format: self.format.unwrap_or_default(),
            datasets: self.datasets,
        })
    }
}

// ==================== Query / Result ====================

/// What to search for.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    /// Area of interest.
    pub extent: Extent,
    /// Dataset names to restrict the search to (empty = all).
    pub datasets: Vec<String>,
    /// Product formats to restrict the search to (empty = all).
    pub formats: Vec<String>,
}

impl CatalogQuery {
    /// A query over `extent` with no filters.
    #[must_use]
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            datasets: Vec::new(),
            formats: Vec::new(),
        }
    }
}

/// Products found for a query, plus what the API said about it.
#[derive(Debug, Clone, Default)]
pub struct CatalogResult {
    /// Downloadable products in catalog order.
    pub products: Vec<ProductDescriptor>,
    /// Total match count reported by the API.
    pub total: u64,
    /// Informational messages from the API.
    pub messages: Vec<String>,
    /// Errors reported by the API alongside a successful response.
    pub errors: Vec<String>,
}

impl CatalogResult {
    /// True when no products intersect the extent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Connection settings for [`CatalogClient`].
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Product-search endpoint.
    pub base_url: String,
    /// Items per page (at least 1).
    pub page_size: u32,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Per-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            connect_timeout_secs: DEFAULT_API_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_API_READ_TIMEOUT_SECS,
        }
    }
}

// ==================== CatalogClient ====================

/// Queries the National Map product-search API.
///
/// The client pages through results with `offset`/`max` until the API's
/// reported `total` is reached or a short page comes back.
///
/// ```no_run
/// use tnm_core::{CatalogClient, CatalogQuery, Extent};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CatalogClient::new()?;
/// let extent: Extent = "-105.3,39.9,-105.1,40.1".parse()?;
/// let result = client.search(&CatalogQuery::new(extent)).await?;
/// println!("{} products", result.products.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    page_size: u32,
}

impl CatalogClient {
    /// Creates a client for the public endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_settings(CatalogSettings::default())
    }

    /// Creates a client against a custom endpoint (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidEndpoint`] if `base_url` is not a URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_settings(CatalogSettings {
            base_url: base_url.into(),
            ..CatalogSettings::default()
        })
    }

    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidEndpoint`] for an unusable endpoint and
    /// [`CatalogError::ClientBuild`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip_all, fields(base_url = %settings.base_url))]
    pub fn with_settings(settings: CatalogSettings) -> Result<Self, CatalogError> {
        let base_url = Url::parse(&settings.base_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| CatalogError::InvalidEndpoint {
                url: settings.base_url.clone(),
            })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.read_timeout_secs))
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(CatalogError::ClientBuild)?;

        Ok(Self {
            client,
            base_url,
            page_size: settings.page_size.max(1),
        })
    }

    /// Searches for products intersecting the query extent.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Network`] / [`CatalogError::Timeout`] if the API is unreachable
    /// - [`CatalogError::Api`] on a non-success status
    /// - [`CatalogError::Malformed`] if a response body is not the expected JSON
    #[instrument(skip(self, query), fields(bbox = %query.extent))]
    pub async fn search(&self, query: &CatalogQuery) -> Result<CatalogResult, CatalogError> {
        let mut result = CatalogResult::default();
        let mut seen_ids = HashSet::new();
        let mut offset: u64 = 0;

        loop {
            let page = self.fetch_page(query, offset).await?;
            let page_len = page.items.len() as u64;
            if let Some(total) = page.total {
                result.total = total;
            }

            // Only the first page's messages matter; later pages repeat them.
            if offset == 0 {
                result.messages = page.messages.iter().map(value_to_text).collect();
                result.errors = page.errors.iter().map(value_to_text).collect();
            }

            let mut added = 0usize;
            for item in page.items {
                let title = item.title.clone().unwrap_or_default();
                match item.into_descriptor() {
                    Some(product) => {
                        if seen_ids.insert(product.id.clone()) {
                            result.products.push(product);
                            added += 1;
                        } else {
                            debug!(id = %product.id, "skipping duplicate product");
                        }
                    }
                    None => warn!(%title, "skipping product without a download URL"),
                }
            }

            offset += page_len;
            let reached_total = page.total.is_some_and(|total| offset >= total);
            if page_len == 0 || page_len < u64::from(self.page_size) || reached_total {
                break;
            }
            // Without a total, a full page of known ids means the server ignores `offset`.
            if page.total.is_none() && added == 0 {
                warn!(offset, "catalog page added no new products, stopping pagination");
                break;
            }
            debug!(offset, total = result.total, "fetching next page");
        }

        if result.total == 0 {
            result.total = offset;
        }

        info!(
            products = result.products.len(),
            total = result.total,
            "catalog query complete"
        );
        Ok(result)
    }

    fn page_url(&self, query: &CatalogQuery, offset: u64) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("bbox", &query.extent.to_bbox_param())
                .append_pair("offset", &offset.to_string())
                .append_pair("max", &self.page_size.to_string())
                .append_pair("outputFormat", "JSON");
            if !query.datasets.is_empty() {
                pairs.append_pair("datasets", &query.datasets.join(","));
            }
            if !query.formats.is_empty() {
                pairs.append_pair("prodFormats", &query.formats.join(","));
            }
        }
        url
    }

    async fn fetch_page(
        &self,
        query: &CatalogQuery,
        offset: u64,
    ) -> Result<TnmResponse, CatalogError> {
        let url = self.page_url(query, offset);
        let url_text = url.to_string();
        debug!(url = %url_text, "requesting catalog page");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CatalogError::from_request(url_text.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Api {
                url: url_text,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::from_request(url_text.clone(), e))?;

        serde_json::from_slice::<TnmResponse>(&body)
            .map_err(|e| CatalogError::malformed(url_text, e.to_string()))
    }

    /// Returns the configured endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
