//! Error types for the catalog query client.

use thiserror::Error;

/// Errors that can occur while querying the product-search API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level failure (DNS, connection refused, TLS, reset).
    #[error("network error querying {url}: {source}")]
    Network {
        /// The request URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout querying {url}")]
    Timeout {
        /// The request URL.
        url: String,
    },

    /// The API answered with a non-success HTTP status.
    #[error("product API returned HTTP {status} for {url}")]
    Api {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The API answered 2xx but the body is not the expected JSON document.
    #[error("malformed product API response from {url}: {reason}")]
    Malformed {
        /// The request URL.
        url: String,
        /// What failed to parse.
        reason: String,
    },

    /// The configured endpoint is not a usable URL.
    #[error("invalid product API endpoint: {url}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl CatalogError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a malformed-payload error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for failures to reach the API at all.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}
