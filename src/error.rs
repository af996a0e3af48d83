//! Error types for the scraping pipeline.
//!
//! Only [`ScrapeError`] ever reaches the caller of [`crate::scrape`]. The
//! browser and resolver enums describe failures that the pipeline absorbs per
//! record (link resolution, enrichment navigation) or that surface through
//! `ScrapeError` when the page itself cannot be loaded. [`ConfigError`] is
//! returned by [`crate::UserConfig::load`] before any scrape starts.

use thiserror::Error;

/// Failures raised by a [`crate::browser::Browser`] or its pages.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Browser API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Page has not navigated anywhere yet")]
    NotNavigated,

    #[error("No element matches selector {0}")]
    ElementNotFound(String),
}

impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        BrowserError::Network(err.to_string())
    }
}

/// Why a click-through link could not be turned into a publisher URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Not an aggregator article link: {0}")]
    NotAggregatorLink(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("No publisher URL found for {0}")]
    Unresolved(String),

    #[error("Resolved target is not a valid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::Request(err.to_string())
    }
}

/// Problems loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// The failure surfaced by a whole scrape invocation.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to load news page: {0}")]
    Browser(#[from] BrowserError),

    #[error("Failed to set up link resolver: {0}")]
    Resolver(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
