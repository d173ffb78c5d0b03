//! The opaque "fetch a resource and query its structure" capability.
//!
//! This crate provides:
//! - [`Fetcher`]: the trait the enrichment pipeline depends on
//! - [`HttpFetcher`]: plain HTTP via a shared `reqwest` client
//! - [`RenderedFetcher`]: headless rendering through a Browserless-compatible service
//! - [`sources`]: directory and catalog page sources that locate seeds and detail pages

pub mod http;
pub mod page;
pub mod rendered;
pub mod sources;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use url::Url;

use intelscout_shared::{FetchConfig, FetchedPage, Result, browserless_token};

pub use http::HttpFetcher;
pub use page::{extract_links, parse_page, visible_text};
pub use rendered::RenderedFetcher;
pub use sources::{
    CompanyListing, DirectoryQuery, catalog_search_url, first_result_link, parse_company_cards,
    search_directory,
};

/// Fetches a remote document and exposes its source, visible text, and links.
///
/// Implementations must be shareable across concurrently running tasks.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one document. Any transport failure or non-success status is an error.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;

    /// Human-readable fetcher name for tracing.
    fn name(&self) -> &str;
}

/// Establish the fetch capability for a run.
///
/// Errors from here are fatal setup errors: without a fetcher nothing can be resolved.
pub fn build_fetcher(
    config: &FetchConfig,
    headless: bool,
    timeout: Duration,
) -> Result<Arc<dyn Fetcher>> {
    let fetcher: Arc<dyn Fetcher> = if headless {
        Arc::new(RenderedFetcher::new(
            config,
            browserless_token(config),
            timeout,
        )?)
    } else {
        Arc::new(HttpFetcher::new(config, timeout)?)
    };

    info!(fetcher = fetcher.name(), timeout_ms = timeout.as_millis() as u64, "fetch capability ready");
    Ok(fetcher)
}
