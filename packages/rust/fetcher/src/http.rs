//! Plain HTTP fetcher built on a shared, connection-pooled `reqwest` client.

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::debug;
use url::Url;

use intelscout_shared::{FetchConfig, FetchedPage, IntelScoutError, Result};

use crate::Fetcher;
use crate::page::parse_page;

/// Fallback User-Agent when the config lists none.
const DEFAULT_USER_AGENT: &str = concat!("IntelScout/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Fetches pages with a single GET request per URL.
///
/// The client is cloned into every task; cloning shares the connection pool.
pub struct HttpFetcher {
    client: Client,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
    /// Allow localhost/private IPs (for integration tests with mock servers).
    allow_localhost: bool,
}

impl HttpFetcher {
    /// Create a fetcher; failure to build the client is a fatal setup error.
    pub fn new(config: &FetchConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| IntelScoutError::setup(format!("failed to build HTTP client: {e}")))?;

        let user_agents = if config.user_agents.is_empty() {
            vec![DEFAULT_USER_AGENT.to_string()]
        } else {
            config.user_agents.clone()
        };

        Ok(Self {
            client,
            user_agents,
            next_agent: AtomicUsize::new(0),
            allow_localhost: false,
        })
    }

    /// Allow fetching localhost/private IPs (for integration tests).
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }

    /// Round-robin over the configured user agents.
    fn user_agent(&self) -> &str {
        let i = self.next_agent.fetch_add(1, Ordering::Relaxed);
        &self.user_agents[i % self.user_agents.len()]
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        if !self.allow_localhost && is_private_target(url) {
            return Err(IntelScoutError::validation(format!(
                "{url}: refusing to fetch a private or non-HTTP address"
            )));
        }

        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .header(USER_AGENT, self.user_agent())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntelScoutError::Network(format!("{url}: request timed out"))
                } else {
                    IntelScoutError::Network(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntelScoutError::Network(format!("{url}: HTTP {status}")));
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| IntelScoutError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(parse_page(&final_url, Some(status.as_u16()), body))
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ---------------------------------------------------------------------------
// Private-address protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a non-HTTP scheme or a private/loopback host.
pub(crate) fn is_private_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    if let Some(host) = url.host_str() {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return is_private_ip(&ip);
        }
        if host == "localhost" || host.ends_with(".local") || host.ends_with(".internal") {
            return true;
        }
    }

    false
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
