//! Per-mode strategies that turn one seed into a [`CacheEntry`].

use std::sync::Arc;

use async_trait::async_trait;
use scraper::Selector;
use tracing::{debug, instrument, warn};
use url::Url;

use intelscout_extract::{
    CatalogExtractor, FactExtractor, SocialRegistry, TechnologyRegistry, extract_team_members,
    is_team_page,
};
use intelscout_fetcher::{Fetcher, catalog_search_url, first_result_link};
use intelscout_shared::{
    AppConfig, CacheEntry, ExtractedFields, Failure, IntelScoutError, Mode, Result, SeedEntity,
    join_list,
};

/// Resolves a seed against its remote detail resource.
///
/// Resolution never fails outright: every failure is encoded in the entry.
#[async_trait]
pub trait Resolver: Send + Sync {
    fn name(&self) -> &str;

    /// Fields that, when all already filled in the input, make a fetch unnecessary.
    ///
    /// An empty list means seeds are always resolved.
    fn target_fields(&self) -> &[String] {
        &[]
    }

    /// Upper bound on sequential fetches for one seed.
    fn fetch_budget(&self) -> u32 {
        1
    }

    async fn resolve(&self, seed: &SeedEntity) -> CacheEntry;
}

/// Immutable pattern registries shared by extraction and reporting.
#[derive(Debug, Clone)]
pub struct Registries {
    pub technologies: Arc<TechnologyRegistry>,
    pub social: Arc<SocialRegistry>,
}

impl Registries {
    /// Built-in registries extended with the configured technologies.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            technologies: Arc::new(TechnologyRegistry::with_extra(&config.technologies)?),
            social: Arc::new(SocialRegistry::builtin()),
        })
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            technologies: Arc::new(TechnologyRegistry::builtin()),
            social: Arc::new(SocialRegistry::builtin()),
        }
    }
}

/// Build the resolver for `mode`. Configuration problems are fatal.
pub fn build_resolver(
    mode: Mode,
    config: &AppConfig,
    registries: &Registries,
    fetcher: Arc<dyn Fetcher>,
    deep_analysis: bool,
) -> Result<Arc<dyn Resolver>> {
    let resolver: Arc<dyn Resolver> = match mode {
        Mode::Company => Arc::new(
            CompanyResolver::new(
                fetcher,
                FactExtractor::company(registries.technologies.clone(), registries.social.clone()),
            )
            .with_deep_analysis(deep_analysis),
        ),
        Mode::Catalog => Arc::new(CatalogResolver::new(
            fetcher,
            &config.catalog.search_url,
            &config.catalog.result_selector,
            CatalogExtractor::new(config.catalog.labels.clone()),
        )?),
    };
    Ok(resolver)
}

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

/// Sub-pages tried during deep analysis, in order.
const DEEP_PAGES: &[&str] = &[
    "/about",
    "/about-us",
    "/team",
    "/contact",
    "/pricing",
    "/products",
    "/services",
];

/// How many of [`DEEP_PAGES`] are visited per company.
const MAX_DEEP_PAGES: usize = 3;

/// Maximum team members kept across all visited sub-pages.
const MAX_TEAM: usize = 5;

/// Visits a company's website and extracts its intelligence profile.
pub struct CompanyResolver {
    fetcher: Arc<dyn Fetcher>,
    extractor: FactExtractor,
    deep_analysis: bool,
}

impl CompanyResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: FactExtractor) -> Self {
        Self {
            fetcher,
            extractor,
            deep_analysis: false,
        }
    }

    pub fn with_deep_analysis(mut self, enabled: bool) -> Self {
        self.deep_analysis = enabled;
        self
    }

    /// Visit well-known sub-pages; pages that fail to load are skipped.
    async fn deep_analyze(&self, base: &Url, fields: &mut ExtractedFields) {
        let mut visited: Vec<&str> = Vec::new();
        let mut team: Vec<String> = Vec::new();

        for path in DEEP_PAGES.iter().take(MAX_DEEP_PAGES) {
            let Ok(url) = base.join(path) else {
                continue;
            };
            match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    visited.push(path);
                    if is_team_page(path) {
                        for name in extract_team_members(&page.text) {
                            if team.len() < MAX_TEAM && !team.contains(&name) {
                                team.push(name);
                            }
                        }
                    }
                }
                Err(e) => debug!(%url, error = %e, "sub-page skipped"),
            }
        }

        fields.set("deep_pages", join_list(&visited));
        fields.set("team", join_list(&team));
    }
}

#[async_trait]
impl Resolver for CompanyResolver {
    fn name(&self) -> &str {
        "company"
    }

    fn fetch_budget(&self) -> u32 {
        if self.deep_analysis {
            1 + MAX_DEEP_PAGES as u32
        } else {
            1
        }
    }

    #[instrument(skip_all, fields(key = %seed.key))]
    async fn resolve(&self, seed: &SeedEntity) -> CacheEntry {
        let url = match website_url(&seed.locator) {
            Ok(url) => url,
            Err(e) => return CacheEntry::Error(Failure::detail(e.to_string())),
        };

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "company site unreachable");
                return CacheEntry::Error(Failure::detail(e.to_string()));
            }
        };

        let mut fields = self.extractor.extract(&page);
        fields.set("final_url", page.url.clone());
        fields.set("analyzed_at", page.fetched_at.to_rfc3339());

        if self.deep_analysis {
            let base = Url::parse(&page.url).unwrap_or(url);
            self.deep_analyze(&base, &mut fields).await;
        }

        CacheEntry::Found(fields)
    }
}

/// Parse a website locator, assuming https when no scheme is given.
pub fn website_url(locator: &str) -> Result<Url> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(IntelScoutError::validation("no website to visit"));
    }
    let candidate = if locator.contains("://") {
        locator.to_string()
    } else {
        format!("https://{locator}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| IntelScoutError::validation(format!("invalid website '{locator}': {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(IntelScoutError::validation(format!(
            "unsupported website '{locator}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Looks a title up in a library catalog and reads its detail record.
pub struct CatalogResolver {
    fetcher: Arc<dyn Fetcher>,
    search_template: String,
    result_selector: String,
    extractor: CatalogExtractor,
    targets: Vec<String>,
}

impl CatalogResolver {
    /// Fails when the search URL template or result selector is unusable.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        search_template: &str,
        result_selector: &str,
        extractor: CatalogExtractor,
    ) -> Result<Self> {
        catalog_search_url(search_template, "probe")?;
        Selector::parse(result_selector).map_err(|e| {
            IntelScoutError::config(format!("invalid catalog result selector '{result_selector}': {e:?}"))
        })?;

        Ok(Self {
            fetcher,
            search_template: search_template.to_string(),
            result_selector: result_selector.to_string(),
            extractor,
            targets: ["author", "publisher", "year"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        })
    }
}

#[async_trait]
impl Resolver for CatalogResolver {
    fn name(&self) -> &str {
        "catalog"
    }

    fn target_fields(&self) -> &[String] {
        &self.targets
    }

    fn fetch_budget(&self) -> u32 {
        2
    }

    #[instrument(skip_all, fields(key = %seed.key))]
    async fn resolve(&self, seed: &SeedEntity) -> CacheEntry {
        let search_url = match catalog_search_url(&self.search_template, &seed.locator) {
            Ok(url) => url,
            Err(e) => return CacheEntry::Error(Failure::search(e.to_string())),
        };

        let results = match self.fetcher.fetch(&search_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %search_url, error = %e, "catalog search failed");
                return CacheEntry::Error(Failure::search(e.to_string()));
            }
        };

        let base = Url::parse(&results.url).unwrap_or(search_url);
        let detail_url = match first_result_link(&results.html, &base, &self.result_selector) {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(title = %seed.display_name, "no catalog match");
                return CacheEntry::NotFound;
            }
            Err(e) => return CacheEntry::Error(Failure::search(e.to_string())),
        };

        match self.fetcher.fetch(&detail_url).await {
            Ok(page) => CacheEntry::Found(self.extractor.extract(&page)),
            Err(e) => {
                warn!(url = %detail_url, error = %e, "catalog detail failed");
                CacheEntry::Error(Failure::detail(e.to_string()))
            }
        }
    }
}
