use crate::cache::{CacheKey, CachedPages, DEFAULT_TTL, PageCache};
use crate::model::{CacheClearReport, RelevantPages, ScoredPage};
use crate::scoring::score_pages;
use futures::stream::{self, StreamExt};
use sitescout_scanner::expander::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use sitescout_scanner::fetch::{DEFAULT_FETCH_TIMEOUT, DEFAULT_PROBE_TIMEOUT, DEFAULT_USER_AGENT};
use sitescout_scanner::locator::{DEFAULT_CONCURRENCY, DEFAULT_SITEMAP_PATHS, DEFAULT_SUBDOMAINS};
use sitescout_scanner::{
    Discovery, Fetcher, PageEntry, ScanError, SitemapExpander, SitemapLocator, normalize_domain,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Callback for reporting resolution progress
pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Tunables for one `PageService`
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Scheme used to build site URLs; `http` only for local fixtures
    pub scheme: String,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
    pub concurrency: usize,
    pub max_depth: usize,
    pub max_pages: usize,
    pub cache_ttl: Duration,
    pub subdomains: Vec<String>,
    pub sitemap_paths: Vec<String>,
    pub user_agent: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            cache_ttl: DEFAULT_TTL,
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            sitemap_paths: DEFAULT_SITEMAP_PATHS.iter().map(|s| s.to_string()).collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Ranked pages of one resolution, before truncation
struct Resolution {
    pages: Vec<ScoredPage>,
    subdomains_checked: usize,
    sitemaps_found: usize,
    error: Option<String>,
}

/// Resolves a company website into its most relevant pages.
///
/// Owns the HTTP client and an optional cache. Cache failures are logged
/// and treated as misses; no request ever fails because of them.
pub struct PageService {
    config: ServiceConfig,
    fetcher: Fetcher,
    cache: Option<Arc<dyn PageCache>>,
    progress: Option<ProgressCallback>,
}

impl PageService {
    pub fn new(config: ServiceConfig) -> Result<Self, ScanError> {
        let fetcher =
            Fetcher::with_user_agent(&config.user_agent, config.probe_timeout, config.fetch_timeout)?;
        Ok(Self {
            config,
            fetcher,
            cache: None,
            progress: None,
        })
    }

    pub fn with_cache(mut self, cache: Arc<dyn PageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn report(&self, message: String) {
        debug!("{}", message);
        if let Some(ref callback) = self.progress {
            callback(message);
        }
    }

    fn locator(&self) -> SitemapLocator {
        SitemapLocator::new(self.fetcher.clone())
            .with_scheme(&self.config.scheme)
            .with_sitemap_paths(self.config.sitemap_paths.clone())
            .with_subdomains(self.config.subdomains.clone())
            .with_concurrency(self.config.concurrency)
    }

    /// Locate sitemap candidates for an already normalized domain
    pub async fn locate(&self, domain: &str) -> Discovery {
        self.report(format!("Locating sitemaps for {}", domain));
        self.locator().discover(domain).await
    }

    /// Top `limit` pages of a company website, ranked by relevance.
    ///
    /// Never fails: every problem is reported through `error` with an empty
    /// or partial page list.
    pub async fn get_relevant_pages(
        &self,
        website_url: Option<&str>,
        company_name: &str,
        limit: usize,
    ) -> RelevantPages {
        let Some(website) = website_url.map(str::trim).filter(|w| !w.is_empty()) else {
            return RelevantPages::failure("No website URL on file");
        };
        let Some(domain) = normalize_domain(website) else {
            return RelevantPages::failure(format!("Invalid website URL: {}", website));
        };

        let key = CacheKey::new(&domain, company_name);
        if let Some(cached) = self.cache_lookup(&key) {
            info!("Cache hit for {}", key.as_string());
            self.report(format!("Using cached results for {}", domain));
            return RelevantPages {
                total_found: cached.total_found,
                subdomains_checked: cached.subdomains_checked,
                sitemaps_found: cached.sitemaps_found,
                pages: cached.pages.into_iter().take(limit).collect(),
                from_cache: true,
                error: None,
            };
        }

        let resolution = self.resolve(&domain, company_name).await;
        let total_found = resolution.pages.len();

        if !resolution.pages.is_empty() {
            self.cache_store(
                &key,
                CachedPages {
                    pages: resolution.pages.clone(),
                    total_found,
                    subdomains_checked: resolution.subdomains_checked,
                    sitemaps_found: resolution.sitemaps_found,
                },
            );
        }

        RelevantPages {
            pages: resolution.pages.into_iter().take(limit).collect(),
            total_found,
            subdomains_checked: resolution.subdomains_checked,
            sitemaps_found: resolution.sitemaps_found,
            from_cache: false,
            error: resolution.error,
        }
    }

    async fn resolve(&self, domain: &str, company_name: &str) -> Resolution {
        let discovery = self.locate(domain).await;
        let sitemaps_found = discovery.candidates.len();

        if discovery.candidates.is_empty() {
            warn!("No sitemap found for {}", domain);
            return Resolution {
                pages: Vec::new(),
                subdomains_checked: discovery.subdomains_checked,
                sitemaps_found,
                error: Some(format!("No sitemap found for {}", domain)),
            };
        }

        self.report(format!("Expanding {} sitemap(s)", sitemaps_found));
        let expander = SitemapExpander::new(self.fetcher.clone(), domain)
            .with_max_depth(self.config.max_depth)
            .with_max_pages(self.config.max_pages);

        // Concurrent, but collected in candidate order so deduplication is stable
        let batches: Vec<Vec<PageEntry>> = stream::iter(discovery.candidates.iter())
            .map(|candidate| expander.expand(candidate))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let entries = dedup_by_url(batches.into_iter().flatten());
        debug!(
            "{} unique page(s) from {} sitemap document(s)",
            entries.len(),
            expander.visited_count().await
        );

        if entries.is_empty() {
            warn!("No pages found in {} sitemap(s) for {}", sitemaps_found, domain);
            return Resolution {
                pages: Vec::new(),
                subdomains_checked: discovery.subdomains_checked,
                sitemaps_found,
                error: Some(format!(
                    "No pages found in {} sitemap(s) for {}",
                    sitemaps_found, domain
                )),
            };
        }

        self.report(format!("Scoring {} page(s)", entries.len()));
        let pages = score_pages(&entries, company_name, domain);
        info!("Ranked {} page(s) for {}", pages.len(), domain);

        Resolution {
            pages,
            subdomains_checked: discovery.subdomains_checked,
            sitemaps_found,
            error: None,
        }
    }

    fn cache_lookup(&self, key: &CacheKey) -> Option<CachedPages> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(entry) => entry.map(|e| e.value),
            Err(e) => {
                warn!("Cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    fn cache_store(&self, key: &CacheKey, value: CachedPages) {
        let Some(ref cache) = self.cache else {
            return;
        };
        if let Err(e) = cache.put(key, value, self.config.cache_ttl) {
            warn!("Cache write failed: {}", e);
        }
    }

    /// Drop every cached entry
    pub fn clear_cache(&self) -> CacheClearReport {
        let Some(ref cache) = self.cache else {
            return CacheClearReport {
                success: true,
                message: "Cache is disabled; nothing to clear".to_string(),
                entries_removed: 0,
            };
        };

        match cache.clear() {
            Ok(removed) => {
                info!("Cleared {} cache entries", removed);
                CacheClearReport {
                    success: true,
                    message: format!("Cache cleared ({} entries removed)", removed),
                    entries_removed: removed,
                }
            }
            Err(e) => {
                warn!("Failed to clear cache: {}", e);
                CacheClearReport {
                    success: false,
                    message: format!("Failed to clear cache: {}", e),
                    entries_removed: 0,
                }
            }
        }
    }
}

/// Keep the first occurrence of each URL
pub fn dedup_by_url(entries: impl IntoIterator<Item = PageEntry>) -> Vec<PageEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.url.clone()))
        .collect()
}
