use crate::domain::site_root;
use crate::entry::{CandidateOrigin, Discovery, SitemapCandidate};
use crate::fetch::Fetcher;
use crate::parser::parse_robots_sitemaps;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info};

/// Conventional sitemap locations probed on the main domain
pub const DEFAULT_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/wp-sitemap.xml",
    "/sitemaps.xml",
];

/// Subdomain prefixes probed for their own `/sitemap.xml`
pub const DEFAULT_SUBDOMAINS: &[&str] = &[
    "www",
    "blog",
    "careers",
    "jobs",
    "shop",
    "store",
    "support",
    "investors",
    "ir",
    "news",
];

pub const DEFAULT_CONCURRENCY: usize = 8;

/// Finds candidate sitemap URLs for a domain.
pub struct SitemapLocator {
    fetcher: Fetcher,
    scheme: String,
    sitemap_paths: Vec<String>,
    subdomains: Vec<String>,
    concurrency: usize,
}

impl SitemapLocator {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            scheme: "https".to_string(),
            sitemap_paths: DEFAULT_SITEMAP_PATHS.iter().map(|s| s.to_string()).collect(),
            subdomains: DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    pub fn with_sitemap_paths(mut self, paths: Vec<String>) -> Self {
        self.sitemap_paths = paths;
        self
    }

    pub fn with_subdomains(mut self, subdomains: Vec<String>) -> Self {
        self.subdomains = subdomains;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Locate sitemaps for a normalized domain.
    ///
    /// Never fails: unreachable hosts, DNS errors and timeouts only remove
    /// candidates. Every configured subdomain counts as checked.
    pub async fn discover(&self, domain: &str) -> Discovery {
        info!("Locating sitemaps for {}", domain);
        let base = site_root(&self.scheme, domain);

        let (robots, probed) = tokio::join!(self.robots_candidates(&base), self.probe_candidates(domain));

        let mut seen = HashSet::new();
        let candidates: Vec<SitemapCandidate> = robots
            .into_iter()
            .chain(probed)
            .filter(|candidate| seen.insert(candidate.url.clone()))
            .collect();

        info!(
            "Found {} sitemap candidate(s) for {} ({} subdomains checked)",
            candidates.len(),
            domain,
            self.subdomains.len()
        );

        Discovery {
            candidates,
            subdomains_checked: self.subdomains.len(),
        }
    }

    async fn robots_candidates(&self, base: &str) -> Vec<SitemapCandidate> {
        let robots_url = format!("{}/robots.txt", base);
        match self.fetcher.fetch_short(&robots_url).await {
            Ok(body) => {
                let sitemaps = parse_robots_sitemaps(&body);
                debug!("{} lists {} sitemap(s)", robots_url, sitemaps.len());
                sitemaps
                    .into_iter()
                    .map(|url| SitemapCandidate::new(url, CandidateOrigin::Robots))
                    .collect()
            }
            Err(e) => {
                debug!("No usable robots.txt at {}: {}", robots_url, e);
                Vec::new()
            }
        }
    }

    fn probe_targets(&self, domain: &str) -> Vec<SitemapCandidate> {
        let base = site_root(&self.scheme, domain);
        let main = self.sitemap_paths.iter().map(|path| {
            SitemapCandidate::new(format!("{}{}", base, path), CandidateOrigin::Conventional)
        });
        let subdomains = self.subdomains.iter().map(|sub| {
            let host = format!("{}.{}", sub, domain);
            SitemapCandidate::new(
                format!("{}/sitemap.xml", site_root(&self.scheme, &host)),
                CandidateOrigin::Subdomain(sub.clone()),
            )
        });
        main.chain(subdomains).collect()
    }

    async fn probe_candidates(&self, domain: &str) -> Vec<SitemapCandidate> {
        let targets = self.probe_targets(domain);

        // buffered keeps declaration order while bounding parallelism
        let results: Vec<Option<SitemapCandidate>> = stream::iter(targets)
            .map(|candidate| async move {
                match self.fetcher.exists(&candidate.url).await {
                    Ok(true) => {
                        debug!("Found sitemap at {} ({})", candidate.url, candidate.origin.label());
                        Some(candidate)
                    }
                    Ok(false) => None,
                    Err(e) => {
                        debug!("Probe failed for {}: {}", candidate.url, e);
                        None
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}
