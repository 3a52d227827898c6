use crate::domain::{belongs_to_domain, extract_url_path, resolve_url, same_host};
use crate::entry::{ChangeFrequency, PageEntry, SitemapCandidate, parse_lastmod};
use crate::fetch::Fetcher;
use crate::parser::{SitemapDocument, UrlRecord, parse_sitemap};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Expands sitemap candidates into flat page lists.
///
/// One expander serves one discovery pipeline: the visited set is shared by
/// every `expand` call, so a sitemap reachable from several candidates (or
/// from itself) is fetched at most once.
pub struct SitemapExpander {
    fetcher: Fetcher,
    domain: String,
    visited: Arc<Mutex<HashSet<String>>>,
    max_depth: usize,
    max_pages: usize,
}

impl SitemapExpander {
    pub fn new(fetcher: Fetcher, domain: &str) -> Self {
        Self {
            fetcher,
            domain: domain.to_string(),
            visited: Arc::new(Mutex::new(HashSet::new())),
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Expand one candidate into the pages it declares.
    ///
    /// Works through a bounded worklist of `(url, depth)`; documents at
    /// `max_depth` or beyond are not fetched. Fetch and parse failures drop
    /// only the document that failed.
    pub async fn expand(&self, candidate: &SitemapCandidate) -> Vec<PageEntry> {
        let mut pages = Vec::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((candidate.url.clone(), 0));

        while let Some((url, depth)) = queue.pop_front() {
            if depth >= self.max_depth {
                debug!("Depth limit reached, skipping {}", url);
                continue;
            }
            if pages.len() >= self.max_pages {
                debug!("Page limit reached for {}", candidate.url);
                break;
            }

            // Check and mark as visited
            let first_visit = {
                let mut visited = self.visited.lock().await;
                visited.insert(url.clone())
            };
            if !first_visit {
                debug!("Already expanded {}", url);
                continue;
            }

            let body = match self.fetcher.fetch_text(&url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Failed to fetch sitemap {}: {}", url, e);
                    continue;
                }
            };

            match parse_sitemap(&body) {
                Ok(SitemapDocument::Index(records)) => {
                    debug!("{} is an index of {} sitemap(s)", url, records.len());
                    for record in records {
                        let Some(child) = resolve_url(&url, &record.loc) else {
                            continue;
                        };
                        if self.accepts_child(&url, &child) {
                            queue.push_back((child, depth + 1));
                        } else {
                            debug!("Skipping foreign sitemap {} listed in {}", child, url);
                        }
                    }
                }
                Ok(SitemapDocument::UrlSet(records)) => {
                    debug!("{} lists {} url(s)", url, records.len());
                    let remaining = self.max_pages - pages.len();
                    pages.extend(
                        records
                            .into_iter()
                            .filter_map(|record| self.page_from_record(&url, record))
                            .take(remaining),
                    );
                }
                Err(e) => {
                    warn!("Ignoring malformed sitemap {}: {}", url, e);
                }
            }
        }

        info!(
            "Expanded {} ({}) into {} page(s)",
            candidate.url,
            candidate.origin.label(),
            pages.len()
        );
        pages
    }

    pub async fn visited_count(&self) -> usize {
        self.visited.lock().await.len()
    }

    /// Index children must stay on the domain family, or on the host of the
    /// index listing them (a robots.txt sitemap served from a CDN)
    fn accepts_child(&self, index_url: &str, child: &str) -> bool {
        belongs_to_domain(child, &self.domain) || same_host(index_url, child)
    }

    fn page_from_record(&self, document_url: &str, record: UrlRecord) -> Option<PageEntry> {
        let url = resolve_url(document_url, &record.loc)?;
        if !belongs_to_domain(&url, &self.domain) || is_sitemap_document(&url) {
            debug!("Dropping {} (outside {} or not a page)", url, self.domain);
            return None;
        }

        let mut page = PageEntry::new(url);
        if let Some(lastmod) = record.lastmod.as_deref().and_then(parse_lastmod) {
            page = page.with_last_modified(lastmod);
        }
        if let Some(freq) = record
            .changefreq
            .as_deref()
            .and_then(|f| f.parse::<ChangeFrequency>().ok())
        {
            page = page.with_change_frequency(freq);
        }
        if let Some(priority) = record
            .priority
            .as_deref()
            .and_then(|p| p.trim().parse::<f32>().ok())
        {
            page = page.with_priority(priority);
        }
        Some(page)
    }
}

/// URLs pointing at further XML documents are not pages
fn is_sitemap_document(url: &str) -> bool {
    let lower = extract_url_path(url).to_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".xml.gz")
}
