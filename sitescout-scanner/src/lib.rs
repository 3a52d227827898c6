pub mod domain;
pub mod entry;
pub mod error;
pub mod expander;
pub mod fetch;
pub mod locator;
pub mod parser;

pub use domain::normalize_domain;
pub use entry::{CandidateOrigin, ChangeFrequency, Discovery, PageEntry, SitemapCandidate};
pub use error::ScanError;
pub use expander::SitemapExpander;
pub use fetch::Fetcher;
pub use locator::SitemapLocator;
pub use parser::{SitemapDocument, parse_robots_sitemaps, parse_sitemap};
