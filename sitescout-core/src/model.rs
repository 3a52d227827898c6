use serde::{Deserialize, Serialize};
use sitescout_scanner::PageEntry;
use sitescout_scanner::domain::path_segments;
use std::fmt;

/// Business category assigned to a page by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Homepage,
    About,
    Services,
    Products,
    Careers,
    Leadership,
    Investors,
    News,
    CaseStudies,
    Locations,
    Other,
}

impl Category {
    /// Every category, in matching priority order
    pub const ALL: [Category; 11] = [
        Category::Homepage,
        Category::About,
        Category::Services,
        Category::Products,
        Category::Careers,
        Category::Leadership,
        Category::Investors,
        Category::News,
        Category::CaseStudies,
        Category::Locations,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Homepage => "homepage",
            Category::About => "about",
            Category::Services => "services",
            Category::Products => "products",
            Category::Careers => "careers",
            Category::Leadership => "leadership",
            Category::Investors => "investors",
            Category::News => "news",
            Category::CaseStudies => "caseStudies",
            Category::Locations => "locations",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Human readable label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::Homepage => "Homepage",
            Category::About => "About",
            Category::Services => "Services",
            Category::Products => "Products",
            Category::Careers => "Careers",
            Category::Leadership => "Leadership",
            Category::Investors => "Investors",
            Category::News => "News",
            Category::CaseStudies => "Case Studies",
            Category::Locations => "Locations",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page with its relevance score and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredPage {
    #[serde(flatten)]
    pub page: PageEntry,
    pub relevance_score: u8,
    pub category: Category,
}

impl ScoredPage {
    pub fn url(&self) -> &str {
        &self.page.url
    }

    pub fn title(&self) -> Option<&str> {
        self.page.title.as_deref()
    }

    /// Number of non-empty path segments
    pub fn depth(&self) -> usize {
        path_segments(&self.page.url).len()
    }
}

/// Outcome of one relevant-pages request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevantPages {
    pub pages: Vec<ScoredPage>,
    pub total_found: usize,
    pub subdomains_checked: usize,
    pub sitemaps_found: usize,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelevantPages {
    /// An empty result carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Acknowledgement returned by the cache clear operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearReport {
    pub success: bool,
    pub message: String,
    pub entries_removed: usize,
}
