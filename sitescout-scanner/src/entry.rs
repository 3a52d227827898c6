use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Where a sitemap candidate was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateOrigin {
    /// `Sitemap:` directive in the main domain's robots.txt
    Robots,
    /// Conventional path probed on the main domain
    Conventional,
    /// `/sitemap.xml` on a probed subdomain
    Subdomain(String),
}

impl CandidateOrigin {
    pub fn is_subdomain(&self) -> bool {
        matches!(self, CandidateOrigin::Subdomain(_))
    }

    pub fn label(&self) -> String {
        match self {
            CandidateOrigin::Robots => "robots.txt".to_string(),
            CandidateOrigin::Conventional => "main domain".to_string(),
            CandidateOrigin::Subdomain(name) => format!("subdomain '{}'", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapCandidate {
    pub url: String,
    pub origin: CandidateOrigin,
}

impl SitemapCandidate {
    pub fn new(url: impl Into<String>, origin: CandidateOrigin) -> Self {
        Self {
            url: url.into(),
            origin,
        }
    }
}

/// Outcome of locating sitemaps for one domain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Discovery {
    pub candidates: Vec<SitemapCandidate>,
    pub subdomains_checked: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl FromStr for ChangeFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "always" => Ok(ChangeFrequency::Always),
            "hourly" => Ok(ChangeFrequency::Hourly),
            "daily" => Ok(ChangeFrequency::Daily),
            "weekly" => Ok(ChangeFrequency::Weekly),
            "monthly" => Ok(ChangeFrequency::Monthly),
            "yearly" => Ok(ChangeFrequency::Yearly),
            "never" => Ok(ChangeFrequency::Never),
            other => Err(format!("unknown change frequency '{}'", other)),
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single page declared in a urlset sitemap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<ChangeFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_priority: Option<f32>,
}

impl PageEntry {
    /// Build an entry for an absolute URL, deriving its title from the path
    pub fn new(url: String) -> Self {
        let title = derive_title(&url);
        Self {
            url,
            title,
            last_modified: None,
            change_frequency: None,
            declared_priority: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_change_frequency(mut self, change_frequency: ChangeFrequency) -> Self {
        self.change_frequency = Some(change_frequency);
        self
    }

    /// Priorities outside 0.0..=1.0 are discarded
    pub fn with_priority(mut self, priority: f32) -> Self {
        self.declared_priority = (0.0..=1.0).contains(&priority).then_some(priority);
        self
    }
}

/// Derive a human readable title from the last path segment of a URL.
///
/// The root path becomes `"Home"`; dashes and underscores become spaces,
/// common page extensions are dropped and each word is capitalized.
pub fn derive_title(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string());

    let Some(segment) = last_segment else {
        return Some("Home".to_string());
    };

    let decoded = percent_decode(&segment);
    let lower = decoded.to_lowercase();
    let stem = [".html", ".htm", ".php", ".aspx", ".asp"]
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| &decoded[..decoded.len() - ext.len()])
        .unwrap_or(&decoded);

    let title = stem
        .split(['-', '_', ' ', '+'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() { None } else { Some(title) }
}

fn percent_decode(segment: &str) -> String {
    url::form_urlencoded::parse(segment.as_bytes())
        .map(|(k, v)| if v.is_empty() { k.into_owned() } else { format!("{}={}", k, v) })
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse a sitemap `lastmod` value (W3C datetime profile and common variants)
pub fn parse_lastmod(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // 2024-01-15T10:00+00:00 (no seconds)
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}
