// Relevance scoring for sitemap pages.
//
// Scores are additive: base (declared priority), category bonus, company
// name mention, recency, the largest matching penalty and URL structure,
// clamped to 0..=100. Nothing here touches the network or the clock; the
// current time is passed in.

use crate::model::{Category, ScoredPage};
use chrono::{DateTime, Utc};
use sitescout_scanner::PageEntry;
use sitescout_scanner::domain::{extract_url_path, path_segments, subdomain_labels};
use std::cmp::Ordering;
use url::Url;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Base score when a page declares no priority
pub const DEFAULT_BASE: i32 = 5;

pub const NAME_IN_PATH_BONUS: i32 = 5;
pub const NAME_IN_TITLE_BONUS: i32 = 3;

pub const ROOT_PATH_BONUS: i32 = 8;
pub const SINGLE_SEGMENT_BONUS: i32 = 5;
pub const QUERY_STRING_PENALTY: i32 = -2;
pub const LONG_URL_PENALTY: i32 = -3;
pub const LONG_URL_THRESHOLD: usize = 120;

struct CategoryRule {
    category: Category,
    bonus: i32,
    /// A path segment starting with one of these matches
    prefixes: &'static [&'static str],
    /// A path segment equal to one of these matches
    segments: &'static [&'static str],
    /// Fallback phrases looked up in the derived title
    title_phrases: &'static [&'static str],
}

// Homepage is decided on the whole path, see `is_homepage`.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::About,
        bonus: 15,
        prefixes: &["about", "company", "who-we-are", "our-story", "our-company", "mission", "history"],
        segments: &["story", "overview"],
        title_phrases: &["about", "who we are", "our story", "our company"],
    },
    CategoryRule {
        category: Category::Services,
        bonus: 12,
        prefixes: &["service", "solution", "what-we-do", "capabilit", "expertise", "industries"],
        segments: &[],
        title_phrases: &["services", "solutions", "what we do"],
    },
    CategoryRule {
        category: Category::Products,
        bonus: 12,
        prefixes: &["product", "platform", "features", "pricing"],
        segments: &[],
        title_phrases: &["products", "platform", "pricing"],
    },
    CategoryRule {
        category: Category::Careers,
        bonus: 11,
        prefixes: &["career", "job", "join-us", "work-with-us", "hiring", "openings", "vacancies", "opportunities"],
        segments: &["work-here"],
        title_phrases: &["careers", "jobs", "join us", "open positions"],
    },
    CategoryRule {
        category: Category::Leadership,
        bonus: 10,
        prefixes: &["leadership", "team", "our-team", "management", "executive", "board", "founder"],
        segments: &["people"],
        title_phrases: &["leadership", "our team", "management", "board of directors"],
    },
    CategoryRule {
        category: Category::Investors,
        bonus: 10,
        prefixes: &["investor", "shareholder", "annual-report", "financials"],
        segments: &["ir", "stock"],
        title_phrases: &["investor", "shareholder"],
    },
    CategoryRule {
        category: Category::News,
        bonus: 8,
        prefixes: &["news", "press", "media", "blog", "announcement", "updates", "insights"],
        segments: &[],
        title_phrases: &["news", "press release", "announcement"],
    },
    CategoryRule {
        category: Category::CaseStudies,
        bonus: 6,
        prefixes: &["case-stud", "case_stud", "casestud", "customer-stor", "success-stor", "testimonial", "portfolio"],
        segments: &["customers", "clients"],
        title_phrases: &["case stud", "success stor", "customer stor"],
    },
    CategoryRule {
        category: Category::Locations,
        bonus: 5,
        prefixes: &["location", "office", "contact", "find-us", "where-we-are"],
        segments: &[],
        title_phrases: &["locations", "offices", "contact"],
    },
];

const HOMEPAGE_BONUS: i32 = 20;
const HOMEPAGE_PATHS: &[&str] = &["/", "/index.html", "/index.htm", "/index.php", "/home"];

// Penalty keywords match whole path segments (file extension ignored), so
// `/services/accounting` or `/cartography` stay unpenalized.
const ACCOUNT_PENALTY: i32 = -15;
const ACCOUNT_SEGMENTS: &[&str] = &[
    "login", "log-in", "signin", "sign-in", "signup", "sign-up", "register", "registration",
    "admin", "wp-admin", "wp-login", "account", "accounts", "my-account", "myaccount", "cart",
    "basket", "checkout", "logout", "log-out",
];

const LEGAL_PENALTY: i32 = -12;
const LEGAL_SEGMENTS: &[&str] = &[
    "privacy", "privacy-policy", "privacy-notice", "privacy-statement", "terms", "terms-of-use",
    "terms-of-service", "terms-and-conditions", "terms-conditions", "tos", "cookie", "cookies",
    "cookie-policy", "cookie-settings", "legal", "legal-notice", "gdpr", "disclaimer", "imprint",
];

const SEARCH_PENALTY: i32 = -10;
const SEARCH_QUERY_KEYS: &[&str] = &["s", "q", "search"];

const DOWNLOAD_PENALTY: i32 = -8;
const DOWNLOAD_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "csv", "jpg", "jpeg", "png", "gif",
    "svg", "webp", "exe", "dmg",
];

const ARCHIVE_PENALTY: i32 = -5;
const ARCHIVE_SEGMENTS: &[&str] = &["tag", "tags", "author", "feed", "rss"];

/// Bonus awarded for a category
pub fn category_bonus(category: Category) -> i32 {
    if category == Category::Homepage {
        return HOMEPAGE_BONUS;
    }
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.category == category)
        .map(|rule| rule.bonus)
        .unwrap_or(0)
}

fn is_homepage(url: &str) -> bool {
    let path = extract_url_path(url).to_lowercase();
    let trimmed = if path.len() > 1 { path.trim_end_matches('/') } else { path.as_str() };
    HOMEPAGE_PATHS.contains(&trimmed)
}

fn matching_rule(segments: &[String]) -> Option<&'static CategoryRule> {
    CATEGORY_RULES.iter().find(|rule| {
        segments.iter().any(|segment| {
            rule.prefixes.iter().any(|p| segment.starts_with(p))
                || rule.segments.contains(&segment.as_str())
        })
    })
}

/// Classify a page of `domain` by its URL path, then its subdomain, then its title.
///
/// Only the root of the domain itself (or its `www.` host) is the homepage;
/// the root of `careers.<domain>` is a careers page.
pub fn classify(url: &str, title: Option<&str>, domain: &str) -> Category {
    let labels = subdomain_labels(url, domain);
    if labels.is_empty() && is_homepage(url) {
        return Category::Homepage;
    }

    let segments: Vec<String> = path_segments(url).iter().map(|s| s.to_lowercase()).collect();
    if let Some(rule) = matching_rule(&segments) {
        return rule.category;
    }
    if let Some(rule) = matching_rule(&labels) {
        return rule.category;
    }

    if let Some(title) = title {
        let title = title.to_lowercase();
        for rule in CATEGORY_RULES {
            if rule.title_phrases.iter().any(|phrase| title.contains(phrase)) {
                return rule.category;
            }
        }
    }

    Category::Other
}

/// Lowercase the name and collapse punctuation and whitespace runs to single spaces
pub fn normalize_company_name(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn name_bonus(url: &str, title: Option<&str>, normalized_name: &str) -> i32 {
    if normalized_name.is_empty() {
        return 0;
    }

    let mut bonus = 0;
    let path = extract_url_path(url).to_lowercase();
    let slugs = [
        normalized_name.to_string(),
        normalized_name.replace(' ', "-"),
        normalized_name.replace(' ', "_"),
        normalized_name.replace(' ', ""),
    ];
    if slugs.iter().any(|slug| path.contains(slug.as_str())) {
        bonus += NAME_IN_PATH_BONUS;
    }
    if let Some(title) = title
        && title.to_lowercase().contains(normalized_name)
    {
        bonus += NAME_IN_TITLE_BONUS;
    }
    bonus
}

fn recency_bonus(last_modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(modified) = last_modified else {
        return 0;
    };
    let age_days = (now - modified).num_days().max(0);
    match age_days {
        0..=30 => 3,
        31..=90 => 1,
        91..=365 => 0,
        _ => -2,
    }
}

fn query_keys(url: &str) -> Vec<String> {
    Url::parse(url)
        .map(|u| u.query_pairs().map(|(k, _)| k.to_lowercase()).collect())
        .unwrap_or_default()
}

fn has_query(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.query().map(|q| !q.is_empty()))
        .unwrap_or(false)
}

/// The single largest penalty matching the URL, or 0
fn penalty(url: &str) -> i32 {
    let segments: Vec<String> = path_segments(url).iter().map(|s| s.to_lowercase()).collect();
    let matches_segment = |keywords: &[&str]| {
        segments.iter().any(|s| {
            let stem = s.rsplit_once('.').map_or(s.as_str(), |(stem, _)| stem);
            keywords.contains(&stem)
        })
    };

    let mut worst = 0;

    if matches_segment(ACCOUNT_SEGMENTS) {
        worst = worst.min(ACCOUNT_PENALTY);
    }
    if matches_segment(LEGAL_SEGMENTS) {
        worst = worst.min(LEGAL_PENALTY);
    }

    let search_segment = segments.iter().any(|s| s == "search");
    let search_query = query_keys(url)
        .iter()
        .any(|k| SEARCH_QUERY_KEYS.contains(&k.as_str()));
    if search_segment || search_query {
        worst = worst.min(SEARCH_PENALTY);
    }

    if let Some(last) = segments.last()
        && let Some((_, ext)) = last.rsplit_once('.')
        && DOWNLOAD_EXTENSIONS.contains(&ext)
    {
        worst = worst.min(DOWNLOAD_PENALTY);
    }

    let archive = segments.iter().enumerate().any(|(i, s)| {
        ARCHIVE_SEGMENTS.contains(&s.as_str())
            || (s == "page"
                && segments
                    .get(i + 1)
                    .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit())))
    });
    if archive {
        worst = worst.min(ARCHIVE_PENALTY);
    }

    worst
}

fn structure_adjustment(url: &str) -> i32 {
    let mut adjustment = match path_segments(url).len() {
        0 => ROOT_PATH_BONUS,
        1 => SINGLE_SEGMENT_BONUS,
        _ => 0,
    };
    if has_query(url) {
        adjustment += QUERY_STRING_PENALTY;
    }
    if url.len() > LONG_URL_THRESHOLD {
        adjustment += LONG_URL_PENALTY;
    }
    adjustment
}

/// Score one page of `domain` against a normalized company name at a fixed instant
pub fn score_page_at(
    page: &PageEntry,
    normalized_name: &str,
    domain: &str,
    now: DateTime<Utc>,
) -> ScoredPage {
    let title = page.title.as_deref();
    let category = classify(&page.url, title, domain);

    let base = page
        .declared_priority
        .map(|p| (p * 10.0).round() as i32)
        .unwrap_or(DEFAULT_BASE);

    let score = base
        + category_bonus(category)
        + name_bonus(&page.url, title, normalized_name)
        + recency_bonus(page.last_modified, now)
        + penalty(&page.url)
        + structure_adjustment(&page.url);

    ScoredPage {
        page: page.clone(),
        relevance_score: score.clamp(MIN_SCORE, MAX_SCORE) as u8,
        category,
    }
}

/// Score pages at a fixed instant; deterministic for the same inputs.
///
/// The result is ranked (see [`rank`]).
pub fn score_pages_at(
    pages: &[PageEntry],
    company_name: &str,
    domain: &str,
    now: DateTime<Utc>,
) -> Vec<ScoredPage> {
    let normalized = normalize_company_name(company_name);
    let mut scored: Vec<ScoredPage> = pages
        .iter()
        .map(|page| score_page_at(page, &normalized, domain, now))
        .collect();
    rank(&mut scored);
    scored
}

pub fn score_pages(pages: &[PageEntry], company_name: &str, domain: &str) -> Vec<ScoredPage> {
    score_pages_at(pages, company_name, domain, Utc::now())
}

fn compare(a: &ScoredPage, b: &ScoredPage) -> Ordering {
    b.relevance_score
        .cmp(&a.relevance_score)
        .then_with(|| a.depth().cmp(&b.depth()))
        .then_with(|| a.page.url.cmp(&b.page.url))
}

/// Sort by descending score, then shallower path, then URL
pub fn rank(pages: &mut [ScoredPage]) {
    pages.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn page(path: &str) -> PageEntry {
        PageEntry::new(format!("https://acme.example{}", path))
    }

    fn score(path: &str) -> ScoredPage {
        score_page_at(&page(path), "acme corp", "acme.example", now())
    }

    fn classify_acme(url: &str, title: Option<&str>) -> Category {
        classify(url, title, "acme.example")
    }

    #[test]
    fn test_classify_by_segment_prefix() {
        assert_eq!(classify_acme("https://acme.example/", None), Category::Homepage);
        assert_eq!(classify_acme("https://acme.example/index.html", None), Category::Homepage);
        assert_eq!(classify_acme("https://acme.example/about-us", None), Category::About);
        assert_eq!(classify_acme("https://acme.example/careers/openings", None), Category::Careers);
        assert_eq!(classify_acme("https://acme.example/ir/filings", None), Category::Investors);
        assert_eq!(classify_acme("https://acme.example/irrigation", None), Category::Other);
        assert_eq!(classify_acme("https://acme.example/case-studies/x", None), Category::CaseStudies);
        assert_eq!(classify_acme("https://acme.example/widgets", None), Category::Other);
    }

    #[test]
    fn test_classify_first_rule_wins() {
        // careers outranks news
        assert_eq!(classify_acme("https://acme.example/news/careers-fair", None), Category::Careers);
    }

    #[test]
    fn test_classify_falls_back_to_title() {
        assert_eq!(
            classify_acme("https://acme.example/p/123", Some("Who We Are")),
            Category::About
        );
        assert_eq!(classify_acme("https://acme.example/p/123", None), Category::Other);
    }

    #[test]
    fn test_base_score_from_priority() {
        let p = page("/widgets/a/b").with_priority(0.8);
        assert_eq!(score_page_at(&p, "", "acme.example", now()).relevance_score, 8);

        let p = page("/widgets/a/b");
        assert_eq!(score_page_at(&p, "", "acme.example", now()).relevance_score, DEFAULT_BASE as u8);
    }

    #[test]
    fn test_homepage_score() {
        // base 5 + homepage 20 + root 8
        assert_eq!(score("/").relevance_score, 33);
    }

    #[test]
    fn test_company_name_in_path_and_title() {
        // base 5 + path 5 + title 3, two segments
        let s = score("/x/acme-corp");
        assert_eq!(s.category, Category::Other);
        assert_eq!(s.relevance_score, 13);

        assert_eq!(score("/x/acmecorp").relevance_score, 10);
    }

    #[test]
    fn test_recency_bands() {
        let at = |days: i64| {
            let p = page("/widgets/a/b").with_last_modified(now() - chrono::Duration::days(days));
            score_page_at(&p, "", "acme.example", now()).relevance_score
        };
        assert_eq!(at(5), 8);
        assert_eq!(at(60), 6);
        assert_eq!(at(200), 5);
        assert_eq!(at(400), 3);
        // future dates count as fresh
        assert_eq!(at(-10), 8);
    }

    #[test]
    fn test_largest_penalty_only() {
        // legal -12 and file download -8: only -12 applies
        let p = page("/widgets/legal/terms.pdf");
        assert_eq!(penalty(&p.url), LEGAL_PENALTY);
        assert_eq!(penalty("https://acme.example/account/login"), ACCOUNT_PENALTY);
        assert_eq!(penalty("https://acme.example/search"), SEARCH_PENALTY);
        assert_eq!(penalty("https://acme.example/x?q=widgets"), SEARCH_PENALTY);
        assert_eq!(penalty("https://acme.example/blog/page/2"), ARCHIVE_PENALTY);
        assert_eq!(penalty("https://acme.example/blog/page-two"), 0);
        assert_eq!(penalty("https://acme.example/about"), 0);
    }

    #[test]
    fn test_penalties_match_whole_segments() {
        assert_eq!(penalty("https://acme.example/services/accounting"), 0);
        assert_eq!(penalty("https://acme.example/administration-services"), 0);
        assert_eq!(penalty("https://acme.example/cartography"), 0);
        assert_eq!(penalty("https://acme.example/registered-agent"), 0);
        assert_eq!(penalty("https://acme.example/legal-services"), 0);
        assert_eq!(penalty("https://acme.example/my-account"), ACCOUNT_PENALTY);
        assert_eq!(penalty("https://acme.example/wp-login.php"), ACCOUNT_PENALTY);
        assert_eq!(penalty("https://acme.example/privacy-policy"), LEGAL_PENALTY);
        assert_eq!(penalty("https://acme.example/terms.html"), LEGAL_PENALTY);
    }

    #[test]
    fn test_subdomain_roots_are_not_homepages() {
        assert_eq!(classify_acme("https://www.acme.example/", None), Category::Homepage);
        assert_eq!(classify_acme("https://careers.acme.example/", None), Category::Careers);
        assert_eq!(classify_acme("https://ir.acme.example/", None), Category::Investors);
        assert_eq!(classify_acme("https://blog.acme.example/", None), Category::News);
        assert_eq!(classify_acme("https://shop.acme.example/", None), Category::Other);
        // path wins over the subdomain label
        assert_eq!(classify_acme("https://blog.acme.example/about", None), Category::About);
    }

    #[test]
    fn test_structure_adjustments() {
        assert_eq!(structure_adjustment("https://acme.example/"), ROOT_PATH_BONUS);
        assert_eq!(structure_adjustment("https://acme.example/about"), SINGLE_SEGMENT_BONUS);
        assert_eq!(structure_adjustment("https://acme.example/a/b?x=1"), QUERY_STRING_PENALTY);
        let long = format!("https://acme.example/a/{}", "x".repeat(130));
        assert_eq!(structure_adjustment(&long), LONG_URL_PENALTY);
    }

    #[test]
    fn test_scores_are_clamped() {
        let low = score("/account/legal/search/tag/x.pdf");
        assert_eq!(low.relevance_score, 0);

        let high = page("/").with_priority(1.0).with_last_modified(now());
        assert!(score_page_at(&high, "", "acme.example", now()).relevance_score <= 100);
    }

    #[test]
    fn test_careers_beats_privacy() {
        assert!(score("/careers").relevance_score >= score("/legal/privacy").relevance_score);
    }

    #[test]
    fn test_category_ordering_contract() {
        let ordered = [
            "/", "/about", "/services", "/careers", "/news", "/case-studies", "/locations", "/widgets",
            "/privacy",
        ];
        let scores: Vec<u8> = ordered.iter().map(|p| score(p).relevance_score).collect();
        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "scores not strictly decreasing: {:?}", scores);
        }
        assert!(score("/careers").relevance_score >= score("/investors").relevance_score);
    }

    #[test]
    fn test_rank_ties_break_on_depth_then_url() {
        let pages = vec![page("/widgets/b/c"), page("/widgets/a/c"), page("/x/y")];
        let ranked = score_pages_at(&pages, "", "acme.example", now());
        let urls: Vec<&str> = ranked.iter().map(|p| p.url()).collect();
        assert_eq!(
            urls,
            vec![
                "https://acme.example/x/y",
                "https://acme.example/widgets/a/c",
                "https://acme.example/widgets/b/c",
            ]
        );
    }

    #[test]
    fn test_score_pages_at_is_deterministic() {
        let pages = vec![page("/about"), page("/careers"), page("/"), page("/privacy")];
        let first = score_pages_at(&pages, "Acme Corp", "acme.example", now());
        let second = score_pages_at(&pages, "Acme Corp", "acme.example", now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_company_name() {
        assert_eq!(normalize_company_name("  Acme,   Corp. "), "acme corp");
        assert_eq!(normalize_company_name(""), "");
    }
}
