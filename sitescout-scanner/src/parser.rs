//! Parse sitemap index and urlset documents, and robots.txt sitemap directives.

use crate::error::{Result, ScanError};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<url>` record as written in the document, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlRecord {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: Option<String>,
    pub priority: Option<String>,
}

/// One `<sitemap>` record of an index document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexRecord {
    pub loc: String,
    pub lastmod: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    Index(Vec<IndexRecord>),
    UrlSet(Vec<UrlRecord>),
}

impl SitemapDocument {
    pub fn len(&self) -> usize {
        match self {
            SitemapDocument::Index(records) => records.len(),
            SitemapDocument::UrlSet(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Root {
    Index,
    UrlSet,
}

/// Parse a sitemap XML string.
///
/// The root element decides the shape: `<sitemapindex>` or `<urlset>`.
/// Namespaces are ignored. Anything else, or malformed markup, is an error.
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut root: Option<Root> = None;
    let mut index_records = Vec::new();
    let mut url_records = Vec::new();

    let mut in_entry = false;
    // nesting level below the current <url>/<sitemap>; only direct children count
    let mut child_depth = 0usize;
    let mut current_tag = String::new();
    let mut current_url = UrlRecord::default();
    let mut current_index = IndexRecord::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                match (root, name.as_str()) {
                    (Some(_), _) if in_entry => {
                        child_depth += 1;
                        current_tag = if child_depth == 1 { name.clone() } else { String::new() };
                    }
                    (None, "sitemapindex") => root = Some(Root::Index),
                    (None, "urlset") => root = Some(Root::UrlSet),
                    (None, other) => {
                        return Err(ScanError::ParseError(format!(
                            "unrecognized root element <{}>",
                            other
                        )));
                    }
                    (Some(Root::UrlSet), "url") => {
                        in_entry = true;
                        current_url = UrlRecord::default();
                    }
                    (Some(Root::Index), "sitemap") => {
                        in_entry = true;
                        current_index = IndexRecord::default();
                    }
                    _ => current_tag.clear(),
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                if root.is_none() {
                    return match name.as_str() {
                        "sitemapindex" => Ok(SitemapDocument::Index(Vec::new())),
                        "urlset" => Ok(SitemapDocument::UrlSet(Vec::new())),
                        other => Err(ScanError::ParseError(format!(
                            "unrecognized root element <{}>",
                            other
                        ))),
                    };
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                match (root, name.as_str()) {
                    _ if in_entry && child_depth > 0 => child_depth -= 1,
                    (Some(Root::UrlSet), "url") if in_entry => {
                        if !current_url.loc.is_empty() {
                            url_records.push(std::mem::take(&mut current_url));
                        }
                        in_entry = false;
                    }
                    (Some(Root::Index), "sitemap") if in_entry => {
                        if !current_index.loc.is_empty() {
                            index_records.push(std::mem::take(&mut current_index));
                        }
                        in_entry = false;
                    }
                    _ => {}
                }
                current_tag.clear();
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| ScanError::ParseError(format!("bad text content: {}", err)))?;
                record_text(
                    root,
                    in_entry,
                    &current_tag,
                    text.trim(),
                    &mut current_url,
                    &mut current_index,
                );
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                record_text(
                    root,
                    in_entry,
                    &current_tag,
                    text.trim(),
                    &mut current_url,
                    &mut current_index,
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match root {
        Some(Root::Index) => Ok(SitemapDocument::Index(index_records)),
        Some(Root::UrlSet) => Ok(SitemapDocument::UrlSet(url_records)),
        None => Err(ScanError::ParseError("document has no root element".to_string())),
    }
}

fn record_text(
    root: Option<Root>,
    in_entry: bool,
    tag: &str,
    text: &str,
    url: &mut UrlRecord,
    index: &mut IndexRecord,
) {
    if !in_entry || text.is_empty() {
        return;
    }
    match (root, tag) {
        (Some(Root::UrlSet), "loc") => url.loc = text.to_string(),
        (Some(Root::UrlSet), "lastmod") => url.lastmod = Some(text.to_string()),
        (Some(Root::UrlSet), "changefreq") => url.changefreq = Some(text.to_string()),
        (Some(Root::UrlSet), "priority") => url.priority = Some(text.to_string()),
        (Some(Root::Index), "loc") => index.loc = text.to_string(),
        (Some(Root::Index), "lastmod") => index.lastmod = Some(text.to_string()),
        _ => {}
    }
}

/// Extract `Sitemap:` directives from a robots.txt body.
///
/// Keys are case-insensitive, trailing `#` comments are ignored and only
/// absolute http(s) values are kept.
pub fn parse_robots_sitemaps(robots: &str) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or("").trim();
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            if value.starts_with("http://") || value.starts_with("https://") {
                Some(value.to_string())
            } else {
                None
            }
        })
        .collect()
}
