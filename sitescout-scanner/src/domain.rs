// Domain and URL helpers shared by the locator, the expander and the scorer

use url::Url;

/// Normalize a website URL or bare host into the domain key used everywhere else.
///
/// Adds `https://` when no scheme is present, lowercases the host, strips a
/// leading `www.` and keeps an explicit non-default port (`host:port`).
/// Returns `None` for empty or unparseable input.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        return None;
    }

    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Host part of a normalized domain (drops any `:port`)
pub fn domain_host(domain: &str) -> &str {
    match domain.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => domain,
    }
}

/// Base URL (`scheme://domain`) for a normalized domain
pub fn site_root(scheme: &str, domain: &str) -> String {
    format!("{}://{}", scheme, domain)
}

/// True when the URL's host is the domain itself or one of its subdomains
pub fn belongs_to_domain(url: &str, domain: &str) -> bool {
    let host = domain_host(domain).to_lowercase();
    if let Ok(parsed) = Url::parse(url)
        && let Some(url_host) = parsed.host_str()
    {
        let url_host = url_host.to_lowercase();
        return url_host == host || url_host.ends_with(&format!(".{}", host));
    }
    false
}

/// Labels in front of the domain for a URL on one of its subdomains.
///
/// `https://eu.careers.acme.example/` gives `["eu", "careers"]`. The domain
/// itself, its `www.` host and hosts outside the domain give an empty list.
pub fn subdomain_labels(url: &str, domain: &str) -> Vec<String> {
    let host = domain_host(domain).to_lowercase();
    let Some(url_host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    else {
        return Vec::new();
    };

    let Some(prefix) = url_host.strip_suffix(&format!(".{}", host)) else {
        return Vec::new();
    };
    let prefix = prefix.strip_prefix("www.").unwrap_or(prefix);
    if prefix == "www" {
        return Vec::new();
    }
    prefix
        .split('.')
        .filter(|label| !label.is_empty())
        .map(|label| label.to_string())
        .collect()
}

/// True when both URLs parse and share host and port
pub fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => {
            a.host_str().map(str::to_lowercase) == b.host_str().map(str::to_lowercase)
                && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

/// Resolve a possibly relative reference against a base URL, dropping fragments
pub fn resolve_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    let mut url = resolved;
    url.set_fragment(None);
    Some(url.to_string())
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Non-empty path segments of a URL
pub fn path_segments(url: &str) -> Vec<String> {
    extract_url_path(url)
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain_bare_host() {
        assert_eq!(normalize_domain("acme.example"), Some("acme.example".to_string()));
    }

    #[test]
    fn test_normalize_domain_strips_scheme_www_and_slashes() {
        assert_eq!(
            normalize_domain("https://www.Acme.Example/"),
            Some("acme.example".to_string())
        );
        assert_eq!(
            normalize_domain("  http://acme.example/about/  "),
            Some("acme.example".to_string())
        );
    }

    #[test]
    fn test_normalize_domain_keeps_port() {
        assert_eq!(
            normalize_domain("http://127.0.0.1:8080"),
            Some("127.0.0.1:8080".to_string())
        );
        assert_eq!(normalize_domain("https://acme.example:443"), Some("acme.example".to_string()));
    }

    #[test]
    fn test_normalize_domain_rejects_garbage() {
        assert_eq!(normalize_domain(""), None);
        assert_eq!(normalize_domain("   "), None);
        assert_eq!(normalize_domain("ftp://acme.example"), None);
        assert_eq!(normalize_domain("https://"), None);
    }

    #[test]
    fn test_domain_host() {
        assert_eq!(domain_host("acme.example"), "acme.example");
        assert_eq!(domain_host("127.0.0.1:8080"), "127.0.0.1");
    }

    #[test]
    fn test_belongs_to_domain() {
        assert!(belongs_to_domain("https://acme.example/about", "acme.example"));
        assert!(belongs_to_domain("https://careers.acme.example/jobs", "acme.example"));
        assert!(belongs_to_domain("http://127.0.0.1:9000/a", "127.0.0.1:8080"));
        assert!(!belongs_to_domain("https://notacme.example/", "acme.example"));
        assert!(!belongs_to_domain("https://cdn.other.example/x", "acme.example"));
        assert!(!belongs_to_domain("garbage", "acme.example"));
    }

    #[test]
    fn test_subdomain_labels() {
        assert!(subdomain_labels("https://acme.example/", "acme.example").is_empty());
        assert!(subdomain_labels("https://www.acme.example/", "acme.example").is_empty());
        assert!(subdomain_labels("https://other.example/", "acme.example").is_empty());
        assert_eq!(
            subdomain_labels("https://careers.acme.example/", "acme.example"),
            vec!["careers".to_string()]
        );
        assert_eq!(
            subdomain_labels("https://www.eu.shop.acme.example/x", "acme.example"),
            vec!["eu".to_string(), "shop".to_string()]
        );
    }

    #[test]
    fn test_same_host() {
        assert!(same_host("https://cdn.example/a.xml", "https://CDN.example/b.xml"));
        assert!(!same_host("https://cdn.example/a.xml", "https://evil.example/b.xml"));
        assert!(!same_host("http://127.0.0.1:8080/a", "http://127.0.0.1:9090/a"));
        assert!(!same_host("garbage", "https://cdn.example/"));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://acme.example/sitemap.xml", "/about"),
            Some("https://acme.example/about".to_string())
        );
        assert_eq!(
            resolve_url("https://acme.example/sitemap.xml", "https://acme.example/x#frag"),
            Some("https://acme.example/x".to_string())
        );
        assert_eq!(resolve_url("https://acme.example/", "mailto:a@b.c"), None);
        assert_eq!(resolve_url("https://acme.example/", ""), None);
    }

    #[test]
    fn test_extract_url_path() {
        assert_eq!(extract_url_path("https://acme.example"), "/");
        assert_eq!(extract_url_path("https://acme.example/"), "/");
        assert_eq!(extract_url_path("https://acme.example/api/v1?x=1#top"), "/api/v1");
    }

    #[test]
    fn test_path_segments() {
        assert!(path_segments("https://acme.example/").is_empty());
        assert_eq!(
            path_segments("https://acme.example/careers/openings/"),
            vec!["careers".to_string(), "openings".to_string()]
        );
    }
}
