use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static LINK_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("a[href]").ok());

/// Extract every absolute http(s) link from the anchors in `html`.
///
/// References are resolved against `base_url`. Anything that does not
/// resolve to an `http` or `https` URL is dropped. Malformed markup or an
/// unparseable base yields an empty set, never an error.
pub fn extract_links(html: &str, base_url: &str) -> BTreeSet<String> {
    let mut links = BTreeSet::new();

    if html.trim().is_empty() {
        return links;
    }
    let Ok(base) = Url::parse(base_url) else {
        debug!("Unparseable base URL {}, no links extracted", base_url);
        return links;
    };
    let Some(selector) = LINK_SELECTOR.as_ref() else {
        return links;
    };

    let document = Html::parse_document(html);
    for element in document.select(selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(&base, href)
        {
            links.insert(absolute_url);
        }
    }

    links
}

fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Host component used for internal/external classification.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

/// Host-only comparison; scheme and port are ignored.
pub fn is_same_domain(url: &str, base_domain: &str) -> bool {
    host_of(url).is_some_and(|host| host == base_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/docs/index.html";

    #[test]
    fn test_resolves_relative_references() {
        let html = r#"<a href="guide.html">Guide</a><a href="../about">About</a><a href="/root">Root</a>"#;
        let links = extract_links(html, BASE);

        assert!(links.contains("https://example.com/docs/guide.html"));
        assert!(links.contains("https://example.com/about"));
        assert!(links.contains("https://example.com/root"));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_resolves_protocol_relative_reference() {
        let html = r#"<a href="//cdn.example.org/lib">CDN</a>"#;
        let links = extract_links(html, BASE);
        assert!(links.contains("https://cdn.example.org/lib"));
    }

    #[test]
    fn test_fragment_only_reference_resolves_against_page() {
        let html = r##"<a href="#section-2">Jump</a>"##;
        let links = extract_links(html, BASE);
        assert!(links.contains("https://example.com/docs/index.html#section-2"));
    }

    #[test]
    fn test_drops_non_http_schemes() {
        let html = r#"
            <a href="mailto:team@example.com">Mail</a>
            <a href="javascript:void(0)">JS</a>
            <a href="tel:+15555555555">Call</a>
            <a href="ftp://example.com/file">FTP</a>
            <a href="http://plain.example.com/">HTTP</a>
        "#;
        let links = extract_links(html, BASE);
        assert_eq!(links.len(), 1);
        assert!(links.contains("http://plain.example.com/"));
    }

    #[test]
    fn test_ignores_anchors_without_href() {
        let html = r#"<a name="top">Top</a><a>Nothing</a><a href="/ok">Ok</a>"#;
        let links = extract_links(html, BASE);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"<a href="/a">1</a><a href="/a">2</a><a href="https://example.com/a">3</a>"#;
        let links = extract_links(html, BASE);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_empty_and_garbage_input_yield_nothing() {
        assert!(extract_links("", BASE).is_empty());
        assert!(extract_links("   \n", BASE).is_empty());
        assert!(extract_links("<<<>>> not html at all </a", BASE).is_empty());
        assert!(extract_links(r#"<a href="/x">x</a>"#, "not a url").is_empty());
    }

    #[test]
    fn test_same_domain_ignores_scheme_and_port() {
        assert!(is_same_domain("http://example.com:8080/x", "example.com"));
        assert!(is_same_domain("https://example.com/", "example.com"));
        assert!(!is_same_domain("https://blog.example.com/", "example.com"));
        assert!(!is_same_domain("not a url", "example.com"));
    }
}
