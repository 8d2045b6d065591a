//! Sitemap Resolver: `<base>/sitemap.xml` into an ordered list of URLs.

use crate::crawlers::fetch::Fetcher;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static LOC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<loc>(.*?)</loc>").expect("static regex"));

/// Location of the sitemap for a site base URL
pub fn sitemap_url(base: &Url) -> String {
    let mut base = base.clone();
    base.set_query(None);
    base.set_fragment(None);
    format!("{}/sitemap.xml", base.as_str().trim_end_matches('/'))
}

/// Fetch and parse the site's sitemap.
///
/// Returns an empty list when there is no usable sitemap; that is an
/// expected condition and the caller falls back to crawling. One attempt,
/// no retries.
pub async fn resolve(fetcher: &dyn Fetcher, base: &Url, max_pages: usize) -> Vec<String> {
    let location = sitemap_url(base);

    let doc = match fetcher.get(&location).await {
        Ok(doc) => doc,
        Err(e) => {
            ::log::debug!("No sitemap at {}: {}", location, e);
            return Vec::new();
        }
    };

    if !doc.is_success() || doc.body.trim().is_empty() {
        ::log::debug!("No sitemap at {} (status {})", location, doc.status);
        return Vec::new();
    }

    let urls = parse(&doc.body, max_pages);
    ::log::info!("Sitemap {} listed {} URLs", location, urls.len());
    urls
}

/// Extract `<loc>` values, trimmed, in document order, capped at `max_pages`.
///
/// Malformed XML falls back to a plain `<loc>...</loc>` scan.
pub fn parse(xml: &str, max_pages: usize) -> Vec<String> {
    let mut urls = match parse_xml(xml) {
        Ok(urls) => urls,
        Err(e) => {
            ::log::debug!("Sitemap is not well-formed XML ({}), scanning for <loc>", e);
            scan_locs(xml)
        }
    };
    urls.truncate(max_pages);
    urls
}

fn parse_xml(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"loc" => {
                in_loc = true;
                current.clear();
            }
            Event::End(e) if e.local_name().as_ref() == b"loc" => {
                let loc = current.trim();
                if !loc.is_empty() {
                    urls.push(loc.to_string());
                }
                in_loc = false;
            }
            Event::Text(e) if in_loc => {
                current.push_str(&e.unescape()?);
            }
            Event::CData(e) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(urls)
}

fn scan_locs(xml: &str) -> Vec<String> {
    LOC.captures_iter(xml)
        .map(|c| c[1].trim().to_string())
        .filter(|loc| !loc.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::crawlers::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>
      https://example.com/
    </loc>
    <priority>1.0</priority>
  </url>
  <url><loc>https://example.com/about</loc></url>
  <url><loc><![CDATA[https://example.com/blog?page=1&sort=new]]></loc></url>
  <url><loc>https://example.com/contact?a=1&amp;b=2</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_urlset() {
        assert_eq!(
            parse(URLSET, 500),
            vec![
                "https://example.com/",
                "https://example.com/about",
                "https://example.com/blog?page=1&sort=new",
                "https://example.com/contact?a=1&b=2",
            ]
        );
    }

    #[test]
    fn test_parse_truncates_at_cap() {
        assert_eq!(parse(URLSET, 2).len(), 2);
    }

    #[test]
    fn test_malformed_xml_falls_back_to_scan() {
        let broken = "<urlset><url><loc>https://example.com/a</loc></url><url><loc> https://example.com/b </loc></urlset>";
        assert_eq!(
            parse(broken, 500),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_sitemap_url() {
        let base = Url::parse("https://example.com").unwrap();
        assert_eq!(sitemap_url(&base), "https://example.com/sitemap.xml");

        let nested = Url::parse("https://example.com/shop/?ref=x").unwrap();
        assert_eq!(sitemap_url(&nested), "https://example.com/shop/sitemap.xml");
    }

    #[tokio::test]
    async fn test_resolve_missing_sitemap_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&AuditConfig::default()).unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        assert!(resolve(&fetcher, &base, 500).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_empty_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  \n"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&AuditConfig::default()).unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        assert!(resolve(&fetcher, &base, 500).await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_lists_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&AuditConfig::default()).unwrap();
        let base = Url::parse(&server.uri()).unwrap();
        let urls = resolve(&fetcher, &base, 3).await;
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[1], "https://example.com/about");
    }
}
