pub mod fetch;
pub mod frontier;
pub mod sitemap;

use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::filter::{UrlFilter, normalize_url};
use fetch::Fetcher;
use std::collections::HashSet;
use tokio::time::Instant;
use url::Url;

/// How the URL list of a run was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Sitemap,
    Crawl,
}

/// Result of URL discovery
#[derive(Debug, Clone)]
pub struct Discovery {
    pub source: DiscoverySource,
    /// Deduplicated, capped, homepage first
    pub urls: Vec<String>,
}

/// Discover the pages to analyze: the sitemap first, a crawl only if the
/// sitemap yields nothing.
pub async fn discover(
    fetcher: &dyn Fetcher,
    start: &Url,
    config: &AuditConfig,
    deadline: Option<Instant>,
) -> Result<Discovery, AuditError> {
    let from_sitemap = sitemap::resolve(fetcher, start, config.max_pages).await;

    let (source, urls) = if from_sitemap.is_empty() {
        ::log::info!("No sitemap URLs for {}, crawling internal links", start);
        let filter = UrlFilter::for_site(start, &config.include_patterns, &config.exclude_patterns)
            .map_err(|e| AuditError::Other(format!("invalid URL pattern: {}", e)))?;
        let crawled = frontier::crawl(fetcher, start, &filter, config.max_pages, deadline).await;
        (DiscoverySource::Crawl, crawled)
    } else {
        (DiscoverySource::Sitemap, from_sitemap)
    };

    let urls = finalize(urls, start, config.max_pages);
    ::log::info!("Discovered {} URLs via {:?}", urls.len(), source);

    Ok(Discovery { source, urls })
}

/// Normalize, deduplicate, put the homepage first and cap the list.
///
/// Entries that are not valid absolute URLs are dropped.
pub fn finalize(urls: Vec<String>, homepage: &Url, max_pages: usize) -> Vec<String> {
    let home = normalize_url(homepage).to_string();
    let mut seen = HashSet::from([home.clone()]);
    let mut result = vec![home];

    for raw in urls {
        let Ok(parsed) = Url::parse(raw.trim()) else {
            ::log::debug!("Dropping unparseable discovered URL: {}", raw);
            continue;
        };
        let normalized = normalize_url(&parsed).to_string();
        if seen.insert(normalized.clone()) {
            result.push(normalized);
        }
    }

    result.truncate(max_pages.max(1));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawlers::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strings(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_finalize_puts_homepage_first() {
        let home = Url::parse("https://a.test").unwrap();
        let urls = strings(&["https://a.test/x", "https://a.test/", "https://a.test/y"]);
        assert_eq!(
            finalize(urls, &home, 500),
            vec!["https://a.test/", "https://a.test/x", "https://a.test/y"]
        );
    }

    #[test]
    fn test_finalize_adds_missing_homepage_and_caps() {
        let home = Url::parse("https://a.test/").unwrap();
        let urls = strings(&["https://a.test/1", "https://a.test/2", "https://a.test/3"]);
        let result = finalize(urls, &home, 3);
        assert_eq!(
            result,
            vec!["https://a.test/", "https://a.test/1", "https://a.test/2"]
        );
    }

    #[test]
    fn test_finalize_deduplicates() {
        let home = Url::parse("https://a.test/").unwrap();
        let urls = strings(&[
            "https://a.test/x",
            "https://a.test/x#frag",
            " https://a.test/x ",
            "not a url",
        ]);
        assert_eq!(
            finalize(urls, &home, 500),
            vec!["https://a.test/", "https://a.test/x"]
        );
    }

    #[tokio::test]
    async fn test_sitemap_takes_precedence_over_crawl() {
        let server = MockServer::start().await;
        let base = server.uri();
        let sitemap = format!(
            "<urlset><url><loc>{0}/</loc></url><url><loc>{0}/one</loc></url></urlset>",
            base
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
            .expect(1)
            .mount(&server)
            .await;
        // The crawl would fetch the homepage first; it must not run
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/two\">"))
            .expect(0)
            .mount(&server)
            .await;

        let config = AuditConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let start = Url::parse(&base).unwrap();
        let discovery = discover(&fetcher, &start, &config, None).await.unwrap();

        assert_eq!(discovery.source, DiscoverySource::Sitemap);
        assert_eq!(discovery.urls, vec![format!("{}/", base), format!("{}/one", base)]);
    }

    #[tokio::test]
    async fn test_falls_back_to_crawl_without_sitemap() {
        let server = MockServer::start().await;
        let base = server.uri();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/two\">Two</a>"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/two"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>leaf</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let config = AuditConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let start = Url::parse(&base).unwrap();
        let discovery = discover(&fetcher, &start, &config, None).await.unwrap();

        assert_eq!(discovery.source, DiscoverySource::Crawl);
        assert_eq!(discovery.urls, vec![format!("{}/", base), format!("{}/two", base)]);
    }

    #[tokio::test]
    async fn test_unreachable_site_still_yields_homepage() {
        let config = AuditConfig {
            page_timeout_ms: 500,
            ..AuditConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        // Nothing listens on port 9 of the loopback interface
        let start = Url::parse("http://127.0.0.1:9/").unwrap();
        let discovery = discover(&fetcher, &start, &config, None).await.unwrap();

        assert_eq!(discovery.urls, vec!["http://127.0.0.1:9/"]);
    }
}
