//! Breadth-first crawl over same-host links, used when a site has no sitemap.

use crate::crawlers::fetch::Fetcher;
use crate::filter::UrlFilter;
use crate::parsers::markup;
use std::collections::{HashSet, VecDeque};
use tokio::time::Instant;
use url::Url;

/// Frontier plus visited set for one crawl.
///
/// A URL is queued at most once, and `visited` never exceeds `max_pages`.
#[derive(Debug)]
pub struct CrawlState {
    frontier: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    order: Vec<String>,
    max_pages: usize,
}

impl CrawlState {
    pub fn new(start_url: &str, max_pages: usize) -> Self {
        let mut state = Self {
            frontier: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            order: Vec::new(),
            max_pages,
        };
        state.enqueue(start_url.to_string());
        state
    }

    /// Pops the next unvisited URL, FIFO, unless the cap is reached
    pub fn next_url(&mut self) -> Option<String> {
        while self.visited.len() < self.max_pages {
            let url = self.frontier.pop_front()?;
            self.queued.remove(&url);
            if self.visited.contains(&url) {
                ::log::trace!("Skipping already visited: {}", url);
                continue;
            }
            return Some(url);
        }
        None
    }

    pub fn mark_visited(&mut self, url: &str) -> bool {
        if self.visited.len() >= self.max_pages || !self.visited.insert(url.to_string()) {
            return false;
        }
        self.order.push(url.to_string());
        true
    }

    /// Queues a URL unless it was already seen or the cap is reached
    pub fn enqueue(&mut self, url: String) -> bool {
        if self.visited.len() >= self.max_pages
            || self.visited.contains(&url)
            || self.queued.contains(&url)
        {
            return false;
        }
        self.queued.insert(url.clone());
        self.frontier.push_back(url);
        true
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_len(&self) -> usize {
        self.frontier.len()
    }

    /// Visited URLs in the order they were visited
    pub fn into_visited(self) -> Vec<String> {
        self.order
    }
}

/// Resolve a crawl href: absolute http(s) links as-is, root-relative paths
/// against the current page. Anything else is not followed.
pub fn resolve_link(current: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(href).ok()
    } else if href.starts_with('/') {
        current.join(href).ok()
    } else {
        None
    }
}

/// Crawl from `start`, returning every visited URL in discovery order.
///
/// A failed fetch still counts as visited but contributes no links.
pub async fn crawl(
    fetcher: &dyn Fetcher,
    start: &Url,
    filter: &UrlFilter,
    max_pages: usize,
    deadline: Option<Instant>,
) -> Vec<String> {
    let start_url = filter.normalize_url(start).to_string();
    let mut state = CrawlState::new(&start_url, max_pages);

    while let Some(current) = state.next_url() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            ::log::warn!(
                "Crawl deadline reached after {} pages, {} still queued",
                state.visited_len(),
                state.pending_len()
            );
            break;
        }

        state.mark_visited(&current);

        let doc = match fetcher.get(&current).await {
            Ok(doc) if doc.is_success() => doc,
            Ok(doc) => {
                ::log::debug!("Crawl skipping {} (status {})", current, doc.status);
                continue;
            }
            Err(e) => {
                ::log::debug!("Crawl failed to fetch {}: {}", current, e);
                continue;
            }
        };

        let Ok(current_url) = Url::parse(&current) else {
            continue;
        };

        let mut queued = 0;
        for href in markup::crawl_hrefs(&doc.body) {
            let Some(resolved) = resolve_link(&current_url, &href) else {
                continue;
            };
            if !filter.should_crawl(&resolved) {
                ::log::trace!("URL filter rejected: {}", resolved);
                continue;
            }
            if state.enqueue(filter.normalize_url(&resolved).to_string()) {
                queued += 1;
            }
        }

        ::log::debug!("Crawled {}: queued {} new links", current, queued);
    }

    let visited = state.into_visited();
    ::log::info!("Crawl visited {} pages from {}", visited.len(), start_url);
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::crawlers::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page(links: &[&str]) -> ResponseTemplate {
        let anchors: String = links
            .iter()
            .map(|l| format!(r#"<a href="{}">x</a>"#, l))
            .collect();
        ResponseTemplate::new(200).set_body_string(format!("<html><body>{}</body></html>", anchors))
    }

    async fn mount(server: &MockServer, at: &str, response: ResponseTemplate, times: u64) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(response)
            .expect(times)
            .mount(server)
            .await;
    }

    async fn run(server: &MockServer, max_pages: usize) -> Vec<String> {
        let config = AuditConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let start = Url::parse(&server.uri()).unwrap();
        let filter = UrlFilter::for_site(&start, &[], &config.exclude_patterns).unwrap();
        crawl(&fetcher, &start, &filter, max_pages, None).await
    }

    #[test]
    fn test_state_never_queues_twice() {
        let mut state = CrawlState::new("https://a.test/", 10);
        assert!(!state.enqueue("https://a.test/".to_string()));
        assert!(state.enqueue("https://a.test/x".to_string()));
        assert!(!state.enqueue("https://a.test/x".to_string()));

        let first = state.next_url().unwrap();
        assert_eq!(first, "https://a.test/");
        state.mark_visited(&first);
        assert!(!state.enqueue("https://a.test/".to_string()));
    }

    #[test]
    fn test_state_cap_stops_iteration() {
        let mut state = CrawlState::new("https://a.test/", 2);
        state.enqueue("https://a.test/1".to_string());
        state.enqueue("https://a.test/2".to_string());

        let mut seen = Vec::new();
        while let Some(url) = state.next_url() {
            state.mark_visited(&url);
            seen.push(url);
        }
        assert_eq!(seen, vec!["https://a.test/", "https://a.test/1"]);
        assert!(!state.enqueue("https://a.test/3".to_string()));
        assert_eq!(state.into_visited().len(), 2);
    }

    #[test]
    fn test_resolve_link() {
        let current = Url::parse("https://a.test/blog/post").unwrap();
        assert_eq!(
            resolve_link(&current, "/about").unwrap().as_str(),
            "https://a.test/about"
        );
        assert_eq!(
            resolve_link(&current, "HTTPS://a.test/x").unwrap().as_str(),
            "https://a.test/x"
        );
        assert!(resolve_link(&current, "relative/page").is_none());
        assert!(resolve_link(&current, "mailto:me@a.test").is_none());
    }

    #[tokio::test]
    async fn test_crawl_is_breadth_first_and_capped() {
        let server = MockServer::start().await;
        mount(&server, "/", page(&["/a", "/b", "/c", "/d"]), 1).await;
        mount(&server, "/a", page(&["/a/deep"]), 1).await;
        mount(&server, "/b", page(&[]), 1).await;
        mount(&server, "/c", page(&[]), 0).await;
        mount(&server, "/d", page(&[]), 0).await;
        mount(&server, "/a/deep", page(&[]), 0).await;

        let visited = run(&server, 3).await;
        let base = server.uri();
        assert_eq!(
            visited,
            vec![
                format!("{}/", base),
                format!("{}/a", base),
                format!("{}/b", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_never_revisits_or_leaves_host() {
        let server = MockServer::start().await;
        let base = server.uri();
        let absolute_a = format!("{}/a", base);
        mount(
            &server,
            "/",
            page(&[
                "/a",
                &absolute_a,
                "/a#team",
                "https://elsewhere.test/a",
                "//cdn.elsewhere.test/lib",
                "/logo.png",
            ]),
            1,
        )
        .await;
        mount(&server, "/a", page(&["/", "/a"]), 1).await;
        mount(&server, "/logo.png", ResponseTemplate::new(200), 1).await;

        // Same-host links are followed whatever they point at
        let visited = run(&server, 500).await;
        assert_eq!(
            visited,
            vec![
                format!("{}/", base),
                format!("{}/a", base),
                format!("{}/logo.png", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_configured_exclude_patterns_are_honored() {
        let server = MockServer::start().await;
        mount(&server, "/", page(&["/guide.pdf", "/a"]), 1).await;
        mount(&server, "/a", page(&[]), 1).await;
        mount(&server, "/guide.pdf", ResponseTemplate::new(200), 0).await;

        let config = AuditConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let start = Url::parse(&server.uri()).unwrap();
        let filter = UrlFilter::for_site(&start, &[], &[r"\.pdf$".to_string()]).unwrap();
        let visited = crawl(&fetcher, &start, &filter, 500, None).await;

        assert_eq!(
            visited,
            vec![format!("{}/", server.uri()), format!("{}/a", server.uri())]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_counts_as_visited() {
        let server = MockServer::start().await;
        mount(&server, "/", page(&["/broken", "/ok"]), 1).await;
        mount(&server, "/broken", ResponseTemplate::new(500), 1).await;
        mount(&server, "/ok", page(&["/broken"]), 1).await;

        let visited = run(&server, 500).await;
        let base = server.uri();
        assert_eq!(
            visited,
            vec![
                format!("{}/", base),
                format!("{}/broken", base),
                format!("{}/ok", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_expired_deadline_stops_before_fetching() {
        let server = MockServer::start().await;
        mount(&server, "/", page(&[]), 0).await;

        let config = AuditConfig::default();
        let fetcher = HttpFetcher::new(&config).unwrap();
        let start = Url::parse(&server.uri()).unwrap();
        let filter = UrlFilter::for_site(&start, &[], &[]).unwrap();
        let visited = crawl(&fetcher, &start, &filter, 500, Some(Instant::now())).await;
        assert!(visited.is_empty());
    }
}
