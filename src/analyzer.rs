use crate::error::AuditError;
use crate::links::LinkProber;
use crate::parsers::Parser;
use crate::render::Renderer;
use crate::report::PageAudit;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use url::Url;

/// Loads pages through a renderer and turns them into audits
pub struct PageAnalyzer {
    renderer: Arc<dyn Renderer>,
    prober: LinkProber,
    page_timeout: Duration,
}

impl PageAnalyzer {
    pub fn new(renderer: Arc<dyn Renderer>, prober: LinkProber, page_timeout: Duration) -> Self {
        Self {
            renderer,
            prober,
            page_timeout,
        }
    }

    /// Analyze one page.
    ///
    /// Fails only if the page could not be loaded; missing elements never fail extraction.
    pub async fn analyze(&self, url: &str) -> Result<PageAudit, AuditError> {
        let started = std::time::Instant::now();
        let requested = Url::parse(url)?;

        let page = tokio::time::timeout(self.page_timeout, self.renderer.load(url, self.page_timeout))
            .await
            .map_err(|_| AuditError::Timeout(url.to_string()))??;

        // Relative references resolve against where the browser ended up
        let base = Url::parse(&page.url).unwrap_or_else(|_| requested.clone());
        let signals = Parser::extract(&page.source, &base, page.extractor).with_status(page.status_code);

        let hostname = requested.host_str().unwrap_or_default();
        let links = self.prober.inspect(&signals.links, hostname).await;

        ::log::debug!(
            "Analyzed {} (status {}) in {:.2} seconds",
            url,
            signals.status_code,
            started.elapsed().as_secs_f64()
        );

        Ok(PageAudit::new(url, &signals, &links))
    }

    /// Analyze pages with at most `max_concurrency` in flight.
    ///
    /// Results keep the order of `urls`. Pages that fail are left out. Once
    /// `deadline` passes no new page is started and unfinished ones are
    /// abandoned, but finished pages are still returned.
    pub async fn analyze_all(
        self: &Arc<Self>,
        urls: Vec<String>,
        max_concurrency: usize,
        deadline: Option<Instant>,
    ) -> Vec<PageAudit> {
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            if deadline.is_some_and(|d| Instant::now() >= d) {
                ::log::warn!("Deadline reached, not starting {} or later pages", url);
                break;
            }

            let analyzer = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = match deadline {
                    Some(deadline) => tokio::time::timeout_at(deadline, analyzer.analyze(&url))
                        .await
                        .unwrap_or_else(|_| Err(AuditError::Timeout(url.clone()))),
                    None => analyzer.analyze(&url).await,
                };
                (url, result)
            }));
        }

        let mut pages = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok((_, Ok(page))) => pages.push(page),
                Ok((url, Err(e))) => ::log::warn!("Skipping {}: {}", url, e),
                Err(e) => ::log::error!("Page analysis task failed: {}", e),
            }
        }

        ::log::info!("Analyzed {} pages", pages.len());
        pages
    }
}
