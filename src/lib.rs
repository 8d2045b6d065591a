pub mod analyzer;
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod links;
pub mod parsers;
pub mod render;
pub mod report;
pub mod results;
pub mod server;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{AuditConfig, RendererKind};
pub use error::AuditError;
pub use report::{PageAudit, SiteReport};
pub use results::PageSignals;

use analyzer::PageAnalyzer;
use crawlers::fetch::{Fetcher, HttpFetcher};
use links::LinkProber;
use render::Renderer;
use std::sync::Arc;
use tokio::time::Instant;

/// Main builder for auditing a site
pub struct Audit {
    url: String,
    config: AuditConfig,
    single_page: bool,
    fetcher: Option<Arc<dyn Fetcher>>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl Audit {
    /// Create a new audit of the site at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: AuditConfig::default(),
            single_page: false,
            fetcher: None,
            renderer: None,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(
        self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = AuditConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Use a custom document fetcher for sitemap, crawl and probes
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Use a custom renderer instead of the configured one
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Analyze only the given URL and attach findings to the report
    pub fn single_page(mut self, single_page: bool) -> Self {
        self.single_page = single_page;
        self
    }

    /// Run the audit: validate, discover, analyze, aggregate.
    ///
    /// Only an invalid URL or a renderer that cannot start is an error;
    /// everything else degrades into a report with fewer pages.
    pub async fn run(self) -> Result<SiteReport, AuditError> {
        let start = utils::validate_target(Some(&self.url))?;
        let deadline = self.config.total_timeout().map(|t| Instant::now() + t);
        let started = std::time::Instant::now();

        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&self.config)?),
        };
        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => render::from_config(&self.config, Arc::clone(&fetcher)),
        };

        renderer.start().await?;

        let urls = if self.single_page {
            vec![filter::normalize_url(&start).to_string()]
        } else {
            match crawlers::discover(fetcher.as_ref(), &start, &self.config, deadline).await {
                Ok(discovery) => discovery.urls,
                Err(e) => {
                    if let Err(close_err) = renderer.shutdown().await {
                        ::log::warn!("Failed to shut down renderer: {}", close_err);
                    }
                    return Err(e);
                }
            }
        };

        let prober = LinkProber::new(
            Arc::clone(&fetcher),
            self.config.probe_sample_size,
            self.config.probe_timeout(),
        );
        let analyzer = Arc::new(PageAnalyzer::new(
            Arc::clone(&renderer),
            prober,
            self.config.page_timeout(),
        ));
        let pages = analyzer
            .analyze_all(urls, self.config.max_concurrency, deadline)
            .await;

        if let Err(e) = renderer.shutdown().await {
            ::log::warn!("Failed to shut down renderer: {}", e);
        }

        ::log::info!(
            "Audit of {} complete - {} pages in {:.2} seconds",
            start,
            pages.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(report::aggregate(pages, self.single_page))
    }
}
