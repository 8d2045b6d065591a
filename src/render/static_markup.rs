use crate::crawlers::fetch::Fetcher;
use crate::error::AuditError;
use crate::parsers::ExtractorKind;
use crate::render::{RenderedPage, Renderer};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Loads pages with a plain GET; no scripts run.
///
/// The server's markup is analyzed with the pattern extractor, which copes
/// with whatever the server sends.
pub struct StaticRenderer {
    fetcher: Arc<dyn Fetcher>,
}

impl StaticRenderer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn load(&self, url: &str, timeout: Duration) -> Result<RenderedPage, AuditError> {
        let doc = tokio::time::timeout(timeout, self.fetcher.get(url))
            .await
            .map_err(|_| AuditError::Timeout(url.to_string()))??;

        Ok(RenderedPage {
            url: doc.url,
            status_code: doc.status,
            source: doc.body,
            extractor: ExtractorKind::Pattern,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuditConfig;
    use crate::crawlers::fetch::HttpFetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn renderer() -> StaticRenderer {
        StaticRenderer::new(Arc::new(HttpFetcher::new(&AuditConfig::default()).unwrap()))
    }

    #[tokio::test]
    async fn test_error_pages_are_rendered_with_their_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not found</title>"))
            .mount(&server)
            .await;

        let page = renderer()
            .load(&format!("{}/missing", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(page.status_code, 404);
        assert_eq!(page.extractor, ExtractorKind::Pattern);
        assert!(page.source.contains("Not found"));
    }

    #[tokio::test]
    async fn test_slow_page_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let result = renderer()
            .load(&server.uri(), Duration::from_millis(100))
            .await;

        assert!(matches!(result, Err(AuditError::Timeout(_))));
    }
}
