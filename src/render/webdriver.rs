use crate::config::AuditConfig;
use crate::error::AuditError;
use crate::parsers::ExtractorKind;
use crate::render::{RenderedPage, Renderer};
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Reports whether the document finished loading and how many subresources it has fetched so far
const SETTLE_PROBE: &str = r#"
return {
    ready: document.readyState,
    resources: performance.getEntriesByType('resource').length
};"#;

/// Status of the navigation response, 0 when the browser does not expose it
const STATUS_PROBE: &str = r#"
const nav = performance.getEntriesByType('navigation')[0];
return nav && typeof nav.responseStatus === 'number' ? nav.responseStatus : 0;"#;

const SETTLE_POLL: Duration = Duration::from_millis(100);

/// Common local WebDriver endpoints tried when the configured one is down
const FALLBACK_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // Try with IP instead of localhost
];

/// A checked-out session that is handed to `retire` if dropped before `release`.
///
/// A `load` abandoned mid-flight (page timeout or run deadline) drops its
/// future, and the session goes with it.
struct Checkout<T> {
    item: Option<T>,
    retire: fn(T),
}

impl<T> Checkout<T> {
    fn new(item: T, retire: fn(T)) -> Self {
        Self {
            item: Some(item),
            retire,
        }
    }

    fn get(&self) -> Option<&T> {
        self.item.as_ref()
    }

    fn release(mut self) -> Option<T> {
        self.item.take()
    }
}

impl<T> Drop for Checkout<T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            (self.retire)(item);
        }
    }
}

/// Close a session in the background; the browser may still be busy with it
fn retire_client(client: Client) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = client.close().await {
                    ::log::debug!("Failed to close retired WebDriver session: {}", e);
                }
            });
        }
        Err(_) => ::log::warn!("No runtime left to close a WebDriver session"),
    }
}

/// Renders pages in a real browser over WebDriver.
///
/// Sessions are opened lazily and kept in an idle pool, so concurrent
/// analysis workers each hold their own session.
pub struct WebDriverRenderer {
    webdriver_url: String,
    user_agent: String,
    settle_quiet: Duration,
    idle: Mutex<Vec<Client>>,
}

impl WebDriverRenderer {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            user_agent: config.user_agent.clone(),
            settle_quiet: config.settle_quiet(),
            idle: Mutex::new(Vec::new()),
        }
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-setuid-sandbox",
                    format!("--user-agent={}", self.user_agent),
                ]
            }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({
                "args": ["-headless"],
                "prefs": { "general.useragent.override": self.user_agent }
            }),
        );
        caps
    }

    async fn open_session(
        &self,
        webdriver_url: &str,
    ) -> Result<Client, fantoccini::error::NewSessionError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        builder.connect(webdriver_url).await
    }

    /// Connects to the WebDriver instance, trying common local ports if the configured one fails
    async fn connect(&self) -> Result<Client, AuditError> {
        match self.open_session(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                return Ok(client);
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
            }
        }

        for url in FALLBACK_URLS.iter() {
            if *url == self.webdriver_url {
                continue;
            }

            ::log::info!("Trying fallback WebDriver URL: {}", url);
            if let Ok(client) = self.open_session(url).await {
                ::log::debug!("Connected to fallback WebDriver at {}", url);
                return Ok(client);
            }
        }

        Err(AuditError::RendererUnavailable(format!(
            "no WebDriver server reachable at {} (set WEBDRIVER_URL)",
            self.webdriver_url
        )))
    }

    async fn checkout(&self) -> Result<Client, AuditError> {
        if let Some(client) = self.idle.lock().await.pop() {
            return Ok(client);
        }
        self.connect().await
    }

    async fn checkin(&self, client: Client) {
        self.idle.lock().await.push(client);
    }

    /// Navigate, wait for the network to go quiet, then read status and DOM
    async fn render(&self, client: &Client, url: &str) -> Result<RenderedPage, AuditError> {
        client.goto(url).await?;
        self.wait_until_settled(client).await?;

        let status_code = client
            .execute(STATUS_PROBE, Vec::new())
            .await?
            .as_u64()
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(0);
        let source = client.source().await?;
        let final_url = client.current_url().await?.to_string();

        Ok(RenderedPage {
            url: final_url,
            status_code,
            source,
            extractor: ExtractorKind::Dom,
        })
    }

    /// Settled means `readyState == "complete"` and no new resource entries for `settle_quiet`
    async fn wait_until_settled(&self, client: &Client) -> Result<(), AuditError> {
        let mut last_count = None;
        let mut quiet_since = Instant::now();

        loop {
            let state = client.execute(SETTLE_PROBE, Vec::new()).await?;
            let ready = state["ready"].as_str() == Some("complete");
            let count = state["resources"].as_u64().unwrap_or(0);

            if ready && last_count == Some(count) {
                if quiet_since.elapsed() >= self.settle_quiet {
                    return Ok(());
                }
            } else {
                quiet_since = Instant::now();
            }

            last_count = Some(count);
            tokio::time::sleep(SETTLE_POLL).await;
        }
    }
}

#[async_trait]
impl Renderer for WebDriverRenderer {
    async fn start(&self) -> Result<(), AuditError> {
        let client = self.connect().await?;
        self.checkin(client).await;
        Ok(())
    }

    async fn load(&self, url: &str, timeout: Duration) -> Result<RenderedPage, AuditError> {
        let session = Checkout::new(self.checkout().await?, retire_client);
        let Some(client) = session.get() else {
            return Err(AuditError::RendererUnavailable("no WebDriver session".to_string()));
        };

        let outcome = tokio::time::timeout(timeout, self.render(client, url)).await;
        match outcome {
            Ok(Ok(page)) => {
                if let Some(client) = session.release() {
                    self.checkin(client).await;
                }
                Ok(page)
            }
            Ok(Err(e)) => {
                if e.is_lost_session() {
                    ::log::warn!("Lost WebDriver session while loading {}", url);
                    drop(session);
                } else if let Some(client) = session.release() {
                    self.checkin(client).await;
                }
                Err(e)
            }
            // Dropping the checkout retires the session
            Err(_) => Err(AuditError::Timeout(url.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), AuditError> {
        let clients: Vec<Client> = self.idle.lock().await.drain(..).collect();
        for client in clients {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver client: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_capabilities_carry_user_agent() {
        let renderer = WebDriverRenderer::new(&AuditConfig::default());
        let caps = renderer.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--user-agent=SEO-Analyzer-Bot"));
        assert_eq!(
            caps["moz:firefoxOptions"]["prefs"]["general.useragent.override"],
            "SEO-Analyzer-Bot"
        );
    }

    static RETIRED: AtomicUsize = AtomicUsize::new(0);

    fn count_retired(_: &'static str) {
        RETIRED.fetch_add(1, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn test_checkout_retires_unreleased_sessions() {
        let released = Checkout::new("kept", count_retired);
        assert_eq!(released.release(), Some("kept"));
        assert_eq!(RETIRED.load(Ordering::SeqCst), 0);

        // An in-flight load abandoned by a deadline drops its checkout
        let abandoned = tokio::time::timeout(Duration::from_millis(20), async {
            let session = Checkout::new("busy", count_retired);
            tokio::time::sleep(Duration::from_secs(60)).await;
            session.release()
        })
        .await;

        assert!(abandoned.is_err());
        assert_eq!(RETIRED.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_without_sessions_is_ok() {
        let renderer = WebDriverRenderer::new(&AuditConfig::default());
        assert!(renderer.shutdown().await.is_ok());
    }
}
