use crate::config::AuditConfig;
use crate::error::AuditError;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

/// A fetched document
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedDocument {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain HTTP access used by discovery, the static renderer, and the link prober
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a document. Non-2xx responses are returned, not treated as errors.
    async fn get(&self, url: &str) -> Result<FetchedDocument, AuditError>;

    /// HEAD a URL without following redirects and return the status
    async fn head(&self, url: &str) -> Result<u16, AuditError>;
}

/// `Fetcher` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    probe_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.page_timeout())
            .build()?;

        let probe_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .timeout(config.probe_timeout())
            .connect_timeout(config.probe_timeout().min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            client,
            probe_client,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedDocument, AuditError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        ::log::trace!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchedDocument {
            url: final_url,
            status,
            body,
        })
    }

    async fn head(&self, url: &str) -> Result<u16, AuditError> {
        let response = self.probe_client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}
