use crate::crawlers::fetch::Fetcher;
use crate::utils::is_http_url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Link counts for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LinkClassification {
    pub internal: usize,
    pub external: usize,
    /// Confirmed 404s among the probed sample
    pub broken: usize,
}

/// Authority part of an absolute URL string (`user@host:port`), if any
fn authority(link: &str) -> Option<&str> {
    let (_, rest) = link.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

fn mentions_host(link: &str, hostname: &str) -> bool {
    !hostname.is_empty()
        && authority(link)
            .is_some_and(|a| a.to_ascii_lowercase().contains(&hostname.to_ascii_lowercase()))
}

/// A root-relative link, or one whose authority contains the page's hostname
pub fn is_internal(link: &str, hostname: &str) -> bool {
    link.starts_with('/') || mentions_host(link, hostname)
}

/// An absolute http(s) link whose authority does not contain the page's hostname
pub fn is_external(link: &str, hostname: &str) -> bool {
    is_http_url(link) && !mentions_host(link, hostname)
}

/// Counts internal and external links. Links that are neither (mailto:, tel:, ...) are ignored.
pub fn classify(links: &[String], hostname: &str) -> LinkClassification {
    LinkClassification {
        internal: links.iter().filter(|l| is_internal(l, hostname)).count(),
        external: links.iter().filter(|l| is_external(l, hostname)).count(),
        broken: 0,
    }
}

/// Samples a page's links and counts the ones answering 404
#[derive(Clone)]
pub struct LinkProber {
    fetcher: Arc<dyn Fetcher>,
    sample_size: usize,
    timeout: Duration,
}

impl LinkProber {
    pub fn new(fetcher: Arc<dyn Fetcher>, sample_size: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            sample_size,
            timeout,
        }
    }

    /// Probe the first `sample_size` links, in extraction order, one at a time.
    ///
    /// Only a confirmed 404 counts; timeouts, network errors and other
    /// statuses are treated as not broken.
    pub async fn count_broken(&self, links: &[String]) -> usize {
        let mut broken = 0;

        for link in links.iter().take(self.sample_size) {
            match tokio::time::timeout(self.timeout, self.fetcher.head(link)).await {
                Ok(Ok(404)) => {
                    ::log::debug!("Broken link: {}", link);
                    broken += 1;
                }
                Ok(Ok(status)) => {
                    ::log::trace!("Probe {} -> {}", link, status);
                }
                Ok(Err(e)) => {
                    ::log::debug!("Probe failed for {}: {}", link, e);
                }
                Err(_) => {
                    ::log::debug!("Probe timed out for {}", link);
                }
            }
        }

        broken
    }

    /// Classify links and probe the sample
    pub async fn inspect(&self, links: &[String], hostname: &str) -> LinkClassification {
        LinkClassification {
            broken: self.count_broken(links).await,
            ..classify(links, hostname)
        }
    }
}
