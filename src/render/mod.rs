//! Renderer abstraction for page loading.
//!
//! The analyzer only sees the `Renderer` trait, so the browser can be swapped
//! for the plain-HTTP renderer or a test double.

pub mod static_markup;
pub mod webdriver;

use crate::config::{AuditConfig, RendererKind};
use crate::crawlers::fetch::Fetcher;
use crate::error::AuditError;
use crate::parsers::ExtractorKind;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A loaded page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects
    pub url: String,
    /// Status of the navigation response, 0 if unavailable
    pub status_code: u16,
    /// Serialized document
    pub source: String,
    /// Extractor suited to `source`
    pub extractor: ExtractorKind,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Bring the engine up. A failure here aborts the whole audit.
    async fn start(&self) -> Result<(), AuditError> {
        Ok(())
    }

    /// Load a page and wait for it to settle, giving up after `timeout`
    async fn load(&self, url: &str, timeout: Duration) -> Result<RenderedPage, AuditError>;

    /// Release engine resources
    async fn shutdown(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Build the renderer selected in the configuration
pub fn from_config(config: &AuditConfig, fetcher: Arc<dyn Fetcher>) -> Arc<dyn Renderer> {
    match config.renderer {
        RendererKind::WebDriver => Arc::new(webdriver::WebDriverRenderer::new(config)),
        RendererKind::Static => Arc::new(static_markup::StaticRenderer::new(fetcher)),
    }
}
