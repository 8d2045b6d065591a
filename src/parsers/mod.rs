pub mod html;
pub mod markup;


use crate::results::PageSignals;
use url::Url;

/// Strategy used to pull signals out of a page's markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Full DOM parse of a rendered document
    Dom,
    /// Pattern scan over raw markup, for when no rendering engine is available
    Pattern,
}

impl ExtractorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExtractorKind::Dom => "dom",
            ExtractorKind::Pattern => "pattern",
        }
    }
}

/// Main parser that delegates to the specific extractor
pub struct Parser;

impl Parser {
    /// Extract page signals from markup.
    ///
    /// Never fails: absent elements yield empty values. The status code is
    /// left at 0 and must be attached by the caller.
    pub fn extract(source: &str, base: &Url, kind: ExtractorKind) -> PageSignals {
        let signals = match kind {
            ExtractorKind::Dom => html::extract(source, base),
            ExtractorKind::Pattern => markup::extract(source, base),
        };

        ::log::debug!(
            "{} extractor found {} links and {} images on {}",
            kind.label(),
            signals.links.len(),
            signals.images.len(),
            base
        );

        signals
    }
}

/// Resolve an attribute value the way a browser's `href`/`src` properties do
pub(crate) fn resolve_url(base: &Url, raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match base.join(raw) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Collapse runs of whitespace into single spaces and trim, like `document.title`
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
