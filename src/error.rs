use thiserror::Error;

/// Errors produced while auditing a site.
///
/// Only the validation variants and the catastrophic ones ever reach a
/// caller; discovery, per-page and probe failures are logged and recovered
/// where they happen.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The request carried no URL at all
    #[error("No URL provided.")]
    MissingUrl,

    /// The URL does not start with http:// or https://
    #[error("Invalid URL format.")]
    InvalidUrl(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Navigation or probe did not finish in time
    #[error("timed out loading {0}")]
    Timeout(String),

    /// A WebDriver command failed
    #[error("WebDriver command error: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    /// The rendering engine could not be started
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("{0}")]
    Other(String),
}

impl AuditError {
    /// Whether the error was caused by the caller's input rather than by the audit itself
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuditError::MissingUrl | AuditError::InvalidUrl(_))
    }

    /// Whether a WebDriver error means the browser session is gone
    pub fn is_lost_session(&self) -> bool {
        match self {
            AuditError::Command(e) => e.to_string().contains("Unable to find session"),
            _ => false,
        }
    }
}
