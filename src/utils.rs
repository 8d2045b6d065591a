use crate::error::AuditError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static HTTP_SCHEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Whether a string starts with `http://` or `https://`, in any case
pub fn is_http_url(raw: &str) -> bool {
    HTTP_SCHEME.is_match(raw)
}

/// Check a requested audit target without touching the network
pub fn validate_target(raw: Option<&str>) -> Result<Url, AuditError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AuditError::MissingUrl);
    }
    if !is_http_url(raw) {
        return Err(AuditError::InvalidUrl(raw.to_string()));
    }

    let url = Url::parse(raw).map_err(|_| AuditError::InvalidUrl(raw.to_string()))?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AuditError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_check_ignores_case() {
        assert!(is_http_url("https://acme.test"));
        assert!(is_http_url("HTTP://ACME.TEST/"));
        assert!(!is_http_url("ftp://acme.test"));
        assert!(!is_http_url("acme.test"));
        assert!(!is_http_url(" https://acme.test"));
    }

    #[test]
    fn test_validate_target() {
        assert!(matches!(validate_target(None), Err(AuditError::MissingUrl)));
        assert!(matches!(validate_target(Some("  ")), Err(AuditError::MissingUrl)));
        assert!(matches!(
            validate_target(Some("www.acme.test")),
            Err(AuditError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_target(Some("http://")),
            Err(AuditError::InvalidUrl(_))
        ));

        let url = validate_target(Some("HTTPS://Acme.test/shop")).unwrap();
        assert_eq!(url.as_str(), "https://acme.test/shop");
    }
}
