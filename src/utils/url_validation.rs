//! Backend URL validation.
//!
//! The backend base URL must:
//! - Parse as an absolute URL
//! - Use the `http` or `https` scheme
//! - Carry a host
//! - Not carry a query string or fragment
//!
//! Endpoint paths are joined onto the base with [`endpoint_url`].

use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be http or https, got: {0}")]
    UnsupportedScheme(String),

    #[error("URL must have a host")]
    MissingHost,

    #[error("Base URL must not carry a query or fragment")]
    UnexpectedQuery,

    #[error("Endpoint path must start with '/', got: {0}")]
    RelativePath(String),
}

/// Validate the backend base URL.
pub fn validate_backend_url(raw: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(raw.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(UrlValidationError::UnexpectedQuery);
    }

    if url.scheme() == "http" && !is_local_host(&url) {
        tracing::warn!("Backend URL {} is not using TLS", url);
    }

    Ok(url)
}

/// Join an absolute endpoint path onto the base URL.
///
/// Any path on the base is kept as a prefix, so `http://host/app` joined
/// with `/api/search` yields `http://host/app/api/search`.
pub fn endpoint_url(base: &Url, path: &str) -> Result<Url, UrlValidationError> {
    if !path.starts_with('/') {
        return Err(UrlValidationError::RelativePath(path.to_string()));
    }

    let prefix = base.path().trim_end_matches('/');
    let mut url = base.clone();
    url.set_path(&format!("{}{}", prefix, path));
    Ok(url)
}

fn is_local_host(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_backend_urls() {
        assert!(validate_backend_url("http://localhost:8813").is_ok());
        assert!(validate_backend_url("https://assistant.example.com").is_ok());
        assert!(validate_backend_url("  http://127.0.0.1:8813/  ").is_ok());
    }

    #[test]
    fn test_invalid_format() {
        let result = validate_backend_url("not a url");
        assert!(matches!(result, Err(UrlValidationError::InvalidFormat(_))));
    }

    #[test]
    fn test_unsupported_scheme() {
        let result = validate_backend_url("ftp://example.com");
        assert!(matches!(
            result,
            Err(UrlValidationError::UnsupportedScheme(s)) if s == "ftp"
        ));

        let result = validate_backend_url("wss://example.com");
        assert!(matches!(result, Err(UrlValidationError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_query_rejected() {
        let result = validate_backend_url("http://localhost:8813/?token=x");
        assert!(matches!(result, Err(UrlValidationError::UnexpectedQuery)));
    }

    #[test]
    fn test_endpoint_url_joins_paths() {
        let base = Url::parse("http://localhost:8813").unwrap();
        assert_eq!(
            endpoint_url(&base, "/api/search").unwrap().as_str(),
            "http://localhost:8813/api/search"
        );

        let prefixed = Url::parse("https://example.com/assistant/").unwrap();
        assert_eq!(
            endpoint_url(&prefixed, "/api/rtc-connect").unwrap().as_str(),
            "https://example.com/assistant/api/rtc-connect"
        );
    }

    #[test]
    fn test_endpoint_url_requires_absolute_path() {
        let base = Url::parse("http://localhost:8813").unwrap();
        assert!(matches!(
            endpoint_url(&base, "api/search"),
            Err(UrlValidationError::RelativePath(_))
        ));
    }
}
