//! URL helpers for backend endpoints
//!
//! The client talks to one backend through three kinds of URL:
//! - the HTTP server URL the catalog API path is joined onto
//! - the WebSocket URL, derived from the server URL when not configured
//! - model description URLs from the catalog, which may be relative to the server

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that can occur during URL validation
#[derive(Debug, Error)]
pub enum UrlValidationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(#[from] url::ParseError),

    #[error("URL scheme must be one of {expected}, got: {got}")]
    UnsupportedScheme { expected: String, got: String },

    #[error("URL must have a host")]
    MissingHost,
}

/// Schemes accepted for the HTTP server URL.
pub const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Schemes accepted for the WebSocket URL.
pub const WS_SCHEMES: &[&str] = &["ws", "wss"];

/// Parse `url` and check its scheme and host.
///
/// # Example
/// ```
/// use virtu_avatar::utils::url_validation::{HTTP_SCHEMES, validate_url};
///
/// assert!(validate_url("http://127.0.0.1:8000", HTTP_SCHEMES).is_ok());
/// assert!(validate_url("ftp://example.com", HTTP_SCHEMES).is_err());
/// ```
pub fn validate_url(url: &str, schemes: &[&str]) -> Result<Url, UrlValidationError> {
    let parsed = Url::parse(url)?;

    if !schemes.contains(&parsed.scheme()) {
        return Err(UrlValidationError::UnsupportedScheme {
            expected: schemes.join("|"),
            got: parsed.scheme().to_string(),
        });
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(parsed)
}

/// Derive the WebSocket URL for `path` on the same host as `server_url`.
///
/// `http` maps to `ws` and `https` to `wss`. Host and port are kept; path,
/// query and fragment are replaced.
pub fn derive_ws_url(server_url: &str, path: &str) -> Result<String, UrlValidationError> {
    let mut url = validate_url(server_url, HTTP_SCHEMES)?;

    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    // switching between special schemes is always accepted by `url`
    if url.set_scheme(scheme).is_err() {
        warn!(server_url, "Could not switch scheme to {scheme}");
        return Err(UrlValidationError::UnsupportedScheme {
            expected: HTTP_SCHEMES.join("|"),
            got: url.scheme().to_string(),
        });
    }

    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Join an absolute API path onto the server URL, replacing its path.
pub fn join_path(server_url: &str, path: &str) -> Result<String, UrlValidationError> {
    let mut url = validate_url(server_url, HTTP_SCHEMES)?;
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Resolve a catalog URL against the server URL, the way a page resolves a
/// relative reference against its origin. Absolute URLs are returned as-is.
pub fn resolve_reference(server_url: &str, reference: &str) -> Result<String, UrlValidationError> {
    match Url::parse(reference) {
        Ok(absolute) => Ok(absolute.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = validate_url(server_url, HTTP_SCHEMES)?;
            Ok(base.join(reference)?.to_string())
        }
        Err(e) => Err(e.into()),
    }
}
