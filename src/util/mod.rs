//! Small shared utilities: text sanitization and base-URL validation.

mod text;

pub use text::strip_control_chars;

use thiserror::Error;
use url::Url;

/// Errors from validating a configured API base URL.
#[derive(Debug, Error)]
pub enum BaseUrlError {
    #[error("Invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("Non-HTTPS base URL only allowed for localhost: {0}")]
    InsecureHost(String),
}

/// Validate an API base URL from configuration.
///
/// Base URLs must be http(s). Plain `http` is accepted only for
/// localhost/127.0.0.1, so tests can point at a local mock server without
/// ever allowing a token to travel over cleartext to a real host.
pub fn validate_base_url(base: &str) -> Result<Url, BaseUrlError> {
    let url = Url::parse(base)?;

    match url.scheme() {
        "https" => Ok(url),
        "http" => {
            let host = url.host_str().unwrap_or_default();
            if host == "localhost" || host == "127.0.0.1" || host == "[::1]" {
                Ok(url)
            } else {
                Err(BaseUrlError::InsecureHost(host.to_owned()))
            }
        }
        scheme => Err(BaseUrlError::UnsupportedScheme(scheme.to_owned())),
    }
}
