use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The stored access token has passed its expiry. The caller aborts the
    /// in-flight operation and surfaces a sign-in prompt.
    #[error("Access token expired. Please sign in again.")]
    Expired,
}

/// A platform access token with its absolute expiry.
///
/// The token itself is held as a [`SecretString`] so it never appears in
/// `Debug` output or logs.
#[derive(Debug)]
pub struct AuthSession {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            expires_at,
        }
    }

    pub fn is_valid(&self) -> bool {
        Utc::now() < self.expires_at
    }

    /// The `Authorization` header value, or [`AuthError::Expired`].
    ///
    /// Every remote call goes through this check first, so an expired token
    /// fails fast instead of producing a 401 round-trip.
    pub fn bearer(&self) -> Result<String, AuthError> {
        if !self.is_valid() {
            return Err(AuthError::Expired);
        }
        Ok(format!("Bearer {}", self.access_token.expose_secret()))
    }
}
