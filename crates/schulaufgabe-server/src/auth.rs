//! HTTP Basic authentication for the metrics endpoints.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use subtle::ConstantTimeEq;

use schulaufgabe_core::config::MetricsConfig;

use crate::error::ApiError;

/// Username and password a scraper must present.
#[derive(Clone)]
pub struct MetricsCredentials {
    username: String,
    password: String,
}

impl MetricsCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `None` unless both values are configured and non-empty.
    pub fn from_config(config: &MetricsConfig) -> Option<Self> {
        config
            .credentials()
            .map(|(username, password)| Self::new(username, password))
    }

    /// Compares both halves in constant time, evaluating each regardless of
    /// whether the other matched.
    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

impl std::fmt::Debug for MetricsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Extracts `(username, password)` from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Checks a request against the configured metrics credentials.
///
/// # Errors
///
/// - `MetricsNotConfigured` when no credentials are configured.
/// - `Unauthorized` when the header is missing, malformed or wrong.
pub fn authorize(expected: Option<&MetricsCredentials>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        tracing::error!("METRICS_USERNAME or METRICS_PASSWORD not set in environment");
        return Err(ApiError::MetricsNotConfigured);
    };

    match basic_credentials(headers) {
        Some((username, password)) if expected.matches(&username, &password) => Ok(()),
        _ => {
            tracing::warn!("[Metrics] Rejected scrape with invalid credentials");
            Err(ApiError::Unauthorized)
        }
    }
}
