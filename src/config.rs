use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default time to wait for the wallet before giving up on a session.
pub const LOGIN_TIMEOUT_MS: u64 = 120_000;

/// Default time the "copied" feedback stays visible.
pub const COPY_FEEDBACK_MS: u64 = 2_000;

/// Default user-facing message key set when the push channel fails.
pub const LOGIN_ERROR_KEY: &str = "login.error";

/// Tunables of a [LoginSession](crate::login::LoginSession).
///
/// Every field is optional when deserializing, so `{}` yields the defaults.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginConfig {
    pub timeout_ms: u64,
    pub copy_feedback_ms: u64,
    pub error_key: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            timeout_ms: LOGIN_TIMEOUT_MS,
            copy_feedback_ms: COPY_FEEDBACK_MS,
            error_key: LOGIN_ERROR_KEY.to_owned(),
        }
    }
}

impl LoginConfig {
    /// Parse a configuration from JSON, reporting the path of the offending field on error.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::Config {
            path: e.path().to_string(),
            source: e.into_inner(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }
}

/// The three values a login surface is activated with.
///
/// Absent values default to the empty string, which disables whatever depends on them.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivationParams {
    /// Raw authorization request issued by the verifier. Not necessarily a URL.
    pub auth_request: String,
    /// Correlation token binding the pushed outcome to this login attempt.
    #[serde(rename = "state")]
    pub correlation_token: String,
    /// Fallback destination after a timeout.
    pub home_uri: String,
}

impl ActivationParams {
    pub fn new(
        auth_request: impl Into<String>,
        correlation_token: impl Into<String>,
        home_uri: impl Into<String>,
    ) -> Self {
        Self {
            auth_request: auth_request.into(),
            correlation_token: correlation_token.into(),
            home_uri: home_uri.into(),
        }
    }

    /// Read the parameters from a URL query string, with or without its leading `?`.
    ///
    /// Unknown keys are ignored and a repeated key keeps its first value.
    pub fn from_query(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
                .unwrap_or_default()
        };

        Ok(Self::new(first("authRequest"), first("state"), first("homeUri")))
    }
}
