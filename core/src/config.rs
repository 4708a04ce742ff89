//! Client configuration and environment bootstrap.
//!
//! # Design
//! `ClientConfig` is immutable once handed to a client. Environment variables
//! are read in exactly two places, [`ClientConfig::from_env`] and
//! [`ClientConfig::resolve`], so callers that construct a config explicitly
//! get fully deterministic behavior. The API key never appears in `Debug`
//! output.

use std::env;
use std::fmt;

use crate::error::ApiError;

/// Version token embedded in the user agent.
pub const SDK_VERSION: &str = "0.0.0.1";

/// Production endpoint used when no override is given.
pub const DEFAULT_BASE_URL: &str = "https://ai.perkinsfund.org";

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_VAR: &str = "TRACEIX_API_KEY";

/// Environment variable that strips the client descriptor from the user
/// agent when set to exactly `"1"`.
pub const DISABLE_TELEMETRY_VAR: &str = "TRACEIX_DISABLE_TELEMETRY";

/// Everything a [`crate::TraceixClient`] needs, fixed at construction.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    user_agent: String,
}

impl ClientConfig {
    /// Build a config with an explicit API key and default base URL.
    ///
    /// An empty key fails with [`ApiError::MissingApiKey`] here, before any
    /// request is attempted.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ApiError::MissingApiKey);
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: build_user_agent(true),
        })
    }

    /// Point the client at a different host. Trailing slashes are stripped
    /// so path concatenation yields exactly one `/` per segment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable or disable the client descriptor in the user agent. The
    /// version token is always present.
    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.user_agent = build_user_agent(enabled);
        self
    }

    /// Bootstrap entirely from the environment: `TRACEIX_API_KEY` for the
    /// key and `TRACEIX_DISABLE_TELEMETRY` for the user-agent branch.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::resolve(None)
    }

    /// Resolve a config from an optional explicit key, falling back to the
    /// environment when the key is absent or empty. The telemetry opt-out is
    /// honored in both cases.
    pub fn resolve(api_key: Option<&str>) -> Result<Self, ApiError> {
        let telemetry = env::var(DISABLE_TELEMETRY_VAR).map_or(true, |v| v != "1");
        let key = match api_key {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => env::var(API_KEY_VAR).unwrap_or_default(),
        };
        Ok(Self::new(key)?.with_telemetry(telemetry))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn build_user_agent(telemetry: bool) -> String {
    if telemetry {
        format!("Traceix/{SDK_VERSION} (Rust reqwest client)")
    } else {
        format!("Traceix/{SDK_VERSION}")
    }
}
