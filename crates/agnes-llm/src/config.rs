//! Provider configuration
//!
//! Handles API keys and provider selection from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{GeminiProvider, LlmProvider, MockProvider, ResilientProvider};

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which generative backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted Gemini API
    Gemini,
    /// Canned offline responses
    Mock,
    /// No generative provider; scripted replies only
    Off,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "mock" => Ok(ProviderKind::Mock),
            "off" | "none" | "scripted" => Ok(ProviderKind::Off),
            other => Err(ConfigError::Invalid(format!("unknown provider '{}'", other))),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mock => "mock",
            ProviderKind::Off => "off",
        };
        f.write_str(name)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Gemini API key (env: GEMINI_API_KEY)
    pub gemini_api_key: Option<String>,
    /// Selected provider (env: AGNES_PROVIDER)
    pub provider: ProviderKind,
    /// Model name (env: AGNES_MODEL)
    pub model: String,
    /// HTTP timeout per request in ms (env: AGNES_HTTP_TIMEOUT_MS)
    pub http_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            provider: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            http_timeout_ms: 15_000,
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            provider: parse_setting("AGNES_PROVIDER", env::var("AGNES_PROVIDER").ok())
                .unwrap_or(defaults.provider),
            model: env::var("AGNES_MODEL").unwrap_or(defaults.model),
            http_timeout_ms: parse_setting(
                "AGNES_HTTP_TIMEOUT_MS",
                env::var("AGNES_HTTP_TIMEOUT_MS").ok(),
            )
            .unwrap_or(defaults.http_timeout_ms),
        }
    }

    /// Whether the selected provider can actually be built
    pub fn is_configured(&self) -> bool {
        match self.provider {
            ProviderKind::Gemini => self.gemini_api_key.is_some(),
            ProviderKind::Mock => true,
            ProviderKind::Off => false,
        }
    }

    /// Build the selected provider, wrapped so it backs off when it keeps failing
    ///
    /// Returns `Ok(None)` when generation is switched off.
    pub fn build_provider(&self) -> Result<Option<Arc<dyn LlmProvider>>, ConfigError> {
        match self.provider {
            ProviderKind::Off => Ok(None),
            ProviderKind::Mock => Ok(Some(Arc::new(ResilientProvider::wrap(MockProvider::new(
                vec![
                    "Hmm. And how long would all of that take?".to_string(),
                    "I'm still not sure. What happens if the adjuster says no?".to_string(),
                ],
            ))))),
            ProviderKind::Gemini => {
                let key = self
                    .gemini_api_key
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;
                let provider = GeminiProvider::new(key, &self.model)
                    .with_timeout(Duration::from_millis(self.http_timeout_ms));
                Ok(Some(Arc::new(ResilientProvider::wrap(provider))))
            }
        }
    }
}

/// Parse a raw setting, logging and discarding values that don't parse
fn parse_setting<T>(name: &str, raw: Option<String>) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = raw?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(var = name, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
