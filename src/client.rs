//! The authenticated client handle sessions are built on.

use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::{GptKitError, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Capability handle for the OpenAI API: a validated credential plus the
/// endpoint base. Cloning is cheap; each session owns its own copy.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client from an API key.
    ///
    /// The key must form a valid `Authorization` header; anything empty or
    /// containing control characters is rejected up front.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GptKitError::Configuration(
                "Cannot configure client: API key is empty".to_string(),
            ));
        }
        if let Err(e) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
            return Err(GptKitError::Configuration(format!(
                "Cannot configure client, invalid API key: {e}"
            )));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a client from the environment (`OPENAI_API_KEY`, with an
    /// optional `OPENAI_BASE_URL` override). Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            GptKitError::Configuration("Missing OPENAI_API_KEY".to_string())
        })?;
        let mut client = Self::new(api_key)?;
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            client = client.with_base_url(url);
        }
        Ok(client)
    }

    /// Override the endpoint base URL (e.g. to point at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"..")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        let err = OpenAiClient::new("   ").unwrap_err();
        assert!(matches!(err, GptKitError::Configuration(_)));
    }

    #[test]
    fn rejects_key_with_control_characters() {
        let err = OpenAiClient::new("sk-bad\nkey").unwrap_err();
        assert!(
            matches!(err, GptKitError::Configuration(msg) if msg.contains("invalid API key"))
        );
    }

    #[test]
    fn base_url_override_trims_trailing_slash() {
        let client = OpenAiClient::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(client.endpoint("/files"), "http://localhost:9999/files");
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = OpenAiClient::new("sk-secret").unwrap();
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("sk-secret"));
    }
}
