use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{DomainError, ProviderError};

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// GETs `url` with the query pairs and decodes the body as JSON
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        let mut request = self.client.get(url).query(query);

        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        // Error text must never carry the URL: its query string may hold an API key
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::parse(e.without_url()))
    }
}
