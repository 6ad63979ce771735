use anyhow::{anyhow, bail, Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::inference::{
    gemini::types::{GeminiConfig, GenerateContentRequest, GenerateContentResponse},
    InferenceService,
};

/// Gemini `generateContent` client
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl GeminiClient {
    /// Create new Gemini client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        debug!(model = %self.config.model, "Sending prompt to Gemini");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await
            .context("Gemini request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini request failed: {status} - {body}");
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;
        let text = reply
            .into_text()
            .ok_or_else(|| anyhow!("Gemini response was empty"))?;
        debug!(%text, "Gemini reply");
        Ok(text)
    }
}
