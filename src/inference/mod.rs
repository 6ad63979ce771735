//! Free-text generation used to clean up and screen song requests.

pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

/// A text-in, text-out language model.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Send a prompt and return the model's reply verbatim.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
