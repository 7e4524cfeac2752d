use async_trait::async_trait;

use super::gemini::{parse_reply, ModelReply};
use super::ProviderError;

/// Seam between the request handlers and the hosted model API.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a fully assembled prompt and return the raw model text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Turn arbitrary text into a fixed-length embedding vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Complete the prompt and split the reply into its labeled lines.
    async fn ask(&self, prompt: &str) -> Result<ModelReply, ProviderError> {
        let full_text = self.complete(prompt).await?;
        Ok(parse_reply(&full_text))
    }
}
