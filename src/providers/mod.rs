pub mod gemini;
pub mod traits;

pub use gemini::{GeminiClient, ModelReply};
pub use traits::LanguageModel;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("rate limit exceeded, please wait {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("invalid response format: {0}")]
    InvalidResponse(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text for {0} cannot be empty")]
    EmptyInput(&'static str),
}

impl ProviderError {
    /// Rate limits are worth retrying after the hinted delay; everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}
