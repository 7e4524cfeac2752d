use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use async_trait::async_trait;

use super::traits::LanguageModel;
use super::ProviderError;
use crate::config::GeminiConfig;

const ANSWER_PREFIX: &str = "answer:";
const SOURCE_PREFIX: &str = "sourceDocument:";
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Answer text plus the optional source label the model was instructed to emit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub answer: String,
    pub source_document: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.config.generate_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }]
            }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let response_json: Value = response.json().await?;

        response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing candidates[0].content.parts[0].text".into())
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyInput("embedding"));
        }

        let response = self
            .client
            .post(&self.config.embed_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&json!({
                "model": format!("models/{}", self.config.embed_model),
                "content": {
                    "parts": [{ "text": text }]
                }
            }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let response_json: Value = response.json().await?;

        let values = response_json["embedding"]["values"]
            .as_array()
            .ok_or_else(|| ProviderError::InvalidResponse("missing embedding.values".into()))?;

        values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| ProviderError::InvalidResponse("non-numeric embedding value".into()))
            })
            .collect()
    }
}

/// Split a model reply into the `answer:` line and the optional `sourceDocument:` line.
///
/// The model is instructed to emit both labels, but replies without them fall back to
/// the whole trimmed text. A blank or literal "No document" source counts as absent.
pub fn parse_reply(full_text: &str) -> ModelReply {
    let lines: Vec<&str> = full_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let answer = lines
        .iter()
        .find_map(|l| strip_label(l, ANSWER_PREFIX))
        .map(str::to_string)
        .unwrap_or_else(|| full_text.trim().to_string());

    let answer = if answer.is_empty() {
        "No answer".to_string()
    } else {
        answer
    };

    let source_document = lines
        .iter()
        .find_map(|l| strip_label(l, SOURCE_PREFIX))
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("No document"))
        .map(str::to_string);

    ModelReply {
        answer,
        source_document,
    }
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_answer_and_source() {
        let reply = parse_reply("answer: The capital of France is Paris.\nsourceDocument: geography_faq.txt");
        assert_eq!(reply.answer, "The capital of France is Paris.");
        assert_eq!(reply.source_document, Some("geography_faq.txt".to_string()));
    }

    #[test]
    fn labels_are_case_insensitive() {
        let reply = parse_reply("Answer: hello\nSOURCEDOCUMENT: notes.txt");
        assert_eq!(reply.answer, "hello");
        assert_eq!(reply.source_document, Some("notes.txt".to_string()));
    }

    #[test]
    fn unlabeled_reply_falls_back_to_full_text() {
        let reply = parse_reply("  Just some prose without labels.  ");
        assert_eq!(reply.answer, "Just some prose without labels.");
        assert_eq!(reply.source_document, None);
    }

    #[test]
    fn no_document_marker_counts_as_absent() {
        let reply = parse_reply("answer: Hello!\nsourceDocument: No document");
        assert_eq!(reply.source_document, None);

        let reply = parse_reply("answer: Hello!\nsourceDocument:   ");
        assert_eq!(reply.source_document, None);
    }

    #[test]
    fn empty_reply_becomes_no_answer() {
        let reply = parse_reply("   \n  ");
        assert_eq!(reply.answer, "No answer");
        assert_eq!(reply.source_document, None);
    }
}
