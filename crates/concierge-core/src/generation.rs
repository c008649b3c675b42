//! Generation bridge: OpenAI-compatible chat completions (OpenRouter by default).
//!
//! The router only needs "persona + guest message in, text out". Upstream
//! shape problems are not guessed around: a response without usable content
//! comes back as [`Generation::Missing`] and the router decides what to do.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CONCIERGE_PERSONA: &str =
    "You are a helpful hotel concierge answering questions for guests.";
pub const DEFAULT_MODEL: &str = "openai/gpt-4-turbo";
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_persona: String,
    pub user_message: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    Text(String),
    Missing,
}

impl Generation {
    /// Text with at least one non-whitespace character.
    pub fn usable_text(self) -> Option<String> {
        match self {
            Generation::Text(t) if !t.trim().is_empty() => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation backend not configured (no API key)")]
    NotConfigured,
    #[error("generation request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation backend returned {0}: {1}")]
    Status(u16, String),
    #[error("generation response parse: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn extract_generation(parsed: ChatCompletionResponse) -> Generation {
    parsed
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(Generation::Text)
        .unwrap_or(Generation::Missing)
}

/// reqwest client for `{api_url}/chat/completions`.
pub struct ChatCompletionsClient {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Without an API key every call fails with [`GenerationError::NotConfigured`].
    pub fn new(api_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    target: "concierge::generation",
                    error = %e,
                    "HTTP client build failed; falling back to a client without the {:?} timeout",
                    timeout
                );
                reqwest::Client::new()
            }
        };
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ChatCompletionsClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_persona,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_message,
                },
            ],
        };

        tracing::debug!(
            target: "concierge::generation",
            model = %request.model,
            "requesting chat completion"
        );

        let res = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key)
            .header("HTTP-Referer", "https://concierge.local")
            .header("X-Title", "Concierge")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Status(status.as_u16(), text));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| GenerationError::Decode(e.to_string()))?;
        Ok(extract_generation(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Generation {
        extract_generation(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn first_choice_content_is_the_text() {
        let g = parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"Dogs are welcome."}},
                           {"message":{"content":"ignored"}}]}"#,
        );
        assert_eq!(g, Generation::Text("Dogs are welcome.".to_string()));
    }

    #[test]
    fn absent_pieces_are_missing() {
        assert_eq!(parse(r#"{}"#), Generation::Missing);
        assert_eq!(parse(r#"{"choices":[]}"#), Generation::Missing);
        assert_eq!(parse(r#"{"choices":[{}]}"#), Generation::Missing);
        assert_eq!(parse(r#"{"choices":[{"message":{"content":null}}]}"#), Generation::Missing);
    }

    #[test]
    fn blank_text_is_not_usable() {
        assert_eq!(Generation::Text("  ".into()).usable_text(), None);
        assert_eq!(Generation::Missing.usable_text(), None);
        assert_eq!(Generation::Text("Hi".into()).usable_text(), Some("Hi".to_string()));
    }

    #[tokio::test]
    async fn unconfigured_client_refuses() {
        let client = ChatCompletionsClient::new(DEFAULT_API_URL, Some("  ".into()), Duration::from_secs(1));
        assert!(!client.is_configured());
        let req = GenerationRequest {
            system_persona: CONCIERGE_PERSONA.to_string(),
            user_message: "Can I bring my dog?".to_string(),
            model: DEFAULT_MODEL.to_string(),
        };
        assert!(matches!(
            client.generate(&req).await,
            Err(GenerationError::NotConfigured)
        ));
    }
}
