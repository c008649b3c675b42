//! Answer router: knowledge base first, generation as fallback.
//!
//! Each call walks an explicit state machine:
//!
//! | Stage | Next |
//! |-------|------|
//! | Validate | LocalLookup, or Failed(InvalidRequest) |
//! | LocalLookup | LocalHit on first candidate, GenerateFallback on none, Failed(LookupUnavailable) |
//! | GenerateFallback | GenerateResult, or Failed(GenerationUnavailable) |
//! | GenerateResult | Generated, or Failed(GenerationEmpty) under `Reject` |
//!
//! Generation is only reachable from an empty lookup, so the two collaborators
//! are never raced. The router holds no per-request state and is safe to share.

use crate::error::RouterError;
use crate::generation::{AnswerGenerator, Generation, GenerationRequest, CONCIERGE_PERSONA, DEFAULT_MODEL};
use crate::language::Language;
use crate::lookup::KnowledgeLookup;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Local,
    Generated,
}

/// Successful answer. The source is fixed by the constructor and cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatAnswer {
    answer: String,
    source: AnswerSource,
}

impl ChatAnswer {
    pub fn local(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::Local,
        }
    }

    pub fn generated(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            source: AnswerSource::Generated,
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn source(&self) -> AnswerSource {
        self.source
    }
}

/// Wire shape of a failed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFailure {
    pub error: String,
}

impl From<&RouterError> for ChatFailure {
    fn from(e: &RouterError) -> Self {
        Self {
            error: e.public_message().to_string(),
        }
    }
}

/// A validated guest question. Only constructible through [`ChatRequest::new`]
/// or [`ChatRequest::from_json`], so the message is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    message: String,
    language: Language,
}

impl ChatRequest {
    /// The message is kept verbatim; it is only trimmed to check for emptiness.
    pub fn new(message: impl Into<String>, language: Language) -> Result<Self, RouterError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(RouterError::InvalidRequest("message must not be empty".into()));
        }
        Ok(Self { message, language })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `{ "message": string, "lang"?: string }`. A missing or null `lang` means `hr`.
    pub fn from_json(raw: &Value) -> Result<Self, RouterError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| RouterError::InvalidRequest("body must be a JSON object".into()))?;

        let message = match obj.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(RouterError::InvalidRequest("message must be a string".into())),
            None => return Err(RouterError::InvalidRequest("message is required".into())),
        };

        let language = match obj.get("lang") {
            None | Some(Value::Null) => Language::default(),
            Some(Value::String(s)) => s
                .parse()
                .map_err(|e: crate::language::LanguageParseError| {
                    RouterError::InvalidRequest(e.to_string())
                })?,
            Some(_) => return Err(RouterError::InvalidRequest("lang must be a string".into())),
        };

        Self::new(message, language)
    }
}

/// What to do when generation succeeds without usable text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyGenerationPolicy {
    /// Succeed with an empty answer tagged `generated`.
    #[default]
    Accept,
    /// Fail with [`RouterError::GenerationEmpty`].
    Reject,
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub model: String,
    pub persona: String,
    pub lookup_timeout: Duration,
    pub generation_timeout: Duration,
    pub empty_generation: EmptyGenerationPolicy,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            persona: CONCIERGE_PERSONA.to_string(),
            lookup_timeout: Duration::from_secs(5),
            generation_timeout: Duration::from_secs(60),
            empty_generation: EmptyGenerationPolicy::Accept,
        }
    }
}

enum Stage<'a> {
    Validate(&'a Value),
    LocalLookup(ChatRequest),
    GenerateFallback(ChatRequest),
    GenerateResult(Generation),
    Done(Terminal),
}

enum Terminal {
    LocalHit(ChatAnswer),
    Generated(ChatAnswer),
    Failed(RouterError),
}

#[derive(Clone)]
pub struct AnswerRouter {
    lookup: Arc<dyn KnowledgeLookup>,
    generator: Arc<dyn AnswerGenerator>,
    settings: Arc<RouterSettings>,
}

impl AnswerRouter {
    pub fn new(
        lookup: Arc<dyn KnowledgeLookup>,
        generator: Arc<dyn AnswerGenerator>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            lookup,
            generator,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Resolve an untyped request body.
    pub async fn resolve(&self, raw: &Value) -> Result<ChatAnswer, RouterError> {
        self.run(Stage::Validate(raw)).await
    }

    /// Resolve a request that is already validated.
    pub async fn resolve_request(&self, request: ChatRequest) -> Result<ChatAnswer, RouterError> {
        self.run(Stage::LocalLookup(request)).await
    }

    async fn run(&self, mut stage: Stage<'_>) -> Result<ChatAnswer, RouterError> {
        loop {
            stage = match stage {
                Stage::Validate(raw) => match ChatRequest::from_json(raw) {
                    Ok(request) => Stage::LocalLookup(request),
                    Err(e) => Stage::Done(Terminal::Failed(e)),
                },
                Stage::LocalLookup(request) => self.local_lookup(request).await,
                Stage::GenerateFallback(request) => self.generate_fallback(request).await,
                Stage::GenerateResult(generation) => self.generate_result(generation),
                Stage::Done(terminal) => return finish(terminal),
            };
        }
    }

    async fn local_lookup(&self, request: ChatRequest) -> Stage<'static> {
        let limit = self.settings.lookup_timeout;
        let found = tokio::time::timeout(
            limit,
            self.lookup.lookup(&request.message, request.language),
        )
        .await;

        match found {
            Err(_) => Stage::Done(Terminal::Failed(RouterError::LookupUnavailable(format!(
                "lookup timed out after {:?}",
                limit
            )))),
            Ok(Err(e)) => Stage::Done(Terminal::Failed(RouterError::LookupUnavailable(e.0))),
            Ok(Ok(candidates)) => {
                let count = candidates.len();
                match candidates.into_iter().next() {
                    Some(first) => {
                        if count > 1 {
                            info!(
                                target: "concierge::router",
                                candidates = count,
                                language = %request.language,
                                "multiple FAQ candidates; using the first"
                            );
                        }
                        Stage::Done(Terminal::LocalHit(ChatAnswer::local(first.answer)))
                    }
                    None => Stage::GenerateFallback(request),
                }
            }
        }
    }

    async fn generate_fallback(&self, request: ChatRequest) -> Stage<'static> {
        let limit = self.settings.generation_timeout;
        let generation_request = GenerationRequest {
            system_persona: self.settings.persona.clone(),
            user_message: request.message,
            model: self.settings.model.clone(),
        };

        match tokio::time::timeout(limit, self.generator.generate(&generation_request)).await {
            Err(_) => Stage::Done(Terminal::Failed(RouterError::GenerationUnavailable(format!(
                "generation timed out after {:?}",
                limit
            )))),
            Ok(Err(e)) => {
                Stage::Done(Terminal::Failed(RouterError::GenerationUnavailable(e.to_string())))
            }
            Ok(Ok(generation)) => Stage::GenerateResult(generation),
        }
    }

    fn generate_result(&self, generation: Generation) -> Stage<'static> {
        match (generation.usable_text(), self.settings.empty_generation) {
            (Some(text), _) => Stage::Done(Terminal::Generated(ChatAnswer::generated(text))),
            (None, EmptyGenerationPolicy::Accept) => {
                warn!(target: "concierge::router", "generation returned no text; answering empty");
                Stage::Done(Terminal::Generated(ChatAnswer::generated(String::new())))
            }
            (None, EmptyGenerationPolicy::Reject) => {
                Stage::Done(Terminal::Failed(RouterError::GenerationEmpty))
            }
        }
    }
}

fn finish(terminal: Terminal) -> Result<ChatAnswer, RouterError> {
    match terminal {
        Terminal::LocalHit(answer) => {
            info!(target: "concierge::router", source = "local", "answered from FAQ");
            Ok(answer)
        }
        Terminal::Generated(answer) => {
            info!(target: "concierge::router", source = "generated", "answered by generation");
            Ok(answer)
        }
        Terminal::Failed(e) if e.is_client_error() => {
            warn!(target: "concierge::router", kind = e.kind(), error = %e, "chat request rejected");
            Err(e)
        }
        Terminal::Failed(e) => {
            error!(target: "concierge::router", kind = e.kind(), error = %e, "chat request failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_lang_defaults_to_croatian() {
        let req = ChatRequest::from_json(&json!({"message": "Parking?"})).unwrap();
        assert_eq!(req, ChatRequest::new("Parking?", Language::Hr).unwrap());
        let req = ChatRequest::from_json(&json!({"message": "Parking?", "lang": null})).unwrap();
        assert_eq!(req.language(), Language::Hr);
    }

    #[test]
    fn message_is_kept_verbatim() {
        let req = ChatRequest::from_json(&json!({"message": "  Parking? ", "lang": "en"})).unwrap();
        assert_eq!(req.message(), "  Parking? ");
        assert_eq!(req.language(), Language::En);
    }

    #[test]
    fn malformed_requests_are_rejected() {
        let bad = [
            json!("What time is check-out?"),
            json!({}),
            json!({"message": ""}),
            json!({"message": "   "}),
            json!({"message": 42}),
            json!({"message": "Hi", "lang": "de"}),
            json!({"message": "Hi", "lang": 1}),
        ];
        for body in bad {
            let err = ChatRequest::from_json(&body).unwrap_err();
            assert!(err.is_client_error(), "{body} should be invalid");
        }
    }

    #[test]
    fn blank_message_cannot_be_constructed() {
        for message in ["", "   ", "\n\t"] {
            let err = ChatRequest::new(message, Language::Hr).unwrap_err();
            assert!(matches!(err, RouterError::InvalidRequest(_)));
        }
    }

    #[test]
    fn answer_serializes_to_wire_shape() {
        let v = serde_json::to_value(ChatAnswer::local("Check-out is at 11:00 AM.")).unwrap();
        assert_eq!(v, json!({"answer": "Check-out is at 11:00 AM.", "source": "local"}));
        let v = serde_json::to_value(ChatAnswer::generated("")).unwrap();
        assert_eq!(v["source"], "generated");
    }

    #[test]
    fn failure_body_hides_cause() {
        let body = ChatFailure::from(&RouterError::LookupUnavailable("disk gone".into()));
        assert_eq!(body.error, "Failed to process chat request");
    }
}
