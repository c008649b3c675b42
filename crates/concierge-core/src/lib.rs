//! Concierge core library.
//! FAQ knowledge base, generation bridge and the answer router that picks between them.

pub mod config;
pub mod error;
pub mod faq;
pub mod generation;
pub mod language;
pub mod lookup;
pub mod router;
pub mod store;

pub use config::ConciergeConfig;
pub use error::RouterError;
pub use faq::{FaqEntry, FaqRecord};
pub use generation::{
    AnswerGenerator, ChatCompletionsClient, Generation, GenerationError, GenerationRequest,
    CONCIERGE_PERSONA, DEFAULT_MODEL,
};
pub use language::{Language, LanguageParseError};
pub use lookup::{question_matches, KnowledgeLookup, LookupError};
pub use router::{
    AnswerRouter, AnswerSource, ChatAnswer, ChatFailure, ChatRequest, EmptyGenerationPolicy,
    RouterSettings,
};
pub use store::{FaqStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
