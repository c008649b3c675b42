//! Knowledge-base lookup contract.
//!
//! A record is a candidate for a query when its language equals the requested
//! language exactly and every whitespace-separated word of the query occurs in
//! its question (case-insensitive, any order). No ranking is applied: callers
//! receive candidates in the collaborator's natural order.

use crate::faq::FaqRecord;
use crate::language::Language;

#[derive(Debug, Clone, thiserror::Error)]
#[error("knowledge base unavailable: {0}")]
pub struct LookupError(pub String);

#[async_trait::async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// Read-only. An `Err` must never be reported as an empty result.
    async fn lookup(&self, query: &str, language: Language) -> Result<Vec<FaqRecord>, LookupError>;
}

/// Word-containment test used by the FAQ store. An empty query has no words and matches.
pub fn question_matches(question: &str, query: &str) -> bool {
    let haystack = question.to_lowercase();
    query
        .split_whitespace()
        .all(|word| haystack.contains(&word.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_question_matches() {
        assert!(question_matches("What time is check-out?", "What time is check-out?"));
    }

    #[test]
    fn words_match_in_any_order_ignoring_case() {
        assert!(question_matches("What time is check-out?", "CHECK-OUT time"));
        assert!(question_matches("Where is the parking garage?", "garage parking"));
    }

    #[test]
    fn every_word_must_be_present() {
        assert!(!question_matches("What time is check-out?", "check-out breakfast"));
        assert!(!question_matches("Is breakfast included?", "Can I bring my dog?"));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(question_matches("Is breakfast included?", ""));
        assert!(question_matches("Is breakfast included?", "   "));
    }
}
