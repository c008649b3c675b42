use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question/answer pair in one language. This is what lookups return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub language: Language,
}

impl FaqRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, language: Language) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            language,
        }
    }

    /// Both text fields must carry something other than whitespace.
    pub fn validate(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question must not be empty".to_string());
        }
        if self.answer.trim().is_empty() {
            return Err("answer must not be empty".to_string());
        }
        Ok(())
    }
}

/// Persisted form of a record: store-assigned id plus timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: u64,
    pub question: String,
    pub answer: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FaqEntry {
    pub fn record(&self) -> FaqRecord {
        FaqRecord {
            question: self.question.clone(),
            answer: self.answer.clone(),
            language: self.language,
        }
    }

    pub(crate) fn into_record(self) -> FaqRecord {
        FaqRecord {
            question: self.question,
            answer: self.answer,
            language: self.language,
        }
    }
}
