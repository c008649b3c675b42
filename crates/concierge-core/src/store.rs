//! Sled-backed FAQ knowledge base.
//!
//! One tree (`faq`) keyed by big-endian ids from `Db::generate_id`, so natural
//! iteration order is creation order. Values are JSON-encoded [`FaqEntry`]s.

use crate::faq::{FaqEntry, FaqRecord};
use crate::language::Language;
use crate::lookup::{question_matches, KnowledgeLookup, LookupError};
use chrono::Utc;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const FAQ_DEFAULT_PATH: &str = "./data/faq_store";
const FAQ_TREE: &str = "faq";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),
    #[error("faq entry encoding: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid faq record: {0}")]
    Invalid(String),
    #[error("seed line {line}: {source}")]
    Seed {
        line: usize,
        source: serde_json::Error,
    },
}

/// Cheap to clone; clones share the same database handle.
#[derive(Clone)]
pub struct FaqStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl FaqStore {
    /// Open the store at the given path, or `./data/faq_store` when `None`.
    pub fn open(path: Option<impl AsRef<Path>>) -> Result<Self, StoreError> {
        let p = path
            .map(|x| x.as_ref().to_path_buf())
            .unwrap_or_else(|| Path::new(FAQ_DEFAULT_PATH).to_path_buf());
        Self::from_db(sled::open(p)?)
    }

    /// In-memory store, removed on drop.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let tree = db.open_tree(FAQ_TREE)?;
        Ok(Self { db, tree })
    }

    fn put(&self, entry: &FaqEntry) -> Result<(), StoreError> {
        self.tree
            .insert(entry.id.to_be_bytes(), serde_json::to_vec(entry)?)?;
        Ok(())
    }

    pub fn insert(&self, record: FaqRecord) -> Result<FaqEntry, StoreError> {
        record.validate().map_err(StoreError::Invalid)?;
        let now = Utc::now();
        let entry = FaqEntry {
            id: self.db.generate_id()?,
            question: record.question,
            answer: record.answer,
            language: record.language,
            created_at: now,
            updated_at: now,
        };
        self.put(&entry)?;
        tracing::info!(
            target: "concierge::store",
            id = entry.id,
            language = %entry.language,
            "FAQ entry created"
        );
        Ok(entry)
    }

    pub fn get(&self, id: u64) -> Result<Option<FaqEntry>, StoreError> {
        match self.tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Replace the text and language of an entry. `created_at` is kept.
    pub fn update(&self, id: u64, record: FaqRecord) -> Result<Option<FaqEntry>, StoreError> {
        record.validate().map_err(StoreError::Invalid)?;
        let Some(existing) = self.get(id)? else {
            return Ok(None);
        };
        let entry = FaqEntry {
            id,
            question: record.question,
            answer: record.answer,
            language: record.language,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.put(&entry)?;
        tracing::info!(target: "concierge::store", id, "FAQ entry updated");
        Ok(Some(entry))
    }

    pub fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let removed = self.tree.remove(id.to_be_bytes())?.is_some();
        if removed {
            tracing::info!(target: "concierge::store", id, "FAQ entry deleted");
        }
        Ok(removed)
    }

    /// All entries in creation order, optionally restricted to one language.
    pub fn list(&self, language: Option<Language>) -> Result<Vec<FaqEntry>, StoreError> {
        let mut entries = Vec::new();
        for item in self.tree.iter() {
            let (_, value) = item?;
            let entry: FaqEntry = serde_json::from_slice(&value)?;
            if language.map_or(true, |l| entry.language == l) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Durably persist pending writes. Returns bytes flushed.
    pub fn flush(&self) -> Result<usize, StoreError> {
        Ok(self.db.flush()?)
    }

    /// Blocking candidate search; see [`question_matches`] for the matching rule.
    pub fn find_matches(&self, query: &str, language: Language) -> Result<Vec<FaqRecord>, StoreError> {
        Ok(self
            .list(Some(language))?
            .into_iter()
            .filter(|entry| question_matches(&entry.question, query))
            .map(FaqEntry::into_record)
            .collect())
    }

    /// Import JSON lines of `{question, answer, language?}`. Every line is parsed
    /// and validated before anything is written. Returns the number imported.
    pub fn seed_from_jsonl(&self, path: &Path) -> Result<usize, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FaqRecord = serde_json::from_str(&line)
                .map_err(|source| StoreError::Seed { line: idx + 1, source })?;
            record
                .validate()
                .map_err(|e| StoreError::Invalid(format!("line {}: {}", idx + 1, e)))?;
            records.push(record);
        }

        let count = records.len();
        for record in records {
            self.insert(record)?;
        }
        self.flush()?;
        tracing::info!(target: "concierge::store", count, path = %path.display(), "FAQ seed imported");
        Ok(count)
    }
}

#[async_trait::async_trait]
impl KnowledgeLookup for FaqStore {
    async fn lookup(&self, query: &str, language: Language) -> Result<Vec<FaqRecord>, LookupError> {
        let store = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || store.find_matches(&query, language))
            .await
            .map_err(|e| LookupError(format!("lookup task failed: {}", e)))?
            .map_err(|e| LookupError(e.to_string()))
    }
}
