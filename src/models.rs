use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::language::Language;

/// A published FAQ record. Created by the content-management process and
/// read-only to the query path; the embedding is populated asynchronously by
/// the backfill job and stays NULL until then.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FaqEntry {
    pub id: i64,
    pub question: String,
    pub answer_text: String,
    pub category: String,
    pub language: String,
    pub video_url: Option<String>,
    pub footer_disclaimer: Option<String>,
    #[serde(skip_serializing)]
    pub embedding: Option<pgvector::Vector>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight FAQ projection carried in candidate lists and cache payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FaqSummary {
    pub id: i64,
    pub question: String,
    pub answer_text: String,
    pub category: String,
    pub language: String,
    pub video_url: Option<String>,
}

impl From<&FaqEntry> for FaqSummary {
    fn from(entry: &FaqEntry) -> Self {
        Self {
            id: entry.id,
            question: entry.question.clone(),
            answer_text: entry.answer_text.clone(),
            category: entry.category.clone(),
            language: entry.language.clone(),
            video_url: entry.video_url.clone(),
        }
    }
}

/// Synonym expansion row, read-only to the core
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SynonymEntry {
    pub id: i64,
    pub term: String,
    pub language: String,
    pub synonyms: Vec<String>,
}

/// A retrieval candidate with its similarity score.
///
/// Scores within one candidate list are comparable only to each other;
/// there is no global calibration across queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub entry: FaqSummary,
    pub score: f32,
}

impl ScoredCandidate {
    pub fn new(entry: FaqSummary, score: f32) -> Self {
        Self { entry, score }
    }
}

/// Row stored in the query cache table
#[derive(Debug, Clone, FromRow)]
pub struct CacheRow {
    pub query_hash: String,
    pub query_normalized: String,
    pub language: String,
    pub results: serde_json::Value,
    pub hit_count: i64,
    pub last_used_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Best-effort query log written by the API layer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueryLog {
    pub id: i64,
    pub client_id: String,
    pub question: Option<String>,
    pub matched_faq_id: Option<i64>,
    pub confidence: Option<f32>,
    pub created_at: DateTime<Utc>,
}

/// Helper for constructing summaries scoped to a language in tests and
/// fixtures
impl FaqSummary {
    pub fn for_language(id: i64, question: &str, answer: &str, language: Language) -> Self {
        Self {
            id,
            question: question.to_string(),
            answer_text: answer.to_string(),
            category: "general".to_string(),
            language: language.as_str().to_string(),
            video_url: None,
        }
    }
}
