//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Question request
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default = "default_true")]
    pub use_rerank: bool,
}

fn default_language() -> String {
    "auto".to_string()
}

fn default_true() -> bool {
    true
}

/// Question response: the decided action plus user-facing content
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub action: String,
    pub question: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub confidence: f32,
    pub from_cache: bool,
}

/// FAQ entry response
#[derive(Debug, Serialize)]
pub struct FaqResponse {
    pub id: i64,
    pub question: String,
    pub answer_text: String,
    pub category: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Cache statistics response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
}
