//! Embedding gateway
//!
//! Wraps the external text-to-vector capability behind a provider-agnostic
//! client, and adds the request shaping the pipeline needs: synonym
//! enrichment of the embedded text, and normalization/fingerprint metadata
//! computed from the original query.
//!
//! # Examples
//!
//! ```rust,no_run
//! use faqrag::config::AppConfig;
//! use faqrag::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::new(&config)?;
//!
//!     let enriched = service.embed_with_enrichment("как открыть счет", &[]).await?;
//!     println!("{} dims, fingerprint {}", enriched.vector.len(), enriched.fingerprint);
//!
//!     Ok(())
//! }
//! ```

pub mod backfill;
pub mod client;
pub mod generator;

pub use backfill::backfill_embeddings;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use generator::EnrichedQuery;

/// Maximum texts per upstream batch request
pub const MAX_BATCH_SIZE: usize = 100;

/// Configuration for embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_timeout: std::time::Duration,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let endpoint = config.embeddings.endpoint.clone();

        // OpenAI-shaped endpoints take the API key; anything local is Ollama
        let provider = if endpoint.contains("api.openai.com") {
            EmbeddingProvider::OpenAI
        } else if endpoint.contains("localhost") || endpoint.contains("127.0.0.1") {
            EmbeddingProvider::Ollama
        } else if config.embeddings.api_key.is_empty() {
            EmbeddingProvider::Ollama
        } else {
            EmbeddingProvider::OpenAI
        };

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint,
            api_key: if config.embeddings.api_key.is_empty() {
                None
            } else {
                Some(config.embeddings.api_key.clone())
            },
            request_timeout: std::time::Duration::from_secs(
                config.embeddings.request_timeout_secs,
            ),
        }
    }
}
