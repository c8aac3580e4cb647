//! Embedding service: request shaping on top of the provider client

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::client::EmbeddingClient;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::FaqRagError;
use crate::errors::Result;
use crate::text;

/// Embedding plus the query metadata derived from the *original* text.
///
/// When synonyms are supplied, only the text sent for vectorization is
/// enriched; `normalized`, `keywords` and `fingerprint` always come from the
/// unenriched input. Synonym lists can therefore evolve without invalidating
/// cache keys — and cache hits key on literal user phrasing, not enriched
/// meaning.
#[derive(Debug, Clone)]
pub struct EnrichedQuery {
    pub vector: Vec<f32>,
    pub normalized: String,
    pub keywords: Vec<String>,
    pub fingerprint: String,
}

/// Service for generating embeddings
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    /// Create a new embedding service
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let embedding_config = EmbeddingConfig::from_app_config(config);
        Self::from_config(embedding_config)
    }

    /// Create from custom config
    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    /// Generate an embedding for a single text.
    ///
    /// One bounded retry on transient upstream failures; anything else
    /// propagates as `UpstreamUnavailable`.
    pub async fn embed(&self, input_text: &str) -> Result<Vec<f32>> {
        if input_text.trim().is_empty() {
            return Err(FaqRagError::Embedding("Empty text provided".to_string()));
        }

        match self.client.generate(input_text).await {
            Ok(vector) => Ok(vector),
            Err(e) if e.is_upstream() => {
                warn!("Embedding call failed, retrying once: {}", e);
                self.client.generate(input_text).await
            }
            Err(e) => Err(e),
        }
    }

    /// Generate embeddings for multiple texts, preserving input order.
    ///
    /// The whole batch fails if any item fails; chunked at `MAX_BATCH_SIZE`.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let batch = self.client.generate_batch(refs).await?;
            embeddings.extend(batch);
        }

        debug!("Generated {} embeddings in batch", embeddings.len());
        Ok(embeddings)
    }

    /// Embed a query with optional synonym enrichment.
    ///
    /// The enriched text (original + synonyms) is what gets vectorized; the
    /// returned metadata is computed from the original text only.
    pub async fn embed_with_enrichment(
        &self,
        input_text: &str,
        synonyms: &[String],
    ) -> Result<EnrichedQuery> {
        let embedded_text = enrichment_text(input_text, synonyms);

        let vector = self.embed(&embedded_text).await?;

        let normalized = text::normalize(input_text);
        let keywords = text::extract_keywords(input_text);
        let fingerprint = text::fingerprint(&normalized);

        Ok(EnrichedQuery {
            vector,
            normalized,
            keywords,
            fingerprint,
        })
    }
}

/// Text sent for vectorization: the original question, sentence-joined with
/// any synonym expansions
fn enrichment_text(input_text: &str, synonyms: &[String]) -> String {
    if synonyms.is_empty() {
        input_text.to_string()
    } else {
        format!("{}. {}", input_text, synonyms.join(" "))
    }
}
