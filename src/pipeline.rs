//! The query pipeline: the single entry point the transport layer calls
//!
//! Stage order within one query is strictly sequential: detect language →
//! classify intent → synonyms → embed → cache check → hybrid search →
//! rerank → decide → cache save. Greetings and off-topic messages exit
//! before any embedding call is made.

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cache::ResultCache;
use crate::config::AppConfig;
use crate::database::Database;
use crate::decision::make_decision;
use crate::decision::Action;
use crate::decision::DecisionConfig;
use crate::decision::DecisionResult;
use crate::decision::RationaleTag;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::intent;
use crate::intent::Intent;
use crate::language::Language;
use crate::language::LanguageHint;
use crate::llm::LlmService;
use crate::models::ScoredCandidate;
use crate::search::Reranker;
use crate::search::Retriever;

/// Per-query toggles exposed to the caller
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub use_cache: bool,
    pub use_rerank: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            use_rerank: true,
        }
    }
}

/// Pipeline outcome handed to the response-formatting layer
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub decision: DecisionResult,
    pub language: Language,
    pub intent: Intent,
    pub from_cache: bool,
}

pub struct QueryPipeline {
    retriever: Retriever,
    embedding_service: EmbeddingService,
    cache: Arc<ResultCache>,
    reranker: Reranker,
    decision_config: DecisionConfig,
    rerank_enabled: bool,
    search_limit: i64,
    vague_limit: i64,
    high_threshold: f32,
}

impl QueryPipeline {
    pub fn new(
        database: Arc<Database>,
        embedding_service: EmbeddingService,
        llm: Arc<LlmService>,
        config: &AppConfig,
    ) -> Self {
        let retriever = Retriever::new(Arc::clone(&database), config.search.clone());
        let cache = Arc::new(ResultCache::new(Arc::clone(&database), config.cache.clone()));
        let reranker = Reranker::new(llm, config.rerank.clone());

        Self {
            retriever,
            embedding_service,
            cache,
            reranker,
            decision_config: DecisionConfig::from_search_config(&config.search),
            rerank_enabled: config.rerank.enabled,
            search_limit: config.search.limit,
            vague_limit: config.search.vague_limit,
            high_threshold: config.search.similarity_threshold_high,
        }
    }

    /// The result cache, shared with the server for its cleanup task
    pub fn cache(&self) -> Arc<ResultCache> {
        Arc::clone(&self.cache)
    }

    /// Process one user question end to end.
    ///
    /// # Errors
    /// - `UpstreamUnavailable` when the embedding capability fails
    /// - `Retrieval` when the candidate store fails with nothing to degrade to
    pub async fn process_query(
        &self,
        question: &str,
        language_hint: LanguageHint,
        options: QueryOptions,
    ) -> Result<QueryResponse> {
        let language = language_hint.resolve(question);
        let user_intent = intent::classify(question);
        debug!(
            "Processing query: language={}, intent={}",
            language,
            user_intent.as_str()
        );

        // Trivial cases never reach retrieval
        match user_intent {
            Intent::Greeting => {
                return Ok(QueryResponse {
                    decision: DecisionResult::short_circuit(RationaleTag::Greeting),
                    language,
                    intent: user_intent,
                    from_cache: false,
                });
            }
            Intent::OffTopic => {
                return Ok(QueryResponse {
                    decision: DecisionResult::short_circuit(RationaleTag::OffTopic),
                    language,
                    intent: user_intent,
                    from_cache: false,
                });
            }
            Intent::Vague | Intent::Faq => {}
        }

        let limit = if user_intent == Intent::Vague {
            self.vague_limit
        } else {
            self.search_limit
        };

        // Synonym enrichment is best-effort
        let synonyms = match self.retriever.get_synonyms(language, question).await {
            Ok(synonyms) => synonyms,
            Err(e) => {
                warn!("Synonym lookup failed: {}", e);
                Vec::new()
            }
        };
        if !synonyms.is_empty() {
            debug!("Found {} synonyms for enrichment", synonyms.len());
        }

        let enriched = self
            .embedding_service
            .embed_with_enrichment(question, &synonyms)
            .await?;

        if options.use_cache {
            if let Some(cached) = self.cache.check(&enriched.fingerprint, language).await {
                info!("Serving cached candidates for fingerprint {}", enriched.fingerprint);
                let decision = self.decide(&cached, user_intent);
                return Ok(QueryResponse {
                    decision,
                    language,
                    intent: user_intent,
                    from_cache: true,
                });
            }
        }

        let query_vector = pgvector::Vector::from(enriched.vector.clone());
        let mut candidates = self
            .retriever
            .hybrid_search(&enriched.normalized, &query_vector, language, limit)
            .await?;

        if options.use_rerank && self.rerank_enabled {
            candidates = self.reranker.rerank(question, candidates).await;
        }

        let decision = self.decide(&candidates, user_intent);

        if options.use_cache {
            self.cache
                .save(&enriched.fingerprint, &enriched.normalized, language, &candidates)
                .await;
        }

        Ok(QueryResponse {
            decision,
            language,
            intent: user_intent,
            from_cache: false,
        })
    }

    /// Decide over a candidate list, then apply the vague-intent downgrade.
    ///
    /// Cached hits also pass through here, so threshold configuration
    /// changes apply to cached candidate lists too.
    fn decide(&self, candidates: &[ScoredCandidate], user_intent: Intent) -> DecisionResult {
        let decision = make_decision(candidates, &self.decision_config);

        if user_intent == Intent::Vague {
            downgrade_vague_direct_answer(decision, self.high_threshold)
        } else {
            decision
        }
    }
}

/// A vague query gets clarification options rather than a direct answer,
/// unless the match cleared the high-confidence bar outright.
fn downgrade_vague_direct_answer(decision: DecisionResult, high_threshold: f32) -> DecisionResult {
    if decision.action != Action::DirectAnswer || decision.score >= high_threshold {
        return decision;
    }

    let mut supporting = decision.supporting.clone();
    if supporting.is_empty() {
        supporting.extend(decision.best.clone());
    }
    supporting.truncate(3);

    DecisionResult {
        action: Action::Clarify,
        supporting,
        rationale: RationaleTag::VagueQuery,
        ..decision
    }
}
