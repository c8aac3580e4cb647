//! Hybrid candidate retrieval
//!
//! Vector similarity is the primary signal; lexical search backs it up when
//! the vector side comes back empty or weak. Merging is deterministic:
//! stable sort by score, vector hits ahead of appended keyword hits on ties.

pub mod rerank;

pub use rerank::Reranker;

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::config::SearchConfig;
use crate::database::Database;
use crate::errors::Result;
use crate::language::Language;
use crate::models::ScoredCandidate;
use crate::text;

pub struct Retriever {
    database: Arc<Database>,
    config: SearchConfig,
}

impl Retriever {
    pub fn new(database: Arc<Database>, config: SearchConfig) -> Self {
        Self { database, config }
    }

    /// Rank FAQ candidates for a query, best first.
    ///
    /// Primary path is nearest-neighbor search scoped to `language`; when it
    /// finds nothing the vector search retries across all languages before
    /// the keyword fallback engages. Keyword results join the list only when
    /// the vector side is empty or its best score falls below the weakness
    /// threshold, and are discounted to mark them as lower-confidence than a
    /// direct vector hit.
    pub async fn hybrid_search(
        &self,
        query_text: &str,
        query_vector: &pgvector::Vector,
        language: Language,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>> {
        let mut vector_results = self
            .database
            .vector_search_faqs(query_vector, Some(language), limit)
            .await?;

        if vector_results.is_empty() {
            debug!(
                "No vector results for language '{}', searching all languages",
                language
            );
            vector_results = self
                .database
                .vector_search_faqs(query_vector, None, limit)
                .await?;
        }

        let vector_is_weak = vector_results
            .first()
            .map_or(true, |best| best.score < self.config.vector_weakness_threshold);

        if !vector_is_weak {
            return Ok(truncate(vector_results, limit));
        }

        let normalized = text::normalize(query_text);
        let keywords = text::extract_keywords(query_text);

        let keyword_results = match self
            .database
            .keyword_search_faqs(&normalized, &keywords, language, limit)
            .await
        {
            Ok(results) => results,
            Err(e) if !vector_results.is_empty() => {
                // Partial failure: the vector side already produced
                // candidates, so degrade to them instead of failing
                warn!("Keyword fallback failed, keeping vector results: {}", e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Hybrid merge: {} vector + {} keyword candidates",
            vector_results.len(),
            keyword_results.len()
        );

        Ok(merge_candidates(
            vector_results,
            keyword_results,
            self.config.keyword_discount,
            limit,
        ))
    }

    /// Synonym expansions for a query, used to enrich the embedded text
    pub async fn get_synonyms(&self, language: Language, query: &str) -> Result<Vec<String>> {
        self.database.get_synonyms(language, query).await
    }
}

/// Merge keyword results into vector results.
///
/// Keyword hits not already present are appended with their score discounted
/// by `keyword_discount`; the combined list is stable-sorted descending, so
/// equal scores keep retrieval order (vector before keyword), and truncated.
fn merge_candidates(
    vector_results: Vec<ScoredCandidate>,
    keyword_results: Vec<ScoredCandidate>,
    keyword_discount: f32,
    limit: i64,
) -> Vec<ScoredCandidate> {
    let seen: Vec<i64> = vector_results.iter().map(|c| c.entry.id).collect();

    let mut combined = vector_results;
    for mut candidate in keyword_results {
        if seen.contains(&candidate.entry.id) {
            continue;
        }
        candidate.score *= keyword_discount;
        combined.push(candidate);
    }

    // Vec::sort_by is stable: ties preserve insertion order
    combined.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    truncate(combined, limit)
}

fn truncate(mut candidates: Vec<ScoredCandidate>, limit: i64) -> Vec<ScoredCandidate> {
    candidates.truncate(limit.max(0) as usize);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FaqSummary;

    fn candidate(id: i64, score: f32) -> ScoredCandidate {
        ScoredCandidate::new(
            FaqSummary::for_language(id, &format!("q{id}"), "a", Language::Ru),
            score,
        )
    }

    #[test]
    fn test_merge_discounts_appended_keyword_results() {
        let vector = vec![candidate(1, 0.4)];
        let keyword = vec![candidate(2, 0.9)];

        let merged = merge_candidates(vector, keyword, 0.8, 10);
        assert_eq!(merged.len(), 2);
        // 0.9 * 0.8 = 0.72 outranks the weak vector hit
        assert_eq!(merged[0].entry.id, 2);
        assert!((merged[0].score - 0.72).abs() < 1e-6);
        assert_eq!(merged[1].entry.id, 1);
    }

    #[test]
    fn test_merge_skips_duplicates_keeping_vector_score() {
        let vector = vec![candidate(1, 0.45), candidate(2, 0.30)];
        let keyword = vec![candidate(1, 0.9), candidate(3, 0.5)];

        let merged = merge_candidates(vector, keyword, 0.8, 10);
        let ids: Vec<i64> = merged.iter().map(|c| c.entry.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        // The duplicate kept its vector score
        assert!((merged[0].score - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_merge_tie_keeps_vector_before_keyword() {
        // Keyword candidate lands exactly on the vector score after discount
        let vector = vec![candidate(1, 0.40)];
        let keyword = vec![candidate(2, 0.50)];

        let merged = merge_candidates(vector, keyword, 0.8, 10);
        assert!((merged[0].score - merged[1].score).abs() < 1e-6);
        assert_eq!(merged[0].entry.id, 1, "vector hit must come first on a tie");
    }

    #[test]
    fn test_merge_truncates_to_limit() {
        let vector = vec![candidate(1, 0.9), candidate(2, 0.8)];
        let keyword = vec![candidate(3, 0.9), candidate(4, 0.8)];

        let merged = merge_candidates(vector, keyword, 0.8, 3);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_merge_with_empty_vector_side() {
        let keyword = vec![candidate(1, 0.5), candidate(2, 0.4)];

        let merged = merge_candidates(Vec::new(), keyword, 0.8, 10);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].score - 0.4).abs() < 1e-6);
    }
}
