//! Best-effort LLM reranking of retrieval candidates
//!
//! Submits the top candidates to the relevance judge and blends its 0-10
//! verdicts with the original retrieval scores, favoring the judgment since
//! it sees the full question context the vector score alone does not. Any
//! failure — call error, timeout, unparseable or misaligned output — keeps
//! the original ordering; reranking never blocks a request.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::config::RerankConfig;
use crate::llm::LlmService;
use crate::models::ScoredCandidate;

/// Candidates submitted to the judge per query
const MAX_JUDGED_CANDIDATES: usize = 10;

/// The judge scores on an integer 0-10 scale
const JUDGMENT_SCALE: f32 = 10.0;

pub struct Reranker {
    llm: Arc<LlmService>,
    config: RerankConfig,
}

impl Reranker {
    pub fn new(llm: Arc<LlmService>, config: RerankConfig) -> Self {
        Self { llm, config }
    }

    /// Re-score and trim candidates to `top_k`.
    ///
    /// A list already within `top_k` is returned unchanged — reranking only
    /// matters when trimming.
    pub async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<ScoredCandidate>,
    ) -> Vec<ScoredCandidate> {
        let top_k = self.config.top_k;
        if candidates.len() <= top_k {
            return candidates;
        }

        let judged_count = candidates.len().min(MAX_JUDGED_CANDIDATES);
        let timeout = std::time::Duration::from_secs(self.config.timeout_secs);

        let raw_output = match tokio::time::timeout(
            timeout,
            self.llm.judge_relevance(query, &candidates[..judged_count]),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Relevance judgment failed: {}, keeping retrieval order", e);
                candidates.truncate(top_k);
                return candidates;
            }
            Err(_) => {
                warn!(
                    "Relevance judgment timed out after {}s, keeping retrieval order",
                    self.config.timeout_secs
                );
                candidates.truncate(top_k);
                return candidates;
            }
        };

        match parse_judgment(&raw_output, judged_count) {
            Some(scores) => {
                debug!(scores = ?scores, "Relevance judgment parsed");
                candidates.truncate(judged_count);
                apply_judgment(candidates, &scores, self.config.blend_weight, top_k)
            }
            None => {
                warn!(
                    output = %raw_output.chars().take(200).collect::<String>(),
                    "Could not parse relevance judgment, keeping retrieval order"
                );
                candidates.truncate(top_k);
                candidates
            }
        }
    }
}

/// Parse the judge output into one 0-10 score per candidate.
///
/// Accepts the raw JSON array or an array embedded in surrounding text or
/// code fences. Wrong length or out-of-range values reject the output.
fn parse_judgment(output: &str, expected_count: usize) -> Option<Vec<i64>> {
    let trimmed = output
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(scores) = serde_json::from_str::<Vec<i64>>(trimmed) {
        if validate_judgment(&scores, expected_count) {
            return Some(scores);
        }
    }

    // Find the first JSON array inside the output
    let start = trimmed.find('[')?;
    let end = trimmed[start..].find(']')?;
    let slice = &trimmed[start..=start + end];
    let scores = serde_json::from_str::<Vec<i64>>(slice).ok()?;

    if validate_judgment(&scores, expected_count) {
        Some(scores)
    } else {
        None
    }
}

fn validate_judgment(scores: &[i64], expected_count: usize) -> bool {
    scores.len() == expected_count && scores.iter().all(|s| (0..=10).contains(s))
}

/// Blend judgment scores with the original retrieval scores and re-rank.
///
/// Stable sort: candidates with equal blended scores keep retrieval order.
fn apply_judgment(
    candidates: Vec<ScoredCandidate>,
    scores: &[i64],
    blend_weight: f32,
    top_k: usize,
) -> Vec<ScoredCandidate> {
    let mut blended: Vec<ScoredCandidate> = candidates
        .into_iter()
        .zip(scores.iter())
        .map(|(mut candidate, &judged)| {
            let normalized = judged as f32 / JUDGMENT_SCALE;
            candidate.score = blend_weight * normalized + (1.0 - blend_weight) * candidate.score;
            candidate
        })
        .collect();

    blended.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    blended.truncate(top_k);
    blended
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::models::FaqSummary;

    fn candidate(id: i64, score: f32) -> ScoredCandidate {
        ScoredCandidate::new(
            FaqSummary::for_language(id, &format!("q{id}"), "a", Language::Ru),
            score,
        )
    }

    #[test]
    fn test_parse_judgment_plain_array() {
        assert_eq!(parse_judgment("[8, 3, 0]", 3), Some(vec![8, 3, 0]));
    }

    #[test]
    fn test_parse_judgment_code_fenced() {
        assert_eq!(
            parse_judgment("```json\n[10, 5]\n```", 2),
            Some(vec![10, 5])
        );
    }

    #[test]
    fn test_parse_judgment_embedded_in_text() {
        assert_eq!(
            parse_judgment("Here are the scores: [7, 2] as requested", 2),
            Some(vec![7, 2])
        );
    }

    #[test]
    fn test_parse_judgment_rejects_wrong_length() {
        assert_eq!(parse_judgment("[8, 3]", 3), None);
    }

    #[test]
    fn test_parse_judgment_rejects_out_of_range() {
        assert_eq!(parse_judgment("[8, 13]", 2), None);
        assert_eq!(parse_judgment("[-1, 3]", 2), None);
    }

    #[test]
    fn test_parse_judgment_rejects_garbage() {
        assert_eq!(parse_judgment("no scores here", 2), None);
    }

    #[test]
    fn test_apply_judgment_blends_and_reorders() {
        // Judge strongly prefers the second candidate
        let candidates = vec![candidate(1, 0.50), candidate(2, 0.45)];
        let result = apply_judgment(candidates, &[2, 9], 0.6, 2);

        // id 1: 0.6*0.2 + 0.4*0.50 = 0.32; id 2: 0.6*0.9 + 0.4*0.45 = 0.72
        assert_eq!(result[0].entry.id, 2);
        assert!((result[0].score - 0.72).abs() < 1e-6);
        assert!((result[1].score - 0.32).abs() < 1e-6);
    }

    #[test]
    fn test_apply_judgment_truncates_to_top_k() {
        let candidates = vec![
            candidate(1, 0.5),
            candidate(2, 0.4),
            candidate(3, 0.3),
        ];
        let result = apply_judgment(candidates, &[5, 5, 5], 0.6, 2);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_apply_judgment_tie_keeps_retrieval_order() {
        let candidates = vec![candidate(1, 0.4), candidate(2, 0.4)];
        let result = apply_judgment(candidates, &[5, 5], 0.6, 2);
        assert_eq!(result[0].entry.id, 1);
    }
}
