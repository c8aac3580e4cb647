//! Confidence-tiered decision engine
//!
//! Maps a ranked candidate list plus score thresholds to one discrete action
//! and its payload. Pure and stateless; every threshold comparison is
//! inclusive (`>=`) so boundary scores land in the higher band.

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::models::ScoredCandidate;

/// Discrete action the surrounding layer translates into a user response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    DirectAnswer,
    Clarify,
    ShowSimilar,
    NoMatch,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::DirectAnswer => "direct_answer",
            Action::Clarify => "clarify",
            Action::ShowSimilar => "show_similar",
            Action::NoMatch => "no_match",
        }
    }
}

/// Why the engine picked the action it did; consumed by response formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RationaleTag {
    HighConfidence,
    SingleMediumMatch,
    MultipleOptions,
    WeakMatches,
    BelowThreshold,
    NoCandidates,
    // Pipeline-level tags for queries that never reach retrieval or get
    // downgraded by intent
    Greeting,
    OffTopic,
    VagueQuery,
}

/// Score thresholds consumed by `make_decision`
#[derive(Debug, Clone, Copy)]
pub struct DecisionConfig {
    pub low: f32,
    pub medium: f32,
    pub high: f32,
    pub close_match_ratio: f32,
}

impl DecisionConfig {
    pub fn from_search_config(config: &SearchConfig) -> Self {
        Self {
            low: config.similarity_threshold_low,
            medium: config.similarity_threshold_medium,
            high: config.similarity_threshold_high,
            close_match_ratio: config.close_match_ratio,
        }
    }
}

/// Maximum supporting candidates surfaced to the caller
const MAX_SUPPORTING: usize = 5;

/// Maximum clarification options offered at once
const MAX_CLARIFY_OPTIONS: usize = 3;

/// Candidates considered when counting close matches in the medium band
const CLOSE_MATCH_WINDOW: usize = 5;

/// Candidates retained for diagnostics on a below-threshold miss
const MAX_DIAGNOSTICS: usize = 3;

/// Decision outcome: the action plus supporting data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub action: Action,
    pub best: Option<ScoredCandidate>,
    /// Candidates the caller may show to the user (0-5, best first)
    pub supporting: Vec<ScoredCandidate>,
    pub score: f32,
    pub rationale: RationaleTag,
    /// Retained on below-threshold misses for logging; never shown to users
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScoredCandidate>,
}

impl DecisionResult {
    fn no_candidates() -> Self {
        Self {
            action: Action::NoMatch,
            best: None,
            supporting: Vec::new(),
            score: 0.0,
            rationale: RationaleTag::NoCandidates,
            diagnostics: Vec::new(),
        }
    }

    /// Result for a query short-circuited by the intent classifier
    pub fn short_circuit(rationale: RationaleTag) -> Self {
        Self {
            action: Action::NoMatch,
            best: None,
            supporting: Vec::new(),
            score: 0.0,
            rationale,
            diagnostics: Vec::new(),
        }
    }
}

/// Decide the action for a ranked candidate list (best first).
///
/// The banding never returns an empty-handed `NoMatch` while any candidate
/// scores at or above `low`; it only withholds when the list is empty or
/// uniformly weak.
pub fn make_decision(candidates: &[ScoredCandidate], config: &DecisionConfig) -> DecisionResult {
    let Some(best) = candidates.first() else {
        return DecisionResult::no_candidates();
    };
    let best_score = best.score;

    if best_score >= config.high {
        return DecisionResult {
            action: Action::DirectAnswer,
            best: Some(best.clone()),
            supporting: candidates.iter().take(MAX_SUPPORTING).cloned().collect(),
            score: best_score,
            rationale: RationaleTag::HighConfidence,
            diagnostics: Vec::new(),
        };
    }

    if best_score >= config.medium {
        return decide_medium_band(candidates, best, config);
    }

    if best_score >= config.low {
        let supporting: Vec<ScoredCandidate> = candidates
            .iter()
            .filter(|c| c.score >= config.low)
            .take(MAX_SUPPORTING)
            .cloned()
            .collect();

        return DecisionResult {
            action: Action::ShowSimilar,
            best: Some(best.clone()),
            supporting,
            score: best_score,
            rationale: RationaleTag::WeakMatches,
            diagnostics: Vec::new(),
        };
    }

    DecisionResult {
        action: Action::NoMatch,
        best: None,
        supporting: Vec::new(),
        score: best_score,
        rationale: RationaleTag::BelowThreshold,
        diagnostics: candidates.iter().take(MAX_DIAGNOSTICS).cloned().collect(),
    }
}

/// Medium-band tie-break: several near-equal matches signal genuine
/// ambiguity the user must resolve; a lone medium-confidence match is still
/// the best available answer and is surfaced, not withheld.
fn decide_medium_band(
    candidates: &[ScoredCandidate],
    best: &ScoredCandidate,
    config: &DecisionConfig,
) -> DecisionResult {
    let close_threshold = config.medium * config.close_match_ratio;

    let close_matches: Vec<ScoredCandidate> = candidates
        .iter()
        .take(CLOSE_MATCH_WINDOW)
        .filter(|c| c.score >= close_threshold)
        .cloned()
        .collect();

    if close_matches.len() >= 2 {
        DecisionResult {
            action: Action::Clarify,
            best: Some(best.clone()),
            supporting: close_matches
                .into_iter()
                .take(MAX_CLARIFY_OPTIONS)
                .collect(),
            score: best.score,
            rationale: RationaleTag::MultipleOptions,
            diagnostics: Vec::new(),
        }
    } else {
        DecisionResult {
            action: Action::DirectAnswer,
            best: Some(best.clone()),
            supporting: vec![best.clone()],
            score: best.score,
            rationale: RationaleTag::SingleMediumMatch,
            diagnostics: Vec::new(),
        }
    }
}
