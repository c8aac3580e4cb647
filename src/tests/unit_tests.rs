//! Pure unit tests (no database required)
//!
//! Cross-module properties of the query path that don't fit a single
//! module's colocated tests.

#[cfg(test)]
mod unit_tests {
    use crate::decision::make_decision;
    use crate::decision::Action;
    use crate::decision::DecisionConfig;
    use crate::intent;
    use crate::intent::Intent;
    use crate::language::Language;
    use crate::models::FaqSummary;
    use crate::models::ScoredCandidate;
    use crate::text;

    fn config() -> DecisionConfig {
        DecisionConfig {
            low: 0.20,
            medium: 0.35,
            high: 0.55,
            close_match_ratio: 0.85,
        }
    }

    fn candidate(id: i64, score: f32) -> ScoredCandidate {
        ScoredCandidate::new(
            FaqSummary::for_language(id, &format!("q{id}"), "a", Language::Ru),
            score,
        )
    }

    // ====== Cache payload replay ======

    #[test]
    fn test_decision_is_identical_after_cache_round_trip() {
        // Cached hits re-enter the decision step from a deserialized
        // candidate list; the outcome must match the fresh one
        let candidates = vec![
            candidate(1, 0.42),
            candidate(2, 0.40),
            candidate(3, 0.10),
        ];

        let fresh = make_decision(&candidates, &config());

        let payload = serde_json::to_value(&candidates).unwrap();
        let replayed: Vec<ScoredCandidate> = serde_json::from_value(payload).unwrap();
        let cached = make_decision(&replayed, &config());

        assert_eq!(fresh.action, cached.action);
        assert_eq!(fresh.score, cached.score);
        assert_eq!(
            fresh.supporting.iter().map(|c| c.entry.id).collect::<Vec<_>>(),
            cached.supporting.iter().map(|c| c.entry.id).collect::<Vec<_>>()
        );
    }

    // ====== Fingerprint / normalization interplay ======

    #[test]
    fn test_phrasing_variants_share_a_cache_key() {
        let variants = [
            "Как открыть счет?",
            "как открыть счет",
            "КАК  ОТКРЫТЬ   СЧЕТ!!!",
        ];

        let keys: Vec<String> = variants
            .iter()
            .map(|v| text::fingerprint(&text::normalize(v)))
            .collect();

        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_distinct_questions_get_distinct_cache_keys() {
        let a = text::fingerprint(&text::normalize("как открыть счет"));
        let b = text::fingerprint(&text::normalize("как купить облигации"));
        assert_ne!(a, b);
    }

    // ====== Intent and retrieval interplay ======

    #[test]
    fn test_faq_questions_survive_the_intent_filter() {
        // Real corpus-shaped questions must never be short-circuited
        let questions = [
            "Как открыть брокерский счет?",
            "Какие налоги на дивиденды?",
            "Облигацияны қалай сатып аламын?",
            "Шот ашу үшін не керек?",
        ];
        for question in questions {
            assert_eq!(intent::classify(question), Intent::Faq, "{}", question);
        }
    }

    // ====== Decision invariants over sweeps ======

    #[test]
    fn test_action_is_monotonic_in_best_score() {
        // Walking the best score upward never moves the action to a weaker
        // band
        let config = config();
        let rank = |action: Action| match action {
            Action::NoMatch => 0,
            Action::ShowSimilar => 1,
            Action::Clarify => 2,
            Action::DirectAnswer => 3,
        };

        let mut previous = 0;
        for step in 0..=100 {
            let score = step as f32 / 100.0;
            let result = make_decision(&[candidate(1, score)], &config);
            let current = rank(result.action);
            assert!(
                current >= previous,
                "action weakened at score {}: {:?}",
                score,
                result.action
            );
            previous = current;
        }
    }

    #[test]
    fn test_supporting_set_never_exceeds_five() {
        let config = config();
        let candidates: Vec<ScoredCandidate> =
            (1..=20).map(|i| candidate(i, 0.30)).collect();

        let result = make_decision(&candidates, &config);
        assert!(result.supporting.len() <= 5);
    }
}
