//! Integration tests requiring a live Postgres with the pgvector extension.
//!
//! Run with `cargo test -- --ignored` against a database configured in
//! config.toml. The tests create their own rows and only touch tables the
//! schema init owns.

use faqrag::config::AppConfig;
use faqrag::database::Database;
use faqrag::language::Language;
use faqrag::models::FaqSummary;
use faqrag::models::ScoredCandidate;
use faqrag::text;

async fn test_database() -> Database {
    let config = AppConfig::load().expect("config required for integration tests");
    let database = Database::from_config(&config)
        .await
        .expect("database connection failed");
    database
        .init_schema(config.embedding_dimension())
        .await
        .expect("schema init failed");
    database
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_schema_init_is_idempotent() {
    let config = AppConfig::load().unwrap();
    let database = test_database().await;
    // A second run must not fail on existing tables
    database
        .init_schema(config.embedding_dimension())
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_cache_save_then_check_returns_payload() {
    let database = test_database().await;

    let normalized = text::normalize("интеграционный тест кеша");
    let fingerprint = text::fingerprint(&normalized);

    let candidates = vec![ScoredCandidate::new(
        FaqSummary::for_language(1, "q", "a", Language::Ru),
        0.42,
    )];
    let payload = serde_json::to_value(&candidates).unwrap();

    database
        .cache_save(&fingerprint, &normalized, Language::Ru, &payload)
        .await
        .unwrap();

    let stored = database
        .cache_check(&fingerprint, Language::Ru)
        .await
        .unwrap()
        .expect("cache entry must exist after save");

    let restored: Vec<ScoredCandidate> = serde_json::from_value(stored).unwrap();
    assert_eq!(restored.len(), 1);
    assert!((restored[0].score - 0.42).abs() < 1e-6);
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_cache_save_conflict_keeps_first_payload() {
    let database = test_database().await;

    let normalized = text::normalize("первый писатель выигрывает");
    let fingerprint = text::fingerprint(&normalized);

    let first = serde_json::json!([{"entry": {"id": 1, "question": "q", "answer_text": "a",
        "category": "general", "language": "ru", "video_url": null}, "score": 0.9}]);
    let second = serde_json::json!([]);

    database
        .cache_save(&fingerprint, &normalized, Language::Ru, &first)
        .await
        .unwrap();
    database
        .cache_save(&fingerprint, &normalized, Language::Ru, &second)
        .await
        .unwrap();

    let stored = database
        .cache_check(&fingerprint, Language::Ru)
        .await
        .unwrap()
        .unwrap();
    let restored: Vec<ScoredCandidate> = serde_json::from_value(stored).unwrap();
    assert_eq!(restored.len(), 1, "second save must not overwrite payload");
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_cache_check_increments_hit_count() {
    let database = test_database().await;

    let normalized = text::normalize("счетчик попаданий");
    let fingerprint = text::fingerprint(&normalized);
    let payload = serde_json::json!([]);

    database
        .cache_save(&fingerprint, &normalized, Language::Ru, &payload)
        .await
        .unwrap();

    let before = database
        .cache_entry(&fingerprint, Language::Ru)
        .await
        .unwrap()
        .unwrap();

    database
        .cache_check(&fingerprint, Language::Ru)
        .await
        .unwrap();

    let after = database
        .cache_entry(&fingerprint, Language::Ru)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(after.hit_count, before.hit_count + 1);
    assert!(after.last_used_at >= before.last_used_at);
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_query_log_roundtrip() {
    let database = test_database().await;

    database
        .insert_query_log("itest-client", "как открыть счет", None, Some(0.42))
        .await
        .unwrap();

    let logs = database.get_query_logs("itest-client", 10).await.unwrap();
    assert!(!logs.is_empty());
    assert_eq!(logs[0].question.as_deref(), Some("как открыть счет"));
}

#[tokio::test]
#[ignore = "Requires live Postgres with pgvector"]
async fn test_keyword_search_empty_terms_returns_nothing() {
    let database = test_database().await;

    let results = database
        .keyword_search_faqs("", &[], Language::Ru, 10)
        .await
        .unwrap();
    assert!(results.is_empty());
}
