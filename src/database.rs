//! Postgres access layer: FAQ store, synonyms, query cache and logs
//!
//! All queries are plain runtime `query_as` over a shared pool. The query
//! path only ever reads the FAQ and synonym tables; the single mutation it
//! performs is the cache upsert, which is a row-level atomic increment and
//! needs no in-process locking.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::debug;
use tracing::info;

use crate::errors::FaqRagError;
use crate::errors::Result;
use crate::language::Language;
use crate::models::CacheRow;
use crate::models::FaqEntry;
use crate::models::FaqSummary;
use crate::models::QueryLog;
use crate::models::ScoredCandidate;

pub struct Database {
    pool: PgPool,
}

/// Row shape shared by the scored search queries
#[derive(sqlx::FromRow)]
struct ScoredRow {
    id: i64,
    question: String,
    answer_text: String,
    category: String,
    language: String,
    video_url: Option<String>,
    score: f32,
}

impl From<ScoredRow> for ScoredCandidate {
    fn from(row: ScoredRow) -> Self {
        ScoredCandidate {
            entry: FaqSummary {
                id: row.id,
                question: row.question,
                answer_text: row.answer_text,
                category: row.category,
                language: row.language,
                video_url: row.video_url,
            },
            score: row.score,
        }
    }
}

impl Database {
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()))
            .connect(config.database_url())
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist
    pub async fn init_schema(&self, embedding_dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS faq (
                id BIGSERIAL PRIMARY KEY,
                question TEXT NOT NULL,
                answer_text TEXT NOT NULL,
                category VARCHAR(100) NOT NULL,
                language VARCHAR(10) NOT NULL DEFAULT 'kk',
                video_url TEXT,
                footer_disclaimer TEXT,
                embedding vector({embedding_dimension}),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_faq_category ON faq (category)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_faq_language ON faq (language)")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_faq_embedding ON faq \
             USING ivfflat (embedding vector_cosine_ops) WITH (lists = 100)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS synonyms (
                id BIGSERIAL PRIMARY KEY,
                term TEXT NOT NULL,
                language VARCHAR(10) NOT NULL,
                synonyms TEXT[] NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS query_cache (
                query_hash VARCHAR(64) NOT NULL,
                query_normalized TEXT NOT NULL,
                language VARCHAR(10) NOT NULL,
                results JSONB NOT NULL,
                hit_count BIGINT NOT NULL DEFAULT 0,
                last_used_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (query_hash, language)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS logs (
                id BIGSERIAL PRIMARY KEY,
                client_id VARCHAR(100) NOT NULL,
                question TEXT,
                matched_faq_id BIGINT REFERENCES faq(id) ON DELETE SET NULL,
                confidence REAL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_client_id ON logs (client_id)")
            .execute(&self.pool)
            .await?;

        info!("Database schema initialized");
        Ok(())
    }

    // ===== FAQ reads =====

    pub async fn get_faq_by_id(&self, id: i64) -> Result<Option<FaqEntry>> {
        let entry = sqlx::query_as::<_, FaqEntry>("SELECT * FROM faq WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    pub async fn list_categories(&self, language: Language) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM faq WHERE language = $1 ORDER BY category",
        )
        .bind(language.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // ===== Retrieval =====

    /// Nearest-neighbor search over published FAQ embeddings.
    ///
    /// `language = None` searches across all languages; similarity is cosine,
    /// mapped to [0, 1] with 1 meaning identical.
    pub async fn vector_search_faqs(
        &self,
        query_embedding: &pgvector::Vector,
        language: Option<Language>,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>> {
        let rows = match language {
            Some(lang) => {
                sqlx::query_as::<_, ScoredRow>(
                    r#"
                    SELECT
                        id, question, answer_text, category, language, video_url,
                        (1 - (embedding <=> $1::vector))::float4 AS score
                    FROM faq
                    WHERE language = $2
                      AND embedding IS NOT NULL
                    ORDER BY embedding <=> $1::vector
                    LIMIT $3
                    "#,
                )
                .bind(query_embedding)
                .bind(lang.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ScoredRow>(
                    r#"
                    SELECT
                        id, question, answer_text, category, language, video_url,
                        (1 - (embedding <=> $1::vector))::float4 AS score
                    FROM faq
                    WHERE embedding IS NOT NULL
                    ORDER BY embedding <=> $1::vector
                    LIMIT $2
                    "#,
                )
                .bind(query_embedding)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| FaqRagError::Retrieval(e.to_string()))?;

        Ok(rows.into_iter().map(ScoredCandidate::from).collect())
    }

    /// Keyword search over question and answer text, scored by match site:
    /// a whole-query match in the question outranks a token match, which
    /// outranks an answer-text match.
    pub async fn keyword_search_faqs(
        &self,
        normalized_query: &str,
        keywords: &[String],
        language: Language,
        limit: i64,
    ) -> Result<Vec<ScoredCandidate>> {
        if normalized_query.is_empty() && keywords.is_empty() {
            return Ok(Vec::new());
        }

        let query_pattern = format!("%{normalized_query}%");
        let keyword_patterns: Vec<String> =
            keywords.iter().map(|k| format!("%{k}%")).collect();

        let rows = sqlx::query_as::<_, ScoredRow>(
            r#"
            SELECT
                id, question, answer_text, category, language, video_url,
                (CASE
                    WHEN question ILIKE $1 THEN 1.0
                    WHEN question ILIKE ANY($2) THEN 0.9
                    WHEN answer_text ILIKE ANY($2) THEN 0.7
                    ELSE 0.0
                END)::float4 AS score
            FROM faq
            WHERE language = $3
              AND (question ILIKE $1 OR question ILIKE ANY($2) OR answer_text ILIKE ANY($2))
            ORDER BY score DESC, id ASC
            LIMIT $4
            "#,
        )
        .bind(&query_pattern)
        .bind(&keyword_patterns)
        .bind(language.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FaqRagError::Retrieval(e.to_string()))?;

        Ok(rows.into_iter().map(ScoredCandidate::from).collect())
    }

    /// Look up synonym expansions whose term matches the query in either
    /// direction. Flattened; uniqueness comes from DISTINCT, order does not
    /// carry meaning.
    pub async fn get_synonyms(&self, language: Language, query: &str) -> Result<Vec<String>> {
        let synonyms = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT UNNEST(synonyms) AS synonym
            FROM synonyms
            WHERE language = $1
              AND (term ILIKE $2 OR $3 ILIKE '%' || term || '%')
            "#,
        )
        .bind(language.as_str())
        .bind(format!("%{query}%"))
        .bind(query)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FaqRagError::Retrieval(e.to_string()))?;

        Ok(synonyms)
    }

    // ===== Query cache =====

    /// Cache lookup. The hit-count increment and payload read are one
    /// statement, so concurrent hits stay consistent under row-level
    /// atomicity.
    pub async fn cache_check(
        &self,
        query_hash: &str,
        language: Language,
    ) -> Result<Option<serde_json::Value>> {
        let payload = sqlx::query_scalar::<_, serde_json::Value>(
            r#"
            UPDATE query_cache
            SET hit_count = hit_count + 1, last_used_at = NOW()
            WHERE query_hash = $1 AND language = $2
            RETURNING results
            "#,
        )
        .bind(query_hash)
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload)
    }

    /// Insert-or-touch. A concurrent first writer wins the payload; later
    /// saves only bump the bookkeeping columns.
    pub async fn cache_save(
        &self,
        query_hash: &str,
        query_normalized: &str,
        language: Language,
        results: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO query_cache
                (query_hash, query_normalized, language, results, hit_count, last_used_at, created_at)
            VALUES ($1, $2, $3, $4, 0, NOW(), NOW())
            ON CONFLICT (query_hash, language)
            DO UPDATE SET hit_count = query_cache.hit_count + 1, last_used_at = NOW()
            "#,
        )
        .bind(query_hash)
        .bind(query_normalized)
        .bind(language.as_str())
        .bind(results)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a full cache row, bookkeeping columns included
    pub async fn cache_entry(
        &self,
        query_hash: &str,
        language: Language,
    ) -> Result<Option<CacheRow>> {
        let row = sqlx::query_as::<_, CacheRow>(
            "SELECT * FROM query_cache WHERE query_hash = $1 AND language = $2",
        )
        .bind(query_hash)
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Delete cache rows unused for longer than `ttl_seconds`
    pub async fn cache_purge_stale(&self, ttl_seconds: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM query_cache WHERE last_used_at < NOW() - ($1::float8 * INTERVAL '1 second')",
        )
        .bind(ttl_seconds)
        .execute(&self.pool)
        .await?;

        debug!("Purged {} stale cache entries", result.rows_affected());
        Ok(result.rows_affected())
    }

    // ===== Embedding backfill =====

    pub async fn count_faqs_without_embeddings(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM faq WHERE embedding IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn get_faqs_without_embeddings(&self, limit: i64) -> Result<Vec<FaqEntry>> {
        let entries = sqlx::query_as::<_, FaqEntry>(
            "SELECT * FROM faq WHERE embedding IS NULL ORDER BY id ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn store_faq_embedding(&self, id: i64, embedding: &pgvector::Vector) -> Result<()> {
        sqlx::query("UPDATE faq SET embedding = $1 WHERE id = $2")
            .bind(embedding)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ===== Query log =====

    /// Best-effort request log written by the API layer
    pub async fn insert_query_log(
        &self,
        client_id: &str,
        question: &str,
        matched_faq_id: Option<i64>,
        confidence: Option<f32>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO logs (client_id, question, matched_faq_id, confidence)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(client_id)
        .bind(question)
        .bind(matched_faq_id)
        .bind(confidence)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_query_logs(&self, client_id: &str, limit: i64) -> Result<Vec<QueryLog>> {
        let logs = sqlx::query_as::<_, QueryLog>(
            "SELECT * FROM logs WHERE client_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
