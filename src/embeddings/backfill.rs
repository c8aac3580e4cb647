//! Embedding backfill for FAQ entries
//!
//! FAQ rows are created by the content-management process with a NULL
//! embedding; this job fills them in batches so they become searchable.

use tracing::info;
use tracing::warn;

use super::EmbeddingService;
use crate::database::Database;
use crate::errors::Result;

/// Rows fetched per backfill round
const BACKFILL_CHUNK: i64 = 100;

/// Embed every FAQ entry that has no vector yet.
///
/// Returns the number of entries embedded. Entries whose question text is
/// empty are skipped with a warning rather than failing the run.
pub async fn backfill_embeddings(
    database: &Database,
    embedding_service: &EmbeddingService,
) -> Result<u64> {
    let total = database.count_faqs_without_embeddings().await?;
    if total == 0 {
        info!("All FAQ entries already have embeddings");
        return Ok(0);
    }

    info!("Backfilling embeddings for {} FAQ entries", total);
    let mut processed: u64 = 0;

    loop {
        let entries = database.get_faqs_without_embeddings(BACKFILL_CHUNK).await?;
        if entries.is_empty() {
            break;
        }

        // Embed question + answer together so both contribute to recall
        let mut ids = Vec::with_capacity(entries.len());
        let mut texts = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.question.trim().is_empty() {
                warn!("FAQ {} has an empty question, skipping", entry.id);
                continue;
            }
            ids.push(entry.id);
            texts.push(format!("{}\n{}", entry.question, entry.answer_text));
        }

        if texts.is_empty() {
            break;
        }

        let vectors = embedding_service.embed_batch(&texts).await?;

        for (id, vector) in ids.iter().zip(vectors.into_iter()) {
            let embedding = pgvector::Vector::from(vector);
            database.store_faq_embedding(*id, &embedding).await?;
            processed += 1;
        }

        info!("Backfilled {}/{} embeddings", processed, total);

        // Every remaining row had an empty question; nothing left to do
        if (entries.len() as i64) < BACKFILL_CHUNK {
            break;
        }
    }

    Ok(processed)
}
