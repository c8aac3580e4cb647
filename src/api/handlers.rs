//! API request handlers
//!
//! Handlers translate the pipeline's `DecisionResult` into user-facing text.
//! No error from the core ever reaches the client raw: every failure path
//! substitutes a fixed-language fallback message.

use std::sync::Arc;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::api::types::*;
use crate::database::Database;
use crate::decision::Action;
use crate::decision::RationaleTag;
use crate::intent::Intent;
use crate::language::Language;
use crate::language::LanguageHint;
use crate::llm::LlmService;
use crate::models::ScoredCandidate;
use crate::pipeline::QueryOptions;
use crate::pipeline::QueryPipeline;
use crate::pipeline::QueryResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub pipeline: Arc<QueryPipeline>,
    pub llm_service: Arc<LlmService>,
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Answer a user question
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Json<AskResponse> {
    info!("POST /ask: {} chars", request.question.chars().count());

    let hint = match LanguageHint::parse(&request.language) {
        Ok(hint) => hint,
        Err(_) => LanguageHint::Auto,
    };
    let language = hint.resolve(&request.question);

    let options = QueryOptions {
        use_cache: request.use_cache,
        use_rerank: request.use_rerank,
    };

    let outcome = match state
        .pipeline
        .process_query(&request.question, hint, options)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Json(error_fallback_response(&request.question, language));
        }
    };

    let response = render_response(&state, &request.question, &outcome).await;

    log_query(&state, &request, &response).await;

    Json(response)
}

/// Turn the pipeline outcome into response text, degrading to fixed strings
/// when the generative capability is unavailable
async fn render_response(
    state: &AppState,
    question: &str,
    outcome: &QueryResponse,
) -> AskResponse {
    let language = outcome.language;
    let decision = &outcome.decision;

    let mut response = AskResponse {
        action: decision.action.as_str().to_string(),
        question: question.to_string(),
        language: language.as_str().to_string(),
        answer_text: None,
        video_url: None,
        faq_id: None,
        message: None,
        confidence: decision.score,
        from_cache: outcome.from_cache,
    };

    // Intent short-circuits carry no candidates
    match outcome.intent {
        Intent::Greeting => {
            response.message = Some(
                state
                    .llm_service
                    .generate_persona_response(question, language)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Persona response failed: {}", e);
                        greeting_fallback(language).to_string()
                    }),
            );
            return response;
        }
        Intent::OffTopic => {
            response.message = Some(off_topic_fallback(language).to_string());
            return response;
        }
        Intent::Vague | Intent::Faq => {}
    }

    match decision.action {
        Action::DirectAnswer => {
            if let Some(best) = &decision.best {
                response.answer_text = Some(best.entry.answer_text.clone());
                response.video_url = best.entry.video_url.clone();
                response.faq_id = Some(best.entry.id);

                // A lone medium-confidence match gets a synthesized answer
                // pinned to the retrieved context
                if decision.rationale == RationaleTag::SingleMediumMatch {
                    if let Ok(text) = state
                        .llm_service
                        .generate_answer_from_faqs(question, &decision.supporting, language)
                        .await
                    {
                        response.answer_text = Some(text);
                    }
                }
            }
        }
        Action::Clarify => {
            let message = state
                .llm_service
                .generate_clarification(question, &decision.supporting, language)
                .await
                .unwrap_or_else(|e| {
                    warn!("Clarification generation failed: {}", e);
                    clarify_fallback(&decision.supporting, language)
                });
            response.message = Some(message);
        }
        Action::ShowSimilar => {
            response.message = Some(clarify_fallback(&decision.supporting, language));
        }
        Action::NoMatch => {
            let topics = state
                .database
                .list_categories(language)
                .await
                .unwrap_or_default();
            let message = state
                .llm_service
                .generate_no_match(question, &topics, language)
                .await
                .unwrap_or_else(|e| {
                    warn!("No-match generation failed: {}", e);
                    no_match_fallback(language).to_string()
                });
            response.message = Some(message);
        }
    }

    response
}

/// Best-effort query logging; failures never affect the response
async fn log_query(state: &AppState, request: &AskRequest, response: &AskResponse) {
    let Some(client_id) = &request.client_id else {
        return;
    };

    if let Err(e) = state
        .database
        .insert_query_log(
            client_id,
            &request.question,
            response.faq_id,
            Some(response.confidence),
        )
        .await
    {
        warn!("Query log insert failed: {}", e);
    }
}

/// Get FAQ entry by id
pub async fn get_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FaqResponse>>, StatusCode> {
    info!("GET /faq/{}", id);

    match state.database.get_faq_by_id(id).await {
        Ok(Some(entry)) => Ok(Json(ApiResponse::success(FaqResponse {
            id: entry.id,
            question: entry.question,
            answer_text: entry.answer_text,
            category: entry.category,
            language: entry.language,
            video_url: entry.video_url,
        }))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Error fetching FAQ: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    #[serde(default = "default_category_language")]
    pub language: String,
}

fn default_category_language() -> String {
    "kk".to_string()
}

/// List FAQ categories for a language
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, StatusCode> {
    info!("GET /faq/categories?language={}", params.language);

    let language = Language::parse(&params.language).map_err(|_| StatusCode::BAD_REQUEST)?;

    match state.database.list_categories(language).await {
        Ok(categories) => Ok(Json(ApiResponse::success(categories))),
        Err(e) => {
            error!("Error listing categories: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Cache statistics
pub async fn get_stats(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.pipeline.cache().stats().await;
    Json(ApiResponse::success(StatsResponse {
        cache_hits: stats.hits,
        cache_misses: stats.misses,
        cache_hit_rate: stats.hit_rate(),
    }))
}

// ===== Fixed-language fallback texts =====

fn error_fallback_response(question: &str, language: Language) -> AskResponse {
    AskResponse {
        action: Action::NoMatch.as_str().to_string(),
        question: question.to_string(),
        language: language.as_str().to_string(),
        answer_text: None,
        video_url: None,
        faq_id: None,
        message: Some(error_fallback(language).to_string()),
        confidence: 0.0,
        from_cache: false,
    }
}

fn error_fallback(language: Language) -> &'static str {
    match language {
        Language::Kk => "Кешіріңіз, қате орын алды. Қайталап көріңіз немесе қолдау қызметіне жазыңыз.",
        Language::Ru => "Извините, произошла ошибка. Попробуйте еще раз или обратитесь в поддержку.",
    }
}

fn greeting_fallback(language: Language) -> &'static str {
    match language {
        Language::Kk => "Сәлеметсіз бе! Сұрағыңызды жазыңыз, мен жауап табуға көмектесемін.",
        Language::Ru => "Здравствуйте! Напишите ваш вопрос, и я помогу найти ответ.",
    }
}

fn off_topic_fallback(language: Language) -> &'static str {
    match language {
        Language::Kk => "Бұл сұрақ менің тақырыбымнан тыс. Қызмет туралы сұрақ қойыңыз.",
        Language::Ru => "Этот вопрос вне моей темы. Задайте вопрос о сервисе.",
    }
}

fn no_match_fallback(language: Language) -> &'static str {
    match language {
        Language::Kk => "Нақты жауап таппадым. Сұрағыңызды басқаша тұжырымдап көріңіз.",
        Language::Ru => "Не нашел точного ответа. Попробуйте переформулировать вопрос.",
    }
}

fn clarify_fallback(options: &[ScoredCandidate], language: Language) -> String {
    let numbered = options
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.entry.question))
        .collect::<Vec<_>>()
        .join("\n");

    match language {
        Language::Kk => format!("Сұрағыңызды нақтылаңыз. Мүмкін сіз мынаны сұрадыңыз:\n{numbered}"),
        Language::Ru => format!("Уточните вопрос. Возможно вы имели в виду:\n{numbered}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FaqSummary;

    #[test]
    fn test_clarify_fallback_numbers_options() {
        let options = vec![
            ScoredCandidate::new(
                FaqSummary::for_language(1, "Как открыть счет?", "a", Language::Ru),
                0.4,
            ),
            ScoredCandidate::new(
                FaqSummary::for_language(2, "Как закрыть счет?", "a", Language::Ru),
                0.38,
            ),
        ];

        let text = clarify_fallback(&options, Language::Ru);
        assert!(text.contains("1. Как открыть счет?"));
        assert!(text.contains("2. Как закрыть счет?"));
    }
}
