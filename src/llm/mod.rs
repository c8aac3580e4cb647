//! Generative-text gateway and answer composition
//!
//! The model only phrases responses around retrieved FAQ content; the
//! decision flow never depends on it. Callers degrade to fixed fallback
//! strings when a call here fails.

pub mod prompts;

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::FaqRagError;
use crate::errors::Result;
use crate::language::Language;
use crate::models::ScoredCandidate;
use prompts::FaqPrompts;

pub use prompts::PromptTemplate;

/// Client for an OpenAI-compatible chat-completions endpoint
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmService {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| FaqRagError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
        })
    }

    /// Run a single chat completion
    ///
    /// # Errors
    /// - `UpstreamUnavailable` on transport failures or non-success status
    /// - `Llm` on malformed responses
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {}", url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| FaqRagError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FaqRagError::UpstreamUnavailable(format!(
                "Chat API error ({status}): {error_text}"
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| FaqRagError::Llm(format!("Failed to parse response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| FaqRagError::Llm("No choices in response".to_string()))
    }

    /// Phrase a clarification question over candidate FAQ options
    pub async fn generate_clarification(
        &self,
        question: &str,
        options: &[ScoredCandidate],
        language: Language,
    ) -> Result<String> {
        let options_text = numbered_questions(options, 4);

        let mut values = HashMap::new();
        values.insert("question".to_string(), question.to_string());
        values.insert("options".to_string(), options_text);
        let user_prompt = FaqPrompts::clarification(language).render(&values);

        self.generate(&FaqPrompts::base_system(language), &user_prompt, 0.4, 200)
            .await
    }

    /// Phrase a no-match reply offering the available topics
    pub async fn generate_no_match(
        &self,
        question: &str,
        topics: &[String],
        language: Language,
    ) -> Result<String> {
        let topics_text = topics
            .iter()
            .map(|t| format!("- {t}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut values = HashMap::new();
        values.insert("question".to_string(), question.to_string());
        values.insert("topics".to_string(), topics_text);
        let user_prompt = FaqPrompts::no_match(language).render(&values);

        self.generate(&FaqPrompts::base_system(language), &user_prompt, 0.4, 250)
            .await
    }

    /// Synthesize an answer strictly from the matched FAQ snippets
    pub async fn generate_answer_from_faqs(
        &self,
        question: &str,
        matched: &[ScoredCandidate],
        language: Language,
    ) -> Result<String> {
        let mut context = String::new();
        for (i, candidate) in matched.iter().take(3).enumerate() {
            context.push_str(&format!(
                "\n[FAQ {}]\nВопрос: {}\nОтвет: {}\n",
                i + 1,
                candidate.entry.question,
                candidate.entry.answer_text
            ));
        }

        let mut values = HashMap::new();
        values.insert("question".to_string(), question.to_string());
        values.insert("context".to_string(), context);
        let user_prompt = FaqPrompts::answer_synthesis(language).render(&values);

        self.generate(&FaqPrompts::base_system(language), &user_prompt, 0.3, 400)
            .await
    }

    /// Friendly reply for greetings
    pub async fn generate_persona_response(
        &self,
        question: &str,
        language: Language,
    ) -> Result<String> {
        let mut values = HashMap::new();
        values.insert("question".to_string(), question.to_string());
        let user_prompt = FaqPrompts::persona(language).render(&values);

        self.generate(&FaqPrompts::base_system(language), &user_prompt, 0.5, 300)
            .await
    }

    /// Raw listwise relevance judgment for the reranker; the caller parses
    /// and validates the output
    pub async fn judge_relevance(&self, question: &str, candidates: &[ScoredCandidate]) -> Result<String> {
        let candidates_text = numbered_questions(candidates, candidates.len());

        let mut values = HashMap::new();
        values.insert("question".to_string(), question.to_string());
        values.insert("candidates".to_string(), candidates_text);
        let user_prompt = FaqPrompts::relevance_judgment().render(&values);

        self.generate("You are a precise search relevance judge.", &user_prompt, 0.0, 128)
            .await
    }
}

/// Render candidates as a numbered question list
fn numbered_questions(candidates: &[ScoredCandidate], max: usize) -> String {
    candidates
        .iter()
        .take(max)
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.entry.question))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FaqSummary;

    #[test]
    fn test_numbered_questions_caps_and_numbers() {
        let candidates: Vec<ScoredCandidate> = (1..=5)
            .map(|i| {
                ScoredCandidate::new(
                    FaqSummary::for_language(i, &format!("q{i}"), "a", Language::Ru),
                    0.5,
                )
            })
            .collect();

        let text = numbered_questions(&candidates, 3);
        assert_eq!(text, "1. q1\n2. q2\n3. q3");
    }
}
