//! Prompt templates for answer composition
//!
//! The generative capability is only ever used to phrase responses around
//! retrieved FAQ content — clarification questions, topic menus, and answer
//! synthesis pinned to the supplied context. It is never asked to invent
//! facts; the system prompt states that in both corpus languages.

use std::collections::HashMap;

use crate::language::Language;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for var in &self.variables {
            if let Some(value) = values.get(var) {
                result = result.replace(&format!("{{{{{var}}}}}"), value);
            }
        }
        result
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// FAQ assistant prompt set, bilingual
pub struct FaqPrompts;

impl FaqPrompts {
    /// System prompt that pins the model to retrieved content
    #[must_use]
    pub fn base_system(language: Language) -> String {
        match language {
            Language::Kk => r"Сіз FAQ-боттың AI-көмекшісісіз.

Сізде іздеу арқылы табылған контент базасы бар (мәтін + бейне).
Сіз жауаптарды ОЙЛАП ШЫҒАРМАЙСЫЗ және тек табылған контентті қолданасыз.

ЕРЕЖЕЛЕР:
1. Ешқашан кездейсоқ жауап таңдамаңыз.
2. Күмән болса, нақтылаушы сұрақ қойыңыз.
3. Сәйкес контент болмаса, тақырып нұсқаларын ұсыныңыз.
4. Пайдаланушыны әрдайым нақты жауапқа жеткізіңіз."
                .to_string(),
            Language::Ru => r"Ты — AI-ассистент FAQ-бота.

У тебя есть база контента (текст + видео), найденная через поиск.
Ты НЕ придумываешь ответы и используешь только найденный контент.

ПРАВИЛА:
1. Никогда не выбирай ответ случайно.
2. Если есть сомнение, задавай уточняющий вопрос.
3. Если нет подходящего контента, предложи варианты тем.
4. Всегда доводи пользователя до точного ответа."
                .to_string(),
        }
    }

    /// Clarification question over a numbered option list
    #[must_use]
    pub fn clarification(language: Language) -> PromptTemplate {
        match language {
            Language::Kk => PromptTemplate::new(
                r#"Пайдаланушы сұрады: "{{question}}"

Табылған нұсқалар:
{{options}}

Пайдаланушыға нақтылаушы сұрақ қой. Қысқа және нақты болсын (макс 2 сөйлем).
Нұсқаларды нөмірмен тізіп жаз."#,
            ),
            Language::Ru => PromptTemplate::new(
                r#"Пользователь спросил: "{{question}}"

Найденные варианты:
{{options}}

Задай пользователю уточняющий вопрос. Коротко и конкретно (макс 2 предложения).
Перечисли варианты с номерами."#,
            ),
        }
    }

    /// No-match reply that offers the available topics instead of "no answer"
    #[must_use]
    pub fn no_match(language: Language) -> PromptTemplate {
        match language {
            Language::Kk => PromptTemplate::new(
                r#"Пайдаланушы сұрады: "{{question}}"

Контент табылмады. "жауап жоқ" деп жазба.
Қолжетімді тақырыптарды ұсын:
{{topics}}

Пайдаланушы тақырыпты таңдай алатындай жаз."#,
            ),
            Language::Ru => PromptTemplate::new(
                r#"Пользователь спросил: "{{question}}"

Контент не найден. НЕ пиши "нет ответа".
Предложи доступные темы:
{{topics}}

Напиши так, чтобы пользователь мог выбрать тему."#,
            ),
        }
    }

    /// Answer synthesis strictly from matched FAQ context
    #[must_use]
    pub fn answer_synthesis(language: Language) -> PromptTemplate {
        match language {
            Language::Kk => PromptTemplate::new(
                r#"Пайдаланушының сұрағы: "{{question}}"

FAQ контексті:
{{context}}

Осы контекст негізінде ғана жауап жаса. Ештеңе ойлап шығарма.
Қысқа және нақты."#,
            ),
            Language::Ru => PromptTemplate::new(
                r#"Вопрос пользователя: "{{question}}"

Контекст из FAQ:
{{context}}

Сформируй ответ СТРОГО на основе этого контекста. Ничего не придумывай.
Коротко и конкретно."#,
            ),
        }
    }

    /// Friendly reply for greetings and small talk
    #[must_use]
    pub fn persona(language: Language) -> PromptTemplate {
        match language {
            Language::Kk => PromptTemplate::new(
                r#"Пайдаланушы жазды: "{{question}}"

Достық тонмен қысқа жауап бер (2-3 сөйлем).
Не істей алатыныңды түсіндір және мысал сұрақтар ұсын."#,
            ),
            Language::Ru => PromptTemplate::new(
                r#"Пользователь написал: "{{question}}"

Ответь дружелюбно и кратко (2-3 предложения).
Объясни что ты умеешь и предложи примеры вопросов."#,
            ),
        }
    }

    /// Listwise relevance judgment used by the reranker: one integer score
    /// per numbered candidate
    #[must_use]
    pub fn relevance_judgment() -> PromptTemplate {
        PromptTemplate::new(
            r#"You are a search relevance judge. Given a user question and numbered FAQ candidates, rate how well each candidate answers the question on a 0-10 integer scale.

Question: "{{question}}"

Candidates:
{{candidates}}

Return ONLY a JSON array with one integer score per candidate, in candidate order. Example: [8, 3, 0, 6]
Output ONLY the JSON array, nothing else."#,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_extracts_variables() {
        let template = PromptTemplate::new("Hello {{name}}, you asked {{question}}");
        assert_eq!(template.variables(), &["name", "question"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Q: {{question}}");
        let mut values = HashMap::new();
        values.insert("question".to_string(), "как открыть счет".to_string());
        assert_eq!(template.render(&values), "Q: как открыть счет");
    }

    #[test]
    fn test_template_repeated_variable_renders_everywhere() {
        let template = PromptTemplate::new("{{q}} and again {{q}}");
        let mut values = HashMap::new();
        values.insert("q".to_string(), "x".to_string());
        assert_eq!(template.render(&values), "x and again x");
    }

    #[test]
    fn test_faq_prompts_have_expected_variables() {
        for language in [Language::Kk, Language::Ru] {
            assert_eq!(
                FaqPrompts::clarification(language).variables(),
                &["question", "options"]
            );
            assert_eq!(
                FaqPrompts::no_match(language).variables(),
                &["question", "topics"]
            );
            assert_eq!(
                FaqPrompts::answer_synthesis(language).variables(),
                &["question", "context"]
            );
        }
        assert_eq!(
            FaqPrompts::relevance_judgment().variables(),
            &["question", "candidates"]
        );
    }
}
