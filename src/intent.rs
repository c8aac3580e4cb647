//! Lexical intent pre-filter
//!
//! Cheap set-membership classification that short-circuits retrieval for
//! greetings and obvious off-topic messages before any embedding call is
//! made. Vague queries still reach the retriever, with a reduced limit.

use crate::text::normalize;

/// Classified user intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    OffTopic,
    Vague,
    Faq,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::OffTopic => "off_topic",
            Intent::Vague => "vague",
            Intent::Faq => "faq",
        }
    }
}

/// Greetings in both corpus languages
const GREETING_TERMS: &[&str] = &[
    "привет",
    "здравствуйте",
    "здравствуй",
    "салам",
    "сәлем",
    "салем",
    "сәлеметсіз",
    "қалайсың",
    "добрый",
    "доброе",
    "hi",
    "hello",
];

/// Vocabulary that marks a question as outside the FAQ domain; matched as
/// substrings of the normalized text so multiword terms work
const OFF_TOPIC_TERMS: &[&str] = &[
    "погода",
    "футбол",
    "гороскоп",
    "анекдот",
    "рецепт",
    "ауа райы",
    "спорт",
];

/// Terms that signal a query too general to answer directly
const VAGUE_TERMS: &[&str] = &[
    "помоги",
    "помогите",
    "проблема",
    "вопрос",
    "работает",
    "көмектес",
    "көмек",
    "сұрақ",
];

/// Greeting matches only count when the whole message is short
const GREETING_MAX_CHARS: usize = 25;

/// Word-count ceiling for the vague check
const VAGUE_MAX_WORDS: usize = 2;

/// Classify a raw user message.
///
/// Checks are ordered and the first match wins: off-topic vocabulary, then
/// greeting (short messages only), then vague (very short messages built
/// around a vague term), then the FAQ default. Pure and total.
pub fn classify(text: &str) -> Intent {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split_whitespace().collect();

    if OFF_TOPIC_TERMS.iter().any(|term| normalized.contains(term)) {
        return Intent::OffTopic;
    }

    if normalized.chars().count() <= GREETING_MAX_CHARS
        && words.iter().any(|w| GREETING_TERMS.contains(w))
    {
        return Intent::Greeting;
    }

    if words.len() <= VAGUE_MAX_WORDS && words.iter().any(|w| VAGUE_TERMS.contains(w)) {
        return Intent::Vague;
    }

    Intent::Faq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_short_message() {
        assert_eq!(classify("Привет!"), Intent::Greeting);
        assert_eq!(classify("Сәлем"), Intent::Greeting);
        assert_eq!(classify("добрый день"), Intent::Greeting);
    }

    #[test]
    fn test_greeting_word_inside_long_question_is_not_greeting() {
        // A real question that happens to open with a greeting must reach retrieval
        assert_eq!(
            classify("Здравствуйте, подскажите как открыть брокерский счет"),
            Intent::Faq
        );
    }

    #[test]
    fn test_off_topic() {
        assert_eq!(classify("Какая завтра погода?"), Intent::OffTopic);
        assert_eq!(classify("ауа райы қандай"), Intent::OffTopic);
    }

    #[test]
    fn test_off_topic_wins_over_greeting() {
        // Ordered checks: off-topic vocabulary is tested first
        assert_eq!(classify("привет погода"), Intent::OffTopic);
    }

    #[test]
    fn test_vague_two_words() {
        assert_eq!(classify("помоги"), Intent::Vague);
        assert_eq!(classify("не работает"), Intent::Vague);
        assert_eq!(classify("көмектес"), Intent::Vague);
    }

    #[test]
    fn test_vague_term_in_long_question_is_faq() {
        assert_eq!(
            classify("помоги разобраться с налогами на дивиденды"),
            Intent::Faq
        );
    }

    #[test]
    fn test_default_faq() {
        assert_eq!(classify("как купить облигации"), Intent::Faq);
        assert_eq!(classify("шот қалай ашамын"), Intent::Faq);
    }
}
