//! Query text normalization and fingerprinting
//!
//! Pure functions applied to raw user questions before embedding and cache
//! lookup. Normalization is deterministic and idempotent; the fingerprint is
//! a stable content hash of the normalized text and serves as the cache key
//! together with the language.

use sha2::{Digest, Sha256};

/// Bilingual (Kazakh/Russian) stopword set used by keyword extraction
const STOPWORDS: &[&str] = &[
    // Kazakh
    "не", "қалай", "бол", "деген", "керек", "және", "үшін",
    // Russian
    "как", "что", "если", "это", "для", "или", "и", "в", "на",
];

/// Tokens shorter than this many characters are dropped by keyword extraction
const MIN_KEYWORD_CHARS: usize = 3;

/// Normalize raw query text: lowercase, strip everything except word
/// characters, whitespace and hyphens, collapse whitespace runs, trim.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Extract keyword tokens from text.
///
/// Tokens keep their input order and are not deduplicated; callers that need
/// set semantics must dedupe themselves.
pub fn extract_keywords(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w) && w.chars().count() >= MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// Stable 128-bit content fingerprint of normalized text, hex-encoded.
///
/// SHA-256 truncated to 16 bytes. Call with already-normalized text; the
/// cache keys on (fingerprint, language).
pub fn fingerprint(normalized_text: &str) -> String {
    let digest = Sha256::digest(normalized_text.as_bytes());
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("Как открыть счет?!"), "как открыть счет");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  шот   ашу \t қалай \n "), "шот ашу қалай");
    }

    #[test]
    fn test_normalize_keeps_hyphens() {
        assert_eq!(normalize("ИИН-код где взять"), "иин-код где взять");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "Как открыть счет?",
            "  Сәлем!  Қалайсың? ",
            "broker   account #1",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_extract_keywords_drops_stopwords_and_short_tokens() {
        let keywords = extract_keywords("Как купить акции на бирже");
        assert_eq!(keywords, vec!["купить", "акции", "бирже"]);
    }

    #[test]
    fn test_extract_keywords_preserves_order_and_duplicates() {
        let keywords = extract_keywords("налоги налоги брокер");
        assert_eq!(keywords, vec!["налоги", "налоги", "брокер"]);
    }

    #[test]
    fn test_extract_keywords_counts_chars_not_bytes() {
        // Cyrillic is two bytes per char; a two-letter word must still be dropped
        let keywords = extract_keywords("до облигации");
        assert_eq!(keywords, vec!["облигации"]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let text = normalize("Как открыть счет?");
        assert_eq!(fingerprint(&text), fingerprint(&text));
        assert_eq!(fingerprint(&text).len(), 32);
    }

    #[test]
    fn test_fingerprint_matches_for_case_and_punctuation_variants() {
        let a = normalize("Как открыть счет?");
        let b = normalize("как  открыть счет!!!");
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_differs_for_different_content() {
        let a = normalize("как открыть счет");
        let b = normalize("как закрыть счет");
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
