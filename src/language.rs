//! Language handling for the bilingual FAQ corpus

use serde::{Deserialize, Serialize};

/// Supported corpus languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Kazakh
    Kk,
    /// Russian
    Ru,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Kk => "kk",
            Language::Ru => "ru",
        }
    }

    pub fn parse(code: &str) -> crate::Result<Self> {
        match code.trim().to_lowercase().as_str() {
            "kk" => Ok(Language::Kk),
            "ru" => Ok(Language::Ru),
            other => Err(crate::FaqRagError::UnknownLanguage(other.to_string())),
        }
    }

    /// Detect the language of a user question.
    ///
    /// Kazakh-specific Cyrillic letters are unambiguous; any other text in
    /// this corpus is Russian.
    pub fn detect(text: &str) -> Self {
        const KAZAKH_CHARS: &str = "әіңғүұқөһ";

        let has_kazakh = text
            .to_lowercase()
            .chars()
            .any(|c| KAZAKH_CHARS.contains(c));

        if has_kazakh {
            Language::Kk
        } else {
            Language::Ru
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language requested by the caller: a fixed code or auto-detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageHint {
    Auto,
    Fixed(Language),
}

impl LanguageHint {
    pub fn parse(code: &str) -> crate::Result<Self> {
        if code.trim().eq_ignore_ascii_case("auto") {
            Ok(LanguageHint::Auto)
        } else {
            Ok(LanguageHint::Fixed(Language::parse(code)?))
        }
    }

    /// Resolve the hint against the question text
    pub fn resolve(&self, text: &str) -> Language {
        match self {
            LanguageHint::Auto => Language::detect(text),
            LanguageHint::Fixed(lang) => *lang,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kazakh() {
        assert_eq!(Language::detect("шот қалай ашамын"), Language::Kk);
        assert_eq!(Language::detect("Сәлем"), Language::Kk);
    }

    #[test]
    fn test_detect_russian() {
        assert_eq!(Language::detect("как открыть счет"), Language::Ru);
        assert_eq!(Language::detect("привет"), Language::Ru);
    }

    #[test]
    fn test_detect_defaults_to_russian_for_latin() {
        assert_eq!(Language::detect("hello world"), Language::Ru);
    }

    #[test]
    fn test_parse_codes() {
        assert_eq!(Language::parse("kk").unwrap(), Language::Kk);
        assert_eq!(Language::parse("RU").unwrap(), Language::Ru);
        assert!(Language::parse("en").is_err());
    }

    #[test]
    fn test_hint_resolution() {
        let hint = LanguageHint::parse("auto").unwrap();
        assert_eq!(hint.resolve("қалай"), Language::Kk);

        let fixed = LanguageHint::parse("ru").unwrap();
        assert_eq!(fixed.resolve("қалай"), Language::Ru);
    }
}
