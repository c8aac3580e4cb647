use thiserror::Error;

#[derive(Error, Debug)]
pub enum FaqRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("FAQ not found: id {0}")]
    FaqNotFound(i64),

    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl FaqRagError {
    /// Whether this error came from an external capability (embedding or
    /// generative text) as opposed to our own storage or logic.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            FaqRagError::UpstreamUnavailable(_) | FaqRagError::Llm(_) | FaqRagError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FaqRagError>;
