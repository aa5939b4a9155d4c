use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotatorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed VCF line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Annotation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
