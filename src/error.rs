use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Malformed record from {source_name}: {reason}")]
    MalformedSourceRecord { source_name: String, reason: String },

    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Enrichment failed: {0}")]
    EnrichmentFailure(String),

    #[error("Posting to {platform} failed: {reason}")]
    SinkFailure { platform: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        PipelineError::MalformedSourceRecord {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        PipelineError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn sink(platform: &str, reason: impl Into<String>) -> Self {
        PipelineError::SinkFailure {
            platform: platform.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
