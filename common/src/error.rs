use std::time::Duration;

use async_openai::error::OpenAIError;
use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("Error extracting text: {0}")]
    Extraction(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Provider call timed out after {0:?}")]
    ProviderTimeout(Duration),
    #[error("Vector index error: {0}")]
    Index(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Errors raised by the embedding or generation providers, the only ones worth retrying.
    pub const fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::ProviderTimeout(_) | Self::OpenAI(_) | Self::Reqwest(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_are_classified() {
        assert!(AppError::Provider("boom".into()).is_provider_failure());
        assert!(AppError::ProviderTimeout(Duration::from_secs(1)).is_provider_failure());
        assert!(!AppError::MalformedInput("bad".into()).is_provider_failure());
        assert!(!AppError::Index("down".into()).is_provider_failure());
    }

    #[test]
    fn messages_carry_the_cause() {
        let err = AppError::UnsupportedFormat("notes.docx".into());
        assert_eq!(err.to_string(), "Unsupported file type: notes.docx");

        let err = AppError::Extraction("invalid utf-8".into());
        assert_eq!(err.to_string(), "Error extracting text: invalid utf-8");
    }
}
