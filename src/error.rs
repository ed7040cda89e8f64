use std::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure taxonomy for the assembly pipeline.
///
/// `InvalidInput` is raised before any encoding work begins; `Media` only
/// after at least one I/O attempt against a source or the encoder. Callers
/// present kind plus message at the boundary; the pipeline never retries.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{message}")]
    Media {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl EngineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn media(message: impl Into<String>) -> Self {
        Self::Media {
            message: message.into(),
            source: None,
        }
    }

    pub fn media_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Media {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unreadable(path: &Path, source: std::io::Error) -> Self {
        Self::media_with(format!("cannot read {}", path.display()), source)
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
