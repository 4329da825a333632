use thiserror::Error;

/// Error kinds surfaced by a fraud detection run.
///
/// Every stage failure aborts the request with one of these; a run never
/// degrades into a default verdict.
#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("invalid input: cleaned text has {length} chars, expected {min}..={max}")]
    InvalidInput { length: usize, min: usize, max: usize },

    #[error("encoding unavailable: {0}")]
    EncodingUnavailable(String),

    #[error("case index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("reasoning unavailable: {0}")]
    ReasoningUnavailable(String),

    #[error("registry conflict: {0}")]
    RegistryConflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl CuratorError {
    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CuratorError::InvalidInput { .. } => "invalid_input",
            CuratorError::EncodingUnavailable(_) => "encoding_unavailable",
            CuratorError::IndexUnavailable(_) => "index_unavailable",
            CuratorError::ReasoningUnavailable(_) => "reasoning_unavailable",
            CuratorError::RegistryConflict(_) => "registry_conflict",
            CuratorError::Config(_) => "config",
            CuratorError::Io(_) => "io",
            CuratorError::Serialize(_) => "serialize",
        }
    }
}
