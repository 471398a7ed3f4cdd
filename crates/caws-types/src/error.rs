//! Error types for document parsing

use thiserror::Error;

/// Errors raised while turning document text into a value tree
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    /// YAML syntax error
    #[error("invalid YAML: {0}")]
    Yaml(String),

    /// JSON syntax error
    #[error("invalid JSON: {0}")]
    Json(String),

    /// Mapping key that cannot be represented as a string
    #[error("unsupported mapping key: {0}")]
    UnsupportedKey(String),

    /// NaN or infinite number
    #[error("non-finite number at {0}")]
    NonFiniteNumber(String),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;
