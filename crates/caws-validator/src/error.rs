//! Error types for spec validation
//!
//! Rule violations are never errors; they are findings in the result. Only
//! a document that cannot be parsed at all ends up here.

use caws_types::DocumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("cannot parse spec: {0}")]
    Document(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
