//! Error types for the gate facade
//!
//! Validation outcomes are never errors. These cover the inputs the gate
//! could not use at all: configuration, spec files, tool ids.

use caws_policy::PolicyError;
use caws_types::DocumentError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    /// Gate configuration file could not be read or parsed
    #[error("invalid gate config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// Spec file could not be read
    #[error("cannot read spec {}: {reason}", .path.display())]
    SpecUnreadable { path: PathBuf, reason: String },

    /// Spec file is not valid YAML/JSON
    #[error("cannot parse spec: {0}")]
    SpecParse(#[from] DocumentError),

    /// Policy file exists but cannot be used
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Request cannot be served by the selected operation
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// No tool registered under the id
    #[error("unknown tool '{id}', available: {}", .available.join(", "))]
    UnknownTool { id: String, available: Vec<String> },

    #[error("cannot render output: {0}")]
    Render(#[from] serde_json::Error),

    #[error("tracing init failed: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
