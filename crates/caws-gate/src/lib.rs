//! # CAWS Gate
//!
//! Facade over the governance components. A gate check loads the project
//! policy, validates the working spec, loads the waivers it references,
//! derives its budget and returns one merged [`caws_types::ValidationResult`].
//!
//! ## Key Components
//!
//! - [`GateEngine`]: the gate check and its building blocks
//! - [`ToolRegistry`]: capabilities selected by id (`validate`,
//!   `derive_budget`, `suggest_fixes`, `gate_check`)
//! - [`GateConfig`]: `.caws/gate.toml` settings
//! - [`render`]: text or JSON output
//! - [`init_tracing`]: subscriber setup for hosts
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use caws_gate::{GateEngine, GateRequest, OutputFormat};
//!
//! # async fn example() -> caws_gate::Result<()> {
//! let root = Path::new(".");
//! let engine = GateEngine::for_project(root)?;
//! let spec = GateEngine::load_spec(&root.join(".caws/working-spec.yaml")).await?;
//!
//! let request = GateRequest::new(root, spec).with_output(OutputFormat::Text);
//! let (_result, rendered) = engine.check_rendered(&request).await?;
//! println!("{rendered}");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod registry;
pub mod telemetry;

pub use config::{GateConfig, CONFIG_FILE};
pub use engine::{GateEngine, GateOptions, GateRequest};
pub use error::{GateError, Result};
pub use output::{render, OutputFormat};
pub use registry::{
    DeriveBudgetTool, GateCheckTool, GovernanceTool, SuggestFixesTool, ToolOutput, ToolRegistry,
    ValidateTool,
};
pub use telemetry::{init_tracing, TracingConfig};
