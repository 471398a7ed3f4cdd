//! # CAWS Waiver Store
//!
//! Loads waiver documents by id and validates their structure. A waiver
//! that is missing or malformed is skipped with a logged reason rather than
//! failing the caller: one bad file must not abort a budget derivation.
//!
//! Whether a structurally valid waiver is *effective* for a gate is decided
//! by [`caws_types::Waiver::eligibility`], not here.
//!
//! ## Key Components
//!
//! - [`WaiverStore`]: Trait for loading waivers by id
//! - [`FileWaiverStore`]: One file per waiver, `<dir>/WV-NNNN.{yaml,yml,json}`
//! - [`InMemoryWaiverStore`]: Documents held in memory, for hosts that
//!   already own the I/O and for tests
//! - [`validate_waiver_document`]: Structural checks on a parsed document

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod store;
pub mod validate;

pub use error::{Result, WaiverLoadError};
pub use store::{FileWaiverStore, InMemoryWaiverStore, WaiverBatch, WaiverStore, WAIVER_EXTENSIONS};
pub use validate::{validate_waiver_document, WaiverViolation};
