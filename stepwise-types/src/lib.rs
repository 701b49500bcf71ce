//! Core types for the stepwise crate.
//!
//! This crate provides the presentation-agnostic data of a wizard run:
//! - `PromptResult` - The tagged outcome of one prompt (value, back, cancel)
//! - `LastAttempt` - The retry context handed to a step that is shown again
//! - `FieldPath` and `WizardState` - Partially-filled state addressed by path
//! - `WizardError` and `StateError` - Failures that end a run

mod field_path;
pub use field_path::FieldPath;

mod prompt_result;
pub use prompt_result::{LastAttempt, PromptResult};

mod state;
pub use state::{StateError, WizardState};

mod error;
pub use error::WizardError;
