//! Hooks into the progress of a wizard run.

use tracing::{debug, info, warn};

use crate::FieldPath;

/// Receives wizard progress. Every method has a no-op default.
pub trait WizardObserver: Send + Sync {
    /// A step is about to be shown.
    fn step(&self, _path: &FieldPath, _current: usize, _total: usize) {}

    /// A field was skipped, by its condition or because its factory declined.
    fn skipped(&self, _path: &FieldPath) {}

    /// A field was answered and stored.
    fn answered(&self, _path: &FieldPath) {}

    /// A step validator rejected an answer; the step is shown again.
    fn rejected(&self, _path: &FieldPath, _message: &str) {}

    /// The user went back from `from`. `to` is `None` when leaving the wizard.
    fn back(&self, _from: &FieldPath, _to: Option<&FieldPath>) {}

    /// The user cancelled at `at`.
    fn cancelled(&self, _at: &FieldPath) {}

    /// The run finished with every required field filled.
    fn completed(&self, _answered: usize) {}
}

/// Observer that reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl WizardObserver for TracingObserver {
    fn step(&self, path: &FieldPath, current: usize, total: usize) {
        debug!(%path, current, total, "showing step");
    }

    fn skipped(&self, path: &FieldPath) {
        debug!(%path, "skipping field");
    }

    fn answered(&self, path: &FieldPath) {
        debug!(%path, "field answered");
    }

    fn rejected(&self, path: &FieldPath, message: &str) {
        warn!(%path, message, "answer rejected, retrying step");
    }

    fn back(&self, from: &FieldPath, to: Option<&FieldPath>) {
        match to {
            Some(to) => debug!(%from, %to, "going back"),
            None => debug!(%from, "going back out of the wizard"),
        }
    }

    fn cancelled(&self, at: &FieldPath) {
        info!(%at, "wizard cancelled");
    }

    fn completed(&self, answered: usize) {
        info!(answered, "wizard completed");
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WizardObserver for NoopObserver {}
