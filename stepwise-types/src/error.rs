use crate::{FieldPath, StateError};

/// Error type for wizard runs.
///
/// User cancellation is not an error: it is reported as `PromptResult::Cancel`
/// by prompters and as `Ok(None)` by `Wizard::run`.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// A prompter factory failed while the wizard stepped onto its field.
    #[error("Prompter factory for '{path}' failed: {source}")]
    Factory {
        path: FieldPath,
        #[source]
        source: anyhow::Error,
    },

    /// A required field has no binding and no initial value.
    #[error("Required field '{0}' has no bound prompter")]
    Unbound(FieldPath),

    /// A required field was still empty when the wizard finished.
    #[error("Required field '{0}' was never filled")]
    Unfilled(FieldPath),

    /// `run` was called on a wizard that already ran.
    #[error("Wizard has already been run")]
    AlreadyRun,

    /// The collected state could not be read or written.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// An external collaborator failed (item loader, validator, button handler, UI host).
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] anyhow::Error),
}

impl WizardError {
    /// Create a collaborator error from any error type.
    pub fn collaborator(err: impl Into<anyhow::Error>) -> Self {
        Self::Collaborator(err.into())
    }

    /// Check if this error points at a defect in the form itself rather
    /// than at a runtime failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Factory { .. }
                | Self::Unbound(_)
                | Self::Unfilled(_)
                | Self::AlreadyRun
                | Self::State(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = WizardError::Unbound(FieldPath::new("region"));
        assert_eq!(err.to_string(), "Required field 'region' has no bound prompter");
        assert!(err.is_configuration());

        let err = WizardError::collaborator(anyhow::anyhow!("throttled"));
        assert_eq!(err.to_string(), "Collaborator error: throttled");
        assert!(!err.is_configuration());
    }
}
