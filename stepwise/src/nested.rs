use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::wizard::{Outcome, drive};
use crate::{Form, LastAttempt, PromptResult, Prompter, WizardError, WizardOptions, WizardState};

/// A whole form asked as one step of an outer wizard.
///
/// Answers with the filled nested object. Back from the nested form's first
/// step is back for the outer step; cancel anywhere inside cancels.
#[derive(Debug, Clone)]
pub struct WizardPrompter {
    form: Arc<Form>,
    initial: WizardState,
    recent: WizardState,
    options: WizardOptions,
}

impl WizardPrompter {
    pub fn new(form: Form) -> Self {
        Self::from_shared(Arc::new(form))
    }

    pub(crate) fn from_shared(form: Arc<Form>) -> Self {
        Self {
            form,
            initial: WizardState::new(),
            recent: WizardState::new(),
            options: WizardOptions::default(),
        }
    }

    /// Pre-fill nested fields. They are never prompted.
    pub fn with_initial_state(mut self, state: WizardState) -> Self {
        self.initial = state;
        self
    }

    pub fn with_options(mut self, options: WizardOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Prompter<Value> for WizardPrompter {
    async fn prompt(&mut self) -> Result<PromptResult<Value>, WizardError> {
        let outcome = drive(
            &self.form,
            self.initial.clone(),
            self.recent.clone(),
            &self.options,
        )
        .await?;

        Ok(match outcome {
            Outcome::Completed(state) => {
                self.recent = state.clone();
                PromptResult::Value(state.into_value())
            }
            Outcome::Back => PromptResult::Back,
            Outcome::Cancelled => PromptResult::Cancel,
        })
    }

    /// Steps of the nested run are disposed by the run itself.
    fn dispose(&mut self) {}

    /// A previous nested answer is re-offered field by field.
    fn restore(&mut self, attempt: LastAttempt<Value>) {
        if let Ok(state) = WizardState::from_value(attempt.value) {
            self.recent = state;
        }
    }
}
