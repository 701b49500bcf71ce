use std::fmt;
use std::sync::Arc;

use crate::{English, Messages, UiHost};

/// The collaborators every widget prompter is built with.
///
/// Cheap to clone; prompters keep their own copy.
#[derive(Clone)]
pub struct PromptEnv {
    host: Arc<dyn UiHost>,
    messages: Arc<dyn Messages>,
}

impl PromptEnv {
    /// Create an environment for the given host with English strings.
    pub fn new(host: Arc<dyn UiHost>) -> Self {
        Self {
            host,
            messages: Arc::new(English),
        }
    }

    /// Use different user-facing strings.
    pub fn with_messages(mut self, messages: Arc<dyn Messages>) -> Self {
        self.messages = messages;
        self
    }

    pub fn host(&self) -> &dyn UiHost {
        self.host.as_ref()
    }

    pub fn messages(&self) -> &dyn Messages {
        self.messages.as_ref()
    }
}

impl fmt::Debug for PromptEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptEnv").finish_non_exhaustive()
    }
}
