//! Single-line text entry with live validation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::{
    Chrome, Control, ControlEvent, Flow, LastAttempt, PromptEnv, PromptResult, TextInputConfig,
    WidgetPrompter, WidgetStrategy, WizardError,
};

type Verdict = BoxFuture<'static, anyhow::Result<Option<String>>>;
type CheckFn = dyn Fn(String) -> Verdict + Send + Sync;

/// Checks the text of an input box.
///
/// A verdict of `Err(message)` blocks acceptance and shows `message` inline.
/// Async validators may consult external data; if that consultation itself
/// fails, the failure ends the run instead of showing a message.
#[derive(Clone)]
pub struct Validator {
    check: Arc<CheckFn>,
}

impl Validator {
    /// A synchronous validator.
    pub fn new(f: impl Fn(&str) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            check: Arc::new(move |value: String| -> Verdict {
                let verdict = f(&value).err();
                async move { Ok(verdict) }.boxed()
            }),
        }
    }

    /// An asynchronous validator. The outer result reports whether the check
    /// could be performed, the inner one is the verdict.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Result<(), String>>> + Send + 'static,
    {
        Self {
            check: Arc::new(move |value: String| -> Verdict {
                let fut = f(value);
                async move { fut.await.map(|verdict| verdict.err()) }.boxed()
            }),
        }
    }

    /// Validate a value. `Ok(None)` means valid.
    pub async fn check(&self, value: &str) -> anyhow::Result<Option<String>> {
        (self.check)(value.to_string()).await
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

/// A prompter for a line of text.
pub type InputBoxPrompter = WidgetPrompter<InputBox>;

/// A validation that has not answered yet.
struct PendingCheck {
    value: String,
    verdict: Verdict,
}

impl fmt::Debug for PendingCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCheck")
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Strategy behind `InputBoxPrompter`.
///
/// Validation runs alongside user events: while a check is pending the
/// control stays busy but hide and buttons are still handled, and a newer
/// value replaces the check in flight.
#[derive(Debug)]
pub struct InputBox {
    value: String,
    password: bool,
    validator: Option<Validator>,
    validate_on_change: bool,
    /// Last checked value and its verdict.
    checked: Option<(String, Option<String>)>,
    pending: Option<PendingCheck>,
    /// Accept was pressed while the current value was still being checked.
    accept_requested: bool,
    shown_message: Option<String>,
    restored_error: Option<String>,
}

impl Clone for InputBox {
    /// Clones never share a check in flight.
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            password: self.password,
            validator: self.validator.clone(),
            validate_on_change: self.validate_on_change,
            checked: self.checked.clone(),
            pending: None,
            accept_requested: false,
            shown_message: self.shown_message.clone(),
            restored_error: self.restored_error.clone(),
        }
    }
}

impl InputBox {
    /// Create an input box prompter.
    pub fn new(env: &PromptEnv) -> InputBoxPrompter {
        WidgetPrompter::with_strategy(
            env,
            InputBox {
                value: String::new(),
                password: false,
                validator: None,
                validate_on_change: true,
                checked: None,
                pending: None,
                accept_requested: false,
                shown_message: None,
                restored_error: None,
            },
        )
    }

    /// The verdict for the current value, or `None` while it is being checked.
    ///
    /// Starts a check when the value has no cached verdict.
    fn verdict(&mut self, control: &mut dyn Control) -> Option<Option<String>> {
        let Some(validator) = self.validator.clone() else {
            self.show_message(control, None);
            return Some(None);
        };

        if let Some((value, verdict)) = self.checked.clone()
            && value == self.value
        {
            self.show_message(control, verdict.clone());
            return Some(verdict);
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.value == self.value)
        {
            return None;
        }

        if self.pending.is_none() {
            control.set_busy(true);
        }
        self.pending = Some(PendingCheck {
            value: self.value.clone(),
            verdict: (validator.check)(self.value.clone()),
        });
        None
    }

    fn show_message(&mut self, control: &mut dyn Control, message: Option<String>) {
        if self.shown_message != message {
            control.set_validation_message(message.as_deref());
            self.shown_message = message;
        }
    }
}

impl InputBoxPrompter {
    /// Set the initial text.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.strategy.value = value.into();
        self
    }

    /// Mask the input.
    pub fn password(mut self, password: bool) -> Self {
        self.strategy.password = password;
        self
    }

    /// Validate the text on every change and before accepting.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.strategy.validator = Some(validator);
        self
    }

    /// Only validate when the user accepts, not on every keystroke.
    pub fn validate_on_accept_only(mut self) -> Self {
        self.strategy.validate_on_change = false;
        self
    }
}

#[async_trait]
impl WidgetStrategy for InputBox {
    type Output = String;

    fn create(&mut self, env: &PromptEnv, chrome: Chrome) -> Box<dyn Control> {
        env.host().create_text_input(TextInputConfig {
            chrome,
            value: self.value.clone(),
            password: self.password,
        })
    }

    fn on_show(&mut self, _env: &PromptEnv, control: &mut dyn Control) {
        if let Some(error) = self.restored_error.take() {
            self.show_message(control, Some(error));
        }
    }

    async fn next_event(
        &mut self,
        _env: &PromptEnv,
        control: &mut dyn Control,
    ) -> Result<ControlEvent, WizardError> {
        loop {
            let Some(pending) = self.pending.as_mut() else {
                return Ok(control.next_event().await);
            };
            let checked_value = pending.value.clone();

            let verdict = tokio::select! {
                biased;
                verdict = &mut pending.verdict => verdict,
                event = control.next_event() => return Ok(event),
            };

            self.pending = None;
            control.set_busy(false);
            let message = verdict?;
            self.checked = Some((checked_value, message.clone()));
            self.show_message(control, message);

            // Replay the accept that was waiting for this verdict.
            if std::mem::take(&mut self.accept_requested) {
                return Ok(ControlEvent::Accept);
            }
        }
    }

    async fn on_event(
        &mut self,
        event: ControlEvent,
        control: &mut dyn Control,
    ) -> Result<Flow<String>, WizardError> {
        match event {
            ControlEvent::ValueChanged(value) => {
                self.value = value;
                self.accept_requested = false;
                if self.validate_on_change {
                    self.verdict(control);
                } else {
                    if self.pending.take().is_some() {
                        control.set_busy(false);
                    }
                    self.show_message(control, None);
                }
                Ok(Flow::Continue)
            }
            ControlEvent::Accept => Ok(match self.verdict(control) {
                None => {
                    self.accept_requested = true;
                    Flow::Continue
                }
                Some(Some(_)) => Flow::Continue,
                Some(None) => Flow::Resolve(PromptResult::Value(self.value.clone())),
            }),
            _ => Ok(Flow::Continue),
        }
    }

    fn restore(&mut self, attempt: LastAttempt<String>) {
        self.value = attempt.value;
        self.restored_error = attempt.error;
        self.checked = None;
        self.pending = None;
        self.accept_requested = false;
    }
}
