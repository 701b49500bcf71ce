//! Generic prompter over a UI control.
//!
//! `WidgetPrompter` owns everything widget kinds have in common: creating and
//! showing the control, dispatching button clicks, step titles, hide handling
//! and disposal. What differs per widget kind lives in a `WidgetStrategy`.

use async_trait::async_trait;

use crate::{
    Button, ButtonView, Chrome, Control, ControlEvent, LastAttempt, PromptEnv, PromptResult,
    Prompter, WizardError,
};

/// What a strategy wants after handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<T> {
    /// Keep the control open and wait for the next event.
    Continue,

    /// Resolve the prompt.
    Resolve(PromptResult<T>),
}

/// The widget-specific half of a `WidgetPrompter`.
#[async_trait]
pub trait WidgetStrategy: Send {
    type Output: Send + 'static;

    /// Create the control.
    fn create(&mut self, env: &PromptEnv, chrome: Chrome) -> Box<dyn Control>;

    /// Called once, right after the control is first shown.
    fn on_show(&mut self, _env: &PromptEnv, _control: &mut dyn Control) {}

    /// Wait for the next event. Strategies with background work (item
    /// loading, validation) override this to interleave it with user events.
    async fn next_event(
        &mut self,
        _env: &PromptEnv,
        control: &mut dyn Control,
    ) -> Result<ControlEvent, WizardError> {
        Ok(control.next_event().await)
    }

    /// Handle a value, selection or accept event.
    async fn on_event(
        &mut self,
        event: ControlEvent,
        control: &mut dyn Control,
    ) -> Result<Flow<Self::Output>, WizardError>;

    /// Pre-fill from a previous answer.
    fn restore(&mut self, _attempt: LastAttempt<Self::Output>) {}
}

/// A prompter backed by one UI control.
pub struct WidgetPrompter<S: WidgetStrategy> {
    pub(crate) env: PromptEnv,
    pub(crate) strategy: S,
    title: Option<String>,
    placeholder: Option<String>,
    ignore_focus_out: bool,
    buttons: Vec<Button<S::Output>>,
    steps: Option<(usize, usize)>,
    control: Option<Box<dyn Control>>,
    disposed: bool,
}

impl<S: WidgetStrategy> WidgetPrompter<S> {
    /// Wrap a strategy.
    pub fn with_strategy(env: &PromptEnv, strategy: S) -> Self {
        Self {
            env: env.clone(),
            strategy,
            title: None,
            placeholder: None,
            ignore_focus_out: false,
            buttons: Vec::new(),
            steps: None,
            control: None,
            disposed: false,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the placeholder text.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Keep the control open when focus moves elsewhere.
    pub fn ignore_focus_out(mut self, ignore: bool) -> Self {
        self.ignore_focus_out = ignore;
        self
    }

    /// Add a button.
    pub fn with_button(mut self, button: Button<S::Output>) -> Self {
        self.buttons.push(button);
        self
    }

    /// Add the standard back button, labelled through the environment's messages.
    pub fn with_back_button(self) -> Self {
        let tooltip = self.env.messages().back();
        self.with_button(Button::back().with_tooltip(tooltip))
    }

    fn title_text(&self) -> Option<String> {
        let title = self.title.as_deref()?;
        Some(match self.steps {
            Some((current, total)) => self.env.messages().step_title(title, current, total),
            None => title.to_string(),
        })
    }

    fn chrome(&self) -> Chrome {
        Chrome {
            title: self.title_text(),
            placeholder: self.placeholder.clone(),
            buttons: self
                .buttons
                .iter()
                .map(|b| ButtonView {
                    icon: b.icon().to_string(),
                    tooltip: b.tooltip().map(str::to_string),
                })
                .collect(),
            ignore_focus_out: self.ignore_focus_out,
        }
    }
}

impl<S: WidgetStrategy + Clone> Clone for WidgetPrompter<S> {
    /// Clones share configuration but never the live control.
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            strategy: self.strategy.clone(),
            title: self.title.clone(),
            placeholder: self.placeholder.clone(),
            ignore_focus_out: self.ignore_focus_out,
            buttons: self.buttons.clone(),
            steps: self.steps,
            control: None,
            disposed: false,
        }
    }
}

#[async_trait]
impl<S: WidgetStrategy> Prompter<S::Output> for WidgetPrompter<S> {
    async fn prompt(&mut self) -> Result<PromptResult<S::Output>, WizardError> {
        if self.disposed {
            return Err(WizardError::collaborator(anyhow::anyhow!(
                "prompt() called on a disposed prompter"
            )));
        }

        match self.control.as_mut() {
            Some(control) => control.show(),
            None => {
                let chrome = self.chrome();
                let mut control = self.strategy.create(&self.env, chrome);
                control.show();
                self.strategy.on_show(&self.env, control.as_mut());
                self.control = Some(control);
            }
        }

        let Some(control) = self.control.as_mut() else {
            return Ok(PromptResult::Cancel);
        };

        loop {
            let event = self.strategy.next_event(&self.env, control.as_mut()).await?;
            match event {
                ControlEvent::Hide => return Ok(PromptResult::Cancel),
                ControlEvent::ButtonTriggered(index) => {
                    let Some(button) = self.buttons.get(index) else {
                        continue;
                    };
                    if let Some(result) = button.click()? {
                        return Ok(result);
                    }
                }
                other => match self.strategy.on_event(other, control.as_mut()).await? {
                    Flow::Continue => {}
                    Flow::Resolve(result) => return Ok(result),
                },
            }
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(mut control) = self.control.take() {
            control.dispose();
        }
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        self.steps = Some((current, total));
        if let Some(title) = self.title_text()
            && let Some(control) = self.control.as_mut()
        {
            control.set_title(&title);
        }
    }

    fn restore(&mut self, attempt: LastAttempt<S::Output>) {
        self.strategy.restore(attempt);
    }
}

impl<S: WidgetStrategy> Drop for WidgetPrompter<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
