use std::fmt;
use std::sync::Arc;

use crate::PromptResult;

type ClickHandler<T> = dyn Fn(&mut ButtonResolver<T>) -> anyhow::Result<()> + Send + Sync;

/// A clickable action shown next to a prompt.
///
/// The handler receives a `ButtonResolver`. It may resolve the prompt with a
/// value, signal back, or leave the resolver untouched to keep the prompt open
/// (side-effect-only click). Handlers run synchronously with the click; they
/// may spawn further async work of their own.
pub struct Button<T> {
    icon: String,
    tooltip: Option<String>,
    on_click: Arc<ClickHandler<T>>,
}

impl<T> Button<T> {
    /// Create a button with an icon and a click handler.
    pub fn new(
        icon: impl Into<String>,
        on_click: impl Fn(&mut ButtonResolver<T>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            icon: icon.into(),
            tooltip: None,
            on_click: Arc::new(on_click),
        }
    }

    /// The standard back button.
    pub fn back() -> Self {
        Self::new("arrow-left", |resolver| {
            resolver.back();
            Ok(())
        })
    }

    /// Set the tooltip text.
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Run the click handler, returning how the prompt should resolve, if at all.
    pub fn click(&self) -> anyhow::Result<Option<PromptResult<T>>> {
        let mut resolver = ButtonResolver { outcome: None };
        (self.on_click)(&mut resolver)?;
        Ok(resolver.outcome)
    }
}

impl<T> Clone for Button<T> {
    fn clone(&self) -> Self {
        Self {
            icon: self.icon.clone(),
            tooltip: self.tooltip.clone(),
            on_click: Arc::clone(&self.on_click),
        }
    }
}

impl<T> fmt::Debug for Button<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("icon", &self.icon)
            .field("tooltip", &self.tooltip)
            .finish_non_exhaustive()
    }
}

/// Handed to a button's click handler to resolve the owning prompt.
#[derive(Debug)]
pub struct ButtonResolver<T> {
    outcome: Option<PromptResult<T>>,
}

impl<T> ButtonResolver<T> {
    /// Resolve the prompt with a value.
    pub fn resolve(&mut self, value: T) {
        self.outcome = Some(PromptResult::Value(value));
    }

    /// Resolve the prompt with a back signal.
    pub fn back(&mut self) {
        self.outcome = Some(PromptResult::Back);
    }
}
