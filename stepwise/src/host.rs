//! The capability interface a hosting UI provides to the widget prompters.
//!
//! A host creates controls; each control is a message-passing handle. Prompters
//! drive a control by setting its content and awaiting `next_event`, so no
//! subscription outlives the step that created it.

use async_trait::async_trait;

/// Something that can create interactive controls.
pub trait UiHost: Send + Sync {
    /// Create a single-line text entry.
    fn create_text_input(&self, config: TextInputConfig) -> Box<dyn Control>;

    /// Create a selection list.
    fn create_selection_list(&self, config: SelectionListConfig) -> Box<dyn Control>;
}

/// A live UI control.
#[async_trait]
pub trait Control: Send {
    /// Make the control visible.
    fn show(&mut self);

    /// Wait for the next user interaction. Must be cancel-safe: dropping the
    /// returned future must not lose an event.
    async fn next_event(&mut self) -> ControlEvent;

    /// Replace the items of a selection list.
    fn set_items(&mut self, items: Vec<ItemView>);

    /// Replace the text of a text input.
    fn set_value(&mut self, value: &str);

    /// Show or clear the inline validation message.
    fn set_validation_message(&mut self, message: Option<&str>);

    /// Mark the control busy (loading, validating) or idle.
    fn set_busy(&mut self, busy: bool);

    /// Replace the placeholder text.
    fn set_placeholder(&mut self, placeholder: &str);

    /// Replace the title.
    fn set_title(&mut self, title: &str);

    /// Release the control. Safe to call more than once.
    fn dispose(&mut self);
}

/// An interaction reported by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// The text of the control changed.
    ValueChanged(String),

    /// The selected item indices of a selection list changed.
    SelectionChanged(Vec<usize>),

    /// The user accepted the current value or selection.
    Accept,

    /// The control was hidden without accepting.
    Hide,

    /// The button at this index was clicked.
    ButtonTriggered(usize),
}

/// How a button is presented. Handlers stay on the prompter side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub icon: String,
    pub tooltip: Option<String>,
}

/// How a selection list item is presented. Payloads stay on the prompter side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemView {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
    pub picked: bool,
}

impl ItemView {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Settings shared by every control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chrome {
    pub title: Option<String>,
    pub placeholder: Option<String>,
    pub buttons: Vec<ButtonView>,
    pub ignore_focus_out: bool,
}

/// Configuration for `UiHost::create_text_input`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInputConfig {
    pub chrome: Chrome,
    pub value: String,
    pub password: bool,
}

/// Configuration for `UiHost::create_selection_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionListConfig {
    pub chrome: Chrome,
    pub can_pick_many: bool,
}
