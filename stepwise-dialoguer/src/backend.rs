//! Terminal controls for the stepwise `UiHost` interface.

use std::collections::VecDeque;
use std::future;

use async_trait::async_trait;
use dialoguer::{FuzzySelect, Input, MultiSelect, Password, Select, theme::ColorfulTheme};
use stepwise::{
    ButtonView, Chrome, Control, ControlEvent, ItemView, SelectionListConfig, TextInputConfig,
    UiHost,
};
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error};

/// Lists longer than this are shown with fuzzy search.
const FUZZY_THRESHOLD: usize = 12;

/// Error type for one terminal interaction.
#[derive(Debug, Error)]
pub enum DialoguerError {
    /// User cancelled the prompt (e.g., pressed Ctrl+C or Escape).
    #[error("Prompt cancelled by user")]
    Cancelled,

    /// An I/O error occurred during prompting.
    #[error("Dialoguer error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// The blocking prompt thread died.
    #[error("Prompt task failed: {0}")]
    Join(#[from] JoinError),
}

/// Helper to check if a dialoguer error is a cancellation (Ctrl+C / Escape)
fn is_cancelled(err: &dialoguer::Error) -> bool {
    matches!(err, dialoguer::Error::IO(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted)
}

fn check(err: dialoguer::Error) -> DialoguerError {
    if is_cancelled(&err) {
        DialoguerError::Cancelled
    } else {
        DialoguerError::Dialoguer(err)
    }
}

/// A `UiHost` that asks on the terminal using `dialoguer`.
///
/// Every control interaction runs on tokio's blocking pool, so the async
/// side (item loading, validators) keeps running while the user types.
/// Buttons become extra list entries in selection lists and `:command`
/// replies in text inputs.
#[derive(Debug, Default, Clone)]
pub struct DialoguerHost {
    /// Use colorful theme for prompts.
    colorful: bool,
}

impl DialoguerHost {
    /// Create a new Dialoguer host with default (colorful) theme.
    pub fn new() -> Self {
        Self { colorful: true }
    }

    /// Create a host with plain (no color) theme.
    pub fn plain() -> Self {
        Self { colorful: false }
    }
}

impl UiHost for DialoguerHost {
    fn create_text_input(&self, config: TextInputConfig) -> Box<dyn Control> {
        Box::new(TerminalControl::new(
            self.colorful,
            config.chrome,
            Kind::Text {
                value: config.value,
                password: config.password,
            },
        ))
    }

    fn create_selection_list(&self, config: SelectionListConfig) -> Box<dyn Control> {
        Box::new(TerminalControl::new(
            self.colorful,
            config.chrome,
            Kind::List {
                items: Vec::new(),
                many: config.can_pick_many,
            },
        ))
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Text { value: String, password: bool },
    List { items: Vec<ItemView>, many: bool },
}

/// Everything a blocking interaction needs, detached from the control.
#[derive(Debug, Clone)]
struct Ask {
    colorful: bool,
    prompt: String,
    buttons: Vec<ButtonView>,
    message: Option<String>,
    kind: Kind,
}

struct TerminalControl {
    colorful: bool,
    chrome: Chrome,
    kind: Kind,
    message: Option<String>,
    busy: bool,
    disposed: bool,
    queued: VecDeque<ControlEvent>,
    in_flight: Option<JoinHandle<Result<Vec<ControlEvent>, DialoguerError>>>,
}

impl TerminalControl {
    fn new(colorful: bool, chrome: Chrome, kind: Kind) -> Self {
        Self {
            colorful,
            chrome,
            kind,
            message: None,
            busy: false,
            disposed: false,
            queued: VecDeque::new(),
            in_flight: None,
        }
    }

    fn ask(&self) -> Ask {
        Ask {
            colorful: self.colorful,
            prompt: prompt_text(&self.chrome),
            buttons: self.chrome.buttons.clone(),
            message: self.message.clone(),
            kind: self.kind.clone(),
        }
    }
}

#[async_trait]
impl Control for TerminalControl {
    fn show(&mut self) {}

    async fn next_event(&mut self) -> ControlEvent {
        if let Some(event) = self.queued.pop_front() {
            return event;
        }
        if self.disposed {
            return ControlEvent::Hide;
        }
        // A list is not offered before its items are in.
        if self.busy && matches!(self.kind, Kind::List { .. }) && self.in_flight.is_none() {
            future::pending::<()>().await;
        }

        if self.in_flight.is_none() {
            let ask = self.ask();
            self.in_flight = Some(tokio::task::spawn_blocking(move || interact(ask)));
        }
        let Some(handle) = self.in_flight.as_mut() else {
            return ControlEvent::Hide;
        };
        let outcome = handle.await;
        self.in_flight = None;

        match outcome.map_err(DialoguerError::from).and_then(|events| events) {
            Ok(events) => {
                for event in &events {
                    if let (ControlEvent::ValueChanged(typed), Kind::Text { value, .. }) =
                        (event, &mut self.kind)
                    {
                        value.clone_from(typed);
                    }
                }
                self.queued.extend(events);
                self.queued.pop_front().unwrap_or(ControlEvent::Hide)
            }
            Err(DialoguerError::Cancelled) => {
                debug!("terminal prompt cancelled");
                ControlEvent::Hide
            }
            Err(err) => {
                error!(%err, "terminal prompt failed");
                ControlEvent::Hide
            }
        }
    }

    fn set_items(&mut self, new_items: Vec<ItemView>) {
        if let Kind::List { items, .. } = &mut self.kind {
            *items = new_items;
        }
    }

    fn set_value(&mut self, new_value: &str) {
        if let Kind::Text { value, .. } = &mut self.kind {
            *value = new_value.to_string();
        }
    }

    fn set_validation_message(&mut self, message: Option<&str>) {
        self.message = message.map(str::to_string);
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.chrome.placeholder = (!placeholder.is_empty()).then(|| placeholder.to_string());
    }

    fn set_title(&mut self, title: &str) {
        self.chrome.title = Some(title.to_string());
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.queued.clear();
        // A running terminal prompt cannot be interrupted; its answer is dropped.
        self.in_flight = None;
    }
}

/// Run one blocking terminal interaction.
fn interact(ask: Ask) -> Result<Vec<ControlEvent>, DialoguerError> {
    if let Some(message) = &ask.message {
        eprintln!("Error: {message}");
    }

    match &ask.kind {
        Kind::Text { value, password } => {
            let reply = if *password {
                ask_password(&ask)?
            } else {
                ask_text(&ask, value)?
            };
            Ok(text_reply(&reply, &ask.buttons))
        }
        Kind::List { items, many: false } => {
            let index = ask_select(&ask, items)?;
            Ok(index.map_or_else(
                || vec![ControlEvent::Hide],
                |i| select_reply(i, ask.buttons.len()),
            ))
        }
        Kind::List { items, many: true } => {
            let picked = ask_multi_select(&ask, items)?;
            Ok(picked.map_or_else(
                || vec![ControlEvent::Hide],
                |picked| multi_select_reply(&picked, ask.buttons.len()),
            ))
        }
    }
}

fn ask_text(ask: &Ask, value: &str) -> Result<String, DialoguerError> {
    if !ask.buttons.is_empty() {
        let commands: Vec<String> = ask.buttons.iter().map(button_command).collect();
        eprintln!("({})", commands.join(", "));
    }

    let _theme;
    let mut builder: Input<String>;
    if ask.colorful {
        _theme = ColorfulTheme::default();
        builder = Input::with_theme(&_theme);
    } else {
        builder = Input::new();
    }

    builder = builder.with_prompt(&ask.prompt).allow_empty(true);
    if !value.is_empty() {
        builder = builder.with_initial_text(value);
    }

    builder.interact_text().map_err(check)
}

fn ask_password(ask: &Ask) -> Result<String, DialoguerError> {
    let _theme;
    let mut builder: Password;
    if ask.colorful {
        _theme = ColorfulTheme::default();
        builder = Password::with_theme(&_theme);
    } else {
        builder = Password::new();
    }

    builder = builder.with_prompt(&ask.prompt).allow_empty_password(true);

    builder.interact().map_err(check)
}

fn ask_select(ask: &Ask, items: &[ItemView]) -> Result<Option<usize>, DialoguerError> {
    let entries = list_entries(&ask.buttons, items);
    let default = items
        .iter()
        .position(|item| item.picked)
        .map_or(ask.buttons.len(), |i| i + ask.buttons.len())
        .min(entries.len().saturating_sub(1));

    let _theme;
    let result = if entries.len() > FUZZY_THRESHOLD {
        let mut builder: FuzzySelect;
        if ask.colorful {
            _theme = ColorfulTheme::default();
            builder = FuzzySelect::with_theme(&_theme);
        } else {
            builder = FuzzySelect::new();
        }
        builder
            .with_prompt(&ask.prompt)
            .items(&entries)
            .default(default)
            .interact_opt()
    } else {
        let mut builder: Select;
        if ask.colorful {
            _theme = ColorfulTheme::default();
            builder = Select::with_theme(&_theme);
        } else {
            builder = Select::new();
        }
        builder
            .with_prompt(&ask.prompt)
            .items(&entries)
            .default(default)
            .interact_opt()
    };

    result.map_err(check)
}

fn ask_multi_select(ask: &Ask, items: &[ItemView]) -> Result<Option<Vec<usize>>, DialoguerError> {
    let entries = list_entries(&ask.buttons, items);
    let defaults: Vec<bool> = ask
        .buttons
        .iter()
        .map(|_| false)
        .chain(items.iter().map(|item| item.picked))
        .collect();

    let mut builder: MultiSelect;
    let _theme;
    if ask.colorful {
        _theme = ColorfulTheme::default();
        builder = MultiSelect::with_theme(&_theme);
    } else {
        builder = MultiSelect::new();
    }

    builder
        .with_prompt(&ask.prompt)
        .items(&entries)
        .defaults(&defaults)
        .interact_opt()
        .map_err(check)
}

/// Prompt line: the title, with the placeholder as a hint.
fn prompt_text(chrome: &Chrome) -> String {
    match (&chrome.title, &chrome.placeholder) {
        (Some(title), Some(placeholder)) => format!("{title} [{placeholder}]"),
        (Some(title), None) => title.clone(),
        (None, Some(placeholder)) => placeholder.clone(),
        (None, None) => String::new(),
    }
}

/// Text a user types to trigger a button in a text input.
fn button_command(button: &ButtonView) -> String {
    let name = button.tooltip.as_deref().unwrap_or(&button.icon);
    format!(":{}", name.trim().to_lowercase().replace(' ', "-"))
}

fn button_entry(button: &ButtonView) -> String {
    format!("<{}>", button.tooltip.as_deref().unwrap_or(&button.icon))
}

fn list_entries(buttons: &[ButtonView], items: &[ItemView]) -> Vec<String> {
    buttons
        .iter()
        .map(button_entry)
        .chain(items.iter().map(|item| match &item.description {
            Some(description) => format!("{} ({description})", item.label),
            None => item.label.clone(),
        }))
        .collect()
}

fn text_reply(reply: &str, buttons: &[ButtonView]) -> Vec<ControlEvent> {
    let typed = reply.trim();
    match buttons.iter().position(|b| button_command(b) == typed) {
        Some(index) => vec![ControlEvent::ButtonTriggered(index)],
        None => vec![ControlEvent::ValueChanged(reply.to_string()), ControlEvent::Accept],
    }
}

fn select_reply(index: usize, buttons: usize) -> Vec<ControlEvent> {
    if index < buttons {
        vec![ControlEvent::ButtonTriggered(index)]
    } else {
        vec![ControlEvent::SelectionChanged(vec![index - buttons]), ControlEvent::Accept]
    }
}

fn multi_select_reply(picked: &[usize], buttons: usize) -> Vec<ControlEvent> {
    if let Some(&button) = picked.iter().find(|&&i| i < buttons) {
        return vec![ControlEvent::ButtonTriggered(button)];
    }
    vec![
        ControlEvent::SelectionChanged(picked.iter().map(|&i| i - buttons).collect()),
        ControlEvent::Accept,
    ]
}
