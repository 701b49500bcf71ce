//! Scripted collaborators for driving prompters and wizards without a UI.
//!
//! `ScriptedHost` is a `UiHost` whose controls replay queued events and
//! record every call made on them. `ScriptedPrompter` replays queued
//! `PromptResult`s and records prompts, restores and disposals.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    Chrome, Control, ControlEvent, ItemView, LastAttempt, PromptEnv, PromptResult, Prompter,
    SelectionListConfig, TextInputConfig, UiHost, WizardError,
};

/// The kind of control a host was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    TextInput,
    SelectionList,
}

/// Everything that happened to one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRecord {
    pub kind: ControlKind,
    pub chrome: Chrome,
    /// Initial text of a text input.
    pub value: String,
    pub password: bool,
    pub can_pick_many: bool,
    pub shown: usize,
    /// Every `set_items` call, in order.
    pub items: Vec<Vec<ItemView>>,
    pub values: Vec<String>,
    /// Every `set_validation_message` call, in order.
    pub messages: Vec<Option<String>>,
    pub busy: Vec<bool>,
    pub placeholders: Vec<String>,
    pub titles: Vec<String>,
    pub dispose_calls: usize,
}

impl ControlRecord {
    fn new(kind: ControlKind, chrome: Chrome) -> Self {
        Self {
            kind,
            chrome,
            value: String::new(),
            password: false,
            can_pick_many: false,
            shown: 0,
            items: Vec::new(),
            values: Vec::new(),
            messages: Vec::new(),
            busy: Vec::new(),
            placeholders: Vec::new(),
            titles: Vec::new(),
            dispose_calls: 0,
        }
    }

    /// Labels of the last item list shown.
    pub fn labels(&self) -> Vec<String> {
        self.items
            .last()
            .map(|items| items.iter().map(|item| item.label.clone()).collect())
            .unwrap_or_default()
    }

    /// Validation messages that were actually displayed, ignoring clears.
    pub fn shown_messages(&self) -> Vec<String> {
        self.messages.iter().flatten().cloned().collect()
    }
}

#[derive(Default)]
struct HostInner {
    scripts: VecDeque<Vec<ControlEvent>>,
    records: Vec<ControlRecord>,
}

/// A `UiHost` that plays back one event script per created control.
///
/// Scripts are handed out in creation order. A control whose script has run
/// out reports `Hide`, so a missing script reads as a user who dismissed the
/// prompt.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    inner: Arc<Mutex<HostInner>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the events of the next control to be created.
    pub fn script(&self, events: impl IntoIterator<Item = ControlEvent>) -> &Self {
        self.inner.lock().scripts.push_back(events.into_iter().collect());
        self
    }

    /// A prompt environment backed by this host.
    pub fn env(&self) -> PromptEnv {
        PromptEnv::new(Arc::new(self.clone()))
    }

    /// Snapshot of every control created so far.
    pub fn controls(&self) -> Vec<ControlRecord> {
        self.inner.lock().records.clone()
    }

    /// Snapshot of the control created `index`-th.
    pub fn control(&self, index: usize) -> Option<ControlRecord> {
        self.inner.lock().records.get(index).cloned()
    }

    /// Check that every created control was disposed exactly once.
    pub fn all_disposed_once(&self) -> bool {
        self.inner.lock().records.iter().all(|r| r.dispose_calls == 1)
    }

    fn create(&self, record: ControlRecord) -> Box<dyn Control> {
        let mut inner = self.inner.lock();
        let index = inner.records.len();
        inner.records.push(record);
        let events = inner.scripts.pop_front().unwrap_or_default();
        Box::new(ScriptedControl {
            index,
            events: events.into(),
            host: Arc::clone(&self.inner),
        })
    }
}

impl fmt::Debug for ScriptedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ScriptedHost")
            .field("pending_scripts", &inner.scripts.len())
            .field("controls", &inner.records.len())
            .finish()
    }
}

impl UiHost for ScriptedHost {
    fn create_text_input(&self, config: TextInputConfig) -> Box<dyn Control> {
        let mut record = ControlRecord::new(ControlKind::TextInput, config.chrome);
        record.value = config.value;
        record.password = config.password;
        self.create(record)
    }

    fn create_selection_list(&self, config: SelectionListConfig) -> Box<dyn Control> {
        let mut record = ControlRecord::new(ControlKind::SelectionList, config.chrome);
        record.can_pick_many = config.can_pick_many;
        self.create(record)
    }
}

struct ScriptedControl {
    index: usize,
    events: VecDeque<ControlEvent>,
    host: Arc<Mutex<HostInner>>,
}

impl ScriptedControl {
    fn record(&self, f: impl FnOnce(&mut ControlRecord)) {
        if let Some(record) = self.host.lock().records.get_mut(self.index) {
            f(record);
        }
    }
}

#[async_trait]
impl Control for ScriptedControl {
    fn show(&mut self) {
        self.record(|r| r.shown += 1);
    }

    async fn next_event(&mut self) -> ControlEvent {
        self.events.pop_front().unwrap_or(ControlEvent::Hide)
    }

    fn set_items(&mut self, items: Vec<ItemView>) {
        self.record(|r| r.items.push(items));
    }

    fn set_value(&mut self, value: &str) {
        self.record(|r| r.values.push(value.to_string()));
    }

    fn set_validation_message(&mut self, message: Option<&str>) {
        self.record(|r| r.messages.push(message.map(str::to_string)));
    }

    fn set_busy(&mut self, busy: bool) {
        self.record(|r| r.busy.push(busy));
    }

    fn set_placeholder(&mut self, placeholder: &str) {
        self.record(|r| r.placeholders.push(placeholder.to_string()));
    }

    fn set_title(&mut self, title: &str) {
        self.record(|r| r.titles.push(title.to_string()));
    }

    fn dispose(&mut self) {
        self.record(|r| r.dispose_calls += 1);
    }
}

struct PromptLogInner<T> {
    instances: usize,
    prompts: Vec<usize>,
    dispose_calls: Vec<usize>,
    restored: Vec<LastAttempt<T>>,
    steps: Vec<(usize, usize)>,
}

/// What happened to a `ScriptedPrompter` and all of its clones.
pub struct PromptLog<T> {
    inner: Arc<Mutex<PromptLogInner<T>>>,
}

impl<T> Clone for PromptLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> PromptLog<T> {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PromptLogInner {
                instances: 0,
                prompts: Vec::new(),
                dispose_calls: Vec::new(),
                restored: Vec::new(),
                steps: Vec::new(),
            })),
        }
    }

    fn register(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.instances += 1;
        inner.dispose_calls.push(0);
        inner.instances - 1
    }

    /// Total number of `prompt` calls.
    pub fn prompts(&self) -> usize {
        self.inner.lock().prompts.len()
    }

    /// Number of instances that were disposed.
    pub fn disposals(&self) -> usize {
        self.inner.lock().dispose_calls.iter().filter(|&&calls| calls > 0).count()
    }

    /// Check that every prompted instance was disposed exactly once.
    pub fn prompted_disposed_once(&self) -> bool {
        let inner = self.inner.lock();
        inner
            .prompts
            .iter()
            .all(|&instance| inner.dispose_calls.get(instance) == Some(&1))
    }

    /// Previous answers handed to instances through `restore`, in order.
    pub fn restored(&self) -> Vec<LastAttempt<T>> {
        self.inner.lock().restored.clone()
    }

    /// Every `set_steps` call, in order.
    pub fn steps(&self) -> Vec<(usize, usize)> {
        self.inner.lock().steps.clone()
    }
}

impl<T> fmt::Debug for PromptLog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PromptLog")
            .field("instances", &inner.instances)
            .field("prompts", &inner.prompts.len())
            .finish_non_exhaustive()
    }
}

/// A prompter that replays queued results.
///
/// Clones share the queue and the log but count as separate instances, so a
/// prompter bound with `Binding::prompter` answers from the same script on
/// every visit. An exhausted script answers `Cancel`.
pub struct ScriptedPrompter<T> {
    script: Arc<Mutex<VecDeque<PromptResult<T>>>>,
    log: PromptLog<T>,
    instance: usize,
    disposed: bool,
}

impl<T: Clone> ScriptedPrompter<T> {
    pub fn new(script: impl IntoIterator<Item = PromptResult<T>>) -> Self {
        let log = PromptLog::new();
        let instance = log.register();
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            log,
            instance,
            disposed: false,
        }
    }

    /// A prompter that accepts each value in turn.
    pub fn values(values: impl IntoIterator<Item = T>) -> Self {
        Self::new(values.into_iter().map(PromptResult::Value))
    }

    pub fn log(&self) -> PromptLog<T> {
        self.log.clone()
    }
}

impl<T: Clone> Clone for ScriptedPrompter<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            log: self.log.clone(),
            instance: self.log.register(),
            disposed: false,
        }
    }
}

impl<T> fmt::Debug for ScriptedPrompter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedPrompter")
            .field("instance", &self.instance)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Prompter<T> for ScriptedPrompter<T> {
    async fn prompt(&mut self) -> Result<PromptResult<T>, WizardError> {
        self.log.inner.lock().prompts.push(self.instance);
        Ok(self.script.lock().pop_front().unwrap_or(PromptResult::Cancel))
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(calls) = self.log.inner.lock().dispose_calls.get_mut(self.instance) {
            *calls += 1;
        }
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        self.log.inner.lock().steps.push((current, total));
    }

    fn restore(&mut self, attempt: LastAttempt<T>) {
        self.log.inner.lock().restored.push(attempt);
    }
}
