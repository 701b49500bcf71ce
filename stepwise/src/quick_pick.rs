//! Selection lists: pick one (`QuickPick`) or many (`MultiPick`) items.
//!
//! Items can be given up front or loaded lazily from a stream of batches.
//! While a stream is pending the list is busy and shows a loading placeholder;
//! the user may still pick from the items that already arrived.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};

use crate::{
    Chrome, Control, ControlEvent, Flow, ItemView, LastAttempt, PromptEnv, PromptResult,
    SelectionListConfig, WidgetPrompter, WidgetStrategy, WizardError,
};

/// Bound for item payloads.
pub trait PickData: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> PickData for T {}

/// One entry of a selection list, carrying an opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PickItem<T> {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
    pub data: T,
    pub picked: bool,
}

impl<T> PickItem<T> {
    pub fn new(label: impl Into<String>, data: T) -> Self {
        Self {
            label: label.into(),
            description: None,
            detail: None,
            data,
            picked: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Pre-select this item.
    pub fn picked(mut self, picked: bool) -> Self {
        self.picked = picked;
        self
    }

    fn view(&self, picked: bool) -> ItemView {
        ItemView {
            label: self.label.clone(),
            description: self.description.clone(),
            detail: self.detail.clone(),
            picked,
        }
    }
}

impl PickItem<String> {
    /// An item whose payload is its own label.
    pub fn label(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(label.clone(), label)
    }
}

type LoadFn<T> = dyn Fn() -> BoxStream<'static, anyhow::Result<Vec<PickItem<T>>>> + Send + Sync;

/// Where the items of a selection list come from.
pub enum ItemSource<T> {
    /// A fixed list.
    Static(Vec<PickItem<T>>),

    /// Batches produced on demand, each time the list is shown.
    Lazy(Arc<LoadFn<T>>),
}

impl<T: Send + 'static> ItemSource<T> {
    /// Items loaded from a stream of batches.
    pub fn from_stream<F, S>(load: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = anyhow::Result<Vec<PickItem<T>>>> + Send + 'static,
    {
        Self::Lazy(Arc::new(move || load().boxed()))
    }

    /// Items loaded by a single async call.
    pub fn from_future<F, Fut>(load: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<PickItem<T>>>> + Send + 'static,
    {
        Self::Lazy(Arc::new(move || stream::once(load()).boxed()))
    }
}

impl<T: Clone> Clone for ItemSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(items) => Self::Static(items.clone()),
            Self::Lazy(load) => Self::Lazy(Arc::clone(load)),
        }
    }
}

impl<T> From<Vec<PickItem<T>>> for ItemSource<T> {
    fn from(items: Vec<PickItem<T>>) -> Self {
        Self::Static(items)
    }
}

impl<T: fmt::Debug> fmt::Debug for ItemSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(items) => f.debug_tuple("Static").field(items).finish(),
            Self::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

/// Item state shared by single and multi selection.
struct PickList<T> {
    source: ItemSource<T>,
    items: Vec<PickItem<T>>,
    loading: Option<BoxStream<'static, anyhow::Result<Vec<PickItem<T>>>>>,
    selection: Vec<usize>,
    recent: Vec<T>,
    placeholder: Option<String>,
    show_load_errors: bool,
    showing_no_items: bool,
}

enum Wake<T> {
    Batch(Option<anyhow::Result<Vec<PickItem<T>>>>),
    Event(ControlEvent),
}

impl<T: PickData> PickList<T> {
    fn new(source: ItemSource<T>) -> Self {
        Self {
            source,
            items: Vec::new(),
            loading: None,
            selection: Vec::new(),
            recent: Vec::new(),
            placeholder: None,
            show_load_errors: false,
            showing_no_items: false,
        }
    }

    /// A fresh copy that has not been shown yet.
    fn fresh(&self) -> Self {
        let mut list = Self::new(self.source.clone());
        list.recent = self.recent.clone();
        list.show_load_errors = self.show_load_errors;
        list
    }

    fn create(&mut self, env: &PromptEnv, chrome: Chrome, can_pick_many: bool) -> Box<dyn Control> {
        self.placeholder = chrome.placeholder.clone();
        env.host().create_selection_list(SelectionListConfig {
            chrome,
            can_pick_many,
        })
    }

    fn start(&mut self, env: &PromptEnv, control: &mut dyn Control) {
        match &self.source {
            ItemSource::Static(items) => {
                self.items = items.clone();
                self.render(env, control, true);
            }
            ItemSource::Lazy(load) => {
                self.loading = Some(load());
                control.set_busy(true);
                control.set_placeholder(&env.messages().loading());
            }
        }
    }

    fn finish_loading(&mut self, env: &PromptEnv, control: &mut dyn Control) {
        self.loading = None;
        control.set_busy(false);
        control.set_placeholder(self.placeholder.as_deref().unwrap_or_default());
        self.render(env, control, true);
    }

    async fn next_event(
        &mut self,
        env: &PromptEnv,
        control: &mut dyn Control,
    ) -> Result<ControlEvent, WizardError> {
        loop {
            let Some(batches) = self.loading.as_mut() else {
                return Ok(control.next_event().await);
            };

            let wake = tokio::select! {
                biased;
                batch = batches.next() => Wake::Batch(batch),
                event = control.next_event() => Wake::Event(event),
            };

            match wake {
                Wake::Event(event) => return Ok(event),
                Wake::Batch(Some(Ok(batch))) => {
                    self.items.extend(batch);
                    self.render(env, control, false);
                }
                Wake::Batch(Some(Err(err))) => {
                    if !self.show_load_errors {
                        self.loading = None;
                        control.set_busy(false);
                        return Err(WizardError::Collaborator(err));
                    }
                    control.set_validation_message(Some(&format!("{err:#}")));
                    self.finish_loading(env, control);
                }
                Wake::Batch(None) => self.finish_loading(env, control),
            }
        }
    }

    fn render(&mut self, env: &PromptEnv, control: &mut dyn Control, finished: bool) {
        if finished && self.items.is_empty() {
            self.showing_no_items = true;
            self.selection.clear();
            control.set_items(vec![ItemView::new(env.messages().no_items())]);
            return;
        }
        self.showing_no_items = false;

        let picked: Vec<bool> = self
            .items
            .iter()
            .map(|item| item.picked || self.recent.contains(&item.data))
            .collect();
        if self.selection.is_empty() {
            self.selection = picked
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.then_some(i))
                .collect();
        }
        control.set_items(
            self.items
                .iter()
                .zip(picked)
                .map(|(item, picked)| item.view(picked))
                .collect(),
        );
    }

    fn select(&mut self, selection: Vec<usize>) {
        self.selection = selection
            .into_iter()
            .filter(|&i| i < self.items.len())
            .collect();
    }

    fn selected(&self) -> Vec<T> {
        self.selection
            .iter()
            .filter_map(|&i| self.items.get(i))
            .map(|item| item.data.clone())
            .collect()
    }
}

/// A prompter that picks one item.
pub type QuickPickPrompter<T> = WidgetPrompter<QuickPick<T>>;

/// Strategy behind `QuickPickPrompter`.
pub struct QuickPick<T> {
    list: PickList<T>,
}

impl<T: PickData> QuickPick<T> {
    /// Create a single-selection prompter.
    pub fn new(env: &PromptEnv, items: impl Into<ItemSource<T>>) -> QuickPickPrompter<T> {
        WidgetPrompter::with_strategy(
            env,
            QuickPick {
                list: PickList::new(items.into()),
            },
        )
    }
}

impl<T: PickData> Clone for QuickPick<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.fresh(),
        }
    }
}

impl<T: PickData> QuickPickPrompter<T> {
    /// Pre-select the item carrying this payload.
    pub fn with_recent(mut self, recent: T) -> Self {
        self.strategy.list.recent = vec![recent];
        self
    }

    /// Show item-loading failures inline instead of ending the run.
    pub fn show_load_errors(mut self, show: bool) -> Self {
        self.strategy.list.show_load_errors = show;
        self
    }
}

#[async_trait]
impl<T: PickData> WidgetStrategy for QuickPick<T> {
    type Output = T;

    fn create(&mut self, env: &PromptEnv, chrome: Chrome) -> Box<dyn Control> {
        self.list.create(env, chrome, false)
    }

    fn on_show(&mut self, env: &PromptEnv, control: &mut dyn Control) {
        self.list.start(env, control);
    }

    async fn next_event(
        &mut self,
        env: &PromptEnv,
        control: &mut dyn Control,
    ) -> Result<ControlEvent, WizardError> {
        self.list.next_event(env, control).await
    }

    async fn on_event(
        &mut self,
        event: ControlEvent,
        _control: &mut dyn Control,
    ) -> Result<Flow<T>, WizardError> {
        match event {
            ControlEvent::SelectionChanged(selection) => {
                self.list.select(selection);
                Ok(Flow::Continue)
            }
            ControlEvent::Accept if self.list.showing_no_items => {
                Ok(Flow::Resolve(PromptResult::Back))
            }
            ControlEvent::Accept => {
                // Nothing explicitly selected: the first item is the active one.
                let index = self.list.selection.first().copied().unwrap_or(0);
                Ok(match self.list.items.get(index) {
                    Some(item) => Flow::Resolve(PromptResult::Value(item.data.clone())),
                    None => Flow::Continue,
                })
            }
            _ => Ok(Flow::Continue),
        }
    }

    fn restore(&mut self, attempt: LastAttempt<T>) {
        self.list.recent = vec![attempt.value];
    }
}

/// A prompter that picks any number of items.
pub type MultiPickPrompter<T> = WidgetPrompter<MultiPick<T>>;

/// Strategy behind `MultiPickPrompter`.
pub struct MultiPick<T> {
    list: PickList<T>,
}

impl<T: PickData> MultiPick<T> {
    /// Create a multi-selection prompter.
    pub fn new(env: &PromptEnv, items: impl Into<ItemSource<T>>) -> MultiPickPrompter<T> {
        WidgetPrompter::with_strategy(
            env,
            MultiPick {
                list: PickList::new(items.into()),
            },
        )
    }
}

impl<T: PickData> Clone for MultiPick<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.fresh(),
        }
    }
}

impl<T: PickData> MultiPickPrompter<T> {
    /// Pre-select the items carrying these payloads.
    pub fn with_recent(mut self, recent: Vec<T>) -> Self {
        self.strategy.list.recent = recent;
        self
    }

    /// Show item-loading failures inline instead of ending the run.
    pub fn show_load_errors(mut self, show: bool) -> Self {
        self.strategy.list.show_load_errors = show;
        self
    }
}

#[async_trait]
impl<T: PickData> WidgetStrategy for MultiPick<T> {
    type Output = Vec<T>;

    fn create(&mut self, env: &PromptEnv, chrome: Chrome) -> Box<dyn Control> {
        self.list.create(env, chrome, true)
    }

    fn on_show(&mut self, env: &PromptEnv, control: &mut dyn Control) {
        self.list.start(env, control);
    }

    async fn next_event(
        &mut self,
        env: &PromptEnv,
        control: &mut dyn Control,
    ) -> Result<ControlEvent, WizardError> {
        self.list.next_event(env, control).await
    }

    async fn on_event(
        &mut self,
        event: ControlEvent,
        _control: &mut dyn Control,
    ) -> Result<Flow<Vec<T>>, WizardError> {
        match event {
            ControlEvent::SelectionChanged(selection) => {
                self.list.select(selection);
                Ok(Flow::Continue)
            }
            ControlEvent::Accept if self.list.showing_no_items => {
                Ok(Flow::Resolve(PromptResult::Back))
            }
            ControlEvent::Accept => Ok(Flow::Resolve(PromptResult::Value(self.list.selected()))),
            _ => Ok(Flow::Continue),
        }
    }

    fn restore(&mut self, attempt: LastAttempt<Vec<T>>) {
        self.list.recent = attempt.value;
    }
}
