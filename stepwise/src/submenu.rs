//! Two-tier selection: pick a partition key, then an item within it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    BoxPrompter, ItemSource, LastAttempt, PickData, PickItem, PromptEnv, PromptResult, Prompter,
    PrompterExt, QuickPick, WizardError,
};

/// The answer of a `Submenu`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmenuChoice<K, I> {
    pub key: K,
    pub item: I,
}

type KeyFactory<K> = dyn Fn(Option<&K>) -> BoxPrompter<K> + Send + Sync;
type ItemFactory<K, I> = dyn Fn(&K) -> BoxPrompter<I> + Send + Sync;

/// A prompter made of two prompters.
///
/// The first tier picks a key, the second tier, built from that key, picks an
/// item. Back on the second tier returns to the first with the previous key
/// pre-selected; back on the first tier is back for the submenu itself.
pub struct Submenu<K, I> {
    keys: Arc<KeyFactory<K>>,
    items: Arc<ItemFactory<K, I>>,
    recent: Option<K>,
    steps: Option<(usize, usize)>,
}

impl<K, I> Clone for Submenu<K, I>
where
    K: Clone,
{
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            items: Arc::clone(&self.items),
            recent: self.recent.clone(),
            steps: self.steps,
        }
    }
}

impl<K, I> Submenu<K, I>
where
    K: Send + Sync + 'static,
    I: Send + 'static,
{
    /// Compose two prompter factories. The key factory receives the key picked
    /// last time, if the user came back from the item tier.
    pub fn new(
        keys: impl Fn(Option<&K>) -> BoxPrompter<K> + Send + Sync + 'static,
        items: impl Fn(&K) -> BoxPrompter<I> + Send + Sync + 'static,
    ) -> Self {
        Self {
            keys: Arc::new(keys),
            items: Arc::new(items),
            recent: None,
            steps: None,
        }
    }
}

impl<K: PickData, I: PickData> Submenu<K, I> {
    /// A submenu of two quick picks. Items of a key are fetched with `lookup`
    /// every time the key is opened.
    pub fn with_lookup<F, Fut>(
        env: &PromptEnv,
        title: impl Into<String>,
        keys: Vec<PickItem<K>>,
        lookup: F,
    ) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<PickItem<I>>>> + Send + 'static,
    {
        let title = title.into();
        let lookup = Arc::new(lookup);

        let key_env = env.clone();
        let key_title = title.clone();
        let key_items = keys.clone();
        let key_factory = move |recent: Option<&K>| {
            let mut picker = QuickPick::new(&key_env, key_items.clone())
                .with_title(key_title.clone())
                .with_back_button();
            if let Some(recent) = recent {
                picker = picker.with_recent(recent.clone());
            }
            picker.boxed()
        };

        let item_env = env.clone();
        let item_factory = move |key: &K| {
            let label = keys
                .iter()
                .find(|k| k.data == *key)
                .map(|k| k.label.clone())
                .unwrap_or_default();
            let lookup = Arc::clone(&lookup);
            let key = key.clone();
            QuickPick::new(
                &item_env,
                ItemSource::from_future(move || lookup(key.clone())),
            )
            .with_title(format!("{title}: {label}"))
            .with_back_button()
            .boxed()
        };

        Self::new(key_factory, item_factory)
    }
}

async fn prompt_once<T: Send>(
    mut prompter: BoxPrompter<T>,
    steps: Option<(usize, usize)>,
) -> Result<PromptResult<T>, WizardError> {
    if let Some((current, total)) = steps {
        prompter.set_steps(current, total);
    }
    let result = prompter.prompt().await;
    prompter.dispose();
    result
}

#[async_trait]
impl<K, I> Prompter<SubmenuChoice<K, I>> for Submenu<K, I>
where
    K: Clone + Send + Sync + 'static,
    I: Send + 'static,
{
    async fn prompt(&mut self) -> Result<PromptResult<SubmenuChoice<K, I>>, WizardError> {
        loop {
            let key_prompter = (self.keys)(self.recent.as_ref());
            let key = match prompt_once(key_prompter, self.steps).await? {
                PromptResult::Value(key) => key,
                PromptResult::Back => return Ok(PromptResult::Back),
                PromptResult::Cancel => return Ok(PromptResult::Cancel),
            };

            let item_prompter = (self.items)(&key);
            match prompt_once(item_prompter, self.steps).await? {
                PromptResult::Value(item) => {
                    self.recent = Some(key.clone());
                    return Ok(PromptResult::Value(SubmenuChoice { key, item }));
                }
                PromptResult::Back => self.recent = Some(key),
                PromptResult::Cancel => return Ok(PromptResult::Cancel),
            }
        }
    }

    /// Tier prompters are disposed as soon as they resolve.
    fn dispose(&mut self) {}

    fn set_steps(&mut self, current: usize, total: usize) {
        self.steps = Some((current, total));
    }

    fn restore(&mut self, attempt: LastAttempt<SubmenuChoice<K, I>>) {
        self.recent = Some(attempt.value.key);
    }
}
