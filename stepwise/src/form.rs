//! Declarative field → prompter bindings.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    BoxPrompter, FieldPath, LastAttempt, PromptResult, Prompter, PrompterExt, StateError,
    WizardError, WizardOptions, WizardPrompter, WizardState,
};

/// What a prompter factory sees when the wizard steps onto its field.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    path: &'a FieldPath,
    state: &'a WizardState,
    attempt: Option<&'a LastAttempt>,
    options: &'a WizardOptions,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(
        path: &'a FieldPath,
        state: &'a WizardState,
        attempt: Option<&'a LastAttempt>,
        options: &'a WizardOptions,
    ) -> Self {
        Self {
            path,
            state,
            attempt,
            options,
        }
    }

    /// The field being prompted.
    pub fn path(&self) -> &FieldPath {
        self.path
    }

    /// Answers collected so far.
    pub fn state(&self) -> &WizardState {
        self.state
    }

    /// Decode an earlier answer. Absent and undecodable values read as `None`.
    pub fn get<T: DeserializeOwned>(&self, path: impl Into<FieldPath>) -> Option<T> {
        self.state.get(&path.into()).ok().flatten()
    }

    /// The previous answer at this step, with the reason it was rejected if it was.
    pub fn last_attempt<T: DeserializeOwned>(&self) -> Option<LastAttempt<T>> {
        self.attempt.and_then(|attempt| attempt.decode())
    }

    /// Options of the run that is asking.
    pub(crate) fn options(&self) -> &WizardOptions {
        self.options
    }
}

type Factory<T> =
    dyn Fn(&StepContext<'_>) -> anyhow::Result<Option<BoxPrompter<T>>> + Send + Sync;
type Condition = dyn Fn(&WizardState) -> bool + Send + Sync;
type CheckFuture = BoxFuture<'static, anyhow::Result<Result<(), String>>>;
type StepCheck<T> = dyn Fn(&T, &WizardState) -> CheckFuture + Send + Sync;

/// How one field gets its prompter.
pub struct Binding<T> {
    factory: Arc<Factory<T>>,
    condition: Option<Arc<Condition>>,
    depends_on: Vec<FieldPath>,
    check: Option<Arc<StepCheck<T>>>,
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            condition: self.condition.clone(),
            depends_on: self.depends_on.clone(),
            check: self.check.clone(),
        }
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("conditional", &self.condition.is_some())
            .field("depends_on", &self.depends_on)
            .field("validated", &self.check.is_some())
            .finish()
    }
}

impl<T> Binding<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Bind a prompter instance. Every step onto the field gets a fresh clone.
    pub fn prompter<P>(prompter: P) -> Self
    where
        P: Prompter<T> + Clone + 'static,
    {
        let prototype = Mutex::new(prompter);
        Self::try_from_fn(move |_| Ok(Some(prototype.lock().clone().boxed())))
    }

    /// Bind a factory. Returning `None` skips the field.
    pub fn from_fn(
        factory: impl Fn(&StepContext<'_>) -> Option<BoxPrompter<T>> + Send + Sync + 'static,
    ) -> Self {
        Self::try_from_fn(move |ctx| Ok(factory(ctx)))
    }

    /// Bind a fallible factory. An error ends the run with `WizardError::Factory`.
    pub fn try_from_fn(
        factory: impl Fn(&StepContext<'_>) -> anyhow::Result<Option<BoxPrompter<T>>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            condition: None,
            depends_on: Vec::new(),
            check: None,
        }
    }

    /// Only prompt when the predicate holds for the answers so far.
    pub fn when(
        mut self,
        condition: impl Fn(&WizardState) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Declare the fields this binding reads. Used by
    /// `InvalidationPolicy::DeclaredDependencies`.
    pub fn depends_on<P: Into<FieldPath>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.depends_on.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Check an answer before storing it. A rejected answer shows the step
    /// again, built with `LastAttempt { value, error: Some(message) }`.
    pub fn validate<F, Fut>(mut self, check: F) -> Self
    where
        F: Fn(&T, &WizardState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Result<(), String>>> + Send + 'static,
    {
        self.check = Some(Arc::new(move |value: &T, state: &WizardState| {
            check(value, state).boxed()
        }));
        self
    }
}

/// A binding with its answer type erased, as stored in a `Form`.
pub(crate) trait ErasedBinding: Send + Sync {
    fn applies(&self, state: &WizardState) -> bool;

    fn depends_on(&self) -> &[FieldPath];

    fn instantiate(
        &self,
        ctx: &StepContext<'_>,
    ) -> anyhow::Result<Option<BoxPrompter<Value>>>;

    fn check(
        &self,
        path: &FieldPath,
        value: &Value,
        state: &WizardState,
    ) -> Result<Option<CheckFuture>, WizardError>;
}

impl<T> ErasedBinding for Binding<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn applies(&self, state: &WizardState) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(state))
    }

    fn depends_on(&self) -> &[FieldPath] {
        &self.depends_on
    }

    fn instantiate(
        &self,
        ctx: &StepContext<'_>,
    ) -> anyhow::Result<Option<BoxPrompter<Value>>> {
        let path = ctx.path().clone();
        Ok((self.factory)(ctx)?.map(|inner| Encoded { path, inner }.boxed()))
    }

    fn check(
        &self,
        path: &FieldPath,
        value: &Value,
        state: &WizardState,
    ) -> Result<Option<CheckFuture>, WizardError> {
        let Some(check) = &self.check else {
            return Ok(None);
        };
        let typed: T =
            serde_json::from_value(value.clone()).map_err(|source| StateError::Decode {
                path: path.clone(),
                source,
            })?;
        Ok(Some(check(&typed, state)))
    }
}

/// Encodes the answers of a typed prompter into state values.
struct Encoded<T> {
    path: FieldPath,
    inner: BoxPrompter<T>,
}

#[async_trait]
impl<T> Prompter<Value> for Encoded<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    async fn prompt(&mut self) -> Result<PromptResult<Value>, WizardError> {
        let result = self.inner.prompt().await?;
        let path = &self.path;
        Ok(result.try_map(|value| {
            serde_json::to_value(value).map_err(|source| StateError::Encode {
                path: path.clone(),
                source,
            })
        })?)
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        self.inner.set_steps(current, total)
    }

    fn restore(&mut self, attempt: LastAttempt<Value>) {
        if let Some(typed) = attempt.decode::<T>() {
            self.inner.restore(typed);
        }
    }
}

#[derive(Clone)]
pub(crate) struct FieldBinding {
    pub(crate) path: FieldPath,
    pub(crate) binding: Arc<dyn ErasedBinding>,
    /// Set for fields bound with `Form::bind_form`.
    nested: Option<Arc<Form>>,
}

impl FieldBinding {
    /// Whether `state` already answers this field.
    ///
    /// A nested object counts once every applicable nested field is present.
    pub(crate) fn is_filled(&self, state: &WizardState) -> bool {
        let Some(value) = state.get_value(&self.path) else {
            return false;
        };
        let Some(form) = &self.nested else {
            return true;
        };
        match WizardState::from_value(value.clone()) {
            Ok(inner) => form.is_filled_by(&inner),
            Err(_) => true,
        }
    }
}

/// The field → prompter table a wizard walks, in declaration order.
///
/// A form is read-only once built and can be shared by many runs.
#[derive(Clone, Default)]
pub struct Form {
    fields: Vec<FieldBinding>,
    required: Vec<FieldPath>,
}

impl Form {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a field. Binding a path again replaces the earlier binding in place.
    pub fn bind<T>(mut self, path: impl Into<FieldPath>, binding: Binding<T>) -> Self
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.insert(FieldBinding {
            path: path.into(),
            binding: Arc::new(binding),
            nested: None,
        });
        self
    }

    /// Bind a nested object to a form of its own, prompted as one step.
    ///
    /// Nested fields already present in the outer state are kept and not
    /// asked for. The nested run uses the options of the outer run.
    pub fn bind_form(mut self, path: impl Into<FieldPath>, form: Form) -> Self {
        let nested = Arc::new(form);
        let prototype = Arc::clone(&nested);
        let binding = Binding::<Value>::try_from_fn(move |ctx| {
            let partial = match ctx.state().get_value(ctx.path()) {
                Some(value) => WizardState::from_value(value.clone())?,
                None => WizardState::new(),
            };
            let prompter = WizardPrompter::from_shared(Arc::clone(&prototype))
                .with_initial_state(partial)
                .with_options(ctx.options().clone());
            Ok(Some(prompter.boxed()))
        });
        self.insert(FieldBinding {
            path: path.into(),
            binding: Arc::new(binding),
            nested: Some(nested),
        });
        self
    }

    fn insert(&mut self, field: FieldBinding) {
        match self.fields.iter_mut().find(|f| f.path == field.path) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// Declare a field the finished state must contain.
    pub fn require(mut self, path: impl Into<FieldPath>) -> Self {
        self.required.push(path.into());
        self
    }

    /// Bound field paths in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldPath> {
        self.fields.iter().map(|f| &f.path)
    }

    pub fn required(&self) -> &[FieldPath] {
        &self.required
    }

    /// Whether a binding fills this path, directly or through a parent object.
    pub fn is_bound(&self, path: &FieldPath) -> bool {
        self.fields.iter().any(|f| path.starts_with(&f.path))
    }

    /// Get the number of bound fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the form binds nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn bindings(&self) -> &[FieldBinding] {
        &self.fields
    }

    /// Whether `state` answers every field that applies to it.
    pub(crate) fn is_filled_by(&self, state: &WizardState) -> bool {
        self.fields
            .iter()
            .all(|field| field.is_filled(state) || !field.binding.applies(state))
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("fields", &self.fields.iter().map(|b| &b.path).collect::<Vec<_>>())
            .field("required", &self.required)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;

    #[test]
    fn rebinding_replaces_in_place() {
        let form = Form::new()
            .bind("a", Binding::prompter(ScriptedPrompter::<String>::new([])))
            .bind("b", Binding::prompter(ScriptedPrompter::<String>::new([])))
            .bind("a", Binding::prompter(ScriptedPrompter::<u32>::new([])));

        let paths: Vec<String> = form.fields().map(ToString::to_string).collect();
        assert_eq!(paths, vec!["a", "b"]);
    }

    #[test]
    fn nested_paths_count_as_bound() {
        let form = Form::new().bind_form("debug", Form::new());
        assert!(form.is_bound(&FieldPath::new("debug.port")));
        assert!(!form.is_bound(&FieldPath::new("region")));
    }

    #[test]
    fn context_reads_state() {
        let mut state = WizardState::new();
        state.set("region", "eu-central-1").unwrap();
        let path = FieldPath::new("logGroup");
        let attempt = LastAttempt::failed(serde_json::json!("/aws/x"), "gone");
        let options = WizardOptions::default();
        let ctx = StepContext::new(&path, &state, Some(&attempt), &options);

        assert_eq!(ctx.get::<String>("region").as_deref(), Some("eu-central-1"));
        assert_eq!(ctx.get::<String>("missing"), None);
        let last: LastAttempt<String> = ctx.last_attempt().unwrap();
        assert_eq!(last.value, "/aws/x");
        assert_eq!(last.error.as_deref(), Some("gone"));
    }

    #[test]
    fn when_condition() {
        let binding = Binding::prompter(ScriptedPrompter::<String>::new([]))
            .when(|state| state.get_str("kind") == Some("code"));
        let mut state = WizardState::new();
        assert!(!binding.applies(&state));
        state.set("kind", "code").unwrap();
        assert!(binding.applies(&state));
    }
}
