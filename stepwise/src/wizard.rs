//! The wizard engine.
//!
//! A run walks the form in declaration order and prompts the first field that
//! is neither filled nor skipped. The sequence of steps is never fixed up
//! front: after every move the next field is recomputed from the form and the
//! current state, so factories always see the latest answers.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::form::FieldBinding;
use crate::{
    BoxPrompter, FieldPath, Form, LastAttempt, PromptResult, StateError, StepContext,
    TracingObserver, WizardError, WizardObserver, WizardState,
};

/// Which answers are cleared when the user goes back to an earlier field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidationPolicy {
    /// Clear every field declared after the revisited one.
    #[default]
    DeclarationOrder,

    /// Clear only fields that declare a dependency on the revisited field,
    /// directly or through other cleared fields. Bindings without declared
    /// dependencies are kept.
    DeclaredDependencies,
}

/// Collaborators and policies of a run.
#[derive(Clone)]
pub struct WizardOptions {
    observer: Arc<dyn WizardObserver>,
    invalidation: InvalidationPolicy,
}

impl WizardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress to `observer` instead of `tracing`.
    pub fn with_observer(mut self, observer: impl WizardObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_invalidation(mut self, policy: InvalidationPolicy) -> Self {
        self.invalidation = policy;
        self
    }

    pub fn observer(&self) -> &dyn WizardObserver {
        self.observer.as_ref()
    }

    pub fn invalidation(&self) -> InvalidationPolicy {
        self.invalidation
    }
}

impl Default for WizardOptions {
    fn default() -> Self {
        Self {
            observer: Arc::new(TracingObserver),
            invalidation: InvalidationPolicy::default(),
        }
    }
}

impl fmt::Debug for WizardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardOptions")
            .field("invalidation", &self.invalidation)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of a `Wizard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStatus {
    NotStarted,
    Running,
    /// `completed` is false when the user exited or the run failed.
    Done { completed: bool },
}

/// Drives a `Form` to a filled `T`.
///
/// ```ignore
/// let mut wizard = Wizard::<Target>::new(form).with_initial_state(partial);
/// match wizard.run().await? {
///     Some(target) => launch(target),
///     None => {} // the user left
/// }
/// ```
pub struct Wizard<T> {
    form: Arc<Form>,
    initial: WizardState,
    options: WizardOptions,
    status: WizardStatus,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Wizard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("form", &self.form)
            .field("initial", &self.initial)
            .field("status", &self.status)
            .finish()
    }
}

impl<T: DeserializeOwned> Wizard<T> {
    pub fn new(form: impl Into<Arc<Form>>) -> Self {
        Self {
            form: form.into(),
            initial: WizardState::new(),
            options: WizardOptions::default(),
            status: WizardStatus::NotStarted,
            _marker: PhantomData,
        }
    }

    /// Start from a partial answer. Fields present here are never prompted.
    pub fn with_initial_state(mut self, state: WizardState) -> Self {
        self.initial = state;
        self
    }

    pub fn with_options(mut self, options: WizardOptions) -> Self {
        self.options = options;
        self
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    /// Run the wizard. `Ok(None)` means the user cancelled or went back out
    /// of the first step. A wizard runs once.
    pub async fn run(&mut self) -> Result<Option<T>, WizardError> {
        if self.status != WizardStatus::NotStarted {
            return Err(WizardError::AlreadyRun);
        }
        self.status = WizardStatus::Running;

        let outcome = drive(
            &self.form,
            self.initial.clone(),
            WizardState::new(),
            &self.options,
        )
        .await;

        let result = match outcome {
            Ok(Outcome::Completed(state)) => {
                state.into_response::<T>().map(Some).map_err(Into::into)
            }
            Ok(Outcome::Back | Outcome::Cancelled) => Ok(None),
            Err(err) => Err(err),
        };
        self.status = WizardStatus::Done {
            completed: matches!(result, Ok(Some(_))),
        };
        result
    }
}

/// How a call to `drive` ended.
#[derive(Debug)]
pub(crate) enum Outcome {
    Completed(WizardState),
    /// Back from the first step.
    Back,
    Cancelled,
}

/// Disposes the step's prompter when the step is left, on every exit path.
struct ActiveStep {
    prompter: BoxPrompter<Value>,
}

impl Drop for ActiveStep {
    fn drop(&mut self) {
        self.prompter.dispose();
    }
}

/// The next step to show.
struct Pending {
    index: usize,
    prompter: BoxPrompter<Value>,
    attempt: Option<LastAttempt>,
}

/// Walk `form` over `state` until it is filled, the user leaves, or a
/// collaborator fails.
///
/// `recent` holds answers given at earlier visits of a field; they are
/// re-offered to the field's prompter.
pub(crate) async fn drive(
    form: &Form,
    mut state: WizardState,
    mut recent: WizardState,
    options: &WizardOptions,
) -> Result<Outcome, WizardError> {
    let observer = options.observer();
    let fields = form.bindings();

    for path in form.required() {
        if !state.contains(path) && !form.is_bound(path) {
            return Err(WizardError::Unbound(path.clone()));
        }
    }

    let assumed: BTreeSet<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_filled(&state))
        .map(|(index, _)| index)
        .collect();
    let initial = state.clone();

    let mut history: Vec<usize> = Vec::new();
    let mut skipped: BTreeSet<usize> = BTreeSet::new();
    let mut retry: Option<(usize, LastAttempt)> = None;

    loop {
        let pending = next_step(
            fields,
            &state,
            &recent,
            &history,
            &mut skipped,
            retry.take(),
            options,
        )?;
        let Some(Pending {
            index,
            prompter,
            attempt,
        }) = pending
        else {
            break;
        };
        let path = &fields[index].path;

        let current = history.len() + 1;
        let total = current
            + (index + 1..fields.len())
                .filter(|&later| {
                    !skipped.contains(&later)
                        && !history.contains(&later)
                        && !fields[later].is_filled(&state)
                })
                .count();

        let mut step = ActiveStep { prompter };
        if let Some(attempt) = attempt {
            step.prompter.restore(attempt);
        }
        step.prompter.set_steps(current, total);
        observer.step(path, current, total);

        let result = step.prompter.prompt().await;
        drop(step);

        match result? {
            PromptResult::Value(value) => {
                if let Some(check) = fields[index].binding.check(path, &value, &state)?
                    && let Err(message) = check.await.map_err(WizardError::Collaborator)?
                {
                    observer.rejected(path, &message);
                    retry = Some((index, LastAttempt::failed(value, message)));
                    continue;
                }
                state.set_value(path, value.clone())?;
                recent.set_value(path, value)?;
                history.push(index);
                observer.answered(path);
            }
            PromptResult::Back => {
                let Some(position) = history.iter().rposition(|&answered| answered < index) else {
                    observer.back(path, None);
                    return Ok(Outcome::Back);
                };
                let previous = history.remove(position);
                observer.back(path, Some(&fields[previous].path));
                let cleared = rewind(
                    fields,
                    &mut state,
                    &mut recent,
                    &initial,
                    &assumed,
                    previous,
                    options.invalidation(),
                )?;
                history.retain(|answered| !cleared.contains(answered));
                skipped.retain(|&index| index < previous);
            }
            PromptResult::Cancel => {
                observer.cancelled(path);
                return Ok(Outcome::Cancelled);
            }
        }
    }

    for path in form.required() {
        if !state.contains(path) {
            return Err(WizardError::Unfilled(path.clone()));
        }
    }
    observer.completed(history.len());
    Ok(Outcome::Completed(state))
}

/// Find the first field that still needs an answer and build its prompter.
fn next_step(
    fields: &[FieldBinding],
    state: &WizardState,
    recent: &WizardState,
    answered: &[usize],
    skipped: &mut BTreeSet<usize>,
    mut retry: Option<(usize, LastAttempt)>,
    options: &WizardOptions,
) -> Result<Option<Pending>, WizardError> {
    let observer = options.observer();
    for (index, field) in fields.iter().enumerate() {
        if skipped.contains(&index) || answered.contains(&index) || field.is_filled(state) {
            continue;
        }
        if !field.binding.applies(state) {
            skipped.insert(index);
            observer.skipped(&field.path);
            continue;
        }

        let attempt = match retry.take_if(|(retry_index, _)| *retry_index == index) {
            Some((_, attempt)) => Some(attempt),
            None => recent.get_value(&field.path).cloned().map(LastAttempt::new),
        };
        let ctx = StepContext::new(&field.path, state, attempt.as_ref(), options);
        let prompter = field
            .binding
            .instantiate(&ctx)
            .map_err(|source| WizardError::Factory {
                path: field.path.clone(),
                source,
            })?;

        match prompter {
            Some(prompter) => {
                return Ok(Some(Pending {
                    index,
                    prompter,
                    attempt,
                }));
            }
            None => {
                skipped.insert(index);
                observer.skipped(&field.path);
            }
        }
    }
    Ok(None)
}

/// Clear the revisited field and the later answers it invalidates.
///
/// The revisited field keeps its recent answer so it can be re-offered.
/// Invalidated fields lose both their stored and their recent answer.
/// A cleared field falls back to its initial partial value, if any.
/// Returns the indices of every cleared field.
fn rewind(
    fields: &[FieldBinding],
    state: &mut WizardState,
    recent: &mut WizardState,
    initial: &WizardState,
    assumed: &BTreeSet<usize>,
    previous: usize,
    policy: InvalidationPolicy,
) -> Result<BTreeSet<usize>, StateError> {
    let mut cleared = BTreeSet::from([previous]);
    reset(state, initial, &fields[previous].path)?;

    for (index, field) in fields.iter().enumerate().skip(previous + 1) {
        if assumed.contains(&index) {
            continue;
        }
        let stale = match policy {
            InvalidationPolicy::DeclarationOrder => true,
            InvalidationPolicy::DeclaredDependencies => field
                .binding
                .depends_on()
                .iter()
                .any(|dependency| {
                    cleared
                        .iter()
                        .any(|&index| fields[index].path.overlaps(dependency))
                }),
        };
        if stale {
            reset(state, initial, &field.path)?;
            recent.remove(&field.path);
            cleared.insert(index);
        }
    }
    Ok(cleared)
}

fn reset(
    state: &mut WizardState,
    initial: &WizardState,
    path: &FieldPath,
) -> Result<(), StateError> {
    state.remove(path);
    match initial.get_value(path) {
        Some(value) => state.set_value(path, value.clone()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;
    use crate::Binding;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: String,
        b: String,
    }

    fn fixed(value: &str) -> ScriptedPrompter<String> {
        ScriptedPrompter::new([PromptResult::Value(value.to_string())])
    }

    #[tokio::test]
    async fn runs_once() {
        let form = Form::new()
            .bind("a", Binding::prompter(fixed("x")))
            .bind("b", Binding::prompter(fixed("y")));
        let mut wizard = Wizard::<Pair>::new(form);
        assert_eq!(wizard.status(), WizardStatus::NotStarted);

        let pair = wizard.run().await.unwrap();
        assert_eq!(
            pair,
            Some(Pair {
                a: "x".into(),
                b: "y".into()
            })
        );
        assert_eq!(wizard.status(), WizardStatus::Done { completed: true });
        assert!(matches!(wizard.run().await, Err(WizardError::AlreadyRun)));
    }

    #[tokio::test]
    async fn unbound_required_field_fails_before_prompting() {
        let a = fixed("x");
        let log = a.log();
        let form = Form::new().bind("a", Binding::prompter(a)).require("b");
        let mut wizard = Wizard::<serde_json::Value>::new(form);

        let err = wizard.run().await.unwrap_err();
        assert!(matches!(err, WizardError::Unbound(ref path) if path.to_string() == "b"));
        assert!(err.is_configuration());
        assert_eq!(log.prompts(), 0);
        assert_eq!(wizard.status(), WizardStatus::Done { completed: false });
    }

    #[tokio::test]
    async fn skipped_required_field_is_unfilled() {
        let form = Form::new()
            .bind("a", Binding::<String>::from_fn(|_| None))
            .require("a");
        let err = Wizard::<serde_json::Value>::new(form).run().await.unwrap_err();
        assert!(matches!(err, WizardError::Unfilled(_)));
    }

    #[tokio::test]
    async fn factory_errors_are_fatal() {
        let form = Form::new().bind(
            "a",
            Binding::<String>::try_from_fn(|_| Err(anyhow::anyhow!("no credentials"))),
        );
        let err = Wizard::<serde_json::Value>::new(form).run().await.unwrap_err();
        assert!(matches!(err, WizardError::Factory { .. }));
    }

    #[test]
    fn declared_dependencies_clear_transitively() {
        let noop = || Binding::<String>::from_fn(|_| None);
        let form = Form::new()
            .bind("a", noop())
            .bind("b", noop().depends_on(["a"]))
            .bind("c", noop().depends_on(["b"]))
            .bind("d", noop());
        let mut state = WizardState::new();
        for key in ["a", "b", "c", "d"] {
            state.set(key, "v").unwrap();
        }

        let mut by_deps = state.clone();
        let mut recent = state.clone();
        rewind(
            form.bindings(),
            &mut by_deps,
            &mut recent,
            &WizardState::new(),
            &BTreeSet::new(),
            0,
            InvalidationPolicy::DeclaredDependencies,
        )
        .unwrap();
        assert_eq!(by_deps.keys().collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(recent.keys().collect::<Vec<_>>(), vec!["a", "d"]);

        let mut by_order = state.clone();
        let mut recent = state;
        rewind(
            form.bindings(),
            &mut by_order,
            &mut recent,
            &WizardState::new(),
            &BTreeSet::from([3]),
            1,
            InvalidationPolicy::DeclarationOrder,
        )
        .unwrap();
        assert_eq!(by_order.keys().collect::<Vec<_>>(), vec!["a", "d"]);
        assert_eq!(recent.keys().collect::<Vec<_>>(), vec!["a", "b", "d"]);
    }
}
