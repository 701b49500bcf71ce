//! The `Prompter` contract: ask one question, get one answer or a control signal.

use async_trait::async_trait;

use crate::{LastAttempt, PromptResult, WizardError};

/// A single interactive question.
///
/// `prompt` resolves once per call with a value, `Back`, or `Cancel`. Errors
/// are reserved for failures of the prompter's collaborators; a user who
/// dismisses the prompt produces `Cancel`, never an `Err`.
///
/// `dispose` releases the underlying UI resource. It must be idempotent.
#[async_trait]
pub trait Prompter<T: Send>: Send {
    /// Show the prompt and wait for the user.
    async fn prompt(&mut self) -> Result<PromptResult<T>, WizardError>;

    /// Release the prompter's resources. Safe to call more than once.
    fn dispose(&mut self);

    /// Tell the prompter where in the wizard it is shown.
    fn set_steps(&mut self, _current: usize, _total: usize) {}

    /// Pre-fill the prompter from a previous answer at the same step.
    fn restore(&mut self, _attempt: LastAttempt<T>) {}
}

/// A type-erased prompter.
pub type BoxPrompter<T> = Box<dyn Prompter<T>>;

#[async_trait]
impl<T: Send, P: Prompter<T> + ?Sized> Prompter<T> for Box<P> {
    async fn prompt(&mut self) -> Result<PromptResult<T>, WizardError> {
        (**self).prompt().await
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        (**self).set_steps(current, total)
    }

    fn restore(&mut self, attempt: LastAttempt<T>) {
        (**self).restore(attempt)
    }
}

/// Combinators available on every prompter.
pub trait PrompterExt<T: Send>: Prompter<T> + Sized + 'static {
    /// Erase the concrete prompter type.
    fn boxed(self) -> BoxPrompter<T> {
        Box::new(self)
    }

    /// Transform the answer of this prompter.
    ///
    /// The result cannot be restored from an earlier answer; use `map_with`
    /// for steps that can be revisited.
    fn map<U, F>(self, f: F) -> MapPrompter<Self, T, F>
    where
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        MapPrompter {
            inner: self,
            f,
            _marker: std::marker::PhantomData,
        }
    }

    /// Transform the answer of this prompter. `inverse` turns an earlier
    /// answer back into one the inner prompter can be restored from.
    fn map_with<U, F, G>(self, f: F, inverse: G) -> MapWithPrompter<Self, T, F, G>
    where
        U: Send,
        F: Fn(T) -> U + Send + Sync,
        G: Fn(U) -> T + Send + Sync,
    {
        MapWithPrompter {
            inner: self.map(f),
            inverse,
        }
    }
}

impl<T: Send, P: Prompter<T> + 'static> PrompterExt<T> for P {}

/// Prompter adapter that transforms answers. Created by `PrompterExt::map`.
pub struct MapPrompter<P, T, F> {
    inner: P,
    f: F,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<P: Clone, T, F: Clone> Clone for MapPrompter<P, T, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            f: self.f.clone(),
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<P, T, U, F> Prompter<U> for MapPrompter<P, T, F>
where
    P: Prompter<T>,
    T: Send,
    U: Send,
    F: Fn(T) -> U + Send + Sync,
{
    async fn prompt(&mut self) -> Result<PromptResult<U>, WizardError> {
        let result = self.inner.prompt().await?;
        Ok(result.map(&self.f))
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        self.inner.set_steps(current, total)
    }
}

/// A `MapPrompter` that can also be restored. Created by `PrompterExt::map_with`.
pub struct MapWithPrompter<P, T, F, G> {
    inner: MapPrompter<P, T, F>,
    inverse: G,
}

impl<P: Clone, T, F: Clone, G: Clone> Clone for MapWithPrompter<P, T, F, G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            inverse: self.inverse.clone(),
        }
    }
}

#[async_trait]
impl<P, T, U, F, G> Prompter<U> for MapWithPrompter<P, T, F, G>
where
    P: Prompter<T>,
    T: Send,
    U: Send,
    F: Fn(T) -> U + Send + Sync,
    G: Fn(U) -> T + Send + Sync,
{
    async fn prompt(&mut self) -> Result<PromptResult<U>, WizardError> {
        self.inner.prompt().await
    }

    fn dispose(&mut self) {
        self.inner.dispose()
    }

    fn set_steps(&mut self, current: usize, total: usize) {
        self.inner.set_steps(current, total)
    }

    fn restore(&mut self, attempt: LastAttempt<U>) {
        self.inner.inner.restore(attempt.map(&self.inverse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompter;

    #[tokio::test]
    async fn map_transforms_values_only() {
        let mut prompter = ScriptedPrompter::new([
            PromptResult::Value("3".to_string()),
            PromptResult::Back,
        ])
        .map(|s: String| s.len());

        assert_eq!(prompter.prompt().await.unwrap(), PromptResult::Value(1));
        assert_eq!(prompter.prompt().await.unwrap(), PromptResult::Back);
    }

    #[test]
    fn map_with_restores_through_the_inverse() {
        let scripted = ScriptedPrompter::<String>::new([]);
        let log = scripted.log();
        let mut prompter = scripted.map_with(
            |s: String| s.parse::<u32>().unwrap_or_default(),
            |n: u32| n.to_string(),
        );

        prompter.restore(LastAttempt::failed(42, "too large"));
        assert_eq!(log.restored(), vec![LastAttempt::failed("42".to_string(), "too large")]);
    }

    #[tokio::test]
    async fn boxed_prompter_forwards_dispose() {
        let scripted = ScriptedPrompter::new([PromptResult::Value(1)]);
        let log = scripted.log();
        let mut boxed = scripted.boxed();
        boxed.dispose();
        boxed.dispose();
        assert_eq!(log.disposals(), 1);
    }
}
