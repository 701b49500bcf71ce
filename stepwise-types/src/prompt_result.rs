use serde_json::Value;

/// Outcome of a single prompt.
///
/// Exactly one variant holds. Cancellation is data, not an error: a dismissed
/// prompt resolves with `Cancel` instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult<T> {
    /// The user answered.
    Value(T),

    /// The user asked to return to the previous step.
    Back,

    /// The user dismissed the prompt.
    Cancel,
}

impl<T> PromptResult<T> {
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_back(&self) -> bool {
        matches!(self, Self::Back)
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel)
    }

    /// The answer, if there is one.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Back | Self::Cancel => None,
        }
    }

    /// Transform the answer, keeping control signals as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PromptResult<U> {
        match self {
            Self::Value(value) => PromptResult::Value(f(value)),
            Self::Back => PromptResult::Back,
            Self::Cancel => PromptResult::Cancel,
        }
    }

    /// Transform the answer with a fallible function.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<PromptResult<U>, E> {
        Ok(match self {
            Self::Value(value) => PromptResult::Value(f(value)?),
            Self::Back => PromptResult::Back,
            Self::Cancel => PromptResult::Cancel,
        })
    }
}

/// The previous answer given at a step, and why it was not kept.
///
/// Handed to prompter factories and to `Prompter::restore` when a step is
/// shown again: after a step-level validation failure (`error` is set), or
/// after the user navigated back onto the step (`error` is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct LastAttempt<T = Value> {
    pub value: T,
    pub error: Option<String>,
}

impl<T> LastAttempt<T> {
    pub fn new(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn failed(value: T, error: impl Into<String>) -> Self {
        Self {
            value,
            error: Some(error.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LastAttempt<U> {
        LastAttempt {
            value: f(self.value),
            error: self.error,
        }
    }
}

impl LastAttempt<Value> {
    /// Decode the stored value into a concrete type.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Option<LastAttempt<T>> {
        serde_json::from_value(self.value.clone())
            .ok()
            .map(|value| LastAttempt {
                value,
                error: self.error.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keeps_control_signals() {
        assert_eq!(PromptResult::Value(2).map(|v| v * 2), PromptResult::Value(4));
        assert_eq!(PromptResult::<i32>::Back.map(|v| v * 2), PromptResult::Back);
        assert_eq!(PromptResult::<i32>::Cancel.map(|v| v * 2), PromptResult::Cancel);
    }

    #[test]
    fn try_map_propagates_errors() {
        let result: Result<PromptResult<i32>, String> =
            PromptResult::Value("x").try_map(|_| Err("nope".to_string()));
        assert_eq!(result, Err("nope".to_string()));
    }

    #[test]
    fn decode_last_attempt() {
        let attempt = LastAttempt::failed(serde_json::json!("bad"), "too short");
        let decoded: LastAttempt<String> = attempt.decode().unwrap();
        assert_eq!(decoded.value, "bad");
        assert_eq!(decoded.error.as_deref(), Some("too short"));
        assert!(attempt.decode::<u32>().is_none());
    }
}
