//! A live-tail request: which log group, which events, from when.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stepwise::{
    Binding, Form, PickItem, PromptEnv, QuickPick, StateError, Wizard, WizardState,
};

use crate::log_group::{LogGroupChoice, LogGroupSource, log_group_prompter};
use crate::search_pattern::{PatternChecker, search_pattern_prompter};

/// Where the tail starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartFrom {
    Now,
    FiveMinutesAgo,
    OneHourAgo,
}

impl StartFrom {
    /// How far back from now the first event may be.
    pub fn lookback(self) -> Duration {
        match self {
            Self::Now => Duration::ZERO,
            Self::FiveMinutesAgo => Duration::from_secs(5 * 60),
            Self::OneHourAgo => Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailRequest {
    pub log_group: LogGroupChoice,
    pub pattern: String,
    pub start: StartFrom,
}

impl TailRequest {
    pub fn region(&self) -> &str {
        &self.log_group.key
    }

    pub fn log_group_name(&self) -> &str {
        &self.log_group.item
    }
}

pub fn tail_request_form(
    env: &PromptEnv,
    groups: Arc<dyn LogGroupSource>,
    checker: Arc<dyn PatternChecker>,
) -> Form {
    let start = QuickPick::new(
        env,
        vec![
            PickItem::new("Now", StartFrom::Now),
            PickItem::new("5 minutes ago", StartFrom::FiveMinutesAgo),
            PickItem::new("1 hour ago", StartFrom::OneHourAgo),
        ],
    )
    .with_title("Start from")
    .with_back_button();

    Form::new()
        .bind("logGroup", Binding::prompter(log_group_prompter(env, groups)))
        .bind("pattern", Binding::prompter(search_pattern_prompter(env, checker)))
        .bind("start", Binding::prompter(start))
}

/// A tail wizard, optionally started from a known log group.
///
/// A preset log group is never asked for, so back from the pattern leaves
/// the wizard.
pub fn tail_request_wizard(
    env: &PromptEnv,
    groups: Arc<dyn LogGroupSource>,
    checker: Arc<dyn PatternChecker>,
    preset: Option<LogGroupChoice>,
) -> Result<Wizard<TailRequest>, StateError> {
    let mut initial = WizardState::new();
    if let Some(choice) = preset {
        initial.set("logGroup", choice)?;
    }
    Ok(Wizard::new(tail_request_form(env, groups, checker)).with_initial_state(initial))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_grows_with_the_start() {
        assert_eq!(StartFrom::Now.lookback(), Duration::ZERO);
        assert!(StartFrom::FiveMinutesAgo.lookback() < StartFrom::OneHourAgo.lookback());
    }

    #[test]
    fn request_wire_format() {
        let request = TailRequest {
            log_group: LogGroupChoice {
                key: "eu-west-1".to_string(),
                item: "/aws/lambda/thumbnailer".to_string(),
            },
            pattern: "ERROR".to_string(),
            start: StartFrom::FiveMinutesAgo,
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "logGroup": { "key": "eu-west-1", "item": "/aws/lambda/thumbnailer" },
                "pattern": "ERROR",
                "start": "five_minutes_ago",
            })
        );
        assert_eq!(request.region(), "eu-west-1");
        assert_eq!(request.log_group_name(), "/aws/lambda/thumbnailer");
    }
}
