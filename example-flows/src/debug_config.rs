//! Building a launch configuration for debugging a serverless function locally.
//!
//! The questions depend on the target kind: a `code` target needs a handler,
//! a `template` target a template resource, and an `api` target a template
//! resource plus the route that triggers it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepwise::{
    Binding, FieldPath, Form, InputBox, PickItem, PromptEnv, Prompter, PrompterExt, QuickPick,
    Validator, Wizard, WizardState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A handler in a source file.
    Code,
    /// A function resource of a template.
    Template,
    /// An API route in front of a template resource.
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateTarget {
    pub path: String,
    pub logical_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTarget {
    pub path: String,
    pub method: HttpMethod,
}

/// A debug launch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    pub name: String,
    pub target: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiTarget>,
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<Value>,
}

/// Runtimes that can be started straight from source.
const SOURCE_RUNTIMES: &[&str] = &["python3.12", "python3.11", "nodejs20.x", "nodejs18.x"];

/// Runtimes that need a build first, available for template targets only.
const BUILT_RUNTIMES: &[&str] = &["java21", "dotnet8", "provided.al2023"];

/// Runtimes offered for a target kind.
pub fn runtimes(kind: TargetKind) -> Vec<&'static str> {
    match kind {
        TargetKind::Code => SOURCE_RUNTIMES.to_vec(),
        TargetKind::Template | TargetKind::Api => {
            SOURCE_RUNTIMES.iter().chain(BUILT_RUNTIMES).copied().collect()
        }
    }
}

fn target_is(state: &WizardState, kinds: &[TargetKind]) -> bool {
    state
        .get::<TargetKind>(&FieldPath::from("target"))
        .ok()
        .flatten()
        .is_some_and(|kind| kinds.contains(&kind))
}

fn not_empty(what: &'static str) -> Validator {
    Validator::new(move |value| {
        if value.trim().is_empty() {
            Err(format!("{what} is required"))
        } else {
            Ok(())
        }
    })
}

/// Parse an optional JSON event. Empty input means no event.
fn parse_event(text: &str) -> Result<Option<Value>, String> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| format!("Invalid JSON: {e}"))
}

/// An optional JSON payload. A revisited step shows the earlier payload as text.
fn event_prompter(env: &PromptEnv) -> impl Prompter<Option<Value>> + Clone + 'static {
    InputBox::new(env)
        .with_title("Event payload")
        .with_placeholder("JSON event, empty for none")
        .with_back_button()
        .with_validator(Validator::new(|value| parse_event(value).map(drop)))
        .map_with(
            |text: String| parse_event(&text).ok().flatten(),
            |event: Option<Value>| event.map(|value| value.to_string()).unwrap_or_default(),
        )
}

/// The form of a debug configuration. `existing` names are rejected so a new
/// configuration never shadows one already in the launch file.
pub fn debug_config_form(env: &PromptEnv, existing: Vec<String>) -> Form {
    let existing: Arc<[String]> = existing.into();

    let name = InputBox::new(env)
        .with_title("Configuration name")
        .with_validator(not_empty("A name"));

    let target = QuickPick::new(
        env,
        vec![
            PickItem::new("Code", TargetKind::Code).with_description("a handler in a source file"),
            PickItem::new("Template", TargetKind::Template)
                .with_description("a function resource of a template"),
            PickItem::new("API", TargetKind::Api).with_description("an API route of a template"),
        ],
    )
    .with_title("Target")
    .with_back_button();

    let handler = InputBox::new(env)
        .with_title("Handler")
        .with_placeholder("app.lambda_handler")
        .with_back_button()
        .with_validator(Validator::new(|value| {
            if value.contains('.') || value.contains("::") {
                Ok(())
            } else {
                Err("Expected <module>.<function>".to_string())
            }
        }));

    let template_path = InputBox::new(env)
        .with_title("Template path")
        .with_placeholder("template.yaml")
        .with_back_button()
        .with_validator(not_empty("A template path"));

    let logical_id = InputBox::new(env)
        .with_title("Resource logical id")
        .with_back_button()
        .with_validator(Validator::new(|value| {
            if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric()) {
                Ok(())
            } else {
                Err("Logical ids are alphanumeric".to_string())
            }
        }));

    let api_path = InputBox::new(env)
        .with_title("API path")
        .with_value("/")
        .with_back_button()
        .with_validator(Validator::new(|value| {
            if value.starts_with('/') {
                Ok(())
            } else {
                Err("Paths start with /".to_string())
            }
        }));

    let method = QuickPick::new(
        env,
        [
            ("GET", HttpMethod::Get),
            ("POST", HttpMethod::Post),
            ("PUT", HttpMethod::Put),
            ("PATCH", HttpMethod::Patch),
            ("DELETE", HttpMethod::Delete),
        ]
        .into_iter()
        .map(|(label, method)| PickItem::new(label, method))
        .collect::<Vec<_>>(),
    )
    .with_title("HTTP method")
    .with_back_button();

    let runtime_env = env.clone();
    let runtime = Binding::from_fn(move |ctx| {
        let kind = ctx.get::<TargetKind>("target")?;
        let items: Vec<_> = runtimes(kind).into_iter().map(PickItem::label).collect();
        Some(
            QuickPick::new(&runtime_env, items)
                .with_title("Runtime")
                .with_back_button()
                .boxed(),
        )
    })
    .depends_on(["target"]);

    Form::new()
        .bind(
            "name",
            Binding::prompter(name).validate(move |name: &String, _| {
                let taken = existing.contains(name);
                let name = name.clone();
                async move {
                    Ok(if taken {
                        Err(format!("A configuration named \"{name}\" already exists"))
                    } else {
                        Ok(())
                    })
                }
            }),
        )
        .bind("target", Binding::prompter(target))
        .bind(
            "handler",
            Binding::prompter(handler)
                .when(|state| target_is(state, &[TargetKind::Code]))
                .depends_on(["target"]),
        )
        .bind(
            "template.path",
            Binding::prompter(template_path)
                .when(|state| target_is(state, &[TargetKind::Template, TargetKind::Api]))
                .depends_on(["target"]),
        )
        .bind(
            "template.logicalId",
            Binding::prompter(logical_id)
                .when(|state| target_is(state, &[TargetKind::Template, TargetKind::Api]))
                .depends_on(["target"]),
        )
        .bind(
            "api.path",
            Binding::prompter(api_path)
                .when(|state| target_is(state, &[TargetKind::Api]))
                .depends_on(["target"]),
        )
        .bind(
            "api.method",
            Binding::prompter(method)
                .when(|state| target_is(state, &[TargetKind::Api]))
                .depends_on(["target"]),
        )
        .bind("runtime", runtime)
        .bind("event", Binding::prompter(event_prompter(env)))
        .require("name")
        .require("target")
        .require("runtime")
}

pub fn debug_config_wizard(env: &PromptEnv, existing: Vec<String>) -> Wizard<DebugConfig> {
    Wizard::new(debug_config_form(env, existing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise::testing::ScriptedHost;
    use stepwise::{ControlEvent, LastAttempt, PromptResult};

    #[test]
    fn code_targets_only_offer_source_runtimes() {
        assert!(!runtimes(TargetKind::Code).contains(&"java21"));
        assert!(runtimes(TargetKind::Template).contains(&"java21"));
        assert_eq!(runtimes(TargetKind::Api), runtimes(TargetKind::Template));
    }

    #[tokio::test]
    async fn revisited_event_shows_the_earlier_payload() {
        let host = ScriptedHost::new();
        host.script([ControlEvent::Accept]);
        let mut event = event_prompter(&host.env());

        event.restore(LastAttempt::new(Some(serde_json::json!({ "id": 7 }))));
        let answer = event.prompt().await.unwrap();
        event.dispose();

        assert_eq!(answer, PromptResult::Value(Some(serde_json::json!({ "id": 7 }))));
        assert_eq!(host.control(0).unwrap().value, "{\"id\":7}");
    }

    #[test]
    fn empty_event_is_none() {
        assert_eq!(parse_event("  "), Ok(None));
        assert_eq!(
            parse_event("{\"id\": 1}"),
            Ok(Some(serde_json::json!({ "id": 1 })))
        );
        assert!(parse_event("{").unwrap_err().starts_with("Invalid JSON"));
    }

    #[test]
    fn target_condition_reads_the_state() {
        let mut state = WizardState::new();
        assert!(!target_is(&state, &[TargetKind::Code]));

        state.set("target", TargetKind::Api).unwrap();
        assert!(target_is(&state, &[TargetKind::Template, TargetKind::Api]));
        assert!(!target_is(&state, &[TargetKind::Code]));
    }

    #[test]
    fn config_serializes_without_absent_parts() {
        let config = DebugConfig {
            name: "orders".to_string(),
            target: TargetKind::Code,
            handler: Some("app.handler".to_string()),
            template: None,
            api: None,
            runtime: "python3.12".to_string(),
            event: None,
        };

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            serde_json::json!({
                "name": "orders",
                "target": "code",
                "handler": "app.handler",
                "runtime": "python3.12",
            })
        );
    }
}
