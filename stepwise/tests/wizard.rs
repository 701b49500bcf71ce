use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use stepwise::testing::{ScriptedHost, ScriptedPrompter};
use stepwise::{
    Binding, ControlEvent, FieldPath, Form, InputBox, InvalidationPolicy, LastAttempt, PickItem,
    PromptResult, PrompterExt, QuickPick, Validator, Wizard, WizardError, WizardObserver,
    WizardOptions, WizardState, WizardStatus,
};

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl WizardObserver for Recorder {
    fn step(&self, path: &FieldPath, current: usize, total: usize) {
        self.events.lock().push(format!("step {path} {current}/{total}"));
    }

    fn skipped(&self, path: &FieldPath) {
        self.events.lock().push(format!("skip {path}"));
    }

    fn rejected(&self, path: &FieldPath, message: &str) {
        self.events.lock().push(format!("reject {path}: {message}"));
    }

    fn back(&self, from: &FieldPath, to: Option<&FieldPath>) {
        let to = to.map(ToString::to_string).unwrap_or_else(|| "-".to_string());
        self.events.lock().push(format!("back {from} -> {to}"));
    }

    fn cancelled(&self, at: &FieldPath) {
        self.events.lock().push(format!("cancel {at}"));
    }

    fn completed(&self, answered: usize) {
        self.events.lock().push(format!("done {answered}"));
    }
}

fn observed(recorder: &Recorder) -> WizardOptions {
    WizardOptions::new().with_observer(recorder.clone())
}

fn text(values: &[&str]) -> ScriptedPrompter<String> {
    ScriptedPrompter::values(values.iter().map(|v| v.to_string()))
}

fn script(
    results: impl IntoIterator<Item = PromptResult<&'static str>>,
) -> ScriptedPrompter<String> {
    ScriptedPrompter::new(results.into_iter().map(|r| r.map(str::to_string)))
}

fn value(v: &'static str) -> PromptResult<&'static str> {
    PromptResult::Value(v)
}

#[derive(Debug, Deserialize, PartialEq)]
struct Pair {
    a: String,
    b: String,
}

#[tokio::test]
async fn two_fixed_prompters_fill_the_state() {
    let a = text(&["x"]);
    let b = text(&["y"]);
    let (a_log, b_log) = (a.log(), b.log());
    let form = Form::new()
        .bind("a", Binding::prompter(a))
        .bind("b", Binding::prompter(b));

    let pair = Wizard::<Pair>::new(form).run().await.unwrap();

    assert_eq!(
        pair,
        Some(Pair {
            a: "x".into(),
            b: "y".into()
        })
    );
    assert_eq!(a_log.prompts() + b_log.prompts(), 2);
}

#[tokio::test]
async fn n_fields_prompt_once_each_in_order() {
    let recorder = Recorder::default();
    let names = ["region", "group", "pattern", "start", "limit"];
    let mut form = Form::new();
    for name in names {
        form = form.bind(name, Binding::prompter(text(&[name])));
    }

    let state = Wizard::<Value>::new(form)
        .with_options(observed(&recorder))
        .run()
        .await
        .unwrap()
        .unwrap();

    let steps: Vec<String> = recorder
        .events()
        .into_iter()
        .filter(|e| e.starts_with("step"))
        .collect();
    assert_eq!(
        steps,
        vec![
            "step region 1/5",
            "step group 2/5",
            "step pattern 3/5",
            "step start 4/5",
            "step limit 5/5",
        ]
    );
    for name in names {
        assert_eq!(state[name], json!(name));
    }
}

#[tokio::test]
async fn hiding_the_first_prompt_cancels() {
    let host = ScriptedHost::new();
    let env = host.env();
    let form = Form::new()
        .bind("a", Binding::prompter(InputBox::new(&env).with_title("A")))
        .bind("b", Binding::prompter(InputBox::new(&env).with_title("B")));
    let mut wizard = Wizard::<Pair>::new(form);

    assert_eq!(wizard.run().await.unwrap(), None);

    let controls = host.controls();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].shown, 1);
    assert_eq!(controls[0].dispose_calls, 1);
    assert_eq!(wizard.status(), WizardStatus::Done { completed: false });
}

#[tokio::test]
async fn back_re_prompts_the_previous_field() {
    let a = text(&["x", "x2"]);
    let a_log = a.log();
    let b = script([PromptResult::Back, value("y")]);
    let form = Form::new()
        .bind("a", Binding::prompter(a))
        .bind("b", Binding::prompter(b));

    let pair = Wizard::<Pair>::new(form).run().await.unwrap().unwrap();

    assert_eq!(pair.a, "x2");
    assert_eq!(pair.b, "y");
    assert_eq!(a_log.prompts(), 2);
    assert_eq!(a_log.restored(), vec![LastAttempt::new("x".to_string())]);
}

#[tokio::test]
async fn back_from_the_first_step_exits() {
    let recorder = Recorder::default();
    let form = Form::new().bind("a", Binding::prompter(script([PromptResult::Back])));

    let result = Wizard::<Value>::new(form)
        .with_options(observed(&recorder))
        .run()
        .await
        .unwrap();

    assert_eq!(result, None);
    assert!(recorder.events().contains(&"back a -> -".to_string()));
}

#[tokio::test]
async fn going_back_and_repeating_an_answer_restores_the_state() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let c = script([PromptResult::Back, value("z")]);
    let form = Form::new()
        .bind("a", Binding::prompter(text(&["x"])))
        .bind("b", Binding::prompter(text(&["y", "y"])))
        .bind("c", {
            let seen = Arc::clone(&seen);
            Binding::from_fn(move |ctx| {
                seen.lock().push(ctx.state().to_value());
                Some(c.clone().boxed())
            })
        });

    let state = Wizard::<Value>::new(form).run().await.unwrap().unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], json!({"a": "x", "b": "y"}));
    assert_eq!(seen[0], seen[1]);
    assert_eq!(state, json!({"a": "x", "b": "y", "c": "z"}));
}

#[tokio::test]
async fn cancelling_disposes_every_step_once() {
    let host = ScriptedHost::new();
    host.script([ControlEvent::ValueChanged("x".into()), ControlEvent::Accept])
        .script([ControlEvent::SelectionChanged(vec![1]), ControlEvent::Accept]);
    let env = host.env();
    let form = Form::new()
        .bind("a", Binding::prompter(InputBox::new(&env)))
        .bind(
            "b",
            Binding::prompter(QuickPick::new(
                &env,
                vec![PickItem::label("one"), PickItem::label("two")],
            )),
        )
        .bind("c", Binding::prompter(InputBox::new(&env)));

    let result = Wizard::<Value>::new(form).run().await.unwrap();

    assert_eq!(result, None);
    assert_eq!(host.controls().len(), 3);
    assert!(host.all_disposed_once());
}

#[tokio::test]
async fn scripted_steps_are_disposed_on_every_path() {
    let a = text(&["x"]);
    let b = script([PromptResult::Back, PromptResult::Cancel]);
    let (a_log, b_log) = (a.log(), b.log());
    let form = Form::new()
        .bind("a", Binding::prompter(a))
        .bind("b", Binding::prompter(b));

    let result = Wizard::<Value>::new(form).run().await.unwrap();

    // The revisited a has run out of answers and cancels.
    assert_eq!(result, None);
    assert_eq!(a_log.prompts(), 2);
    assert_eq!(b_log.prompts(), 1);
    assert!(a_log.prompted_disposed_once());
    assert!(b_log.prompted_disposed_once());
}

#[tokio::test]
async fn failing_input_validation_disposes_every_step() {
    let host = ScriptedHost::new();
    host.script([ControlEvent::ValueChanged("orders".into()), ControlEvent::Accept])
        .script([ControlEvent::ValueChanged("ERROR".into()), ControlEvent::Accept]);
    let env = host.env();
    let pattern = InputBox::new(&env).with_validator(Validator::from_async(|_: String| async {
        Err(anyhow::anyhow!("pattern service unreachable"))
    }));
    let form = Form::new()
        .bind("name", Binding::prompter(InputBox::new(&env)))
        .bind("pattern", Binding::prompter(pattern));
    let mut wizard = Wizard::<Value>::new(form);

    let err = wizard.run().await.unwrap_err();

    assert!(matches!(err, WizardError::Collaborator(_)));
    assert!(err.to_string().contains("pattern service unreachable"));
    assert_eq!(wizard.status(), WizardStatus::Done { completed: false });
    assert_eq!(host.controls().len(), 2);
    assert!(host.all_disposed_once());
}

#[tokio::test]
async fn declined_factory_skips_the_field() {
    let recorder = Recorder::default();
    let calls = Arc::new(Mutex::new(0));
    let form = Form::new()
        .bind("kind", Binding::prompter(text(&["code", "code"])))
        .bind("template", {
            let calls = Arc::clone(&calls);
            Binding::<String>::from_fn(move |ctx| {
                *calls.lock() += 1;
                match ctx.get::<String>("kind").as_deref() {
                    Some("template") => Some(text(&["template.yaml"]).boxed()),
                    _ => None,
                }
            })
        })
        .bind("handler", Binding::prompter(script([PromptResult::Back, value("app.handler")])));

    let state = Wizard::<Value>::new(form)
        .with_options(observed(&recorder))
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"kind": "code", "handler": "app.handler"}));
    assert_eq!(*calls.lock(), 2);
    let events = recorder.events();
    assert!(events.contains(&"back handler -> kind".to_string()));
    assert_eq!(events.iter().filter(|e| *e == "skip template").count(), 2);
}

#[tokio::test]
async fn conditional_binding_follows_earlier_answers() {
    let form = Form::new()
        .bind("kind", Binding::prompter(text(&["api"])))
        .bind(
            "path",
            Binding::prompter(text(&["/hello"])).when(|state| state.get_str("kind") == Some("api")),
        )
        .bind(
            "handler",
            Binding::prompter(text(&["app.handler"]))
                .when(|state| state.get_str("kind") == Some("code")),
        );

    let state = Wizard::<Value>::new(form).run().await.unwrap().unwrap();

    assert_eq!(state, json!({"kind": "api", "path": "/hello"}));
}

#[tokio::test]
async fn dependent_field_sees_the_new_answer() {
    let regions = Arc::new(Mutex::new(Vec::new()));
    let groups = script([PromptResult::Back, value("/aws/lambda/eu")]);
    let form = Form::new()
        .bind("region", Binding::prompter(text(&["us-east-1", "eu-west-1"])))
        .bind("group", {
            let regions = Arc::clone(&regions);
            Binding::from_fn(move |ctx| {
                regions.lock().push(ctx.get::<String>("region")?);
                Some(groups.clone().boxed())
            })
        });

    let state = Wizard::<Value>::new(form).run().await.unwrap().unwrap();

    assert_eq!(*regions.lock(), vec!["us-east-1", "eu-west-1"]);
    assert_eq!(state, json!({"region": "eu-west-1", "group": "/aws/lambda/eu"}));
}

#[tokio::test]
async fn rejected_answer_retries_with_the_error() {
    let recorder = Recorder::default();
    let port = ScriptedPrompter::values([0u32, 9229]);
    let port_log = port.log();
    let form = Form::new().bind(
        "port",
        Binding::prompter(port).validate(|port: &u32, _| {
            let port = *port;
            async move {
                Ok(if port == 0 {
                    Err("Port must be positive".to_string())
                } else {
                    Ok(())
                })
            }
        }),
    );

    let state = Wizard::<Value>::new(form)
        .with_options(observed(&recorder))
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"port": 9229}));
    assert_eq!(port_log.prompts(), 2);
    assert_eq!(
        port_log.restored(),
        vec![LastAttempt::failed(0, "Port must be positive")]
    );
    assert!(recorder.events().contains(&"reject port: Port must be positive".to_string()));
}

#[tokio::test]
async fn factories_see_the_retry_context() {
    let attempts = Arc::new(Mutex::new(Vec::new()));
    let answers = text(&["bad", "good"]);
    let form = Form::new().bind("name", {
        let attempts = Arc::clone(&attempts);
        Binding::from_fn(move |ctx| {
            attempts.lock().push(ctx.last_attempt::<String>());
            Some(answers.clone().boxed())
        })
        .validate(|name: &String, _| {
            let ok = name != "bad";
            async move { Ok(if ok { Ok(()) } else { Err("taken".to_string()) }) }
        })
    });

    Wizard::<Value>::new(form).run().await.unwrap();

    assert_eq!(
        *attempts.lock(),
        vec![None, Some(LastAttempt::failed("bad".to_string(), "taken"))]
    );
}

#[tokio::test]
async fn validator_failure_ends_the_run() {
    let form = Form::new().bind(
        "name",
        Binding::prompter(text(&["x"]))
            .validate(|_: &String, _| async { Err(anyhow::anyhow!("service unavailable")) }),
    );

    let err = Wizard::<Value>::new(form).run().await.unwrap_err();
    assert!(!err.is_configuration());
    assert!(err.to_string().contains("service unavailable"));
}

#[tokio::test]
async fn initial_state_fields_are_assumed() {
    let region = text(&["never"]);
    let region_log = region.log();
    let form = Form::new()
        .bind("region", Binding::prompter(region))
        .bind("group", Binding::prompter(script([value("/aws/a"), PromptResult::Back])))
        .bind("pattern", Binding::prompter(script([PromptResult::Back])));

    let mut initial = WizardState::new();
    initial.set("region", "eu-west-1").unwrap();
    let result = Wizard::<Value>::new(form)
        .with_initial_state(initial)
        .run()
        .await
        .unwrap();

    // pattern -> back to group, group -> back out of the wizard
    assert_eq!(result, None);
    assert_eq!(region_log.prompts(), 0);
}

#[tokio::test]
async fn required_fields_satisfied_by_initial_state() {
    let mut initial = WizardState::new();
    initial.set("region", "eu-west-1").unwrap();
    let form = Form::new()
        .bind("group", Binding::prompter(text(&["/aws/a"])))
        .require("region")
        .require("group");

    let state = Wizard::<Value>::new(form)
        .with_initial_state(initial)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"region": "eu-west-1", "group": "/aws/a"}));
}

#[derive(Debug, Deserialize, PartialEq)]
struct Launch {
    name: String,
    debug: DebugSettings,
}

#[derive(Debug, Deserialize, PartialEq)]
struct DebugSettings {
    port: u32,
    host: String,
}

#[tokio::test]
async fn nested_form_is_one_step() {
    let name = text(&["a", "b"]);
    let name_log = name.log();
    let debug = Form::new()
        .bind(
            "port",
            Binding::prompter(ScriptedPrompter::new([
                PromptResult::Back,
                PromptResult::Value(9229u32),
            ])),
        )
        .bind("host", Binding::prompter(text(&["localhost"])));
    let form = Form::new()
        .bind("name", Binding::prompter(name))
        .bind_form("debug", debug)
        .require("debug.port");

    let launch = Wizard::<Launch>::new(form).run().await.unwrap().unwrap();

    assert_eq!(
        launch,
        Launch {
            name: "b".into(),
            debug: DebugSettings {
                port: 9229,
                host: "localhost".into()
            }
        }
    );
    assert_eq!(name_log.prompts(), 2);
}

#[tokio::test]
async fn nested_form_keeps_partial_initial_state() {
    let port = ScriptedPrompter::<u32>::values([9229]);
    let host = script([PromptResult::Back, value("localhost")]);
    let (port_log, host_log) = (port.log(), host.log());
    let debug = Form::new()
        .bind("port", Binding::prompter(port))
        .bind("host", Binding::prompter(host));
    let form = Form::new()
        .bind("name", Binding::prompter(text(&["a", "b"])))
        .bind_form("debug", debug)
        .require("debug.port");

    let mut initial = WizardState::new();
    initial.set("debug.port", 1234).unwrap();
    let launch = Wizard::<Launch>::new(form)
        .with_initial_state(initial)
        .run()
        .await
        .unwrap()
        .unwrap();

    // Back from host leaves the nested form; the port survives the revisit of name.
    assert_eq!(
        launch,
        Launch {
            name: "b".into(),
            debug: DebugSettings {
                port: 1234,
                host: "localhost".into()
            }
        }
    );
    assert_eq!(port_log.prompts(), 0);
    assert_eq!(host_log.prompts(), 2);
}

#[tokio::test]
async fn filled_nested_object_is_assumed() {
    let debug = Form::new()
        .bind("port", Binding::prompter(ScriptedPrompter::<u32>::new([])))
        .bind("host", Binding::prompter(text(&[])));
    let form = Form::new()
        .bind("name", Binding::prompter(text(&["a"])))
        .bind_form("debug", debug);

    let mut initial = WizardState::new();
    initial.set("debug", json!({"port": 1234, "host": "localhost"})).unwrap();
    let state = Wizard::<Value>::new(form)
        .with_initial_state(initial)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"name": "a", "debug": {"port": 1234, "host": "localhost"}}));
}

#[tokio::test]
async fn nested_runs_report_to_the_outer_observer() {
    let recorder = Recorder::default();
    let debug =
        Form::new().bind("port", Binding::prompter(ScriptedPrompter::<u32>::values([9229])));
    let form = Form::new()
        .bind("name", Binding::prompter(text(&["a"])))
        .bind_form("debug", debug);

    let state = Wizard::<Value>::new(form)
        .with_options(observed(&recorder))
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"name": "a", "debug": {"port": 9229}}));
    assert_eq!(
        recorder.events(),
        vec!["step name 1/2", "step debug 2/2", "step port 1/1", "done 1", "done 2"]
    );
}

fn revisit_form(policy_recorder: &ScriptedPrompter<String>) -> Form {
    Form::new()
        .bind("a", Binding::prompter(text(&["x"])))
        .bind("b", Binding::prompter(text(&["y", "y2"])))
        .bind("c", Binding::prompter(policy_recorder.clone()))
        .bind("d", Binding::prompter(script([PromptResult::Back, value("w")])))
}

#[tokio::test]
async fn declaration_order_forgets_later_answers() {
    let c = script([value("z"), PromptResult::Back, value("z2")]);
    let c_log = c.log();

    let state = Wizard::<Value>::new(revisit_form(&c)).run().await.unwrap().unwrap();

    assert_eq!(state, json!({"a": "x", "b": "y2", "c": "z2", "d": "w"}));
    assert_eq!(c_log.restored(), vec![LastAttempt::new("z".to_string())]);
}

#[tokio::test]
async fn declared_dependencies_keep_independent_answers() {
    let c = script([value("z"), PromptResult::Back, value("z2")]);
    let c_log = c.log();
    let options = WizardOptions::new().with_invalidation(InvalidationPolicy::DeclaredDependencies);

    let state = Wizard::<Value>::new(revisit_form(&c))
        .with_options(options)
        .run()
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, json!({"a": "x", "b": "y2", "c": "z2", "d": "w"}));
    assert_eq!(
        c_log.restored(),
        vec![LastAttempt::new("z".to_string()), LastAttempt::new("z".to_string())]
    );
}

#[derive(Debug, Deserialize, PartialEq)]
struct Optional {
    name: Option<String>,
    note: String,
}

#[tokio::test]
async fn null_answers_count_as_answered() {
    let name = ScriptedPrompter::<Option<String>>::values([None]);
    let note = text(&["n"]);
    let (name_log, note_log) = (name.log(), note.log());
    let form = Form::new()
        .bind("name", Binding::prompter(name))
        .bind("note", Binding::prompter(note));

    let result = Wizard::<Optional>::new(form).run().await.unwrap();

    assert_eq!(
        result,
        Some(Optional {
            name: None,
            note: "n".to_string(),
        })
    );
    assert_eq!(name_log.prompts(), 1);
    assert_eq!(note_log.prompts(), 1);
}
