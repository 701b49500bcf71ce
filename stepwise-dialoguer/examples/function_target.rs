//! Pick a local function to debug: kind, handler, runtime.
//!
//! Run with: cargo run -p stepwise-dialoguer --example function_target

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use stepwise::{
    Binding, Form, InputBox, ItemSource, PickItem, PromptEnv, QuickPick, Validator, Wizard,
};
use stepwise_dialoguer::DialoguerHost;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct FunctionTarget {
    kind: String,
    handler: String,
    runtime: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = PromptEnv::new(Arc::new(DialoguerHost::new()));

    let kinds = vec![
        PickItem::label("code").with_description("a handler in a source file"),
        PickItem::label("template").with_description("a resource in a SAM template"),
    ];
    let handler = InputBox::new(&env)
        .with_title("Handler")
        .with_placeholder("app.lambda_handler")
        .with_back_button()
        .with_validator(Validator::new(|value| {
            if value.contains('.') {
                Ok(())
            } else {
                Err("Expected <module>.<function>".to_string())
            }
        }));
    let runtimes = ItemSource::from_future(|| async {
        // Simulate a slow lookup.
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(["python3.12", "nodejs20.x", "java21"]
            .into_iter()
            .map(PickItem::label)
            .collect())
    });

    let form = Form::new()
        .bind("kind", Binding::prompter(QuickPick::new(&env, kinds).with_title("Target kind")))
        .bind("handler", Binding::prompter(handler))
        .bind(
            "runtime",
            Binding::prompter(
                QuickPick::new(&env, runtimes)
                    .with_title("Runtime")
                    .with_back_button(),
            ),
        );

    match Wizard::<FunctionTarget>::new(form).run().await? {
        Some(target) => println!("{target:#?}"),
        None => println!("Cancelled"),
    }
    Ok(())
}
