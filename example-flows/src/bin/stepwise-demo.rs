use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use stepwise::{PromptEnv, Prompter, PromptResult};
use stepwise_dialoguer::DialoguerHost;
use tracing_subscriber::EnvFilter;

use example_flows::{
    LogGroupChoice, SimplePatternChecker, StaticLogGroups, debug_config_wizard, log_group_prompter,
    tail_request_wizard,
};

#[derive(Parser)]
#[command(name = "stepwise-demo", about = "Run the toolkit flows in a terminal")]
struct Cli {
    /// Disable colors
    #[arg(long)]
    plain: bool,

    /// Delay of simulated cloud lookups, in milliseconds
    #[arg(long, default_value_t = 400)]
    latency_ms: u64,

    #[command(subcommand)]
    flow: Flow,
}

#[derive(Subcommand)]
enum Flow {
    /// Create a debug launch configuration
    Debug {
        /// Names of configurations that already exist
        #[arg(long = "existing")]
        existing: Vec<String>,
    },
    /// Pick a region and a log group
    LogGroup,
    /// Build a live-tail request
    Tail {
        /// Region of a preset log group
        #[arg(long, requires = "log_group")]
        region: Option<String>,

        /// Preset log group, skips the log group question
        #[arg(long, requires = "region")]
        log_group: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let host = if cli.plain {
        DialoguerHost::plain()
    } else {
        DialoguerHost::new()
    };
    let env = PromptEnv::new(Arc::new(host));
    let groups = Arc::new(
        StaticLogGroups::sample().with_latency(Duration::from_millis(cli.latency_ms)),
    );
    let checker = Arc::new(SimplePatternChecker);

    match cli.flow {
        Flow::Debug { existing } => report(debug_config_wizard(&env, existing).run().await?),
        Flow::LogGroup => {
            let mut picker = log_group_prompter(&env, groups);
            let result = picker.prompt().await;
            picker.dispose();
            match result? {
                PromptResult::Value(choice) => report(Some(choice)),
                PromptResult::Back | PromptResult::Cancel => report(None::<LogGroupChoice>),
            }
        }
        Flow::Tail { region, log_group } => {
            let preset = region
                .zip(log_group)
                .map(|(key, item)| LogGroupChoice { key, item });
            let mut wizard = tail_request_wizard(&env, groups, checker, preset)?;
            report(wizard.run().await?)
        }
    }
}

fn report<T: Serialize>(answer: Option<T>) -> Result<()> {
    match answer {
        Some(answer) => println!("{}", serde_json::to_string_pretty(&answer)?),
        None => eprintln!("Cancelled"),
    }
    Ok(())
}
