//! # stepwise-dialoguer
//!
//! Terminal host for stepwise wizards.
//!
//! This crate implements the stepwise `UiHost` interface with the `dialoguer`
//! library, so any flow built from stepwise prompters can be driven from a
//! command line. Text inputs become line prompts, selection lists become
//! (fuzzy) selects, and prompt buttons become extra entries or `:commands`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use stepwise::{Binding, Form, InputBox, PromptEnv, Wizard};
//! use stepwise_dialoguer::DialoguerHost;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let env = PromptEnv::new(Arc::new(DialoguerHost::new()));
//!     let form = Form::new().bind(
//!         "name",
//!         Binding::prompter(InputBox::new(&env).with_title("Function name")),
//!     );
//!
//!     let answers: Option<serde_json::Value> = Wizard::new(form).run().await?;
//!     println!("{answers:?}");
//!     Ok(())
//! }
//! ```

mod backend;

pub use backend::{DialoguerError, DialoguerHost};
