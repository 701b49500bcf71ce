//! Flows of a serverless-function toolkit, built as stepwise forms.
//!
//! Each flow takes a [`PromptEnv`](stepwise::PromptEnv), so it runs in a
//! terminal through `stepwise-dialoguer` or headless against
//! [`ScriptedHost`](stepwise::testing::ScriptedHost). Cloud lookups go
//! through small traits with in-memory implementations.

pub mod debug_config;
pub mod log_group;
pub mod search_pattern;
pub mod tail_request;

pub use debug_config::{DebugConfig, debug_config_form, debug_config_wizard};
pub use log_group::{LogGroupChoice, LogGroupSource, Region, StaticLogGroups, log_group_prompter};
pub use search_pattern::{PatternChecker, SimplePatternChecker, search_pattern_prompter};
pub use tail_request::{StartFrom, TailRequest, tail_request_form, tail_request_wizard};
