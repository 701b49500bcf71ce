//! Multi-step prompting: wizards of back-navigable, cancelable prompters.
//!
//! A [`Form`] binds field paths of a target type to [`Prompter`]s or prompter
//! factories. A [`Wizard`] walks the form, prompting one field at a time,
//! and hands back the filled target, or `None` when the user leaves.
//!
//! Prompters never talk to a UI directly. The widget prompters
//! ([`InputBox`], [`QuickPick`], [`MultiPick`]) drive controls created by a
//! [`UiHost`], so the same flow runs in a terminal, in an editor, or against
//! the scripted host in [`testing`].
//!
//! ```ignore
//! let env = PromptEnv::new(host);
//! let form = Form::new()
//!     .bind("region", Binding::prompter(QuickPick::new(&env, regions).with_title("Region")))
//!     .bind(
//!         "pattern",
//!         Binding::prompter(InputBox::new(&env).with_title("Search pattern").with_back_button()),
//!     );
//!
//! let request: Option<TailRequest> = Wizard::new(form).run().await?;
//! ```

// Re-export all types from stepwise-types
pub use stepwise_types::*;

mod prompter;
pub use prompter::{BoxPrompter, MapPrompter, MapWithPrompter, Prompter, PrompterExt};

mod button;
pub use button::{Button, ButtonResolver};

mod host;
pub use host::{
    ButtonView, Chrome, Control, ControlEvent, ItemView, SelectionListConfig, TextInputConfig,
    UiHost,
};

mod messages;
pub use messages::{English, Messages};

mod env;
pub use env::PromptEnv;

mod widget;
pub use widget::{Flow, WidgetPrompter, WidgetStrategy};

mod input_box;
pub use input_box::{InputBox, InputBoxPrompter, Validator};

mod quick_pick;
pub use quick_pick::{
    ItemSource, MultiPick, MultiPickPrompter, PickData, PickItem, QuickPick, QuickPickPrompter,
};

mod submenu;
pub use submenu::{Submenu, SubmenuChoice};

mod observer;
pub use observer::{NoopObserver, TracingObserver, WizardObserver};

mod form;
pub use form::{Binding, Form, StepContext};

mod wizard;
pub use wizard::{InvalidationPolicy, Wizard, WizardOptions, WizardStatus};

mod nested;
pub use nested::WizardPrompter;

// Scripted collaborators for testing flows without user interaction
pub mod testing;
