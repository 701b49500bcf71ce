//! User-facing strings, injected so flows can be localized.

/// Strings the widget prompters show on their own.
pub trait Messages: Send + Sync {
    /// Tooltip of the built-in back button.
    fn back(&self) -> String;

    /// Placeholder shown while a selection list is still loading.
    fn loading(&self) -> String;

    /// Label of the entry shown when a selection list loaded no items.
    fn no_items(&self) -> String;

    /// Title of a prompt shown as step `current` of an estimated `total`.
    fn step_title(&self, title: &str, current: usize, total: usize) -> String;
}

/// The default English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Messages for English {
    fn back(&self) -> String {
        "Back".to_string()
    }

    fn loading(&self) -> String {
        "Loading...".to_string()
    }

    fn no_items(&self) -> String {
        "[No items found]".to_string()
    }

    fn step_title(&self, title: &str, current: usize, total: usize) -> String {
        if total > 1 {
            format!("{title} ({current}/{total})")
        } else {
            title.to_string()
        }
    }
}
