//! The command contract.
//!
//! A command is a step-by-step interactive workflow (place a point, drag a
//! gizmo, tweak a dialog) that must also be atomic for undo. While it runs it
//! registers its outstanding interactions with its [`CancellableRegistor`], so
//! finishing or cancelling the command tears all of them down together.

use async_trait::async_trait;
use solidkit_core::{Cancellable, CancellableRegistor, CommandState, Result};

/// What `enqueue` does to the command that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelOrFinish {
    Cancel,
    /// Complete the running command with whatever it has so far.
    #[default]
    Finish,
}

/// Turn a title such as `"Offset Face"` into an identifier such as `"offset-face"`.
pub fn dasherize(title: &str) -> String {
    let mut out = String::with_capacity(title.len() + 4);
    let mut previous_lower = false;
    for c in title.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !out.ends_with('-') && !out.is_empty() {
                out.push('-');
            }
            previous_lower = false;
        } else if c.is_uppercase() {
            if previous_lower && !out.ends_with('-') {
                out.push('-');
            }
            out.extend(c.to_lowercase());
            previous_lower = false;
        } else {
            out.push(c);
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out.trim_end_matches('-').to_string()
}

#[async_trait(?Send)]
pub trait Command {
    fn title(&self) -> &str;

    fn registor(&self) -> &CancellableRegistor;

    /// Perform the command's work. Runs at most once, driven by the executor.
    async fn execute(&self) -> Result<()>;

    fn identifier(&self) -> String {
        dasherize(self.title())
    }

    fn state(&self) -> CommandState {
        self.registor().state()
    }

    /// Abort, cancelling every registered resource.
    fn cancel(&self) {
        self.registor().cancel();
    }

    /// Complete early, finishing every registered resource.
    fn finish(&self) {
        self.registor().finish();
    }

    /// Run `f` when the command ends.
    fn ensure(&self, f: Box<dyn FnOnce()>) -> Result<()> {
        self.registor().ensure(f)
    }

    /// Whether "repeat last command" should replay this command.
    fn remember(&self) -> bool {
        true
    }

    fn should_add_to_history(&self, _selection_changed: bool) -> bool {
        true
    }
}

/// Resource registration for concrete commands.
pub trait CommandExt: Command {
    /// Track `resource` so cancelling or finishing the command reaches it.
    fn register<C>(&self, resource: C) -> Result<C>
    where
        C: Cancellable + Clone + 'static,
    {
        self.registor().register(resource)
    }
}

impl<T: Command + ?Sized> CommandExt for T {}
