//! Command lifecycle bookkeeping.
//!
//! A [`CancellableRegistor`] owns the state of one command and every
//! cancellable resource the command registered while running. Cancelling or
//! finishing the command cascades to all of them, then runs the `ensure`
//! cleanups.

use std::cell::RefCell;
use std::fmt;

use crate::cancellable::Cancellable;
use crate::disposable::{CompositeDisposable, Disposable};
use crate::error::{Error, Result};

/// Lifecycle of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandState {
    /// Created, never started.
    None,
    /// Execution began.
    Running,
    /// Completed successfully. Terminal.
    Finished,
    /// Aborted or failed. Terminal.
    Cancelled,
}

impl CommandState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CommandState::Finished | CommandState::Cancelled)
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandState::None => write!(f, "None"),
            CommandState::Running => write!(f, "Running"),
            CommandState::Finished => write!(f, "Finished"),
            CommandState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

struct RegistorState {
    state: CommandState,
    resources: Vec<Box<dyn Cancellable>>,
    cleanup: CompositeDisposable,
}

/// Tracks a command's state and the resources it must tear down.
pub struct CancellableRegistor {
    inner: RefCell<RegistorState>,
}

impl Default for CancellableRegistor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellableRegistor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CancellableRegistor")
            .field("state", &inner.state)
            .field("resources", &inner.resources.len())
            .finish()
    }
}

impl CancellableRegistor {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(RegistorState {
                state: CommandState::None,
                resources: Vec::new(),
                cleanup: CompositeDisposable::new(),
            }),
        }
    }

    pub fn state(&self) -> CommandState {
        self.inner.borrow().state
    }

    /// Move `None -> Running`. Other states are left alone.
    pub fn begin(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.state == CommandState::None {
            inner.state = CommandState::Running;
        }
    }

    /// Track a resource so the command's cancel/finish reaches it.
    ///
    /// A terminal command cancels the resource on the spot and reports
    /// `Error::AlreadyFinished`.
    pub fn register<C>(&self, resource: C) -> Result<C>
    where
        C: Cancellable + Clone + 'static,
    {
        let terminal = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                true
            } else {
                inner.resources.push(Box::new(resource.clone()));
                false
            }
        };
        if terminal {
            resource.cancel();
            return Err(Error::AlreadyFinished);
        }
        Ok(resource)
    }

    /// Run `f` when the command ends, however it ends.
    ///
    /// On a terminal command `f` runs immediately and `Error::AlreadyFinished`
    /// is reported.
    pub fn ensure(&self, f: impl FnOnce() + 'static) -> Result<()> {
        let disposable = Disposable::new(f);
        let terminal = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                true
            } else {
                inner.cleanup.add(disposable.clone());
                false
            }
        };
        if terminal {
            disposable.dispose();
            return Err(Error::AlreadyFinished);
        }
        Ok(())
    }

    /// Cancel every resource and move to `Cancelled`.
    pub fn cancel(&self) {
        if let Some((resources, cleanup)) = self.conclude(CommandState::Cancelled) {
            for resource in &resources {
                resource.cancel();
            }
            for item in cleanup {
                item.dispose();
            }
        }
    }

    /// Finish every resource and move to `Finished`.
    pub fn finish(&self) {
        if let Some((resources, cleanup)) = self.conclude(CommandState::Finished) {
            for resource in &resources {
                resource.finish();
            }
            for item in cleanup {
                item.dispose();
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn conclude(&self, to: CommandState) -> Option<(Vec<Box<dyn Cancellable>>, Vec<Disposable>)> {
        let mut inner = self.inner.borrow_mut();
        if inner.state.is_terminal() {
            return None;
        }
        inner.state = to;
        let resources = std::mem::take(&mut inner.resources);
        let cleanup = inner.cleanup.take();
        Some((resources, cleanup))
    }
}
