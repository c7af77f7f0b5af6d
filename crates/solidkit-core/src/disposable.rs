//! Run-once cleanup tokens.
//!
//! A [`Disposable`] wraps a cleanup action (detach a listener, re-enable
//! camera controls, release focus). Clones share the action, and whichever
//! clone is disposed first runs it; later calls do nothing. Dropping a
//! disposable does not run it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::OnceCallback;

/// A shareable cleanup action that runs at most once.
#[derive(Clone, Default)]
pub struct Disposable {
    action: Rc<RefCell<Option<OnceCallback>>>,
}

impl Disposable {
    /// Wrap a cleanup action
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Rc::new(RefCell::new(Some(Box::new(action)))),
        }
    }

    /// A disposable with nothing to clean up
    pub fn empty() -> Self {
        Self::default()
    }

    /// Run the cleanup action if it has not run yet.
    pub fn dispose(&self) {
        // Take the action out before calling it; it may dispose us again.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Whether the action has already run (or there never was one)
    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A group of disposables released together, in insertion order.
#[derive(Debug, Default)]
pub struct CompositeDisposable {
    items: Vec<Disposable>,
    disposed: bool,
}

impl CompositeDisposable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a disposable. Adding to an already disposed group disposes it immediately.
    pub fn add(&mut self, disposable: Disposable) {
        if self.disposed {
            disposable.dispose();
        } else {
            self.items.push(disposable);
        }
    }

    /// Convenience for `add(Disposable::new(action))`
    pub fn add_action(&mut self, action: impl FnOnce() + 'static) {
        self.add(Disposable::new(action));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take every pending disposable out of the group and mark it disposed.
    ///
    /// Callers that hold the group inside a `RefCell` use this to release the
    /// borrow before running the actions.
    pub fn take(&mut self) -> Vec<Disposable> {
        self.disposed = true;
        std::mem::take(&mut self.items)
    }

    /// Dispose every member
    pub fn dispose(&mut self) {
        for item in self.take() {
            item.dispose();
        }
    }

    /// Turn the whole group into a single disposable
    pub fn into_disposable(mut self) -> Disposable {
        let items = self.take();
        Disposable::new(move || {
            for item in items {
                item.dispose();
            }
        })
    }
}
