//! Focus arbitration between sibling gizmos.
//!
//! At most one claim holds focus at a time. The holder registers a release
//! [`Disposable`] when it takes focus; whoever takes focus next disposes it
//! first, which interrupts the previous holder synchronously.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use solidkit_core::Disposable;

#[derive(Default)]
struct ArbiterState {
    holder: RefCell<Option<(usize, Disposable)>>,
    next_key: Cell<usize>,
}

/// Shared focus slot for one composite gizmo.
#[derive(Clone, Default)]
pub struct FocusArbiter {
    state: Rc<ArbiterState>,
}

impl std::fmt::Debug for FocusArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusArbiter")
            .field("holder", &self.holder())
            .finish()
    }
}

impl FocusArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new claim that competes for this arbiter's focus.
    pub fn claim(&self) -> FocusClaim {
        let key = self.state.next_key.get();
        self.state.next_key.set(key + 1);
        FocusClaim {
            arbiter: self.clone(),
            key,
        }
    }

    pub fn holder(&self) -> Option<usize> {
        self.state.holder.borrow().as_ref().map(|(key, _)| *key)
    }

    /// Whether someone other than `key` holds focus.
    pub fn is_blocked(&self, key: usize) -> bool {
        self.holder().is_some_and(|holder| holder != key)
    }

    /// Take focus for `key`, disposing the previous holder's release first.
    pub fn acquire(&self, key: usize, release: Disposable) {
        let previous = {
            let mut holder = self.state.holder.borrow_mut();
            match holder.as_ref() {
                Some((current, _)) if *current == key => None,
                _ => holder.take(),
            }
        };
        if let Some((previous, release)) = previous {
            tracing::debug!("Focus moves from gizmo {} to gizmo {}", previous, key);
            release.dispose();
        }
        *self.state.holder.borrow_mut() = Some((key, release));
    }

    /// Give up focus if `key` holds it. The release is dropped, not run.
    pub fn release(&self, key: usize) {
        let mut holder = self.state.holder.borrow_mut();
        if holder.as_ref().is_some_and(|(current, _)| *current == key) {
            holder.take();
        }
    }

    /// Interrupt whoever holds focus.
    pub fn interrupt_holder(&self) {
        let previous = self.state.holder.borrow_mut().take();
        if let Some((_, release)) = previous {
            release.dispose();
        }
    }
}

/// One competitor's handle on a [`FocusArbiter`].
#[derive(Debug, Clone)]
pub struct FocusClaim {
    arbiter: FocusArbiter,
    key: usize,
}

impl FocusClaim {
    pub fn key(&self) -> usize {
        self.key
    }

    pub fn is_blocked(&self) -> bool {
        self.arbiter.is_blocked(self.key)
    }

    pub fn is_held(&self) -> bool {
        self.arbiter.holder() == Some(self.key)
    }

    pub fn acquire(&self, release: Disposable) {
        self.arbiter.acquire(self.key, release);
    }

    pub fn release(&self) {
        self.arbiter.release(self.key);
    }
}
