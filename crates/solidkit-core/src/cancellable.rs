//! Cancellable operations
//!
//! A [`CancellableOperation`] is a single-resolution future that can also be
//! terminated from the outside. Gizmo drags, point pickers and dialogs all
//! produce one: the command awaiting it sees a value when the user completes
//! the interaction, `Error::Cancel` when the user aborts it, and whatever the
//! operation's finish hook produces when something asks it to wrap up early.
//!
//! The operation is an explicit state record behind an `Rc`:
//!
//! ```text
//! slot:  Pending | Ready(result) | Taken
//! state: Pending | Finished | Cancelled
//! hooks: dispose, finish
//! ```
//!
//! `cancel()` runs the dispose hook and rejects with [`Error::Cancel`].
//! `finish()` runs the dispose hook and then the finish hook, which usually
//! resolves the operation. Both are no-ops once the operation left `Pending`.
//!
//! Hooks, continuations and wakers are always invoked after the state borrow
//! is released, so they are free to call back into the operation.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::disposable::Disposable;
use crate::error::{Error, Result};
use crate::registor::CancellableRegistor;
use crate::types::OnceCallback;

/// Anything a command can tear down together with itself.
pub trait Cancellable {
    /// Abort; pending awaits observe `Error::Cancel`.
    fn cancel(&self);
    /// Complete early with whatever the object considers its current result.
    fn finish(&self);
}

/// Lifecycle tag of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    /// Neither settled nor asked to stop.
    Pending,
    /// Resolved, or `finish()` was requested.
    Finished,
    /// Rejected, or `cancel()` was requested.
    Cancelled,
}

/// The `{dispose, finish}` pair an executor hands back to its operation.
#[derive(Default)]
pub struct OperationHooks {
    dispose: Option<OnceCallback>,
    finish: Option<OnceCallback>,
}

impl OperationHooks {
    pub fn new(dispose: impl FnOnce() + 'static, finish: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
            finish: Some(Box::new(finish)),
        }
    }

    /// Hooks that do nothing; for operations that settle on their own.
    pub fn none() -> Self {
        Self::default()
    }
}

enum Slot<T> {
    Pending,
    Ready(Result<T>),
    Taken,
}

struct Inner<T> {
    slot: Slot<T>,
    state: OperationState,
    hooks: OperationHooks,
    waker: Option<Waker>,
    continuation: Option<Box<dyn FnOnce(Result<T>)>>,
    observers: Vec<OnceCallback>,
}

impl<T> Inner<T> {
    fn new() -> Self {
        Self {
            slot: Slot::Pending,
            state: OperationState::Pending,
            hooks: OperationHooks::none(),
            waker: None,
            continuation: None,
            observers: Vec::new(),
        }
    }
}

/// Promise-like handle with explicit `cancel()` and `finish()`.
///
/// Clones refer to the same operation. Awaiting consumes the result; a second
/// await of the same operation yields `Error::AlreadyFinished`.
pub struct CancellableOperation<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for CancellableOperation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for CancellableOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let slot = match inner.slot {
            Slot::Pending => "pending",
            Slot::Ready(_) => "ready",
            Slot::Taken => "taken",
        };
        f.debug_struct("CancellableOperation")
            .field("state", &inner.state)
            .field("slot", &slot)
            .finish()
    }
}

/// Settles the operation it was created for. Only the first call has an effect.
pub struct Resolver<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Resolver<T> {
    pub fn resolve(&self, value: T) {
        settle(&self.inner, Ok(value));
    }

    pub fn reject(&self, error: Error) {
        settle(&self.inner, Err(error));
    }

    /// Settle with an already computed result
    pub fn settle(&self, result: Result<T>) {
        settle(&self.inner, result);
    }

    /// Whether nobody has settled, cancelled or finished the operation yet
    pub fn is_open(&self) -> bool {
        let s = self.inner.borrow();
        matches!(s.slot, Slot::Pending) && s.state == OperationState::Pending
    }
}

fn settle<T>(inner: &Rc<RefCell<Inner<T>>>, result: Result<T>) {
    let (hooks, waker, continuation, observers, result) = {
        let mut s = inner.borrow_mut();
        if !matches!(s.slot, Slot::Pending) {
            return;
        }
        if s.state == OperationState::Pending {
            s.state = if result.is_ok() {
                OperationState::Finished
            } else {
                OperationState::Cancelled
            };
        }
        let continuation = s.continuation.take();
        let result = if continuation.is_some() {
            s.slot = Slot::Taken;
            Some(result)
        } else {
            s.slot = Slot::Ready(result);
            None
        };
        (
            std::mem::take(&mut s.hooks),
            s.waker.take(),
            continuation,
            std::mem::take(&mut s.observers),
            result,
        )
    };
    // Dropping the hooks breaks the resolver <-> operation cycle.
    drop(hooks);
    if let Some(waker) = waker {
        waker.wake();
    }
    if let (Some(continuation), Some(result)) = (continuation, result) {
        continuation(result);
    }
    for observer in observers {
        observer();
    }
}

impl<T: 'static> CancellableOperation<T> {
    /// Create an operation from an executor.
    ///
    /// The executor receives the [`Resolver`] and returns the hooks that
    /// `cancel()` and `finish()` will use. It may settle synchronously.
    pub fn new(executor: impl FnOnce(Resolver<T>) -> OperationHooks) -> Self {
        let (op, resolver) = Self::pending();
        let hooks = executor(resolver);
        op.install(hooks);
        op
    }

    fn pending() -> (Self, Resolver<T>) {
        let inner = Rc::new(RefCell::new(Inner::new()));
        (
            Self {
                inner: inner.clone(),
            },
            Resolver { inner },
        )
    }

    fn install(&self, hooks: OperationHooks) {
        let mut s = self.inner.borrow_mut();
        if matches!(s.slot, Slot::Pending) && s.state == OperationState::Pending {
            s.hooks = hooks;
        } else {
            drop(s);
            drop(hooks);
        }
    }

    /// An operation that is already resolved
    pub fn resolved(value: T) -> Self {
        Self::new(|resolver| {
            resolver.resolve(value);
            OperationHooks::none()
        })
    }

    /// An operation that is already rejected
    pub fn rejected(error: Error) -> Self {
        Self::new(|resolver| {
            resolver.reject(error);
            OperationHooks::none()
        })
    }

    pub fn state(&self) -> OperationState {
        self.inner.borrow().state
    }

    /// Whether a result has been produced (even if already consumed)
    pub fn is_settled(&self) -> bool {
        !matches!(self.inner.borrow().slot, Slot::Pending)
    }

    /// Abort the operation: run its dispose hook and reject with `Error::Cancel`.
    pub fn cancel(&self) {
        let dispose = {
            let mut s = self.inner.borrow_mut();
            if s.state != OperationState::Pending {
                return;
            }
            s.state = OperationState::Cancelled;
            s.hooks.dispose.take()
        };
        if let Some(dispose) = dispose {
            dispose();
        }
        settle(&self.inner, Err(Error::Cancel));
    }

    /// Complete early: run the dispose hook, then the finish hook.
    pub fn finish(&self) {
        let (dispose, finish) = {
            let mut s = self.inner.borrow_mut();
            if s.state != OperationState::Pending {
                return;
            }
            s.state = OperationState::Finished;
            (s.hooks.dispose.take(), s.hooks.finish.take())
        };
        if let Some(dispose) = dispose {
            dispose();
        }
        if let Some(finish) = finish {
            finish();
        }
    }

    /// Hand the result to `f` once it is available, consuming it.
    ///
    /// Only one continuation is kept; a later call replaces an earlier one.
    pub fn then(&self, f: impl FnOnce(Result<T>) + 'static) {
        let ready = {
            let mut s = self.inner.borrow_mut();
            match std::mem::replace(&mut s.slot, Slot::Taken) {
                Slot::Pending => {
                    s.slot = Slot::Pending;
                    s.continuation = Some(Box::new(f));
                    return;
                }
                Slot::Ready(result) => result,
                Slot::Taken => Err(Error::AlreadyFinished),
            }
        };
        f(ready);
    }

    /// Run `f` once the operation settles, without touching the result.
    pub fn finally(&self, f: impl FnOnce() + 'static) {
        {
            let mut s = self.inner.borrow_mut();
            if matches!(s.slot, Slot::Pending) {
                s.observers.push(Box::new(f));
                return;
            }
        }
        f();
    }

    /// Register with a command so the command's cancel/finish cascades here.
    pub fn resource(self, registor: &CancellableRegistor) -> Result<Self> {
        registor.register(self)
    }
}

impl<T: Default + 'static> CancellableOperation<T> {
    /// An operation settled from the outside through the returned resolver.
    ///
    /// `finish()` resolves it with `T::default()`.
    pub fn delay() -> (Self, Resolver<T>) {
        let (op, resolver) = Self::pending();
        let on_finish = resolver.clone();
        op.install(OperationHooks::new(
            || {},
            move || on_finish.resolve(T::default()),
        ));
        (op, resolver)
    }
}

impl CancellableOperation<()> {
    /// Settle with the first of `operations` to settle; cancel the rest.
    ///
    /// Cancelling the race cancels every member. Finishing it cancels every
    /// member and resolves.
    pub fn race(operations: Vec<CancellableOperation<()>>) -> Self {
        let operations = Rc::new(operations);
        Self::new(|resolver| {
            let members = operations.clone();
            let teardown = Disposable::new(move || {
                for op in members.iter() {
                    op.cancel();
                }
            });
            for op in operations.iter() {
                let teardown = teardown.clone();
                let resolver = resolver.clone();
                op.then(move |result| {
                    // Members cancelled by our own cancel()/finish() must not decide the race.
                    if resolver.is_open() {
                        resolver.settle(result);
                    }
                    teardown.dispose();
                });
            }
            OperationHooks::new(move || teardown.dispose(), move || resolver.resolve(()))
        })
    }
}

impl<T: 'static> Cancellable for CancellableOperation<T> {
    fn cancel(&self) {
        CancellableOperation::cancel(self);
    }

    fn finish(&self) {
        CancellableOperation::finish(self);
    }
}

impl<T> Future for CancellableOperation<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut s = self.inner.borrow_mut();
        match std::mem::replace(&mut s.slot, Slot::Taken) {
            Slot::Ready(result) => Poll::Ready(result),
            Slot::Taken => Poll::Ready(Err(Error::AlreadyFinished)),
            Slot::Pending => {
                s.slot = Slot::Pending;
                s.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
