//! The command executor.
//!
//! Commands run one at a time: a new command never starts while another
//! command's `execute`, including its cancellation cleanup, is still running.
//! There is one active slot and one pending slot. Enqueuing while a command
//! is active replaces whatever was pending and finishes (or cancels) the
//! active command, so the loop picks the new one up as soon as the active one
//! is done.
//!
//! Each command runs inside an atomic boundary: the editor state is saved
//! before it starts and restored if it fails. Failures never escape the
//! loop; they are logged according to their [`Severity`].

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::Context;

use futures::future::{self, FutureExt, LocalBoxFuture};
use solidkit_core::event_bus::{
    CommandEvent, EditorEvent, EventBus, EventCategory, EventFilter, SelectionEvent,
};
use solidkit_core::{shared, CommandState, CompositeDisposable, Disposable, Severity, Shared};
use solidkit_gizmo::{EventTarget, InputRouter, Viewport};

use crate::command::{CancelOrFinish, Command};
use crate::document::{GeometryDatabase, Originator};
use crate::history::{History, DEFAULT_MAX_DEPTH};

pub const FINISH_COMMAND: &str = "command:finish";
pub const ABORT_COMMAND: &str = "command:abort";

#[derive(Default)]
struct Queue {
    active: Option<Rc<dyn Command>>,
    pending: Option<Rc<dyn Command>>,
}

struct Inner<O: Originator> {
    originator: Rc<O>,
    db: Rc<dyn GeometryDatabase>,
    history: Shared<History<O::Memento>>,
    bus: Arc<EventBus>,
    viewports: Vec<Rc<dyn Viewport>>,
    router: Option<InputRouter>,
    queue: RefCell<Queue>,
}

/// Serializes commands and gives each one an atomic rollback boundary.
///
/// Clones share the same queue.
pub struct CommandExecutor<O: Originator> {
    inner: Rc<Inner<O>>,
}

impl<O: Originator> Clone for CommandExecutor<O> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<O: Originator + 'static> fmt::Debug for CommandExecutor<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("active", &self.active_title())
            .field("pending", &self.pending_title())
            .finish()
    }
}

/// Builder for [`CommandExecutor`].
pub struct ExecutorBuilder<O: Originator> {
    originator: Rc<O>,
    db: Rc<dyn GeometryDatabase>,
    bus: Arc<EventBus>,
    viewports: Vec<Rc<dyn Viewport>>,
    router: Option<InputRouter>,
    max_depth: usize,
}

impl<O: Originator + 'static> ExecutorBuilder<O> {
    /// Viewports whose camera controls are re-enabled after every command.
    pub fn viewports(mut self, viewports: Vec<Rc<dyn Viewport>>) -> Self {
        self.viewports = viewports;
        self
    }

    /// Route `command:finish` and `command:abort` to the active command.
    pub fn router(mut self, router: InputRouter) -> Self {
        self.router = Some(router);
        self
    }

    pub fn max_history_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> CommandExecutor<O> {
        let history = History::with_max_depth(self.bus.clone(), self.max_depth);
        CommandExecutor {
            inner: Rc::new(Inner {
                originator: self.originator,
                db: self.db,
                history: shared(history),
                bus: self.bus,
                viewports: self.viewports,
                router: self.router,
                queue: RefCell::new(Queue::default()),
            }),
        }
    }
}

impl<O: Originator + 'static> CommandExecutor<O> {
    pub fn builder(
        originator: Rc<O>,
        db: Rc<dyn GeometryDatabase>,
        bus: Arc<EventBus>,
    ) -> ExecutorBuilder<O> {
        ExecutorBuilder {
            originator,
            db,
            bus,
            viewports: Vec::new(),
            router: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn new(originator: Rc<O>, db: Rc<dyn GeometryDatabase>, bus: Arc<EventBus>) -> Self {
        Self::builder(originator, db, bus).build()
    }

    pub fn history(&self) -> &Shared<History<O::Memento>> {
        &self.inner.history
    }

    pub fn originator(&self) -> &Rc<O> {
        &self.inner.originator
    }

    pub fn is_busy(&self) -> bool {
        self.inner.queue.borrow().active.is_some()
    }

    pub fn active_title(&self) -> Option<String> {
        let queue = self.inner.queue.borrow();
        queue.active.as_ref().map(|c| c.title().to_string())
    }

    pub fn pending_title(&self) -> Option<String> {
        let queue = self.inner.queue.borrow();
        queue.pending.as_ref().map(|c| c.title().to_string())
    }

    /// Queue `command`, finishing or cancelling the active one.
    ///
    /// When nothing was running the command starts before this returns. If it
    /// then waits on anything, the rest of the command loop is spawned onto
    /// the current `tokio::task::LocalSet`, so such commands must be enqueued
    /// inside one. The loop runs whether or not the returned future is
    /// awaited; the future only reports that the loop has drained. When
    /// another command is active the returned future is already complete and
    /// the running loop picks the command up on its next turn.
    pub fn enqueue(&self, command: Rc<dyn Command>, how: CancelOrFinish) -> LocalBoxFuture<'static, ()> {
        tracing::debug!("Enqueue {}", command.title());
        let active = {
            let mut queue = self.inner.queue.borrow_mut();
            if let Some(dropped) = queue.pending.replace(command) {
                tracing::debug!("Dropping pending command {}", dropped.title());
            }
            queue.active.clone()
        };

        if let Some(active) = active {
            match how {
                CancelOrFinish::Cancel => active.cancel(),
                CancelOrFinish::Finish => active.finish(),
            }
            return future::ready(()).boxed_local();
        }

        let mut run = self.clone().dequeue().boxed_local();
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        if run.as_mut().poll(&mut cx).is_ready() {
            return future::ready(()).boxed_local();
        }
        let handle = tokio::task::spawn_local(run);
        async move {
            if let Err(e) = handle.await {
                tracing::error!("Command loop stopped: {}", e);
            }
        }
        .boxed_local()
    }

    pub fn cancel_active(&self) {
        let active = self.inner.queue.borrow().active.clone();
        if let Some(active) = active {
            active.cancel();
        }
    }

    pub fn finish_active(&self) {
        let active = self.inner.queue.borrow().active.clone();
        if let Some(active) = active {
            active.finish();
        }
    }

    /// Undo the most recent command. Refused while a command runs.
    pub fn undo(&self) -> Option<String> {
        if self.is_busy() {
            tracing::warn!("Undo ignored while a command is running");
            return None;
        }
        self.inner.history.borrow_mut().undo(&*self.inner.originator)
    }

    pub fn redo(&self) -> Option<String> {
        if self.is_busy() {
            tracing::warn!("Redo ignored while a command is running");
            return None;
        }
        self.inner.history.borrow_mut().redo(&*self.inner.originator)
    }

    async fn dequeue(self) {
        loop {
            let next = {
                let mut queue = self.inner.queue.borrow_mut();
                let next = queue.pending.take();
                queue.active = next.clone();
                next
            };
            let Some(command) = next else {
                break;
            };
            self.execute(command).await;
        }
    }

    async fn execute(&self, command: Rc<dyn Command>) {
        let inner = &self.inner;
        let title = command.title().to_string();
        tracing::info!("Command {} started", title);
        self.publish(CommandEvent::Started {
            title: title.clone(),
        });

        let bindings = self.bind_keys(&command);
        let selection_changed = Arc::new(AtomicBool::new(false));
        let subscription = {
            let flag = selection_changed.clone();
            inner.bus.subscribe(
                EventFilter::Categories(vec![EventCategory::Selection]),
                move |event| {
                    if matches!(event, EditorEvent::Selection(SelectionEvent::Changed { .. })) {
                        flag.store(true, Ordering::SeqCst);
                    }
                },
            )
        };

        let snapshot = inner.originator.save_to_memento();
        inner.db.begin_transaction();
        command.registor().begin();
        let result = command.execute().await;
        inner.db.end_transaction();

        match result {
            Ok(()) => {
                command.finish();
                if command.state() == CommandState::Finished {
                    if command.should_add_to_history(selection_changed.load(Ordering::SeqCst)) {
                        inner.history.borrow_mut().add(title.clone(), snapshot);
                    }
                    tracing::info!("Command {} finished", title);
                    self.publish(CommandEvent::FinishedSuccessfully {
                        title: title.clone(),
                    });
                }
            }
            Err(error) => {
                command.cancel();
                inner.originator.restore_from_memento(&snapshot);
                match error.severity() {
                    Severity::Silent => tracing::debug!("Command {} ended: {}", title, error),
                    Severity::Warning => tracing::warn!("{}: {}", title, error),
                    Severity::Error => tracing::error!("{}: {:#}", title, error),
                }
            }
        }

        for viewport in &inner.viewports {
            viewport.enable_controls();
        }
        bindings.dispose();
        inner.bus.unsubscribe(subscription);
        inner.db.clear_temporary_objects();
        self.publish(CommandEvent::Ended {
            title: title.clone(),
        });
        if let Err(e) = inner.originator.validate() {
            tracing::error!("Editor state invalid after {}: {}", title, e);
        }
    }

    fn bind_keys(&self, command: &Rc<dyn Command>) -> Disposable {
        let Some(router) = &self.inner.router else {
            return Disposable::empty();
        };
        let mut bindings = CompositeDisposable::new();
        let target = Rc::downgrade(command);
        bindings.add(router.on_command(EventTarget::Document, FINISH_COMMAND, move || {
            if let Some(command) = target.upgrade() {
                command.finish();
            }
        }));
        let target = Rc::downgrade(command);
        bindings.add(router.on_command(EventTarget::Document, ABORT_COMMAND, move || {
            if let Some(command) = target.upgrade() {
                command.cancel();
            }
        }));
        bindings.into_disposable()
    }

    fn publish(&self, event: CommandEvent) {
        self.inner.bus.publish(EditorEvent::Command(event)).ok();
    }
}
