//! Named command constructors and "repeat last command".

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use solidkit_core::{CompositeDisposable, Disposable, Error, Result};
use solidkit_gizmo::{EventTarget, InputRouter};

use crate::command::{CancelOrFinish, Command};
use crate::document::Originator;
use crate::executor::CommandExecutor;

pub type CommandFactory = Rc<dyn Fn() -> Rc<dyn Command>>;

struct RegistryState {
    factories: BTreeMap<String, CommandFactory>,
    last: Option<String>,
}

/// Maps command identifiers to constructors and runs them through an executor.
pub struct CommandRegistry<O: Originator> {
    executor: CommandExecutor<O>,
    state: Rc<RefCell<RegistryState>>,
}

impl<O: Originator> Clone for CommandRegistry<O> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            state: self.state.clone(),
        }
    }
}

impl<O: Originator + 'static> CommandRegistry<O> {
    pub fn new(executor: CommandExecutor<O>) -> Self {
        Self {
            executor,
            state: Rc::new(RefCell::new(RegistryState {
                factories: BTreeMap::new(),
                last: None,
            })),
        }
    }

    pub fn executor(&self) -> &CommandExecutor<O> {
        &self.executor
    }

    /// Register a constructor under `id`, replacing any previous one.
    pub fn register(&self, id: impl Into<String>, factory: impl Fn() -> Rc<dyn Command> + 'static) {
        let id = id.into();
        tracing::debug!("Registered command {}", id);
        self.state
            .borrow_mut()
            .factories
            .insert(id, Rc::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.state.borrow().factories.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.borrow().factories.keys().cloned().collect()
    }

    pub fn last(&self) -> Option<String> {
        self.state.borrow().last.clone()
    }

    /// Build a fresh `id` command and enqueue it, finishing the active one.
    pub fn run(&self, id: &str) -> Result<LocalBoxFuture<'static, ()>> {
        let factory = self
            .state
            .borrow()
            .factories
            .get(id)
            .cloned()
            .ok_or_else(|| Error::validation(format!("Unknown command '{}'", id)))?;
        let command = factory();
        if command.remember() {
            self.state.borrow_mut().last = Some(id.to_string());
        }
        Ok(self.executor.enqueue(command, CancelOrFinish::Finish))
    }

    /// Run the most recent remembered command again.
    pub fn repeat_last(&self) -> Result<LocalBoxFuture<'static, ()>> {
        let last = self.last().ok_or(Error::NoOp)?;
        self.run(&last)
    }

    /// Listen on `router` for every registered identifier as a document command.
    ///
    /// Dispatched commands that wait on input need a `tokio::task::LocalSet`,
    /// see [`CommandExecutor::enqueue`].
    pub fn attach(&self, router: &InputRouter) -> Disposable {
        let mut bindings = CompositeDisposable::new();
        for id in self.ids() {
            let registry = self.clone();
            let name = id.clone();
            bindings.add(router.on_command(EventTarget::Document, id, move || {
                if let Err(e) = registry.run(&name) {
                    tracing::warn!("{}", e);
                }
            }));
        }
        bindings.into_disposable()
    }
}
