//! Parametric factories: the geometry side of a command.
//!
//! While the user drags gizmos or edits dialog fields the factory is
//! *updated*, which recomputes a preview from the current parameters. When the
//! user is done it is *committed*, which adds the result to the document, or
//! *cancelled*, which discards the preview. Failed updates roll the
//! parameters back to their last working values.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use solidkit_core::event_bus::{EditorEvent, EventBus, FactoryEvent};
use solidkit_core::{Cancellable, Error, Result, Severity};

use crate::document::{GeometryDatabase, Item, ItemId, TemporaryId};
use crate::transaction::Transactional;

/// The computation a factory wraps.
pub trait Calculation: 'static {
    type Params: Serialize + DeserializeOwned + 'static;

    fn name(&self) -> &str;

    /// Parameters rolled back when a calculation fails.
    fn keys(&self) -> &[&'static str];

    fn calculate(&self, params: &Self::Params) -> Result<Vec<Item>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryState {
    None,
    Updating,
    Updated,
    Failed,
    Committed,
    Cancelled,
}

impl FactoryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FactoryState::Committed | FactoryState::Cancelled)
    }
}

struct FactoryInner<C: Calculation> {
    calculation: C,
    params: RefCell<Transactional<C::Params>>,
    state: Cell<FactoryState>,
    temps: RefCell<Vec<TemporaryId>>,
    db: Rc<dyn GeometryDatabase>,
    bus: Arc<EventBus>,
}

/// A cancellable, transactional wrapper around a [`Calculation`].
///
/// Clones share the same factory.
pub struct ParametricFactory<C: Calculation> {
    inner: Rc<FactoryInner<C>>,
}

impl<C: Calculation> Clone for ParametricFactory<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Calculation> fmt::Debug for ParametricFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParametricFactory")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("temps", &self.inner.temps.borrow().len())
            .finish()
    }
}

impl<C: Calculation> ParametricFactory<C> {
    pub fn new(
        calculation: C,
        params: C::Params,
        db: Rc<dyn GeometryDatabase>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            inner: Rc::new(FactoryInner {
                calculation,
                params: RefCell::new(Transactional::new(params)),
                state: Cell::new(FactoryState::None),
                temps: RefCell::new(Vec::new()),
                db,
                bus,
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.calculation.name()
    }

    pub fn state(&self) -> FactoryState {
        self.inner.state.get()
    }

    pub fn params(&self) -> Ref<'_, C::Params> {
        Ref::map(self.inner.params.borrow(), Transactional::params)
    }

    /// Recompute the preview from the current parameters.
    pub fn update(&self) -> Result<()> {
        self.update_with(|_| {})
    }

    /// Change the parameters with `edit` and recompute the preview.
    ///
    /// On failure the rollback keys return to their last working values and
    /// the previous preview stays up.
    pub fn update_with(&self, edit: impl FnOnce(&mut C::Params)) -> Result<()> {
        if self.state().is_terminal() {
            return Err(Error::AlreadyFinished);
        }
        self.inner.state.set(FactoryState::Updating);

        let calculation = &self.inner.calculation;
        let result = self
            .inner
            .params
            .borrow_mut()
            .transaction(calculation.keys(), |params| {
                edit(params);
                calculation.calculate(params)
            });

        match result {
            Ok(items) => {
                self.replace_preview(items);
                self.inner.state.set(FactoryState::Updated);
                self.publish(FactoryEvent::Updated {
                    name: self.name().to_string(),
                });
                Ok(())
            }
            Err(error) => {
                self.inner.state.set(FactoryState::Failed);
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Add the result to the document. Terminal.
    pub fn commit(&self) -> Result<Vec<ItemId>> {
        if self.state().is_terminal() {
            return Err(Error::AlreadyFinished);
        }
        let result = {
            let params = self.inner.params.borrow();
            self.inner.calculation.calculate(params.params())
        };
        self.clear_preview();
        match result {
            Ok(items) => {
                let ids = items.into_iter().map(|item| self.inner.db.add_item(item)).collect();
                self.inner.state.set(FactoryState::Committed);
                tracing::info!("{}: committed", self.name());
                self.publish(FactoryEvent::Committed {
                    name: self.name().to_string(),
                });
                Ok(ids)
            }
            Err(error) => {
                self.inner.state.set(FactoryState::Cancelled);
                self.report(&error);
                self.publish(FactoryEvent::Cancelled {
                    name: self.name().to_string(),
                });
                Err(error)
            }
        }
    }

    /// Discard the preview. Terminal; a no-op once committed or cancelled.
    pub fn cancel(&self) {
        if self.state().is_terminal() {
            return;
        }
        self.clear_preview();
        self.inner.state.set(FactoryState::Cancelled);
        tracing::debug!("{}: cancelled", self.name());
        self.publish(FactoryEvent::Cancelled {
            name: self.name().to_string(),
        });
    }

    fn replace_preview(&self, items: Vec<Item>) {
        self.clear_preview();
        let ids: Vec<TemporaryId> = items
            .into_iter()
            .map(|item| self.inner.db.add_temporary_item(item))
            .collect();
        *self.inner.temps.borrow_mut() = ids;
    }

    fn clear_preview(&self) {
        let temps = std::mem::take(&mut *self.inner.temps.borrow_mut());
        for id in temps {
            self.inner.db.remove_temporary_item(id);
        }
    }

    fn report(&self, error: &Error) {
        match error.severity() {
            Severity::Silent => {}
            Severity::Warning => {
                tracing::warn!("{}: {}", self.name(), error);
                self.publish(FactoryEvent::UpdateFailed {
                    name: self.name().to_string(),
                    message: error.to_string(),
                });
            }
            Severity::Error => {
                tracing::error!("{}: {:#}", self.name(), error);
                self.publish(FactoryEvent::UpdateFailed {
                    name: self.name().to_string(),
                    message: error.to_string(),
                });
            }
        }
    }

    fn publish(&self, event: FactoryEvent) {
        self.inner.bus.publish(EditorEvent::Factory(event)).ok();
    }
}

/// Cancelling a command discards the factory's preview. Finishing leaves it
/// alone; committing is the command's decision.
impl<C: Calculation> Cancellable for ParametricFactory<C> {
    fn cancel(&self) {
        ParametricFactory::cancel(self);
    }

    fn finish(&self) {}
}
