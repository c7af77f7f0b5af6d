//! Collaborators the executor and factories talk to, and an in-memory document
//! implementing them.
//!
//! The geometry kernel is out of scope; an [`Item`] is only a named record.
//! What matters here is the transaction boundary, temporary preview items,
//! and memento snapshots used for rollback and undo.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use solidkit_core::event_bus::{EditorEvent, EventBus, SelectionEvent};
use solidkit_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemporaryId(pub u64);

/// A geometry record produced by a factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, f64>,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Saves and restores the editor state a command may change.
pub trait Originator {
    type Memento: Clone + 'static;

    fn save_to_memento(&self) -> Self::Memento;

    fn restore_from_memento(&self, memento: &Self::Memento);

    /// Check internal consistency after a command ends.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// The geometry store, as seen by commands and factories.
pub trait GeometryDatabase {
    fn begin_transaction(&self);

    fn end_transaction(&self);

    fn add_item(&self, item: Item) -> ItemId;

    /// Add a preview that is not part of the document.
    fn add_temporary_item(&self, item: Item) -> TemporaryId;

    fn remove_temporary_item(&self, id: TemporaryId);

    fn clear_temporary_objects(&self);
}

#[derive(Debug, Clone, Default, PartialEq)]
struct DocumentState {
    items: BTreeMap<ItemId, Item>,
    selection: BTreeSet<ItemId>,
}

/// Snapshot of an [`InMemoryDocument`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMemento(DocumentState);

impl DocumentMemento {
    pub fn item_count(&self) -> usize {
        self.0.items.len()
    }
}

/// A document kept entirely in memory, used by tests and the demo session.
#[derive(Debug)]
pub struct InMemoryDocument {
    state: RefCell<DocumentState>,
    temporaries: RefCell<BTreeMap<TemporaryId, Item>>,
    next_id: Cell<u64>,
    transaction_depth: Cell<usize>,
    bus: Option<Arc<EventBus>>,
}

impl Default for InMemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocument {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(DocumentState::default()),
            temporaries: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
            transaction_depth: Cell::new(0),
            bus: None,
        }
    }

    /// Publish selection changes on `bus`.
    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    fn next(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.state.borrow().items.get(&id).cloned()
    }

    pub fn items(&self) -> Vec<(ItemId, Item)> {
        self.state
            .borrow()
            .items
            .iter()
            .map(|(id, item)| (*id, item.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remove_item(&self, id: ItemId) -> Option<Item> {
        let mut state = self.state.borrow_mut();
        state.selection.remove(&id);
        state.items.remove(&id)
    }

    /// Replace the selection. Unknown ids are ignored.
    pub fn select(&self, ids: impl IntoIterator<Item = ItemId>) {
        let selected: Vec<u64> = {
            let mut state = self.state.borrow_mut();
            let selection: BTreeSet<ItemId> = ids
                .into_iter()
                .filter(|id| state.items.contains_key(id))
                .collect();
            if selection == state.selection {
                return;
            }
            state.selection = selection;
            state.selection.iter().map(|id| id.0).collect()
        };
        if let Some(bus) = &self.bus {
            bus.publish(EditorEvent::Selection(SelectionEvent::Changed { selected }))
                .ok();
        }
    }

    pub fn selected(&self) -> Vec<ItemId> {
        self.state.borrow().selection.iter().copied().collect()
    }

    pub fn temporaries(&self) -> Vec<Item> {
        self.temporaries.borrow().values().cloned().collect()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth.get() > 0
    }
}

impl Originator for InMemoryDocument {
    type Memento = DocumentMemento;

    fn save_to_memento(&self) -> DocumentMemento {
        DocumentMemento(self.state.borrow().clone())
    }

    fn restore_from_memento(&self, memento: &DocumentMemento) {
        *self.state.borrow_mut() = memento.0.clone();
    }

    fn validate(&self) -> Result<()> {
        if self.in_transaction() {
            return Err(Error::other("geometry transaction left open"));
        }
        let state = self.state.borrow();
        if let Some(stray) = state.selection.iter().find(|id| !state.items.contains_key(id)) {
            return Err(Error::other(format!("selection refers to missing {}", stray)));
        }
        Ok(())
    }
}

impl GeometryDatabase for InMemoryDocument {
    fn begin_transaction(&self) {
        self.transaction_depth.set(self.transaction_depth.get() + 1);
    }

    fn end_transaction(&self) {
        let depth = self.transaction_depth.get();
        if depth == 0 {
            tracing::error!("end_transaction without a matching begin_transaction");
            return;
        }
        self.transaction_depth.set(depth - 1);
    }

    fn add_item(&self, item: Item) -> ItemId {
        let id = ItemId(self.next());
        tracing::debug!("Adding {} ({})", id, item.name);
        self.state.borrow_mut().items.insert(id, item);
        id
    }

    fn add_temporary_item(&self, item: Item) -> TemporaryId {
        let id = TemporaryId(self.next());
        self.temporaries.borrow_mut().insert(id, item);
        id
    }

    fn remove_temporary_item(&self, id: TemporaryId) {
        self.temporaries.borrow_mut().remove(&id);
    }

    fn clear_temporary_objects(&self) {
        self.temporaries.borrow_mut().clear();
    }
}
