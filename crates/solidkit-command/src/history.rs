//! Memento-based undo/redo.
//!
//! Each entry stores the editor state from *before* a command ran. Undoing
//! swaps it with the current state, so the same entry moved to the redo
//! stack can restore the state after the command.

use std::collections::VecDeque;
use std::sync::Arc;

use solidkit_core::event_bus::{EditorEvent, EventBus, HistoryEvent};

use crate::document::Originator;

pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone)]
pub struct HistoryEntry<M> {
    pub name: String,
    pub memento: M,
}

pub struct History<M> {
    undo: VecDeque<HistoryEntry<M>>,
    redo: Vec<HistoryEntry<M>>,
    max_depth: usize,
    bus: Arc<EventBus>,
}

impl<M> std::fmt::Debug for History<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("undo", &self.undo_names())
            .field("redo", &self.redo.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<M: Clone> History<M> {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_max_depth(bus, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(bus: Arc<EventBus>, max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
            bus,
        }
    }

    /// Record the state from before command `name`. Clears the redo stack.
    pub fn add(&mut self, name: impl Into<String>, before: M) {
        let name = name.into();
        tracing::debug!("History: added {}", name);
        self.undo.push_back(HistoryEntry {
            name: name.clone(),
            memento: before,
        });
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
        self.redo.clear();
        self.publish(HistoryEvent::Added { name });
        self.publish(HistoryEvent::Changed);
    }

    /// Restore the state from before the most recent command. Returns its name.
    pub fn undo<O>(&mut self, originator: &O) -> Option<String>
    where
        O: Originator<Memento = M> + ?Sized,
    {
        let entry = self.undo.pop_back()?;
        let after = originator.save_to_memento();
        originator.restore_from_memento(&entry.memento);
        let name = entry.name.clone();
        self.redo.push(HistoryEntry {
            name: entry.name,
            memento: after,
        });
        tracing::info!("Undo {}", name);
        self.publish(HistoryEvent::Changed);
        Some(name)
    }

    /// Re-apply the most recently undone command. Returns its name.
    pub fn redo<O>(&mut self, originator: &O) -> Option<String>
    where
        O: Originator<Memento = M> + ?Sized,
    {
        let entry = self.redo.pop()?;
        let before = originator.save_to_memento();
        originator.restore_from_memento(&entry.memento);
        let name = entry.name.clone();
        self.undo.push_back(HistoryEntry {
            name: entry.name,
            memento: before,
        });
        tracing::info!("Redo {}", name);
        self.publish(HistoryEvent::Changed);
        Some(name)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.publish(HistoryEvent::Changed);
    }
}

impl<M> History<M> {
    pub fn undo_names(&self) -> Vec<&str> {
        self.undo.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn publish(&self, event: HistoryEvent) {
        self.bus.publish(EditorEvent::History(event)).ok();
    }
}
