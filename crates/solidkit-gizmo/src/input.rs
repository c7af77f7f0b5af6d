//! Pointer, key and named-command dispatch.
//!
//! [`InputRouter`] plays the part of the windowing layer: listeners attach to
//! a viewport element or to the whole document, and every subscription hands
//! back a [`Disposable`] that detaches it. Dispatch works on a snapshot of
//! the listener list, so a handler may add or remove listeners (including
//! itself) while it runs. Removed listeners are skipped even within the
//! dispatch that removed them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use solidkit_core::Disposable;

use crate::viewport::{PointerSample, Viewport, ViewportId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    /// Only events raised on this viewport.
    Element(ViewportId),
    /// Events raised anywhere.
    Document,
}

impl EventTarget {
    fn accepts(&self, viewport: ViewportId) -> bool {
        match self {
            EventTarget::Element(id) => *id == viewport,
            EventTarget::Document => true,
        }
    }
}

type PointerHandler = Rc<dyn Fn(PointerSample)>;
type KeyHandler = Rc<dyn Fn(&str)>;
type CommandHandler = Rc<dyn Fn()>;

struct Entry<H> {
    id: u64,
    alive: Rc<Cell<bool>>,
    handler: H,
}

struct PointerEntry {
    target: EventTarget,
    kind: PointerKind,
    entry: Entry<PointerHandler>,
}

struct CommandEntry {
    target: EventTarget,
    name: String,
    entry: Entry<CommandHandler>,
}

#[derive(Default)]
struct RouterState {
    next_id: u64,
    pointer: Vec<PointerEntry>,
    keys: Vec<Entry<KeyHandler>>,
    commands: Vec<CommandEntry>,
    keymap: HashMap<String, String>,
    last_sample: HashMap<ViewportId, PointerSample>,
    active_viewport: Option<ViewportId>,
}

impl RouterState {
    fn next(&mut self) -> (u64, Rc<Cell<bool>>) {
        self.next_id += 1;
        (self.next_id, Rc::new(Cell::new(true)))
    }

    fn remove(&mut self, id: u64) {
        self.pointer.retain(|e| e.entry.id != id);
        self.keys.retain(|e| e.id != id);
        self.commands.retain(|e| e.entry.id != id);
    }
}

/// Routes raw input to gizmo and command listeners.
///
/// Clones share the same listener tables.
#[derive(Clone, Default)]
pub struct InputRouter {
    state: Rc<RefCell<RouterState>>,
}

impl std::fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("InputRouter")
            .field("pointer_listeners", &state.pointer.len())
            .field("key_listeners", &state.keys.len())
            .field("command_listeners", &state.commands.len())
            .field("active_viewport", &state.active_viewport)
            .finish()
    }
}

fn detach(state: Weak<RefCell<RouterState>>, id: u64, alive: Rc<Cell<bool>>) -> Disposable {
    Disposable::new(move || {
        alive.set(false);
        if let Some(state) = state.upgrade() {
            state.borrow_mut().remove(id);
        }
    })
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pointer(
        &self,
        target: EventTarget,
        kind: PointerKind,
        handler: impl Fn(PointerSample) + 'static,
    ) -> Disposable {
        let mut state = self.state.borrow_mut();
        let (id, alive) = state.next();
        state.pointer.push(PointerEntry {
            target,
            kind,
            entry: Entry {
                id,
                alive: alive.clone(),
                handler: Rc::new(handler),
            },
        });
        detach(Rc::downgrade(&self.state), id, alive)
    }

    /// Listen for typed characters anywhere in the document.
    pub fn on_key(&self, handler: impl Fn(&str) + 'static) -> Disposable {
        let mut state = self.state.borrow_mut();
        let (id, alive) = state.next();
        state.keys.push(Entry {
            id,
            alive: alive.clone(),
            handler: Rc::new(handler),
        });
        detach(Rc::downgrade(&self.state), id, alive)
    }

    /// Listen for a named command such as `gizmo:distance:free` or `command:abort`.
    pub fn on_command(
        &self,
        target: EventTarget,
        name: impl Into<String>,
        handler: impl Fn() + 'static,
    ) -> Disposable {
        let mut state = self.state.borrow_mut();
        let (id, alive) = state.next();
        state.commands.push(CommandEntry {
            target,
            name: name.into(),
            entry: Entry {
                id,
                alive: alive.clone(),
                handler: Rc::new(handler),
            },
        });
        detach(Rc::downgrade(&self.state), id, alive)
    }

    /// Map a key to a named command. Pressing the key dispatches the command.
    pub fn bind_key(&self, key: impl Into<String>, command: impl Into<String>) {
        self.state
            .borrow_mut()
            .keymap
            .insert(key.into(), command.into());
    }

    pub fn binding(&self, key: &str) -> Option<String> {
        self.state.borrow().keymap.get(key).cloned()
    }

    /// Raise a pointer event in client pixel coordinates.
    pub fn pointer(
        &self,
        viewport: &dyn Viewport,
        kind: PointerKind,
        client_x: f32,
        client_y: f32,
        button: i32,
    ) {
        let sample = viewport.normalize(client_x, client_y, button);
        self.pointer_sample(viewport.id(), kind, sample);
    }

    /// Raise a pointer event already in normalized device coordinates.
    ///
    /// Element listeners of the viewport run before document listeners.
    pub fn pointer_sample(&self, viewport: ViewportId, kind: PointerKind, sample: PointerSample) {
        let snapshot: Vec<(Rc<Cell<bool>>, PointerHandler)> = {
            let mut state = self.state.borrow_mut();
            state.last_sample.insert(viewport, sample);
            state.active_viewport = Some(viewport);

            let state = &*state;

            let mut snapshot = Vec::new();
            for element in [true, false] {
                snapshot.extend(
                    state
                        .pointer
                        .iter()
                        .filter(|e| {
                            e.kind == kind
                                && e.target.accepts(viewport)
                                && matches!(e.target, EventTarget::Element(_)) == element
                        })
                        .map(|e| (e.entry.alive.clone(), e.entry.handler.clone())),
                );
            }
            snapshot
        };
        for (alive, handler) in snapshot {
            if alive.get() {
                handler(sample);
            }
        }
    }

    /// Type a key: key listeners first, then any bound command.
    pub fn press_key(&self, key: &str) {
        let snapshot: Vec<(Rc<Cell<bool>>, KeyHandler)> = self
            .state
            .borrow()
            .keys
            .iter()
            .map(|e| (e.alive.clone(), e.handler.clone()))
            .collect();
        for (alive, handler) in snapshot {
            if alive.get() {
                handler(key);
            }
        }

        if let Some(command) = self.binding(key) {
            self.dispatch_command(&command);
        }
    }

    /// Dispatch a named command to document listeners and to listeners on the
    /// active viewport. Returns whether anyone was listening.
    ///
    /// Before any pointer activity, element listeners of the first viewport
    /// that registered the command are used.
    pub fn dispatch_command(&self, name: &str) -> bool {
        let snapshot: Vec<(Rc<Cell<bool>>, CommandHandler)> = {
            let state = self.state.borrow();
            let viewport = state.active_viewport.or_else(|| {
                state.commands.iter().find_map(|e| match e.target {
                    EventTarget::Element(id) if e.name == name => Some(id),
                    _ => None,
                })
            });
            state
                .commands
                .iter()
                .filter(|e| {
                    e.name == name
                        && match e.target {
                            EventTarget::Document => true,
                            EventTarget::Element(id) => Some(id) == viewport,
                        }
                })
                .map(|e| (e.entry.alive.clone(), e.entry.handler.clone()))
                .collect()
        };
        tracing::debug!("Dispatching command {} to {} listeners", name, snapshot.len());
        let found = !snapshot.is_empty();
        for (alive, handler) in snapshot {
            if alive.get() {
                handler();
            }
        }
        found
    }

    /// Last pointer sample seen on a viewport, used to seed keyboard-started interactions.
    pub fn last_sample(&self, viewport: ViewportId) -> Option<PointerSample> {
        self.state.borrow().last_sample.get(&viewport).copied()
    }

    pub fn active_viewport(&self) -> Option<ViewportId> {
        self.state.borrow().active_viewport
    }

    pub fn set_active_viewport(&self, viewport: ViewportId) {
        self.state.borrow_mut().active_viewport = Some(viewport);
    }

    /// Names of every command with at least one listener.
    pub fn registered_commands(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<String> = state.commands.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn listener_count(&self) -> usize {
        let state = self.state.borrow();
        state.pointer.len() + state.keys.len() + state.commands.len()
    }
}
