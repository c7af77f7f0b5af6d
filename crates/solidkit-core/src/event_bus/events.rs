//! Event type definitions for the event bus.
//!
//! Events carry plain data (titles, ids, messages) so they stay cloneable
//! and serializable for logging and replay.

use serde::{Deserialize, Serialize};

/// Root event enum for all editor events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
    /// Command lifecycle
    Command(CommandEvent),
    /// Gizmo interaction
    Gizmo(GizmoEvent),
    /// Parametric factory updates
    Factory(FactoryEvent),
    /// Undo/redo history
    History(HistoryEvent),
    /// Selection changes
    Selection(SelectionEvent),
}

impl EditorEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            EditorEvent::Command(_) => EventCategory::Command,
            EditorEvent::Gizmo(_) => EventCategory::Gizmo,
            EditorEvent::Factory(_) => EventCategory::Factory,
            EditorEvent::History(_) => EventCategory::History,
            EditorEvent::Selection(_) => EventCategory::Selection,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            EditorEvent::Command(e) => e.description(),
            EditorEvent::Gizmo(e) => e.description(),
            EditorEvent::Factory(e) => e.description(),
            EditorEvent::History(e) => e.description(),
            EditorEvent::Selection(e) => e.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Command lifecycle events.
    Command,
    /// Gizmo interaction events.
    Gizmo,
    /// Factory update events.
    Factory,
    /// History events.
    History,
    /// Selection events.
    Selection,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Command => write!(f, "Command"),
            EventCategory::Gizmo => write!(f, "Gizmo"),
            EventCategory::Factory => write!(f, "Factory"),
            EventCategory::History => write!(f, "History"),
            EventCategory::Selection => write!(f, "Selection"),
        }
    }
}

/// Command lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandEvent {
    /// The executor is about to run a command.
    Started {
        /// Command title.
        title: String,
    },
    /// The command reached `Finished` and was committed.
    FinishedSuccessfully {
        /// Command title.
        title: String,
    },
    /// The executor is done with a command, whatever the outcome.
    Ended {
        /// Command title.
        title: String,
    },
}

impl CommandEvent {
    fn description(&self) -> String {
        match self {
            CommandEvent::Started { title } => format!("Command started: {}", title),
            CommandEvent::FinishedSuccessfully { title } => {
                format!("Command finished: {}", title)
            }
            CommandEvent::Ended { title } => format!("Command ended: {}", title),
        }
    }
}

/// Gizmo interaction events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GizmoEvent {
    /// A gizmo changed state or produced a value.
    Changed {
        /// Gizmo title.
        title: String,
    },
    /// The picked point moved.
    PointPickerChanged,
    /// Keyboard commands became available.
    KeybindingsRegistered {
        /// Command names, e.g. `gizmo:distance:free`.
        commands: Vec<String>,
    },
    /// Keyboard commands went away.
    KeybindingsCleared {
        /// Command names.
        commands: Vec<String>,
    },
}

impl GizmoEvent {
    fn description(&self) -> String {
        match self {
            GizmoEvent::Changed { title } => format!("Gizmo changed: {}", title),
            GizmoEvent::PointPickerChanged => "Point picker changed".to_string(),
            GizmoEvent::KeybindingsRegistered { commands } => {
                format!("Keybindings registered: {}", commands.join(", "))
            }
            GizmoEvent::KeybindingsCleared { commands } => {
                format!("Keybindings cleared: {}", commands.join(", "))
            }
        }
    }
}

/// Parametric factory events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactoryEvent {
    /// A preview was recomputed.
    Updated {
        /// Factory name.
        name: String,
    },
    /// A recompute was rejected; parameters were rolled back.
    UpdateFailed {
        /// Factory name.
        name: String,
        /// Validation message.
        message: String,
    },
    /// The factory produced its final result.
    Committed {
        /// Factory name.
        name: String,
    },
    /// The factory was abandoned.
    Cancelled {
        /// Factory name.
        name: String,
    },
}

impl FactoryEvent {
    fn description(&self) -> String {
        match self {
            FactoryEvent::Updated { name } => format!("Factory updated: {}", name),
            FactoryEvent::UpdateFailed { name, message } => {
                format!("Factory update failed: {}: {}", name, message)
            }
            FactoryEvent::Committed { name } => format!("Factory committed: {}", name),
            FactoryEvent::Cancelled { name } => format!("Factory cancelled: {}", name),
        }
    }
}

/// History events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// An entry was pushed onto the undo stack.
    Added {
        /// Entry name.
        name: String,
    },
    /// Undo or redo moved the document.
    Changed,
}

impl HistoryEvent {
    fn description(&self) -> String {
        match self {
            HistoryEvent::Added { name } => format!("History added: {}", name),
            HistoryEvent::Changed => "History changed".to_string(),
        }
    }
}

/// Selection events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionEvent {
    /// The selected item ids changed.
    Changed {
        /// Currently selected ids.
        selected: Vec<u64>,
    },
}

impl SelectionEvent {
    fn description(&self) -> String {
        match self {
            SelectionEvent::Changed { selected } => {
                format!("Selection changed ({} items)", selected.len())
            }
        }
    }
}
