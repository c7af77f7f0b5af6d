//! # SolidKit Command
//!
//! The command layer: the [`Command`] contract, the serializing
//! [`CommandExecutor`] with its atomic rollback boundary, memento-based undo
//! [`History`], and [`ParametricFactory`] previews with last-known-good
//! parameter rollback.

pub mod command;
pub mod document;
pub mod executor;
pub mod factory;
pub mod history;
pub mod registry;
pub mod transaction;

pub use command::{dasherize, CancelOrFinish, Command, CommandExt};
pub use document::{
    DocumentMemento, GeometryDatabase, InMemoryDocument, Item, ItemId, Originator, TemporaryId,
};
pub use executor::{CommandExecutor, ExecutorBuilder, ABORT_COMMAND, FINISH_COMMAND};
pub use factory::{Calculation, FactoryState, ParametricFactory};
pub use history::{History, HistoryEntry, DEFAULT_MAX_DEPTH};
pub use registry::{CommandFactory, CommandRegistry};
pub use transaction::Transactional;
