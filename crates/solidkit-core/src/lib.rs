//! # SolidKit Core
//!
//! Core types for the SolidKit interaction layer: the error taxonomy,
//! run-once disposables, cancellable operations, the per-command resource
//! registor and the editor event bus.

pub mod cancellable;
pub mod disposable;
pub mod error;
pub mod event_bus;
pub mod registor;
pub mod types;

pub use cancellable::{Cancellable, CancellableOperation, OperationHooks, OperationState, Resolver};
pub use disposable::{CompositeDisposable, Disposable};
pub use error::{Error, Result, Severity};
pub use registor::{CancellableRegistor, CommandState};

// Re-export event bus for convenience
pub use event_bus::{
    EditorEvent, EventBus, EventBusConfig, EventCategory, EventFilter, SubscriptionId,
};

// Re-export type aliases for convenience
pub use types::{shared, shared_none, OnceCallback, Shared, SharedOption};
