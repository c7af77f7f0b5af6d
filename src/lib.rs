//! # SolidKit
//!
//! The interactive command and gizmo layer of a solid-modeling editor.
//!
//! ## Architecture
//!
//! SolidKit is organized as a workspace with multiple crates:
//!
//! 1. **solidkit-core** - Errors, disposables, cancellable operations, the
//!    per-command resource registor and the editor event bus
//! 2. **solidkit-gizmo** - Cameras, input routing, gizmo state machines,
//!    composite gizmos with focus arbitration
//! 3. **solidkit-command** - Commands, the serializing executor, undo history
//!    and parametric factories
//! 4. **solidkit-settings** - Configuration loading and validation
//! 5. **solidkit** - Logging setup, session wiring and a headless demo

pub mod demo;
pub mod editor;

pub use solidkit_command as command;
pub use solidkit_gizmo as gizmo;
pub use solidkit_settings as settings;

pub use solidkit_core::{
    event_bus, Cancellable, CancellableOperation, CancellableRegistor, CommandState,
    CompositeDisposable, Disposable, EditorEvent, Error, EventBus, EventBusConfig, Result,
    Severity,
};

pub use demo::{run_scripted_session, OffsetFace, OffsetFaceCommand, SessionReport};
pub use editor::{spawn_event_journal, Editor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    init_logging_with("info")
}

/// Initialize logging, using `filter` when `RUST_LOG` is not set.
pub fn init_logging_with(filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(filter)?,
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
