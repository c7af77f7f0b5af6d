//! # Event Bus Module
//!
//! Editor-wide publish/subscribe for decoupled communication between the
//! command executor, gizmos, factories and the views that observe them.
//!
//! ## Overview
//!
//! - Publishers emit typed [`EditorEvent`]s without knowing subscribers
//! - Subscribers filter by [`EventCategory`]
//! - Synchronous handlers run before `publish` returns; async consumers poll
//!   a broadcast [`receiver`](EventBus::receiver)
//!
//! There is no global instance. Every component takes the `Arc<EventBus>`
//! it publishes to: the editor creates one bus per session and hands clones
//! to the executor, the document, gizmos and factories, and tests give each
//! fixture a private bus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use solidkit_core::event_bus::{CommandEvent, EditorEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = Arc::new(EventBus::new());
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Command]),
//!     |event| {
//!         if let EditorEvent::Command(CommandEvent::Ended { title }) = event {
//!             println!("{} ended", title);
//!         }
//!     },
//! );
//!
//! bus.publish(EditorEvent::Command(CommandEvent::Ended {
//!     title: "Box".to_string(),
//! }));
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
