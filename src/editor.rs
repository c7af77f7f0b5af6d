//! Wiring of the interaction layer from a [`Config`].

use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use solidkit_command::{CommandExecutor, CommandRegistry, InMemoryDocument};
use solidkit_core::{EventBus, EventBusConfig};
use solidkit_gizmo::{GizmoContext, InputRouter, Mode, Viewport};
use solidkit_settings::Config;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Log every event published on `bus` until the bus is dropped.
///
/// Resolves to the number of events logged.
pub fn spawn_event_journal(bus: &EventBus) -> JoinHandle<usize> {
    let mut receiver = bus.receiver();
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    logged += 1;
                    tracing::debug!(
                        target: "solidkit::events",
                        "[{}] {}",
                        event.category(),
                        event.description()
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event journal fell behind, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}

/// One editing session: document, event bus, input, gizmo context and executor.
pub struct Editor {
    pub config: Config,
    pub bus: Arc<EventBus>,
    pub document: Rc<InMemoryDocument>,
    pub router: InputRouter,
    pub gizmos: GizmoContext,
    pub registry: CommandRegistry<InMemoryDocument>,
    pub default_mode: Mode,
}

impl Editor {
    /// Build a session over `viewports`, binding every keymap entry on the router.
    pub fn new(config: Config, viewports: Vec<Rc<dyn Viewport>>) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;
        let default_mode: Mode = config
            .interaction
            .default_mode
            .parse()
            .map_err(anyhow::Error::msg)?;

        let bus = Arc::new(EventBus::with_config(EventBusConfig {
            channel_capacity: config.event_bus.channel_capacity,
            enable_history: config.event_bus.enable_history,
            max_history_size: config.event_bus.max_history_size,
            ..Default::default()
        }));
        let document = Rc::new(InMemoryDocument::new().with_bus(bus.clone()));

        let router = InputRouter::new();
        for (key, command) in &config.keymap {
            router.bind_key(key.clone(), command.clone());
        }

        let gizmos = GizmoContext::new(viewports.clone(), router.clone(), bus.clone());
        let executor = CommandExecutor::builder(document.clone(), document.clone(), bus.clone())
            .viewports(viewports)
            .router(router.clone())
            .max_history_depth(config.history.max_depth)
            .build();

        tracing::info!(
            "Editor ready: {} viewport(s), {} key binding(s), {:?} gizmos",
            gizmos.viewports.len(),
            config.keymap.len(),
            default_mode
        );
        Ok(Self {
            config,
            bus,
            document,
            router,
            gizmos,
            registry: CommandRegistry::new(executor),
            default_mode,
        })
    }

    /// Start journaling this session's events, see [`spawn_event_journal`].
    pub fn journal(&self) -> JoinHandle<usize> {
        spawn_event_journal(&self.bus)
    }

    pub fn executor(&self) -> &CommandExecutor<InMemoryDocument> {
        self.registry.executor()
    }

    /// Scale for the cameras of this session's viewports, see [`Camera::with_gizmo_scale`].
    ///
    /// [`Camera::with_gizmo_scale`]: solidkit_gizmo::Camera::with_gizmo_scale
    pub fn gizmo_scale(&self) -> f32 {
        self.config.interaction.gizmo_scale
    }
}
