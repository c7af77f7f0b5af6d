use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use solidkit_command::{
    Calculation, CancelOrFinish, Command, CommandExecutor, CommandExt, FactoryState,
    InMemoryDocument, Item, ParametricFactory,
};
use solidkit_core::event_bus::{EditorEvent, EventBus, EventBusConfig, FactoryEvent};
use solidkit_core::{shared_none, CancellableRegistor, CommandState, Error, Result, SharedOption};
use solidkit_gizmo::{
    Camera, DistanceGizmo, Gizmo, GizmoContext, GizmoHandle, HeadlessViewport, InputRouter, Mode,
    PointerKind, PointerSample, Viewport,
};
use tokio::task::LocalSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExtrudeParams {
    height: f64,
}

struct Extrude;

impl Calculation for Extrude {
    type Params = ExtrudeParams;

    fn name(&self) -> &str {
        "extrude"
    }

    fn keys(&self) -> &[&'static str] {
        &["height"]
    }

    fn calculate(&self, params: &ExtrudeParams) -> Result<Vec<Item>> {
        if params.height <= 0.0 {
            return Err(Error::validation("height must be positive"));
        }
        Ok(vec![Item::new("prism").with("height", params.height)])
    }
}

/// Drag a distance gizmo to set the height, press Enter to commit.
struct ExtrudeCommand {
    registor: CancellableRegistor,
    doc: Rc<InMemoryDocument>,
    ctx: GizmoContext,
    gizmo: GizmoHandle<DistanceGizmo>,
    factory: SharedOption<ParametricFactory<Extrude>>,
}

#[async_trait(?Send)]
impl Command for ExtrudeCommand {
    fn title(&self) -> &str {
        "Extrude"
    }

    fn registor(&self) -> &CancellableRegistor {
        &self.registor
    }

    async fn execute(&self) -> Result<()> {
        let factory = self.register(ParametricFactory::new(
            Extrude,
            ExtrudeParams { height: 1.0 },
            self.doc.clone(),
            self.ctx.bus.clone(),
        ))?;
        *self.factory.borrow_mut() = Some(factory.clone());
        factory.update()?;
        self.gizmo.gizmo().borrow_mut().set_value(1.0);

        let preview = factory.clone();
        let op = self.gizmo.execute(
            &self.ctx,
            move |height| {
                // A failed preview keeps the last good one up
                preview.update_with(|p| p.height = f64::from(height)).ok();
            },
            Mode::Persistent,
        );
        self.register(op)?.await?;

        factory.commit()?;
        Ok(())
    }
}

struct Session {
    doc: Rc<InMemoryDocument>,
    bus: Arc<EventBus>,
    viewport: Rc<HeadlessViewport>,
    router: InputRouter,
    ctx: GizmoContext,
    executor: CommandExecutor<InMemoryDocument>,
}

fn session() -> Session {
    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        enable_history: true,
        ..Default::default()
    }));
    let doc = Rc::new(InMemoryDocument::new().with_bus(bus.clone()));
    let viewport = Rc::new(HeadlessViewport::new(
        1,
        Camera::top(Vec3::ZERO, 10.0),
        800.0,
        600.0,
    ));
    let viewports = vec![viewport.clone() as Rc<dyn Viewport>];
    let router = InputRouter::new();
    router.bind_key("Escape", "command:abort");
    router.bind_key("Enter", "command:finish");
    let ctx = GizmoContext::new(viewports.clone(), router.clone(), bus.clone());
    let executor = CommandExecutor::builder(doc.clone(), doc.clone(), bus.clone())
        .viewports(viewports)
        .router(router.clone())
        .build();
    Session {
        doc,
        bus,
        viewport,
        router,
        ctx,
        executor,
    }
}

impl Session {
    fn command(&self) -> Rc<ExtrudeCommand> {
        Rc::new(ExtrudeCommand {
            registor: CancellableRegistor::new(),
            doc: self.doc.clone(),
            ctx: self.ctx.clone(),
            gizmo: GizmoHandle::new(DistanceGizmo::new("height", Vec3::ZERO, Vec3::Y)),
            factory: shared_none(),
        })
    }

    fn drag_handle(&self, gizmo: &GizmoHandle<DistanceGizmo>, to: Vec2) {
        let camera = self.viewport.camera();
        let at = {
            let mut g = gizmo.gizmo().borrow_mut();
            g.update(&camera);
            camera.project(g.view().picker_center())
        };
        let id = self.viewport.id();
        self.router
            .pointer_sample(id, PointerKind::Move, PointerSample::moved(at));
        self.router
            .pointer_sample(id, PointerKind::Down, PointerSample::primary(at));
        self.router
            .pointer_sample(id, PointerKind::Move, PointerSample::moved(to));
        self.router
            .pointer_sample(id, PointerKind::Up, PointerSample::primary(to));
    }
}

fn factory_of(command: &ExtrudeCommand) -> ParametricFactory<Extrude> {
    command
        .factory
        .borrow()
        .clone()
        .expect("factory created on start")
}

#[tokio::test]
async fn test_drag_then_enter_commits_the_dragged_height() {
    let s = session();
    let command = s.command();
    let dragged = LocalSet::new()
        .run_until(async {
            let running = s.executor.enqueue(command.clone(), CancelOrFinish::Finish);

            assert_eq!(s.doc.temporaries().len(), 1);
            s.drag_handle(&command.gizmo, Vec2::new(0.0, 0.6));
            let dragged = command.gizmo.gizmo().borrow().value();
            assert!(dragged > 1.0);
            assert_eq!(factory_of(&command).params().height, f64::from(dragged));

            s.router.press_key("Enter");
            running.await;
            dragged
        })
        .await;

    assert_eq!(command.state(), CommandState::Finished);
    assert_eq!(factory_of(&command).state(), FactoryState::Committed);
    let items = s.doc.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].1.properties.get("height"), Some(&f64::from(dragged)));
    assert!(s.doc.temporaries().is_empty());
    assert!(s.viewport.controls_enabled());
    assert_eq!(s.router.listener_count(), 0);

    let committed = s
        .bus
        .history(None)
        .into_iter()
        .filter(|e| matches!(e, EditorEvent::Factory(FactoryEvent::Committed { .. })))
        .count();
    assert_eq!(committed, 1);
}

#[tokio::test]
async fn test_escape_discards_the_preview() {
    let s = session();
    let command = s.command();
    LocalSet::new()
        .run_until(async {
            let running = s.executor.enqueue(command.clone(), CancelOrFinish::Finish);
            s.drag_handle(&command.gizmo, Vec2::new(0.0, 0.4));
            s.router.press_key("Escape");
            running.await;
        })
        .await;

    assert_eq!(command.state(), CommandState::Cancelled);
    assert_eq!(factory_of(&command).state(), FactoryState::Cancelled);
    assert!(s.doc.is_empty());
    assert!(s.doc.temporaries().is_empty());
    assert!(s.executor.history().borrow().is_empty());
}

#[tokio::test]
async fn test_starting_another_command_commits_the_first() {
    let s = session();
    let first = s.command();
    let second = s.command();

    LocalSet::new()
        .run_until(async {
            let running = s.executor.enqueue(first.clone(), CancelOrFinish::Finish);
            s.executor.enqueue(second.clone(), CancelOrFinish::Finish).await;
            assert_eq!(first.state(), CommandState::Finished);

            // The loop commits the first command and leaves the second waiting
            for _ in 0..16 {
                if second.state() == CommandState::Running {
                    break;
                }
                tokio::task::yield_now().await;
            }
            assert_eq!(s.executor.active_title().as_deref(), Some("Extrude"));
            assert_eq!(second.state(), CommandState::Running);
            assert_eq!(s.doc.len(), 1);

            s.router.press_key("Enter");
            running.await;
        })
        .await;

    assert_eq!(second.state(), CommandState::Finished);
    assert_eq!(s.doc.len(), 2);
    assert_eq!(
        s.executor.history().borrow().undo_names(),
        vec!["Extrude", "Extrude"]
    );
}

#[tokio::test]
async fn test_dragging_below_zero_keeps_the_last_good_height() {
    let s = session();
    let command = s.command();
    let good = LocalSet::new()
        .run_until(async {
            let running = s.executor.enqueue(command.clone(), CancelOrFinish::Finish);

            s.drag_handle(&command.gizmo, Vec2::new(0.0, 0.5));
            let good = factory_of(&command).params().height;
            s.drag_handle(&command.gizmo, Vec2::new(0.0, -0.9));

            assert_eq!(factory_of(&command).state(), FactoryState::Failed);
            assert_eq!(factory_of(&command).params().height, good);
            assert_eq!(s.doc.temporaries().len(), 1);

            s.router.press_key("Enter");
            running.await;
            good
        })
        .await;
    assert_eq!(s.doc.items()[0].1.properties.get("height"), Some(&good));
}
