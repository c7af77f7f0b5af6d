use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use glam::{Vec2, Vec3};
use solidkit_core::event_bus::{EditorEvent, EventBus, EventBusConfig, GizmoEvent};
use solidkit_core::{Error, OperationState};
use solidkit_gizmo::{
    Camera, DistanceGizmo, Gizmo, GizmoContext, GizmoHandle, GizmoState, HeadlessViewport,
    InputMode, InputRouter, Mode, PointerKind, PointerSample, Viewport,
};

struct Session {
    viewport: Rc<HeadlessViewport>,
    router: InputRouter,
    bus: Arc<EventBus>,
    ctx: GizmoContext,
}

fn session() -> Session {
    let viewport = Rc::new(HeadlessViewport::new(
        1,
        Camera::top(Vec3::ZERO, 10.0),
        800.0,
        600.0,
    ));
    let router = InputRouter::new();
    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        enable_history: true,
        ..Default::default()
    }));
    let ctx = GizmoContext::new(
        vec![viewport.clone() as Rc<dyn Viewport>],
        router.clone(),
        bus.clone(),
    );
    Session {
        viewport,
        router,
        bus,
        ctx,
    }
}

fn handle_position<G: Gizmo>(handle: &GizmoHandle<G>, viewport: &HeadlessViewport) -> Vec2 {
    let camera = viewport.camera();
    let mut gizmo = handle.gizmo().borrow_mut();
    gizmo.update(&camera);
    camera.project(gizmo.view().picker_center())
}

impl Session {
    fn send(&self, kind: PointerKind, sample: PointerSample) {
        self.router.pointer_sample(self.viewport.id(), kind, sample);
    }

    fn drag<G: Gizmo>(&self, handle: &GizmoHandle<G>, to: Vec2) {
        let at = handle_position(handle, &self.viewport);
        self.send(PointerKind::Move, PointerSample::moved(at));
        self.send(PointerKind::Down, PointerSample::primary(at));
        self.send(PointerKind::Move, PointerSample::moved(to));
        self.send(PointerKind::Up, PointerSample::primary(to));
    }
}

#[test]
fn test_transitory_resolves_after_one_drag() {
    let s = session();
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let values = Rc::new(RefCell::new(Vec::new()));
    let v = values.clone();
    let op = handle.execute(&s.ctx, move |d| v.borrow_mut().push(d), Mode::Transitory);

    assert!(s.router.listener_count() > 0);
    assert!(handle.node().is_some());

    s.drag(&handle, Vec2::new(0.0, 0.5));

    assert!(matches!(op.clone().now_or_never(), Some(Ok(()))));
    assert_eq!(values.borrow().len(), 1);
    assert!(values.borrow()[0] > 0.0);
    assert_eq!(s.router.listener_count(), 0);
    assert!(s.viewport.controls_enabled());
    assert_eq!(s.viewport.disable_count(), 1);
    assert!(handle.node().is_none());
    assert!(handle.machine().is_none());
    assert!(s.ctx.helpers.borrow().is_empty());
}

#[test]
fn test_persistent_accepts_many_drags_until_finished() {
    let s = session();
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    let op = handle.execute(&s.ctx, move |_| *c.borrow_mut() += 1, Mode::Persistent);

    s.drag(&handle, Vec2::new(0.0, 0.3));
    s.drag(&handle, Vec2::new(0.0, 0.6));
    assert_eq!(*count.borrow(), 2);
    assert_eq!(handle.state(), GizmoState::None);
    assert!(op.clone().now_or_never().is_none());

    op.finish();
    assert_eq!(op.state(), OperationState::Finished);
    assert!(matches!(op.now_or_never(), Some(Ok(()))));
    assert_eq!(s.router.listener_count(), 0);
}

#[test]
fn test_cancel_mid_drag_cleans_up() {
    let s = session();
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let op = handle.execute(&s.ctx, |_| {}, Mode::Persistent);

    let at = handle_position(&handle, &s.viewport);
    s.send(PointerKind::Move, PointerSample::moved(at));
    s.send(PointerKind::Down, PointerSample::primary(at));
    assert_eq!(handle.state(), GizmoState::Dragging);
    assert!(!s.viewport.controls_enabled());

    op.cancel();
    assert!(matches!(op.now_or_never(), Some(Err(Error::Cancel))));
    assert!(s.viewport.controls_enabled());
    assert_eq!(s.router.listener_count(), 0);
}

#[test]
fn test_keyboard_command_enters_modal_tracking() {
    let s = session();
    s.router.bind_key("d", "gizmo:distance");
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let last = Rc::new(RefCell::new(None));
    let l = last.clone();
    let _op = handle.execute(&s.ctx, move |d| *l.borrow_mut() = Some(d), Mode::Persistent);

    assert_eq!(s.router.registered_commands(), vec!["gizmo:distance".to_string()]);
    s.router.press_key("d");
    assert_eq!(handle.state(), GizmoState::Command);

    s.router.press_key("3");
    assert_eq!(*last.borrow(), Some(3.0));

    s.send(PointerKind::Up, PointerSample::primary(Vec2::ZERO));
    assert_eq!(handle.state(), GizmoState::None);
    assert_eq!(handle.gizmo().borrow().value(), 3.0);
}

#[test]
fn test_named_keys_do_not_reach_typed_text() {
    let s = session();
    s.router.bind_key("d", "gizmo:distance");
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let last = Rc::new(RefCell::new(None));
    let l = last.clone();
    let _op = handle.execute(&s.ctx, move |d| *l.borrow_mut() = Some(d), Mode::Persistent);

    s.router.press_key("d");
    s.router.press_key("1");
    s.router.press_key("5");
    s.router.press_key("Enter");
    assert_eq!(*last.borrow(), Some(15.0));
    assert_eq!(handle.gizmo().borrow().mode(), InputMode::Keyboard);

    s.router.press_key("Shift");
    s.router.press_key("2");
    assert_eq!(*last.borrow(), Some(152.0));
    assert_eq!(handle.state(), GizmoState::Command);
}

#[test]
fn test_keybinding_events_bracket_execution() {
    let s = session();
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let op = handle.execute(&s.ctx, |_| {}, Mode::Persistent);
    op.cancel();

    let bindings: Vec<GizmoEvent> = s
        .bus
        .history(None)
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::Gizmo(
                e @ (GizmoEvent::KeybindingsRegistered { .. }
                | GizmoEvent::KeybindingsCleared { .. }),
            ) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(bindings.len(), 2);
    assert!(matches!(
        &bindings[0],
        GizmoEvent::KeybindingsRegistered { commands } if commands == &["gizmo:distance"]
    ));
    assert!(matches!(bindings[1], GizmoEvent::KeybindingsCleared { .. }));
}

#[test]
fn test_hover_enters_and_leaves() {
    let s = session();
    let handle = GizmoHandle::new(DistanceGizmo::new("distance", Vec3::ZERO, Vec3::Y));
    let _op = handle.execute(&s.ctx, |_| {}, Mode::Persistent);

    let at = handle_position(&handle, &s.viewport);
    s.send(PointerKind::Move, PointerSample::moved(at));
    assert_eq!(handle.state(), GizmoState::Hover);
    assert!(handle.gizmo().borrow().is_hovered());

    s.send(PointerKind::Move, PointerSample::moved(Vec2::new(0.9, -0.9)));
    assert_eq!(handle.state(), GizmoState::None);
    assert!(!handle.gizmo().borrow().is_hovered());

    // A secondary button never starts a drag
    s.send(PointerKind::Move, PointerSample::moved(at));
    s.send(PointerKind::Down, PointerSample::new(at.x, at.y, 2));
    assert_eq!(handle.state(), GizmoState::Hover);
}
