use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use glam::{Vec2, Vec3};
use solidkit_core::event_bus::{EditorEvent, EventBus, EventBusConfig, GizmoEvent};
use solidkit_core::{CancellableRegistor, Error};
use solidkit_gizmo::{
    Camera, ConstructionPlane, GizmoContext, HeadlessViewport, InputRouter, PointPicker,
    PointerKind, PointerSample, Viewport, FINISH_POINT_PICKER,
};

fn setup() -> (GizmoContext, Rc<HeadlessViewport>, Arc<EventBus>) {
    let viewport = Rc::new(HeadlessViewport::new(
        1,
        Camera::top(Vec3::ZERO, 10.0),
        800.0,
        600.0,
    ));
    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        enable_history: true,
        ..Default::default()
    }));
    let ctx = GizmoContext::new(
        vec![viewport.clone() as Rc<dyn Viewport>],
        InputRouter::new(),
        bus.clone(),
    );
    (ctx, viewport, bus)
}

fn picker_events(bus: &EventBus) -> usize {
    bus.history(None)
        .into_iter()
        .filter(|e| matches!(e, EditorEvent::Gizmo(GizmoEvent::PointPickerChanged)))
        .count()
}

#[test]
fn test_click_accepts_the_point_under_the_pointer() {
    let (ctx, viewport, bus) = setup();
    let picker = PointPicker::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let op = picker.execute(&ctx, move |p| s.borrow_mut().push(p));
    assert!(!viewport.controls_enabled());

    let id = viewport.id();
    ctx.router
        .pointer_sample(id, PointerKind::Move, PointerSample::moved(Vec2::new(0.2, 0.0)));
    ctx.router
        .pointer_sample(id, PointerKind::Move, PointerSample::moved(Vec2::new(0.4, 0.0)));
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(picker_events(&bus), 2);

    ctx.router
        .pointer_sample(id, PointerKind::Down, PointerSample::primary(Vec2::new(0.4, 0.0)));
    let result = op.now_or_never().expect("settled").expect("picked");

    assert!(result.point.x > 0.0);
    assert!(result.point.z.abs() < 1e-4);
    assert_eq!(result.viewport, id);
    assert_eq!(picker.picked_points(), vec![result.point]);
    assert!(viewport.controls_enabled());
    assert_eq!(ctx.router.listener_count(), 0);
    // Accepting tears the picker down, which is a change too
    assert_eq!(picker_events(&bus), 3);
}

#[test]
fn test_finish_command_picks_on_the_restricted_plane() {
    let (ctx, viewport, _bus) = setup();
    let mut picker = PointPicker::new();
    picker.restrict_to_plane(ConstructionPlane::XY.through(Vec3::new(0.0, 0.0, 2.0)));
    let op = picker.execute(&ctx, |_| {});

    ctx.router.pointer_sample(
        viewport.id(),
        PointerKind::Move,
        PointerSample::moved(Vec2::new(-0.3, 0.1)),
    );
    assert!(ctx.router.dispatch_command(FINISH_POINT_PICKER));

    let result = op.now_or_never().expect("settled").expect("picked");
    assert!((result.point.z - 2.0).abs() < 1e-3);
    assert!(result.point.x < 0.0);
    assert_eq!(picker.undo(), Some(result.point));
    assert!(picker.last_picked().is_none());
}

#[test]
fn test_finish_without_a_point_is_a_no_op() {
    let (ctx, viewport, _bus) = setup();
    let picker = PointPicker::new();
    let op = picker.execute(&ctx, |_| {});
    op.finish();

    assert!(matches!(op.now_or_never(), Some(Err(Error::NoOp))));
    assert!(picker.picked_points().is_empty());
    assert!(viewport.controls_enabled());
}

#[test]
fn test_command_cancel_reaches_a_registered_picker() {
    let (ctx, viewport, bus) = setup();
    let picker = PointPicker::new();
    let registor = CancellableRegistor::new();
    registor.begin();
    let op = registor
        .register(picker.execute(&ctx, |_| {}))
        .expect("running command");

    ctx.router.pointer_sample(
        viewport.id(),
        PointerKind::Move,
        PointerSample::moved(Vec2::new(0.1, 0.1)),
    );
    registor.cancel();

    assert!(matches!(op.now_or_never(), Some(Err(Error::Cancel))));
    assert!(picker.picked_points().is_empty());
    assert!(viewport.controls_enabled());
    assert_eq!(ctx.router.listener_count(), 0);
    assert_eq!(picker_events(&bus), 2);
}

#[test]
fn test_secondary_button_does_not_accept() {
    let (ctx, viewport, _bus) = setup();
    let picker = PointPicker::new();
    let op = picker.execute(&ctx, |_| {});

    ctx.router.pointer_sample(
        viewport.id(),
        PointerKind::Down,
        PointerSample::new(0.0, 0.0, 2),
    );
    assert!(!op.is_settled());
    op.cancel();
}
