use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::FutureExt;
use glam::{Vec2, Vec3};
use solidkit_core::event_bus::EventBus;
use solidkit_gizmo::{
    Camera, CompositeGizmo, DistanceGizmo, Gizmo, GizmoContext, GizmoHandle, GizmoState,
    HeadlessViewport, InputRouter, Mode, PointerKind, PointerSample, Viewport,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Offsets {
    along_y: f32,
    along_x: f32,
}

struct Fixture {
    viewport: Rc<HeadlessViewport>,
    router: InputRouter,
    ctx: GizmoContext,
    y: GizmoHandle<DistanceGizmo>,
    x: GizmoHandle<DistanceGizmo>,
    composite: CompositeGizmo<Offsets>,
}

fn fixture() -> Fixture {
    let viewport = Rc::new(HeadlessViewport::new(
        1,
        Camera::top(Vec3::ZERO, 20.0),
        800.0,
        600.0,
    ));
    let router = InputRouter::new();
    let ctx = GizmoContext::new(
        vec![viewport.clone() as Rc<dyn Viewport>],
        router.clone(),
        Arc::new(EventBus::new()),
    );
    let y = GizmoHandle::new(DistanceGizmo::new("offset-y", Vec3::ZERO, Vec3::Y));
    let x = GizmoHandle::new(DistanceGizmo::new(
        "offset-x",
        Vec3::new(4.0, -4.0, 0.0),
        Vec3::X,
    ));
    let mut composite = CompositeGizmo::new("offsets", Offsets::default(), &ctx);
    composite.add_gizmo(&ctx, y.clone(), |p: &mut Offsets, v| p.along_y = v);
    composite.add_gizmo(&ctx, x.clone(), |p: &mut Offsets, v| p.along_x = v);
    Fixture {
        viewport,
        router,
        ctx,
        y,
        x,
        composite,
    }
}

fn fixture_composite(ctx: &GizmoContext) -> CompositeGizmo<Offsets> {
    let y = GizmoHandle::new(DistanceGizmo::new("offset-y", Vec3::ZERO, Vec3::Y));
    let x = GizmoHandle::new(DistanceGizmo::new(
        "offset-x",
        Vec3::new(4.0, -4.0, 0.0),
        Vec3::X,
    ));
    let mut composite = CompositeGizmo::new("offsets", Offsets::default(), ctx);
    composite.add_gizmo(ctx, y, |p: &mut Offsets, v| p.along_y = v);
    composite.add_gizmo(ctx, x, |p: &mut Offsets, v| p.along_x = v);
    composite
}

impl Fixture {
    fn position_of(&self, handle: &GizmoHandle<DistanceGizmo>) -> Vec2 {
        let camera = self.viewport.camera();
        let mut gizmo = handle.gizmo().borrow_mut();
        gizmo.update(&camera);
        camera.project(gizmo.view().picker_center())
    }

    fn send(&self, kind: PointerKind, sample: PointerSample) {
        self.router.pointer_sample(self.viewport.id(), kind, sample);
    }

    fn press(&self, handle: &GizmoHandle<DistanceGizmo>) {
        let at = self.position_of(handle);
        self.send(PointerKind::Move, PointerSample::moved(at));
        self.send(PointerKind::Down, PointerSample::primary(at));
    }
}

#[test]
fn test_members_attach_under_composite_node() {
    let f = fixture();
    let scene = f.ctx.helpers.borrow();
    let y_node = f.y.node().expect("attached");
    let x_node = f.x.node().expect("attached");
    assert_eq!(scene.parent_of(y_node), Some(f.composite.node()));
    assert_eq!(scene.parent_of(x_node), Some(f.composite.node()));
    assert!(!scene.is_visible(y_node));
}

#[test]
fn test_dragging_member_blocks_siblings() {
    let f = fixture();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let _op = f
        .composite
        .execute(&f.ctx, move |p: &Offsets| s.borrow_mut().push(p.clone()), Mode::Persistent);
    assert!(f.ctx.helpers.borrow().is_visible(f.composite.node()));

    f.press(&f.y);
    assert_eq!(f.y.state(), GizmoState::Dragging);
    assert_eq!(f.composite.focused(), Some(0));

    // Hovering the other member while the first holds focus does nothing
    let x_at = f.position_of(&f.x);
    f.send(PointerKind::Move, PointerSample::moved(x_at));
    assert_eq!(f.x.state(), GizmoState::None);

    f.send(PointerKind::Up, PointerSample::primary(x_at));
    assert_eq!(f.y.state(), GizmoState::None);
    assert_eq!(f.composite.focused(), None);
    let last = seen.borrow().last().cloned().expect("y reported");
    assert!(last.along_y < 0.0);
    assert_eq!(last.along_x, 0.0);
}

#[test]
fn test_keyboard_command_steals_focus_and_interrupts_holder() {
    let f = fixture();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    let _op = f
        .composite
        .execute(&f.ctx, move |p: &Offsets| s.borrow_mut().push(p.clone()), Mode::Persistent);

    f.press(&f.y);
    f.send(PointerKind::Move, PointerSample::moved(Vec2::new(0.0, 0.5)));
    assert!(f.composite.params().borrow().along_y > 0.0);
    let before = seen.borrow().len();

    assert!(f.router.dispatch_command("gizmo:offset-x"));
    assert_eq!(f.y.state(), GizmoState::None);
    assert_eq!(f.x.state(), GizmoState::Command);
    assert_eq!(f.composite.focused(), Some(1));

    // The interrupted member reverted exactly once
    let after = seen.borrow()[before..].to_vec();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].along_y, 0.0);

    // Later pointer movement drives only the new holder
    f.send(PointerKind::Move, PointerSample::moved(Vec2::new(0.6, 0.0)));
    let params = f.composite.params().borrow().clone();
    assert_eq!(params.along_y, 0.0);
    assert!(params.along_x > 0.0);
}

#[test]
fn test_disable_interrupts_and_ignores_input() {
    let f = fixture();
    let _op = f.composite.execute(&f.ctx, |_: &Offsets| {}, Mode::Persistent);

    f.press(&f.y);
    f.composite.disable();
    assert_eq!(f.y.state(), GizmoState::None);

    f.press(&f.y);
    assert_eq!(f.y.state(), GizmoState::None);

    f.composite.enable();
    f.press(&f.y);
    assert_eq!(f.y.state(), GizmoState::Dragging);
}

#[test]
fn test_finishing_the_composite_settles_and_detaches() {
    let f = fixture();
    let op = f.composite.execute(&f.ctx, |_: &Offsets| {}, Mode::Persistent);
    f.press(&f.x);
    assert_eq!(f.x.state(), GizmoState::Dragging);

    op.finish();
    assert!(matches!(op.now_or_never(), Some(Ok(()))));
    assert_eq!(f.x.state(), GizmoState::None);
    assert_eq!(f.composite.focused(), None);
    assert!(!f.ctx.helpers.borrow().is_visible(f.composite.node()));
    assert_eq!(f.router.listener_count(), 0);
    assert!(f.viewport.controls_enabled());
}

#[test]
fn test_settled_composite_leaves_no_helper_nodes() {
    let f = fixture();
    assert_eq!(f.ctx.helpers.borrow().len(), 3);

    let op = f.composite.execute(&f.ctx, |_: &Offsets| {}, Mode::Persistent);
    op.cancel();

    assert!(f.ctx.helpers.borrow().is_empty());
    assert!(!f.ctx.helpers.borrow().contains(f.composite.node()));
    assert_eq!(f.y.node(), None);
    assert_eq!(f.x.node(), None);

    // A second composite over the same session starts from an empty scene
    let again = fixture_composite(&f.ctx);
    let op = again.execute(&f.ctx, |_: &Offsets| {}, Mode::Persistent);
    assert_eq!(f.ctx.helpers.borrow().len(), 3);
    op.finish();
    assert!(f.ctx.helpers.borrow().is_empty());
}
